//! Crate error type.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::widgets::task_list::TaskListError;

pub type Result<T> = std::result::Result<T, UxError>;

#[derive(Debug, Error)]
pub enum UxError {
    /// Writing a frame to the output stream failed.
    #[error("failed to write to terminal: {0}")]
    Io(#[from] io::Error),

    /// Raw mode could not be entered or the keyboard could not be read.
    #[error("keyboard input failed: {0}")]
    Keyboard(#[source] io::Error),

    /// The user interrupted the interaction (Ctrl-C, SIGINT, SIGTERM).
    #[error("cancelled by user")]
    Cancelled,

    /// The configured prompt timeout expired before an answer was given.
    #[error("prompt timed out after {}", format_timeout(.0))]
    Timeout(Duration),

    /// A caller-supplied deadline expired.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("render failed: {0}")]
    Render(String),

    #[error(transparent)]
    Tasks(#[from] TaskListError),
}

impl UxError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

fn format_timeout(timeout: &Duration) -> String {
    if timeout.subsec_millis() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::UxError;
    use std::io;
    use std::time::Duration;

    #[test]
    fn timeout_message_carries_duration() {
        assert_eq!(
            UxError::Timeout(Duration::from_secs(30)).to_string(),
            "prompt timed out after 30s"
        );
        assert_eq!(
            UxError::Timeout(Duration::from_millis(1500)).to_string(),
            "prompt timed out after 1500ms"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: UxError = io::Error::new(io::ErrorKind::BrokenPipe, "closed").into();
        assert!(matches!(err, UxError::Io(_)));
        assert!(!err.is_cancelled());
        assert!(UxError::Cancelled.is_cancelled());
    }
}
