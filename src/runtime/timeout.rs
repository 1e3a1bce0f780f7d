//! Prompt timeouts.

use std::time::{Duration, Instant};

use crate::error::{Result, UxError};
use crate::runtime::cancel::CancelToken;

/// Runs `ask` under `timeout`, if one is set.
///
/// When the deadline that expires is the one added here, [`UxError::DeadlineExceeded`]
/// becomes [`UxError::Timeout`] carrying `timeout`. A caller's own earlier deadline passes
/// through unchanged.
pub fn with_prompt_timeout<T, F>(token: &CancelToken, timeout: Option<Duration>, ask: F) -> Result<T>
where
    F: FnOnce(&CancelToken) -> Result<T>,
{
    let Some(timeout) = timeout.filter(|timeout| !timeout.is_zero()) else {
        return ask(token);
    };

    let deadline = Instant::now() + timeout;
    let ours = token.deadline().map_or(true, |parent| deadline < parent);
    let scoped = token.with_deadline(deadline);
    match ask(&scoped) {
        Err(UxError::DeadlineExceeded) if ours => {
            tracing::debug!(?timeout, "prompt timed out");
            Err(UxError::Timeout(timeout))
        }
        other => other,
    }
}
