//! Keyboard source trait and raw-mode lifecycle helpers.

use std::io;
use std::time::Duration;

/// Outcome of one timed read from an [`InputSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// `n` bytes were written to the front of the buffer.
    Data(usize),
    /// Nothing arrived before the timeout.
    Idle,
    /// The source is exhausted and will never produce more bytes.
    Closed,
}

/// Byte stream the input loop reads keys from.
///
/// Reads must honor the timeout so the reader thread can notice a stop request.
pub trait InputSource: Send {
    /// Switch the device into character-at-a-time mode.
    fn enter_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Restore whatever mode was active before [`InputSource::enter_raw_mode`].
    fn leave_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<ReadStatus>;
}

/// RAII guard that leaves raw mode on drop, even when the read loop unwinds.
pub struct RawModeGuard<'a> {
    source: &'a mut dyn InputSource,
    active: bool,
}

impl<'a> RawModeGuard<'a> {
    pub fn enter(source: &'a mut dyn InputSource) -> io::Result<Self> {
        source.enter_raw_mode()?;
        Ok(Self {
            source,
            active: true,
        })
    }

    pub fn source(&mut self) -> &mut dyn InputSource {
        &mut *self.source
    }

    /// Leave raw mode now and report the outcome.
    pub fn leave(mut self) -> io::Result<()> {
        self.active = false;
        self.source.leave_raw_mode()
    }
}

impl Drop for RawModeGuard<'_> {
    fn drop(&mut self) {
        if self.active {
            let _ = self.source.leave_raw_mode();
        }
    }
}
