//! Deterministic keyboard source for tests and demos.

use std::collections::VecDeque;
use std::io;
use std::thread;
use std::time::Duration;

use crate::core::input::Key;
use crate::core::terminal::{InputSource, ReadStatus};

/// What a [`ScriptedSource`] reports once every chunk has been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exhausted {
    Close,
    Idle,
}

/// Replays a fixed list of byte chunks, one chunk per read.
///
/// Each chunk is followed by one idle read, the pause between two keypresses, so a lone
/// `ESC` chunk decodes as Escape instead of prefixing the next key.
pub struct ScriptedSource {
    chunks: VecDeque<Vec<u8>>,
    pending: Vec<u8>,
    pause: bool,
    exhausted: Exhausted,
    key_delay: Duration,
    raw_mode: bool,
}

impl ScriptedSource {
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            pending: Vec::new(),
            pause: false,
            exhausted: Exhausted::Close,
            key_delay: Duration::ZERO,
            raw_mode: false,
        }
    }

    /// One chunk per key, encoded the way a terminal would send it.
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = Key>,
    {
        Self::new(keys.into_iter().map(|key| key.to_bytes()))
    }

    /// Report [`ReadStatus::Idle`] forever instead of closing once the script ends.
    pub fn then_idle(mut self) -> Self {
        self.exhausted = Exhausted::Idle;
        self
    }

    /// Waits `delay` between chunks, like a person typing.
    pub fn with_key_delay(mut self, delay: Duration) -> Self {
        self.key_delay = delay;
        self
    }

    pub fn is_raw_mode(&self) -> bool {
        self.raw_mode
    }
}

impl InputSource for ScriptedSource {
    fn enter_raw_mode(&mut self) -> io::Result<()> {
        self.raw_mode = true;
        Ok(())
    }

    fn leave_raw_mode(&mut self) -> io::Result<()> {
        self.raw_mode = false;
        Ok(())
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<ReadStatus> {
        if self.pause {
            self.pause = false;
            if !self.key_delay.is_zero() {
                thread::sleep(self.key_delay);
            }
            return Ok(ReadStatus::Idle);
        }
        if self.pending.is_empty() {
            match self.chunks.pop_front() {
                Some(chunk) => self.pending = chunk,
                None => {
                    return match self.exhausted {
                        Exhausted::Close => Ok(ReadStatus::Closed),
                        Exhausted::Idle => {
                            thread::sleep(timeout);
                            Ok(ReadStatus::Idle)
                        }
                    };
                }
            }
        }
        let len = self.pending.len().min(buf.len());
        buf[..len].copy_from_slice(&self.pending[..len]);
        self.pending.drain(..len);
        self.pause = self.pending.is_empty();
        Ok(ReadStatus::Data(len))
    }
}
