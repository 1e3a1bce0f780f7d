//! The single output gate and in-memory output targets.
//!
//! Invariant: canvases hand rendered frames to the terminal only through [`write_chunked`].

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Upper bound for a single `write` call when flushing a frame.
pub const MAX_CHUNK_SIZE: usize = 4096;

/// Writes `bytes` in pieces of at most [`MAX_CHUNK_SIZE`] and flushes the writer.
pub fn write_chunked<W: Write + ?Sized>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    for chunk in bytes.chunks(MAX_CHUNK_SIZE) {
        writer.write_all(chunk)?;
    }
    writer.flush()
}

/// Cloneable in-memory writer.
///
/// Every clone appends to the same buffer, so a test can hand one clone to a canvas and read
/// the rendered bytes back through another.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn len(&self) -> usize {
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns everything written so far and empties the buffer.
    pub fn take(&self) -> String {
        let mut bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        let taken = std::mem::take(&mut *bytes);
        String::from_utf8_lossy(&taken).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
