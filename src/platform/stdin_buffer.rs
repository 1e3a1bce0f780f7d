//! Stdin byte buffering and key decoding.
//!
//! Raw reads can split an escape sequence or a multi-byte character across chunks. The
//! buffer keeps incomplete tails until more bytes arrive; a lone `ESC` is only reported as
//! [`Key::Escape`] once the reader goes idle and calls [`StdinBuffer::flush`].

use crate::core::input::Key;

const ESC: u8 = 0x1b;

#[derive(Debug)]
enum Decoded {
    Key(Key, usize),
    Skip(usize),
    Incomplete,
}

/// Buffers stdin input and emits complete keys.
#[derive(Debug, Default)]
pub struct StdinBuffer {
    pending: Vec<u8>,
}

impl StdinBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `data` and returns every key that is now complete.
    pub fn process(&mut self, data: &[u8]) -> Vec<Key> {
        self.pending.extend_from_slice(data);
        let mut keys = Vec::new();
        let mut idx = 0;
        while idx < self.pending.len() {
            match decode(&self.pending[idx..]) {
                Decoded::Key(key, used) => {
                    keys.push(key);
                    idx += used;
                }
                Decoded::Skip(used) => idx += used,
                Decoded::Incomplete => break,
            }
        }
        self.pending.drain(..idx);
        keys
    }

    /// Resolves whatever is still buffered, treating a dangling `ESC` as the Escape key.
    pub fn flush(&mut self) -> Vec<Key> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let pending = std::mem::take(&mut self.pending);
        let mut keys = Vec::new();
        let mut idx = 0;
        while idx < pending.len() {
            if pending[idx] == ESC {
                keys.push(Key::Escape);
                idx += 1;
                continue;
            }
            match decode(&pending[idx..]) {
                Decoded::Key(key, used) => {
                    keys.push(key);
                    idx += used;
                }
                Decoded::Skip(used) => idx += used,
                // Truncated UTF-8 at end of input.
                Decoded::Incomplete => break,
            }
        }
        keys
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

fn decode(bytes: &[u8]) -> Decoded {
    let first = bytes[0];
    match first {
        ESC => decode_escape(bytes),
        b'\r' | b'\n' => Decoded::Key(Key::Enter, 1),
        0x7f | 0x08 => Decoded::Key(Key::Backspace, 1),
        b'\t' => Decoded::Key(Key::Tab, 1),
        0x03 | 0x18 => Decoded::Key(Key::Interrupt, 1),
        0x00..=0x1f => Decoded::Skip(1),
        _ => decode_utf8(bytes),
    }
}

fn decode_utf8(bytes: &[u8]) -> Decoded {
    let len = match bytes[0] {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => return Decoded::Skip(1),
    };
    if bytes.len() < len {
        return Decoded::Incomplete;
    }
    match std::str::from_utf8(&bytes[..len]) {
        Ok(text) => match text.chars().next() {
            Some(ch) => Decoded::Key(Key::Char(ch), len),
            None => Decoded::Skip(len),
        },
        Err(_) => Decoded::Skip(1),
    }
}

fn decode_escape(bytes: &[u8]) -> Decoded {
    if bytes.len() < 2 {
        return Decoded::Incomplete;
    }
    match bytes[1] {
        b'[' => decode_csi(bytes),
        b'O' => {
            if bytes.len() < 3 {
                return Decoded::Incomplete;
            }
            match bytes[2] {
                b'A' => Decoded::Key(Key::Up, 3),
                b'B' => Decoded::Key(Key::Down, 3),
                b'C' => Decoded::Key(Key::Right, 3),
                b'D' => Decoded::Key(Key::Left, 3),
                b'H' => Decoded::Key(Key::Home, 3),
                b'F' => Decoded::Key(Key::End, 3),
                b'M' => Decoded::Key(Key::Enter, 3),
                _ => Decoded::Skip(3),
            }
        }
        // ESC followed by another ESC: the first one stands alone.
        ESC => Decoded::Key(Key::Escape, 1),
        // Alt+key: report the key, drop the modifier.
        _ => match decode(&bytes[1..]) {
            Decoded::Key(key, used) => Decoded::Key(key, used + 1),
            Decoded::Skip(used) => Decoded::Skip(used + 1),
            Decoded::Incomplete => Decoded::Incomplete,
        },
    }
}

fn decode_csi(bytes: &[u8]) -> Decoded {
    let mut idx = 2;
    while idx < bytes.len() {
        let b = bytes[idx];
        if (0x40..=0x7e).contains(&b) {
            let used = idx + 1;
            let params = &bytes[2..idx];
            let key = match b {
                b'A' => Some(Key::Up),
                b'B' => Some(Key::Down),
                b'C' => Some(Key::Right),
                b'D' => Some(Key::Left),
                b'H' => Some(Key::Home),
                b'F' => Some(Key::End),
                b'~' => match params {
                    b"1" | b"7" => Some(Key::Home),
                    b"4" | b"8" => Some(Key::End),
                    b"3" => Some(Key::Delete),
                    _ => None,
                },
                _ => None,
            };
            return match key {
                Some(key) => Decoded::Key(key, used),
                None => Decoded::Skip(used),
            };
        }
        idx += 1;
    }
    Decoded::Incomplete
}

#[cfg(test)]
mod tests {
    use super::StdinBuffer;
    use crate::core::input::Key;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_printable_and_control_keys() {
        let mut buffer = StdinBuffer::new();
        let keys = buffer.process(b"ab\x7f\r");
        assert_eq!(
            keys,
            vec![Key::Char('a'), Key::Char('b'), Key::Backspace, Key::Enter]
        );
    }

    #[test]
    fn decodes_arrow_sequences() {
        let mut buffer = StdinBuffer::new();
        let keys = buffer.process(b"\x1b[A\x1b[B\x1bOC\x1b[D");
        assert_eq!(keys, vec![Key::Up, Key::Down, Key::Right, Key::Left]);
    }

    #[test]
    fn split_escape_sequence_waits_for_rest() {
        let mut buffer = StdinBuffer::new();
        assert!(buffer.process(b"\x1b[").is_empty());
        assert!(buffer.has_pending());
        assert_eq!(buffer.process(b"B"), vec![Key::Down]);
        assert!(!buffer.has_pending());
    }

    #[test]
    fn lone_escape_resolves_on_flush() {
        let mut buffer = StdinBuffer::new();
        assert!(buffer.process(b"\x1b").is_empty());
        assert_eq!(buffer.flush(), vec![Key::Escape]);
    }

    #[test]
    fn multibyte_chars_survive_chunk_splits() {
        let mut buffer = StdinBuffer::new();
        let bytes = "é".as_bytes();
        assert!(buffer.process(&bytes[..1]).is_empty());
        assert_eq!(buffer.process(&bytes[1..]), vec![Key::Char('é')]);
    }

    #[test]
    fn ctrl_c_and_ctrl_x_interrupt() {
        let mut buffer = StdinBuffer::new();
        assert_eq!(buffer.process(b"\x03\x18"), vec![Key::Interrupt, Key::Interrupt]);
    }

    #[test]
    fn unknown_sequences_are_dropped() {
        let mut buffer = StdinBuffer::new();
        assert_eq!(buffer.process(b"\x1b[15~x"), vec![Key::Char('x')]);
    }

    #[test]
    fn key_bytes_round_trip_through_decoder() {
        let keys = [
            Key::Char('q'),
            Key::Enter,
            Key::Backspace,
            Key::Delete,
            Key::Up,
            Key::Down,
            Key::Left,
            Key::Right,
            Key::Home,
            Key::End,
            Key::Interrupt,
        ];
        let mut buffer = StdinBuffer::new();
        for key in keys {
            assert_eq!(buffer.process(&key.to_bytes()), vec![key]);
        }
    }
}
