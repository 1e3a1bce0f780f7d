//! Normalized key events.

/// A single decoded keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Printable character, including space.
    Char(char),
    Enter,
    Backspace,
    Delete,
    Tab,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    /// Ctrl-C or Ctrl-X. Handled like SIGINT by the input loop.
    Interrupt,
}

impl Key {
    /// Bytes a legacy (non-kitty) terminal sends for this key.
    pub fn to_bytes(self) -> Vec<u8> {
        match self {
            Self::Char(ch) => {
                let mut buf = [0u8; 4];
                ch.encode_utf8(&mut buf).as_bytes().to_vec()
            }
            Self::Enter => b"\r".to_vec(),
            Self::Backspace => b"\x7f".to_vec(),
            Self::Delete => b"\x1b[3~".to_vec(),
            Self::Tab => b"\t".to_vec(),
            Self::Escape => b"\x1b".to_vec(),
            Self::Up => b"\x1b[A".to_vec(),
            Self::Down => b"\x1b[B".to_vec(),
            Self::Right => b"\x1b[C".to_vec(),
            Self::Left => b"\x1b[D".to_vec(),
            Self::Home => b"\x1b[H".to_vec(),
            Self::End => b"\x1b[F".to_vec(),
            Self::Interrupt => b"\x03".to_vec(),
        }
    }

    pub fn is_printable(self) -> bool {
        matches!(self, Self::Char(_))
    }
}
