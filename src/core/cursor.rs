//! Cursor control sequences.
//!
//! Stateless emitters: every call writes its escape sequence to the wrapped writer and
//! forgets about it. Write failures are ignored here; the canvas flush that eventually moves
//! these bytes to the terminal reports I/O errors.

use std::io::Write;

pub const HIDE_CURSOR: &str = "\x1b[?25l";
pub const SHOW_CURSOR: &str = "\x1b[?25h";
pub const CLEAR_LINE: &str = "\x1b[2K\r";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorCmd {
    Up(usize),
    Down(usize),
    Left(usize),
    Right(usize),
    StartOfLine,
    ClearLine,
    Hide,
    Show,
}

impl CursorCmd {
    /// Appends the escape sequence for this command to `out`.
    ///
    /// Zero-length moves emit nothing: most terminals read `ESC[0A` as a move of one.
    pub fn push_to(self, out: &mut String) {
        match self {
            Self::Up(n) => push_move(out, n, 'A'),
            Self::Down(n) => push_move(out, n, 'B'),
            Self::Right(n) => push_move(out, n, 'C'),
            Self::Left(n) => push_move(out, n, 'D'),
            Self::StartOfLine => out.push('\r'),
            Self::ClearLine => out.push_str(CLEAR_LINE),
            Self::Hide => out.push_str(HIDE_CURSOR),
            Self::Show => out.push_str(SHOW_CURSOR),
        }
    }

    pub fn to_ansi(self) -> String {
        let mut out = String::new();
        self.push_to(&mut out);
        out
    }
}

fn push_move(out: &mut String, n: usize, code: char) {
    if n == 0 {
        return;
    }
    out.push_str("\x1b[");
    out.push_str(&n.to_string());
    out.push(code);
}

/// Writes cursor commands straight to a byte sink.
#[derive(Debug)]
pub struct Cursor<W: Write> {
    writer: W,
}

impl<W: Write> Cursor<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn emit(&mut self, cmd: CursorCmd) {
        let seq = cmd.to_ansi();
        if !seq.is_empty() {
            let _ = self.writer.write_all(seq.as_bytes());
        }
    }
}
