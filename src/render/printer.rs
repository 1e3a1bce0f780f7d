//! Stateful text sink that tracks the screen area it has drawn.
//!
//! The printer never writes to the terminal itself. Text and cursor moves accumulate in a
//! frame buffer that the owning canvas flushes through [`crate::core::output::write_chunked`].
//! Alongside the bytes it keeps a model of what they occupy on screen: the bounding
//! [`CanvasSize`] and the row/column the physical cursor was left at. `\n` starts a new row
//! and a line longer than the terminal width spills into extra rows without one.

use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::cursor::{Cursor, CursorCmd};
use crate::core::style::Style;
use crate::core::text::width::{visible_length, wrap_rows};
use crate::platform::process_terminal::stdout_width;
use crate::platform::signals::SignalWatcher;

/// Bounding box, in terminal cells, of everything drawn since the last clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub rows: usize,
    pub cols: usize,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self { rows: 1, cols: 0 }
    }
}

/// Cursor location relative to the canvas origin (row 0, column 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPosition {
    pub row: usize,
    pub col: usize,
}

impl CursorPosition {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Default)]
struct PrinterState {
    frame: Vec<u8>,
    current_line: String,
    /// Wrap rows of `current_line` already added to `size.rows`.
    line_wraps: usize,
    size: CanvasSize,
    /// `None` means the cursor sits where the last write left it: the bottom-right corner.
    cursor: Option<CursorPosition>,
    width: usize,
}

impl PrinterState {
    fn bottom_right(&self) -> CursorPosition {
        CursorPosition::new(self.size.rows.saturating_sub(1), self.size.cols)
    }

    /// Cursor control is dropped at width 0, where the output is a plain log.
    fn emit(&mut self, cmds: &[CursorCmd]) {
        if self.width == 0 {
            return;
        }
        let mut cursor = Cursor::new(&mut self.frame);
        for &cmd in cmds {
            cursor.emit(cmd);
        }
    }

    fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.frame.extend_from_slice(text.as_bytes());

        let mut segments = text.split('\n');
        if let Some(first) = segments.next() {
            self.current_line.push_str(first);
        }
        for segment in segments {
            self.account_wraps();
            self.size.rows += 1;
            self.current_line.clear();
            self.current_line.push_str(segment);
            self.line_wraps = 0;
        }
        self.account_wraps();
        self.size.cols = visible_length(&self.current_line);
        self.cursor = None;
    }

    /// Adds the wrap rows the current line implies beyond those already counted.
    fn account_wraps(&mut self) {
        if self.width == 0 {
            return;
        }
        let wraps = wrap_rows(visible_length(&self.current_line), self.width);
        if wraps > self.line_wraps {
            self.size.rows += wraps - self.line_wraps;
            self.line_wraps = wraps;
        }
    }

    fn move_to(&mut self, target: CursorPosition) {
        let current = self.cursor.unwrap_or_else(|| self.bottom_right());
        if target == current {
            return;
        }
        let vertical = if target.row > current.row {
            CursorCmd::Down(target.row - current.row)
        } else {
            CursorCmd::Up(current.row - target.row)
        };
        self.emit(&[vertical, CursorCmd::StartOfLine, CursorCmd::Right(target.col)]);
        self.cursor = Some(target);
    }

    fn clear(&mut self) {
        let bottom = self.bottom_right();
        self.move_to(bottom);
        for row in (0..self.size.rows).rev() {
            self.emit(&[CursorCmd::ClearLine]);
            if row > 0 {
                self.emit(&[CursorCmd::Up(1)]);
            }
        }
        self.size = CanvasSize::default();
        self.current_line.clear();
        self.line_wraps = 0;
        self.cursor = None;
    }
}

/// Shared handle to one canvas's drawing state.
///
/// Clones refer to the same state; every operation takes the internal lock, so a resize
/// listener can change the width while a visual is printing.
#[derive(Clone)]
pub struct Printer {
    state: Arc<Mutex<PrinterState>>,
    style: Style,
    resize_watcher: Option<Arc<SignalWatcher>>,
}

impl Printer {
    /// Printer with a fixed width. A width of 0 means the width is unknown: wrap accounting is
    /// skipped and no cursor control is emitted.
    pub fn new(width: usize, style: Style) -> Self {
        Self {
            state: Arc::new(Mutex::new(PrinterState {
                width,
                ..PrinterState::default()
            })),
            style,
            resize_watcher: None,
        }
    }

    /// Printer sized to the terminal on stdout, re-measured on every SIGWINCH.
    pub fn for_terminal(style: Style) -> Self {
        let mut printer = Self::new(stdout_width(), style);
        let state = Arc::clone(&printer.state);
        match SignalWatcher::on_resize(move || {
            let width = stdout_width();
            lock_state(&state).width = width;
            tracing::debug!(width, "terminal resized");
        }) {
            Ok(watcher) => printer.resize_watcher = Some(Arc::new(watcher)),
            Err(err) => tracing::warn!(error = %err, "resize listener unavailable"),
        }
        printer
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn width(&self) -> usize {
        self.lock().width
    }

    pub fn set_width(&self, width: usize) {
        self.lock().width = width;
    }

    /// Appends formatted text, e.g. `printer.fprintf(format_args!("{n} items"))`.
    pub fn fprintf(&self, args: fmt::Arguments<'_>) {
        let mut text = String::new();
        let _ = text.write_fmt(args);
        self.print(&text);
    }

    /// Like [`Printer::fprintf`] followed by a newline.
    pub fn fprintln(&self, args: fmt::Arguments<'_>) {
        let mut text = String::new();
        let _ = text.write_fmt(args);
        text.push('\n');
        self.print(&text);
    }

    pub fn print(&self, text: &str) {
        self.lock().write(text);
    }

    pub fn println(&self, text: &str) {
        let mut state = self.lock();
        state.write(text);
        state.write("\n");
    }

    pub fn cursor_position(&self) -> CursorPosition {
        let state = self.lock();
        state.cursor.unwrap_or_else(|| state.bottom_right())
    }

    /// Moves the cursor relative to where it is now. No-op when already there.
    pub fn set_cursor_position(&self, position: CursorPosition) {
        self.lock().move_to(position);
    }

    pub fn size(&self) -> CanvasSize {
        self.lock().size
    }

    /// Erases every tracked row, bottom to top, leaving the cursor at the canvas origin.
    pub fn clear_canvas(&self) {
        self.lock().clear();
    }

    /// Emits a raw cursor command without touching the size model.
    pub fn emit(&self, cmd: CursorCmd) {
        self.lock().emit(&[cmd]);
    }

    /// Exchanges the pending frame with `buffer`, which is emptied first.
    pub(crate) fn swap_frame(&self, buffer: &mut Vec<u8>) {
        buffer.clear();
        std::mem::swap(buffer, &mut self.lock().frame);
    }

    fn lock(&self) -> MutexGuard<'_, PrinterState> {
        lock_state(&self.state)
    }
}

fn lock_state(state: &Mutex<PrinterState>) -> MutexGuard<'_, PrinterState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl fmt::Debug for Printer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Printer")
            .field("size", &state.size)
            .field("cursor", &state.cursor)
            .field("width", &state.width)
            .field("style", &self.style)
            .finish()
    }
}
