//! A repaintable region of terminal output.
//!
//! Every repaint erases the previous frame through the printer, re-runs the visuals in
//! registration order and hands the new frame to [`write_chunked`]. When the terminal width
//! is unknown (stdout is not a tty) the canvas degrades to an append-only line log.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::core::cursor::{HIDE_CURSOR, SHOW_CURSOR};
use crate::core::output::write_chunked;
use crate::core::style::Style;
use crate::core::text::ansi::strip_ansi;
use crate::error::Result;
use crate::render::manager::CanvasManager;
use crate::render::printer::Printer;

pub(crate) type CanvasId = u64;

/// Render callback bound to one canvas.
pub trait Visual: Send {
    fn render(&mut self, printer: &Printer) -> Result<()>;
}

impl<F> Visual for F
where
    F: FnMut(&Printer) -> Result<()> + Send,
{
    fn render(&mut self, printer: &Printer) -> Result<()> {
        self(printer)
    }
}

/// Boxes a render closure.
pub fn visual<F>(render: F) -> Box<dyn Visual>
where
    F: FnMut(&Printer) -> Result<()> + Send + 'static,
{
    Box::new(render)
}

/// Where a canvas's printer learns the terminal width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidthSource {
    /// Width of the terminal on stdout, refreshed on resize. 0 when stdout is not a tty.
    #[default]
    Terminal,
    /// A width of 0 stands for "unknown" and turns the canvas into a plain line log.
    Fixed(usize),
}

struct CanvasState {
    visuals: Vec<Box<dyn Visual>>,
    printer: Option<Printer>,
    buffer: Vec<u8>,
    /// Plain-text rows already written while the width is unknown.
    logged: Vec<String>,
    writer: Box<dyn Write + Send>,
    width: WidthSource,
    style: Option<Style>,
    closed: bool,
}

impl CanvasState {
    fn printer(&mut self) -> Printer {
        if let Some(printer) = self.printer.as_ref() {
            return printer.clone();
        }
        let style = self.style.unwrap_or_default();
        let printer = match self.width {
            WidthSource::Terminal => Printer::for_terminal(style),
            WidthSource::Fixed(width) => Printer::new(width, style),
        };
        self.printer = Some(printer.clone());
        printer
    }

    fn repaint(&mut self) -> Result<()> {
        let printer = self.printer();
        printer.clear_canvas();
        let mut outcome = Ok(());
        for visual in self.visuals.iter_mut() {
            if let Err(err) = visual.render(&printer) {
                outcome = Err(err);
                break;
            }
        }
        // Flush even a partial frame so the tracked size matches the screen.
        self.flush(&printer)?;
        outcome
    }

    fn erase(&mut self) -> io::Result<()> {
        let Some(printer) = self.printer.clone() else {
            return Ok(());
        };
        printer.clear_canvas();
        self.flush(&printer)
    }

    fn flush(&mut self, printer: &Printer) -> io::Result<()> {
        printer.swap_frame(&mut self.buffer);
        if printer.width() == 0 {
            return self.flush_lines();
        }
        if self.buffer.is_empty() {
            return Ok(());
        }
        write_chunked(&mut self.writer, &self.buffer)?;
        self.buffer.clear();
        Ok(())
    }

    /// Line-log flush for output without a known width.
    ///
    /// Nothing is erased or redrawn: a frame row is written, with a newline, only when its
    /// text differs from what was last logged for that row. Blank rows are skipped.
    fn flush_lines(&mut self) -> io::Result<()> {
        let frame = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();

        let mut out = String::new();
        for (row, line) in frame.split('\n').enumerate() {
            let text = strip_ansi(line);
            if text.trim().is_empty() || self.logged.get(row) == Some(&text) {
                continue;
            }
            if self.logged.len() <= row {
                self.logged.resize(row + 1, String::new());
            }
            self.logged[row] = text;
            out.push_str(line);
            out.push('\n');
        }
        if out.is_empty() {
            return Ok(());
        }
        write_chunked(&mut self.writer, out.as_bytes())
    }

    fn is_plain(&mut self) -> bool {
        self.printer().width() == 0
    }
}

struct CanvasInner {
    id: CanvasId,
    manager: CanvasManager,
    state: Mutex<CanvasState>,
}

/// Shared handle to a canvas. Clones drive the same region.
#[derive(Clone)]
pub struct Canvas {
    inner: Arc<CanvasInner>,
}

/// Registry entry that does not keep a canvas alive.
#[derive(Clone)]
pub(crate) struct WeakCanvas(Weak<CanvasInner>);

impl WeakCanvas {
    pub(crate) fn upgrade(&self) -> Option<Canvas> {
        self.0.upgrade().map(|inner| Canvas { inner })
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl Canvas {
    /// Creates a canvas drawing `visuals` to stdout and registers it with `manager`.
    pub fn new(manager: &CanvasManager, visuals: Vec<Box<dyn Visual>>) -> Self {
        let canvas = Self {
            inner: Arc::new(CanvasInner {
                id: manager.next_id(),
                manager: manager.clone(),
                state: Mutex::new(CanvasState {
                    visuals,
                    printer: None,
                    buffer: Vec::new(),
                    logged: Vec::new(),
                    writer: Box::new(io::stdout()),
                    width: WidthSource::Terminal,
                    style: None,
                    closed: false,
                }),
            }),
        };
        manager.add(&canvas);
        canvas
    }

    /// Redirects output, e.g. to a [`crate::core::output::SharedBuffer`] in tests.
    pub fn with_writer<W: Write + Send + 'static>(self, writer: W) -> Self {
        self.lock().writer = Box::new(writer);
        self
    }

    /// Chooses the width source. Takes effect when the printer is first created.
    pub fn with_width(self, width: WidthSource) -> Self {
        self.lock().width = width;
        self
    }

    pub fn with_style(self, style: Style) -> Self {
        self.lock().style = Some(style);
        self
    }

    pub fn add_visual(&self, visual: Box<dyn Visual>) {
        self.lock().visuals.push(visual);
    }

    pub(crate) fn id(&self) -> CanvasId {
        self.inner.id
    }

    pub(crate) fn downgrade(&self) -> WeakCanvas {
        WeakCanvas(Arc::downgrade(&self.inner))
    }

    pub fn manager(&self) -> &CanvasManager {
        &self.inner.manager
    }

    /// Printer backing this canvas, created on first use.
    pub fn printer(&self) -> Printer {
        self.lock().printer()
    }

    /// Draws the first frame.
    pub fn run(&self) -> Result<()> {
        self.lock().printer();
        self.update()
    }

    /// Erases the previous frame and draws a new one.
    ///
    /// Returns `Ok(())` without writing while another canvas holds focus, or once closed.
    pub fn update(&self) -> Result<()> {
        let manager = self.manager();
        let _update = manager.lock();
        if !manager.can_update(self) {
            return Ok(());
        }
        let mut state = self.lock();
        if state.closed {
            return Ok(());
        }
        state.repaint()
    }

    /// Erases the previous frame without drawing a new one.
    pub fn clear(&self) -> Result<()> {
        let manager = self.manager();
        let _update = manager.lock();
        if !manager.can_update(self) {
            return Ok(());
        }
        Ok(self.clear_unchecked()?)
    }

    /// Erase path used by the manager while it already holds the update lock.
    pub(crate) fn clear_unchecked(&self) -> io::Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Ok(());
        }
        state.erase()
    }

    pub fn hide_cursor(&self) -> Result<()> {
        self.write_raw(HIDE_CURSOR)
    }

    pub fn show_cursor(&self) -> Result<()> {
        self.write_raw(SHOW_CURSOR)
    }

    /// Deregisters the canvas. Later updates and clears do nothing.
    pub fn close(&self) {
        self.inner.manager.remove(self);
        self.lock().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn write_raw(&self, seq: &str) -> Result<()> {
        let mut state = self.lock();
        if state.closed || state.is_plain() {
            return Ok(());
        }
        write_chunked(&mut state.writer, seq.as_bytes())?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, CanvasState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas").field("id", &self.inner.id).finish()
    }
}
