//! Animated progress line.
//!
//! A spinner never takes focus: while a prompt is interacting its ticks are dropped by the
//! canvas manager, and it resumes on the first tick after the prompt finishes.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::error::{Result, UxError};
use crate::render::{visual, Canvas, Printer, Visual};
use crate::runtime::Ticker;
use crate::widgets::{CanvasOptions, CanvasSlot};

pub const DEFAULT_SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
pub const DEFAULT_SPINNER_INTERVAL: Duration = Duration::from_millis(80);

pub struct SpinnerOptions {
    pub text: String,
    /// Default: [`DEFAULT_SPINNER_FRAMES`].
    pub frames: Vec<String>,
    /// Default: [`DEFAULT_SPINNER_INTERVAL`].
    pub interval: Duration,
    /// Erase the line on stop. Default: true.
    pub clear_on_stop: bool,
    pub canvas: CanvasOptions,
}

impl Default for SpinnerOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            frames: DEFAULT_SPINNER_FRAMES.iter().map(|frame| frame.to_string()).collect(),
            interval: DEFAULT_SPINNER_INTERVAL,
            clear_on_stop: true,
            canvas: CanvasOptions::default(),
        }
    }
}

struct SpinnerState {
    text: String,
    frames: Vec<String>,
    frame: usize,
}

impl SpinnerState {
    fn advance(&mut self) {
        if !self.frames.is_empty() {
            self.frame = (self.frame + 1) % self.frames.len();
        }
    }

    fn render(&self, printer: &Printer) -> Result<()> {
        let style = printer.style();
        let frame = self.frames.get(self.frame).map(String::as_str).unwrap_or_default();
        printer.fprintf(format_args!("{} {}", style.highlight(frame), self.text));
        Ok(())
    }
}

pub struct Spinner {
    state: Arc<Mutex<SpinnerState>>,
    slot: CanvasSlot,
    interval: Duration,
    clear_on_stop: bool,
    /// Resolved on first start; the flag says whether the spinner owns it.
    canvas: Option<(Canvas, bool)>,
    ticker: Option<Ticker>,
}

impl Spinner {
    pub fn new(options: SpinnerOptions) -> Self {
        let state = SpinnerState {
            text: options.text,
            frames: options.frames,
            frame: 0,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            slot: CanvasSlot::Owned(options.canvas),
            interval: options.interval,
            clear_on_stop: options.clear_on_stop,
            canvas: None,
            ticker: None,
        }
    }

    pub fn with_canvas(mut self, canvas: &Canvas) -> Self {
        canvas.add_visual(self.visual());
        self.slot = CanvasSlot::Shared(canvas.clone());
        self
    }

    pub fn visual(&self) -> Box<dyn Visual> {
        spinner_visual(Arc::clone(&self.state))
    }

    pub fn is_running(&self) -> bool {
        self.ticker.as_ref().is_some_and(Ticker::is_running)
    }

    /// Draws the first frame and starts animating. Starting twice does nothing.
    pub fn start(&mut self) -> Result<()> {
        if self.ticker.is_some() {
            return Ok(());
        }
        let state = Arc::clone(&self.state);
        let slot = &mut self.slot;
        let (canvas, _) = self
            .canvas
            .get_or_insert_with(|| slot.resolve(|| spinner_visual(Arc::clone(&state))));
        let canvas = canvas.clone();
        canvas.run()?;

        let ticking = canvas.clone();
        let ticker = Ticker::spawn("canvas-spinner", self.interval, move || {
            state.lock().unwrap_or_else(PoisonError::into_inner).advance();
            if let Err(err) = ticking.update() {
                tracing::warn!(error = %err, "failed to update spinner");
            }
            true
        })
        .map_err(UxError::Io)?;
        self.ticker = Some(ticker);
        Ok(())
    }

    /// Replaces the text; the next tick shows it.
    pub fn update_text(&self, text: impl Into<String>) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).text = text.into();
    }

    /// Stops animating, then erases the line or leaves the last frame in place.
    pub fn stop(&mut self) -> Result<()> {
        let Some(mut ticker) = self.ticker.take() else {
            return Ok(());
        };
        ticker.stop();
        let Some((canvas, _)) = &self.canvas else {
            return Ok(());
        };
        if self.clear_on_stop {
            canvas.clear()
        } else {
            canvas.update()
        }
    }

    /// Spins while `action` runs, then stops.
    pub fn run<T, F>(&mut self, action: F) -> Result<T>
    where
        F: FnOnce(&Spinner) -> Result<T>,
    {
        self.start()?;
        let outcome = action(self);
        let stopped = self.stop();
        let value = outcome?;
        stopped?;
        Ok(value)
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::warn!(error = %err, "failed to stop spinner");
        }
        if let Some((canvas, true)) = &self.canvas {
            canvas.close();
        }
    }
}

fn spinner_visual(state: Arc<Mutex<SpinnerState>>) -> Box<dyn Visual> {
    visual(move |printer: &Printer| {
        state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .render(printer)
    })
}

#[cfg(test)]
mod tests {
    use super::{Spinner, SpinnerOptions};
    use crate::core::output::SharedBuffer;
    use crate::error::UxError;
    use crate::render::CanvasManager;
    use crate::widgets::CanvasOptions;
    use assert_matches::assert_matches;
    use std::thread;
    use std::time::Duration;

    fn spinner(
        buffer: &SharedBuffer,
        manager: &CanvasManager,
        interval: Duration,
        clear_on_stop: bool,
    ) -> Spinner {
        Spinner::new(SpinnerOptions {
            text: "Loading".into(),
            frames: vec!["-".into(), "\\".into(), "|".into(), "/".into()],
            interval,
            clear_on_stop,
            canvas: CanvasOptions::buffered(buffer, manager, 80),
        })
    }

    #[test]
    fn ticks_cycle_through_frames() {
        let buffer = SharedBuffer::new();
        let manager = CanvasManager::new();
        let mut spinner = spinner(&buffer, &manager, Duration::from_millis(10), false);
        spinner.start().expect("start");
        thread::sleep(Duration::from_millis(80));
        spinner.update_text("Still loading");
        thread::sleep(Duration::from_millis(40));
        spinner.stop().expect("stop");

        let output = buffer.contents();
        assert!(output.starts_with("\x1b[2K\r- Loading"));
        assert!(output.contains("\\ Loading"));
        assert!(output.contains("Still loading"));
        assert!(!spinner.is_running());
        assert_eq!(manager.len(), 1);
        drop(spinner);
        assert!(manager.is_empty());
    }

    #[test]
    fn clear_on_stop_erases_the_line() {
        let buffer = SharedBuffer::new();
        let manager = CanvasManager::new();
        let mut spinner = spinner(&buffer, &manager, Duration::from_secs(60), true);
        spinner.start().expect("start");
        spinner.stop().expect("stop");
        assert_eq!(buffer.contents(), "\x1b[2K\r- Loading\x1b[2K\r");
    }

    #[test]
    fn run_returns_the_action_result_after_stopping() {
        let buffer = SharedBuffer::new();
        let manager = CanvasManager::new();
        let mut spinner = spinner(&buffer, &manager, Duration::from_millis(10), true);
        let value = spinner
            .run(|spinner| {
                assert!(spinner.is_running());
                spinner.update_text("Deploying");
                Ok(42)
            })
            .expect("run");
        assert_eq!(value, 42);
        assert!(!spinner.is_running());

        let failed: crate::error::Result<()> =
            spinner.run(|_| Err(UxError::Render("boom".into())));
        assert_matches!(failed, Err(UxError::Render(_)));
        assert!(!spinner.is_running());
        assert!(buffer.contents().contains("- Loading"));
    }
}
