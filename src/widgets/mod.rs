//! Interactive and animated widgets built on [`Canvas`].
//!
//! Prompts follow one state machine: `Pending` until asked, `Interacting` while keys arrive,
//! then `Complete`, `Cancelled` or `TimedOut`. While interacting a prompt holds canvas focus,
//! so spinners and other passive canvases stay quiet until it finishes.

pub mod choices;
pub mod confirm;
pub mod multi_select;
pub mod prompt;
pub mod select;
pub mod spinner;
pub mod task_list;

use std::io::Write;
use std::time::Duration;

use crate::config::EnvConfig;
use crate::core::output::SharedBuffer;
use crate::core::style::Style;
use crate::core::terminal::InputSource;
use crate::error::Result;
use crate::render::{Canvas, CanvasManager, Printer, Visual, WidthSource};
use crate::runtime::{with_prompt_timeout, CancelToken, Input, InputConfig, KeyPressEventArgs};

pub use choices::SelectChoice;
pub use confirm::{Confirm, ConfirmOptions};
pub use multi_select::{MultiSelect, MultiSelectChoice, MultiSelectOptions};
pub use prompt::{Prompt, PromptOptions, Validator};
pub use select::{Select, SelectOptions};
pub use spinner::{Spinner, SpinnerOptions, DEFAULT_SPINNER_FRAMES};
pub use task_list::{
    Progress, TaskError, TaskFailure, TaskList, TaskListError, TaskListOptions, TaskOptions,
    TaskState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Pending,
    Interacting,
    Complete,
    Cancelled,
    TimedOut,
}

impl Phase {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled | Self::TimedOut)
    }
}

/// Where a widget draws when it creates its own canvas.
#[derive(Default)]
pub struct CanvasOptions {
    /// Output target. Default: stdout.
    pub writer: Option<Box<dyn Write + Send>>,
    /// Focus registry. Default: [`CanvasManager::global`].
    pub manager: Option<CanvasManager>,
    /// Default: the terminal width.
    pub width: WidthSource,
    /// Default: detected from `FORCE_COLOR` and whether stdout is a terminal.
    pub style: Option<Style>,
}

impl CanvasOptions {
    /// Plain, fixed-width output into `buffer`, arbitrated by `manager`.
    pub fn buffered(buffer: &SharedBuffer, manager: &CanvasManager, width: usize) -> Self {
        Self {
            writer: Some(Box::new(buffer.clone())),
            manager: Some(manager.clone()),
            width: WidthSource::Fixed(width),
            style: Some(Style::plain()),
        }
    }

    pub(crate) fn into_canvas(self, visual: Box<dyn Visual>) -> Canvas {
        let manager = self.manager.unwrap_or_else(CanvasManager::global);
        let mut canvas = Canvas::new(&manager, vec![visual]).with_width(self.width);
        if let Some(writer) = self.writer {
            canvas = canvas.with_writer(writer);
        }
        if let Some(style) = self.style {
            canvas = canvas.with_style(style);
        }
        canvas
    }
}

/// Canvas a widget draws on: created by the widget, or shared with other visuals.
pub(crate) enum CanvasSlot {
    Owned(CanvasOptions),
    Shared(Canvas),
}

impl CanvasSlot {
    /// Resolves the canvas and whether the widget owns it (and so closes it when done).
    pub(crate) fn resolve(&mut self, visual: impl FnOnce() -> Box<dyn Visual>) -> (Canvas, bool) {
        match std::mem::replace(self, Self::Owned(CanvasOptions::default())) {
            Self::Owned(options) => {
                let canvas = options.into_canvas(visual());
                *self = Self::Shared(canvas.clone());
                (canvas, true)
            }
            Self::Shared(canvas) => {
                *self = Self::Shared(canvas.clone());
                (canvas, false)
            }
        }
    }
}

/// Keyboard and timeout settings shared by the prompts.
#[derive(Default)]
pub(crate) struct PromptIo {
    pub(crate) reader: Option<Box<dyn InputSource>>,
    pub(crate) timeout: Option<Duration>,
}

impl PromptIo {
    pub(crate) fn new(reader: Option<Box<dyn InputSource>>, timeout: Option<Duration>) -> Self {
        Self { reader, timeout }
    }

    fn input(&mut self) -> Input {
        match self.reader.take() {
            Some(reader) => Input::new(reader),
            None => Input::stdin(),
        }
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout.or_else(|| EnvConfig::from_env().prompt_timeout)
    }
}

/// How a prompt drives its canvas while interacting.
pub(crate) struct Interaction<'a> {
    pub(crate) canvas: &'a Canvas,
    pub(crate) owned: bool,
    pub(crate) hide_cursor: bool,
    pub(crate) clear_on_complete: bool,
    pub(crate) config: InputConfig,
}

impl Interaction<'_> {
    /// Focuses the canvas, feeds keys to `on_key` and repaints after each one.
    ///
    /// `on_key` returns whether to keep reading. Focus is released and an owned canvas closed
    /// on every exit path.
    pub(crate) fn run<F>(self, io: &mut PromptIo, token: &CancelToken, mut on_key: F) -> Result<()>
    where
        F: FnMut(&KeyPressEventArgs) -> bool,
    {
        let canvas = self.canvas;
        let focus = canvas.manager().focus(canvas);
        let mut input = io.input();
        let timeout = io.timeout();

        let result = (|| -> Result<()> {
            if self.hide_cursor {
                canvas.hide_cursor()?;
            }
            canvas.run()?;
            with_prompt_timeout(token, timeout, |token| {
                input.read_input(token, &self.config, |args| {
                    let keep_reading = on_key(args);
                    if let Err(err) = canvas.update() {
                        tracing::warn!(error = %err, "failed to update prompt canvas");
                    }
                    Ok(keep_reading)
                })
            })?;
            if self.clear_on_complete {
                canvas.clear()?;
            }
            Ok(())
        })();

        if self.hide_cursor {
            if let Err(err) = canvas.show_cursor() {
                tracing::warn!(error = %err, "failed to restore cursor");
            }
        }
        io.reader = input.into_source();
        focus.release();
        if self.owned {
            canvas.close();
        }
        result
    }
}

/// Renders the hint block shown while `?` is toggled on.
pub(crate) fn render_help(printer: &Printer, help_message: &str) {
    if help_message.is_empty() {
        return;
    }
    let style = printer.style();
    printer.println("");
    printer.fprintln(format_args!(
        "{} {}",
        style.hint(&style.bold("  Hint:")),
        style.hint(help_message)
    ));
}

/// Separator and key help under list prompts.
pub(crate) fn render_footer(printer: &Printer, lines: &[&str]) {
    let style = printer.style();
    let rule_width = lines.iter().map(|line| line.chars().count()).max().unwrap_or(0);
    printer.println("");
    printer.println(&style.gray(&"─".repeat(rule_width)));
    for line in lines {
        printer.println(&style.gray(line));
    }
}

/// `? Message: ` lead-in shared by every prompt.
pub(crate) fn render_question(printer: &Printer, message: &str) {
    let style = printer.style();
    printer.print(&style.highlight("? "));
    printer.print(&style.bold(&format!("{message}: ")));
}
