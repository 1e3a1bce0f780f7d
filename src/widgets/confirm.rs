//! Yes/no prompt.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::core::input::Key;
use crate::core::terminal::InputSource;
use crate::error::{Result, UxError};
use crate::render::{visual, Canvas, CursorPosition, Printer, Visual};
use crate::runtime::{CancelToken, InputConfig, KeyPressEventArgs};
use crate::widgets::{
    render_help, render_question, CanvasOptions, CanvasSlot, Interaction, Phase, PromptIo,
};

pub const DEFAULT_HINT: &str = "[Type ? for hint]";

pub struct ConfirmOptions {
    pub message: String,
    /// Answer used when Enter is pressed on an empty line. `None` requires an explicit answer.
    pub default_value: Option<bool>,
    pub help_message: String,
    /// Shown after the question while a help message exists. Default: [`DEFAULT_HINT`].
    pub hint: String,
    pub canvas: CanvasOptions,
    pub reader: Option<Box<dyn InputSource>>,
    pub timeout: Option<Duration>,
}

impl Default for ConfirmOptions {
    fn default() -> Self {
        Self {
            message: String::new(),
            default_value: None,
            help_message: String::new(),
            hint: DEFAULT_HINT.to_string(),
            canvas: CanvasOptions::default(),
            reader: None,
            timeout: None,
        }
    }
}

fn parse_answer(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

struct ConfirmState {
    options: ConfirmOptions,
    value: String,
    answer: Option<bool>,
    invalid: bool,
    show_help: bool,
    phase: Phase,
    cursor: Option<CursorPosition>,
}

impl ConfirmState {
    fn handle_key(&mut self, args: &KeyPressEventArgs) -> bool {
        if args.cancelled {
            self.phase = Phase::Cancelled;
            return false;
        }
        if args.timed_out {
            self.phase = Phase::TimedOut;
            return false;
        }

        self.show_help = args.hint;
        self.value = args.value.clone();
        self.invalid = false;

        if args.key == Some(Key::Enter) {
            let answer = if self.value.trim().is_empty() {
                self.options.default_value
            } else {
                parse_answer(&self.value)
            };
            match answer {
                Some(answer) => {
                    self.answer = Some(answer);
                    self.phase = Phase::Complete;
                    return false;
                }
                None => self.invalid = true,
            }
        }
        true
    }

    fn render(&mut self, printer: &Printer) -> Result<()> {
        let style = *printer.style();
        render_question(printer, &self.options.message);
        match self.phase {
            Phase::Cancelled => {
                printer.println(&style.error("(Cancelled)"));
                return Ok(());
            }
            Phase::TimedOut => {
                printer.println(&style.error("(Timed out)"));
                return Ok(());
            }
            Phase::Complete => {
                let text = if self.answer == Some(true) { "Yes" } else { "No" };
                printer.println(&style.highlight(text));
                return Ok(());
            }
            Phase::Pending | Phase::Interacting => {}
        }

        if !self.options.help_message.is_empty() && !self.options.hint.is_empty() {
            printer.print(&style.gray(&format!("{} ", self.options.hint)));
        }
        let cue = match self.options.default_value {
            Some(true) => "(Y/n)",
            Some(false) => "(y/N)",
            None => "(y/n)",
        };
        printer.print(&style.gray(&format!("{cue} ")));
        printer.print(&self.value);
        self.cursor = Some(printer.cursor_position());
        printer.println("");

        if self.invalid && !self.show_help {
            printer.println(&style.warning("  Enter a valid value"));
        }
        if self.show_help {
            render_help(printer, &self.options.help_message);
        }
        if let Some(position) = self.cursor {
            printer.set_cursor_position(position);
        }
        Ok(())
    }
}

/// Asks a yes/no question.
pub struct Confirm {
    state: Arc<Mutex<ConfirmState>>,
    slot: CanvasSlot,
    io: PromptIo,
}

impl Confirm {
    pub fn new(mut options: ConfirmOptions) -> Self {
        let slot = CanvasSlot::Owned(std::mem::take(&mut options.canvas));
        let io = PromptIo::new(options.reader.take(), options.timeout);
        let state = ConfirmState {
            options,
            value: String::new(),
            answer: None,
            invalid: false,
            show_help: false,
            phase: Phase::Pending,
            cursor: None,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            slot,
            io,
        }
    }

    pub fn with_canvas(mut self, canvas: &Canvas) -> Self {
        canvas.add_visual(self.visual());
        self.slot = CanvasSlot::Shared(canvas.clone());
        self
    }

    pub fn visual(&self) -> Box<dyn Visual> {
        confirm_visual(Arc::clone(&self.state))
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).phase
    }

    pub fn ask(&mut self, token: &CancelToken) -> Result<bool> {
        let state = Arc::clone(&self.state);
        let (canvas, owned) = self.slot.resolve(|| confirm_visual(Arc::clone(&state)));
        state.lock().unwrap_or_else(PoisonError::into_inner).phase = Phase::Interacting;

        Interaction {
            canvas: &canvas,
            owned,
            hide_cursor: false,
            clear_on_complete: false,
            config: InputConfig::default(),
        }
        .run(&mut self.io, token, |args| {
            state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .handle_key(args)
        })?;

        let answer = state.lock().unwrap_or_else(PoisonError::into_inner).answer;
        answer.ok_or_else(|| UxError::Render("confirm finished without an answer".to_string()))
    }
}

fn confirm_visual(state: Arc<Mutex<ConfirmState>>) -> Box<dyn Visual> {
    visual(move |printer: &Printer| {
        state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .render(printer)
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_answer, Confirm, ConfirmOptions};
    use crate::core::input::Key;
    use crate::core::output::SharedBuffer;
    use crate::error::UxError;
    use crate::platform::scripted::ScriptedSource;
    use crate::render::CanvasManager;
    use crate::runtime::CancelToken;
    use crate::widgets::{CanvasOptions, Phase};
    use assert_matches::assert_matches;
    use std::time::Duration;

    fn confirm(default_value: Option<bool>, source: ScriptedSource, buffer: &SharedBuffer) -> Confirm {
        Confirm::new(ConfirmOptions {
            message: "Are you sure?".into(),
            default_value,
            canvas: CanvasOptions::buffered(buffer, &CanvasManager::new(), 80),
            reader: Some(Box::new(source)),
            ..ConfirmOptions::default()
        })
    }

    #[test]
    fn answers_parse_case_insensitively() {
        assert_eq!(parse_answer("Y"), Some(true));
        assert_eq!(parse_answer(" yes "), Some(true));
        assert_eq!(parse_answer("NO"), Some(false));
        assert_eq!(parse_answer("maybe"), None);
    }

    #[test]
    fn enter_on_empty_line_uses_the_default() {
        let buffer = SharedBuffer::new();
        let mut prompt = confirm(Some(true), ScriptedSource::from_keys([Key::Enter]), &buffer);
        assert!(prompt.ask(&CancelToken::new()).expect("ask"));
        assert!(buffer.contents().ends_with("? Are you sure?: Yes\n"));
    }

    #[test]
    fn invalid_answer_warns_then_accepts_a_correction() {
        let buffer = SharedBuffer::new();
        let keys = [
            Key::Char('x'),
            Key::Enter,
            Key::Backspace,
            Key::Char('n'),
            Key::Enter,
        ];
        let mut prompt = confirm(None, ScriptedSource::from_keys(keys), &buffer);
        assert!(!prompt.ask(&CancelToken::new()).expect("ask"));
        let output = buffer.contents();
        assert!(output.contains("  Enter a valid value"));
        assert!(output.ends_with("? Are you sure?: No\n"));
    }

    #[test]
    fn no_default_and_empty_enter_keeps_asking() {
        let buffer = SharedBuffer::new();
        let mut prompt = confirm(
            None,
            ScriptedSource::from_keys([Key::Enter, Key::Interrupt]),
            &buffer,
        );
        assert_matches!(prompt.ask(&CancelToken::new()), Err(UxError::Cancelled));
        assert_eq!(prompt.phase(), Phase::Cancelled);
        assert!(buffer.contents().ends_with("? Are you sure?: (Cancelled)\n"));
    }

    #[test]
    fn configured_timeout_renders_a_final_frame() {
        let buffer = SharedBuffer::new();
        let mut prompt = Confirm::new(ConfirmOptions {
            message: "Are you sure?".into(),
            canvas: CanvasOptions::buffered(&buffer, &CanvasManager::new(), 80),
            reader: Some(Box::new(ScriptedSource::new(Vec::<Vec<u8>>::new()).then_idle())),
            timeout: Some(Duration::from_millis(60)),
            ..ConfirmOptions::default()
        });
        assert_matches!(
            prompt.ask(&CancelToken::new()),
            Err(UxError::Timeout(d)) if d == Duration::from_millis(60)
        );
        assert!(buffer.contents().ends_with("? Are you sure?: (Timed out)\n"));
    }
}
