//! Free-text prompt with optional masking and validation.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::core::input::Key;
use crate::core::terminal::InputSource;
use crate::error::Result;
use crate::render::{visual, Canvas, CursorPosition, Printer, Visual};
use crate::runtime::{CancelToken, InputConfig, KeyPressEventArgs};
use crate::widgets::confirm::DEFAULT_HINT;
use crate::widgets::{
    render_help, render_question, CanvasOptions, CanvasSlot, Interaction, Phase, PromptIo,
};

/// Checks a submitted value; `Err` carries the message shown under the input.
pub type Validator = Box<dyn Fn(&str) -> std::result::Result<(), String> + Send>;

const REQUIRED_MESSAGE: &str = "This field is required";

pub struct PromptOptions {
    pub message: String,
    /// Pre-filled, editable value.
    pub default_value: String,
    /// Gray text shown while the value is empty.
    pub placeholder: String,
    pub required: bool,
    /// Echo `*` for every typed character.
    pub secret: bool,
    pub validation: Option<Validator>,
    pub help_message: String,
    /// Default: [`DEFAULT_HINT`].
    pub hint: String,
    /// Erase the prompt once answered instead of leaving `? message: value` behind.
    pub clear_on_completion: bool,
    /// Treat `?` as text.
    pub ignore_hint_keys: bool,
    pub canvas: CanvasOptions,
    pub reader: Option<Box<dyn InputSource>>,
    pub timeout: Option<Duration>,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            message: String::new(),
            default_value: String::new(),
            placeholder: String::new(),
            required: false,
            secret: false,
            validation: None,
            help_message: String::new(),
            hint: DEFAULT_HINT.to_string(),
            clear_on_completion: false,
            ignore_hint_keys: false,
            canvas: CanvasOptions::default(),
            reader: None,
            timeout: None,
        }
    }
}

struct PromptState {
    options: PromptOptions,
    value: String,
    error: Option<String>,
    show_help: bool,
    phase: Phase,
    cursor: Option<CursorPosition>,
}

impl PromptState {
    fn display_value(&self) -> String {
        if self.options.secret {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    fn validate(&self) -> Option<String> {
        if self.options.required && self.value.trim().is_empty() {
            return Some(REQUIRED_MESSAGE.to_string());
        }
        match &self.options.validation {
            Some(validate) => validate(&self.value).err(),
            None => None,
        }
    }

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
        self.error = None;

        if args.key == Some(Key::Enter) {
            self.error = self.validate();
            if self.error.is_none() {
                self.phase = Phase::Complete;
                return false;
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
                printer.println(&style.highlight(&self.display_value()));
                return Ok(());
            }
            Phase::Pending | Phase::Interacting => {}
        }

        if !self.options.help_message.is_empty() && !self.options.hint.is_empty() {
            printer.print(&style.gray(&format!("{} ", self.options.hint)));
        }
        if self.value.is_empty() && !self.options.placeholder.is_empty() {
            self.cursor = Some(printer.cursor_position());
            printer.print(&style.gray(&self.options.placeholder));
        } else {
            printer.print(&self.display_value());
            self.cursor = Some(printer.cursor_position());
        }
        printer.println("");

        if !self.show_help {
            if let Some(error) = &self.error {
                printer.println(&style.warning(&format!("  {error}")));
            }
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

/// Asks for a line of text.
pub struct Prompt {
    state: Arc<Mutex<PromptState>>,
    slot: CanvasSlot,
    io: PromptIo,
}

impl Prompt {
    pub fn new(mut options: PromptOptions) -> Self {
        let slot = CanvasSlot::Owned(std::mem::take(&mut options.canvas));
        let io = PromptIo::new(options.reader.take(), options.timeout);
        let state = PromptState {
            value: options.default_value.clone(),
            options,
            error: None,
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
        prompt_visual(Arc::clone(&self.state))
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).phase
    }

    /// Runs the prompt and returns the submitted text.
    pub fn ask(&mut self, token: &CancelToken) -> Result<String> {
        let state = Arc::clone(&self.state);
        let (canvas, owned) = self.slot.resolve(|| prompt_visual(Arc::clone(&state)));
        let (config, clear_on_complete) = {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            state.phase = Phase::Interacting;
            let config = InputConfig {
                initial_value: state.options.default_value.clone(),
                ignore_hint_keys: state.options.ignore_hint_keys,
            };
            (config, state.options.clear_on_completion)
        };

        Interaction {
            canvas: &canvas,
            owned,
            hide_cursor: false,
            clear_on_complete,
            config,
        }
        .run(&mut self.io, token, |args| {
            state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .handle_key(args)
        })?;

        let value = state.lock().unwrap_or_else(PoisonError::into_inner).value.clone();
        Ok(value)
    }
}

fn prompt_visual(state: Arc<Mutex<PromptState>>) -> Box<dyn Visual> {
    visual(move |printer: &Printer| {
        state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .render(printer)
    })
}

#[cfg(test)]
mod tests {
    use super::{Prompt, PromptOptions};
    use crate::core::input::Key;
    use crate::core::output::SharedBuffer;
    use crate::platform::scripted::ScriptedSource;
    use crate::render::CanvasManager;
    use crate::runtime::CancelToken;
    use pretty_assertions::assert_eq;

    fn typed(text: &str) -> Vec<Key> {
        let mut keys: Vec<Key> = text.chars().map(Key::Char).collect();
        keys.push(Key::Enter);
        keys
    }

    fn prompt(options: PromptOptions, keys: Vec<Key>, buffer: &SharedBuffer) -> Prompt {
        Prompt::new(PromptOptions {
            message: "Environment name".into(),
            canvas: crate::widgets::CanvasOptions::buffered(buffer, &CanvasManager::new(), 80),
            reader: Some(Box::new(ScriptedSource::from_keys(keys))),
            ..options
        })
    }

    #[test]
    fn returns_typed_text() {
        let buffer = SharedBuffer::new();
        let mut ask = prompt(PromptOptions::default(), typed("dev"), &buffer);
        assert_eq!(ask.ask(&CancelToken::new()).expect("ask"), "dev");
        assert!(buffer.contents().ends_with("? Environment name: dev\n"));
    }

    #[test]
    fn default_value_is_editable() {
        let buffer = SharedBuffer::new();
        let mut keys = vec![Key::Backspace];
        keys.extend(typed("2"));
        let mut ask = prompt(
            PromptOptions {
                default_value: "dev1".into(),
                ..PromptOptions::default()
            },
            keys,
            &buffer,
        );
        assert_eq!(ask.ask(&CancelToken::new()).expect("ask"), "dev2");
    }

    #[test]
    fn required_field_rejects_empty_submit() {
        let buffer = SharedBuffer::new();
        let mut keys = vec![Key::Enter];
        keys.extend(typed("prod"));
        let mut ask = prompt(
            PromptOptions {
                required: true,
                placeholder: "e.g. dev".into(),
                ..PromptOptions::default()
            },
            keys,
            &buffer,
        );
        assert_eq!(ask.ask(&CancelToken::new()).expect("ask"), "prod");
        let output = buffer.contents();
        assert!(output.contains("e.g. dev"));
        assert!(output.contains("  This field is required"));
    }

    #[test]
    fn validator_message_is_shown_until_fixed() {
        let buffer = SharedBuffer::new();
        let mut keys = typed("a b");
        keys.extend([Key::Backspace, Key::Backspace, Key::Enter]);
        let mut ask = prompt(
            PromptOptions {
                validation: Some(Box::new(|value: &str| {
                    if value.contains(' ') {
                        Err("Spaces are not allowed".to_string())
                    } else {
                        Ok(())
                    }
                })),
                ..PromptOptions::default()
            },
            keys,
            &buffer,
        );
        assert_eq!(ask.ask(&CancelToken::new()).expect("ask"), "a");
        assert!(buffer.contents().contains("  Spaces are not allowed"));
    }

    #[test]
    fn secret_values_are_masked() {
        let buffer = SharedBuffer::new();
        let mut ask = prompt(
            PromptOptions {
                secret: true,
                ..PromptOptions::default()
            },
            typed("hunter2"),
            &buffer,
        );
        assert_eq!(ask.ask(&CancelToken::new()).expect("ask"), "hunter2");
        let output = buffer.contents();
        assert!(!output.contains("hunter2"));
        assert!(output.ends_with("? Environment name: *******\n"));
    }

    #[test]
    fn clear_on_completion_erases_the_prompt() {
        let buffer = SharedBuffer::new();
        let mut ask = prompt(
            PromptOptions {
                clear_on_completion: true,
                ..PromptOptions::default()
            },
            typed("x"),
            &buffer,
        );
        ask.ask(&CancelToken::new()).expect("ask");
        assert!(buffer.contents().ends_with("\x1b[2K\r"));
    }
}
