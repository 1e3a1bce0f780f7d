//! Single-choice list prompt.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::core::input::Key;
use crate::core::terminal::InputSource;
use crate::error::{Result, UxError};
use crate::render::{visual, Canvas, CursorPosition, Printer, Visual};
use crate::runtime::{CancelToken, InputConfig, KeyPressEventArgs};
use crate::widgets::choices::{ChoiceList, SelectChoice};
use crate::widgets::{
    render_footer, render_help, render_question, CanvasOptions, CanvasSlot, Interaction, Phase,
    PromptIo,
};

const FOOTER: &[&str] = &["Use arrows to move, type ? for hint"];

pub struct SelectOptions {
    pub message: String,
    pub choices: Vec<SelectChoice>,
    /// Initially highlighted choice. Default: `Some(0)`.
    pub selected_index: Option<usize>,
    /// Shown while hint mode is on.
    pub help_message: String,
    /// Rows visible at once. Default: 6.
    pub display_count: usize,
    /// Prefix rows with `1. `, `2. `; typing a number then filters by position.
    pub display_numbers: bool,
    /// Default: true.
    pub enable_filtering: bool,
    pub canvas: CanvasOptions,
    /// Keyboard source. Default: stdin.
    pub reader: Option<Box<dyn InputSource>>,
    /// Default: the `INLINE_CANVAS_PROMPT_TIMEOUT` setting.
    pub timeout: Option<Duration>,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            message: String::new(),
            choices: Vec::new(),
            selected_index: Some(0),
            help_message: String::new(),
            display_count: 6,
            display_numbers: false,
            enable_filtering: true,
            canvas: CanvasOptions::default(),
            reader: None,
            timeout: None,
        }
    }
}

struct SelectState {
    message: String,
    help_message: String,
    enable_filtering: bool,
    list: ChoiceList,
    /// Original index shown next to the question.
    selected: Option<usize>,
    show_help: bool,
    phase: Phase,
    cursor: Option<CursorPosition>,
}

impl SelectState {
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
        if self.enable_filtering {
            self.list.set_filter(&args.value);
        }
        match args.key {
            Some(Key::Up) => self.list.move_up(),
            Some(Key::Down) => self.list.move_down(),
            _ => {}
        }
        if let Some(current) = self.list.current() {
            self.selected = Some(current);
        }

        if args.key == Some(Key::Enter) && self.list.current().is_some() {
            self.phase = Phase::Complete;
            return false;
        }
        true
    }

    fn render(&mut self, printer: &Printer) -> Result<()> {
        let style = *printer.style();
        render_question(printer, &self.message);
        match self.phase {
            Phase::Cancelled => printer.print(&style.error("(Cancelled)")),
            Phase::TimedOut => printer.print(&style.error("(Timed out)")),
            _ => {
                if let Some(choice) = self.selected.and_then(|index| self.list.entries().get(index)) {
                    printer.print(&style.highlight(&choice.label));
                }
            }
        }
        printer.println("");
        if self.phase.is_finished() {
            return Ok(());
        }

        if self.enable_filtering {
            printer.println("");
            printer.print("  Filter: ");
            if self.list.filter().is_empty() {
                self.cursor = Some(printer.cursor_position());
                printer.print(&style.gray("Type to filter list"));
            } else {
                printer.print(self.list.filter());
                self.cursor = Some(printer.cursor_position());
            }
            printer.println("");
            printer.println("");
        }

        self.list.render(printer, "  ", |_, label, number, highlighted| {
            if highlighted {
                printer.fprintln(format_args!(
                    "  {} {}{}",
                    style.highlight(">"),
                    style.highlight(number),
                    style.highlight(label)
                ));
            } else {
                printer.fprintln(format_args!("    {number}{label}"));
            }
        });

        if self.list.is_empty() && !self.show_help {
            printer.println(&style.warning("  No options found matching the filter"));
        }
        if self.show_help {
            render_help(printer, &self.help_message);
        }
        render_footer(printer, FOOTER);

        if let Some(position) = self.cursor {
            printer.set_cursor_position(position);
        }
        Ok(())
    }
}

/// Asks the user to pick one choice from a list.
pub struct Select {
    state: Arc<Mutex<SelectState>>,
    slot: CanvasSlot,
    io: PromptIo,
}

impl Select {
    pub fn new(options: SelectOptions) -> Self {
        let mut list = ChoiceList::new(options.choices, options.display_count, options.display_numbers);
        let selected = options
            .selected_index
            .filter(|&index| index < list.entries().len());
        if let Some(index) = selected {
            list.highlight(index);
        }
        let state = SelectState {
            message: options.message,
            help_message: options.help_message,
            enable_filtering: options.enable_filtering,
            list,
            selected,
            show_help: false,
            phase: Phase::Pending,
            cursor: None,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            slot: CanvasSlot::Owned(options.canvas),
            io: PromptIo::new(options.reader, options.timeout),
        }
    }

    /// Draws onto `canvas` next to its other visuals instead of a canvas of its own.
    pub fn with_canvas(mut self, canvas: &Canvas) -> Self {
        canvas.add_visual(self.visual());
        self.slot = CanvasSlot::Shared(canvas.clone());
        self
    }

    pub fn visual(&self) -> Box<dyn Visual> {
        select_visual(Arc::clone(&self.state))
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).phase
    }

    /// Runs the prompt and returns the original index of the chosen entry.
    pub fn ask(&mut self, token: &CancelToken) -> Result<usize> {
        let state = Arc::clone(&self.state);
        let (canvas, owned) = self.slot.resolve(|| select_visual(Arc::clone(&state)));
        let hide_cursor = {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            state.phase = Phase::Interacting;
            !state.enable_filtering
        };

        Interaction {
            canvas: &canvas,
            owned,
            hide_cursor,
            clear_on_complete: false,
            config: InputConfig::default(),
        }
        .run(&mut self.io, token, |args| {
            state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .handle_key(args)
        })?;

        let selected = state.lock().unwrap_or_else(PoisonError::into_inner).selected;
        selected.ok_or_else(|| UxError::Render("select finished without a choice".to_string()))
    }
}

fn select_visual(state: Arc<Mutex<SelectState>>) -> Box<dyn Visual> {
    visual(move |printer: &Printer| {
        state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .render(printer)
    })
}

#[cfg(test)]
mod tests {
    use super::{Select, SelectOptions};
    use crate::core::input::Key;
    use crate::core::output::SharedBuffer;
    use crate::error::UxError;
    use crate::platform::scripted::ScriptedSource;
    use crate::render::CanvasManager;
    use crate::runtime::CancelToken;
    use crate::widgets::{CanvasOptions, Phase, SelectChoice};
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn colors(keys: Vec<Key>, buffer: &SharedBuffer, manager: &CanvasManager) -> Select {
        Select::new(SelectOptions {
            message: "Pick a color".into(),
            choices: ["Red", "Green", "Blue"].into_iter().map(SelectChoice::from).collect(),
            canvas: CanvasOptions::buffered(buffer, manager, 80),
            reader: Some(Box::new(ScriptedSource::from_keys(keys))),
            ..SelectOptions::default()
        })
    }

    #[test]
    fn arrows_then_enter_choose_an_index() {
        let buffer = SharedBuffer::new();
        let manager = CanvasManager::new();
        let mut select = colors(vec![Key::Down, Key::Down, Key::Enter], &buffer, &manager);

        assert_eq!(select.ask(&CancelToken::new()).expect("ask"), 2);
        assert_eq!(select.phase(), Phase::Complete);
        assert!(buffer.contents().ends_with("? Pick a color: Blue\n"));
        assert!(manager.is_empty());
    }

    #[test]
    fn first_frame_lists_choices_with_filter_and_footer() {
        let buffer = SharedBuffer::new();
        let manager = CanvasManager::new();
        let mut select = colors(vec![Key::Enter], &buffer, &manager);
        select.ask(&CancelToken::new()).expect("ask");

        let output = buffer.contents();
        assert!(output.contains("  Filter: Type to filter list"));
        assert!(output.contains("  > Red\n    Green\n    Blue\n"));
        assert!(output.contains("Use arrows to move, type ? for hint"));
    }

    #[test]
    fn typing_filters_and_enter_returns_original_index() {
        let buffer = SharedBuffer::new();
        let manager = CanvasManager::new();
        let mut select = colors(
            vec![Key::Char('b'), Key::Char('l'), Key::Enter],
            &buffer,
            &manager,
        );
        assert_eq!(select.ask(&CancelToken::new()).expect("ask"), 2);
        assert!(buffer.contents().contains("  > Blue\n"));
    }

    #[test]
    fn unmatched_filter_warns_and_enter_is_ignored() {
        let buffer = SharedBuffer::new();
        let manager = CanvasManager::new();
        let mut select = colors(vec![Key::Char('z'), Key::Enter, Key::Interrupt], &buffer, &manager);

        assert_matches!(select.ask(&CancelToken::new()), Err(UxError::Cancelled));
        let output = buffer.contents();
        assert!(output.contains("No options found matching the filter"));
        assert!(output.ends_with("? Pick a color: (Cancelled)\n"));
    }
}
