//! Checkbox list prompt.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::core::input::Key;
use crate::core::terminal::InputSource;
use crate::error::Result;
use crate::render::{visual, Canvas, CursorPosition, Printer, Visual};
use crate::runtime::{CancelToken, InputConfig, KeyPressEventArgs};
use crate::widgets::choices::{ChoiceList, SelectChoice};
use crate::widgets::{
    render_footer, render_help, render_question, CanvasOptions, CanvasSlot, Interaction, Phase,
    PromptIo,
};

const FOOTER: &[&str] = &[
    "Use arrows to move, use space to select",
    "Use left/right to select none/all",
    "Use enter to submit, type ? for help",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSelectChoice {
    pub value: String,
    pub label: String,
    /// Checked when the prompt opens.
    pub selected: bool,
}

impl MultiSelectChoice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            selected: false,
        }
    }

    pub fn checked(mut self) -> Self {
        self.selected = true;
        self
    }
}

impl From<&str> for MultiSelectChoice {
    fn from(value: &str) -> Self {
        Self::new(value, value)
    }
}

pub struct MultiSelectOptions {
    pub message: String,
    pub choices: Vec<MultiSelectChoice>,
    pub help_message: String,
    /// Default: 6.
    pub display_count: usize,
    pub display_numbers: bool,
    /// Default: true.
    pub enable_filtering: bool,
    pub canvas: CanvasOptions,
    pub reader: Option<Box<dyn InputSource>>,
    pub timeout: Option<Duration>,
}

impl Default for MultiSelectOptions {
    fn default() -> Self {
        Self {
            message: String::new(),
            choices: Vec::new(),
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

struct MultiSelectState {
    message: String,
    help_message: String,
    enable_filtering: bool,
    list: ChoiceList,
    checked: Vec<bool>,
    submitted: bool,
    show_help: bool,
    phase: Phase,
    cursor: Option<CursorPosition>,
}

impl MultiSelectState {
    fn validation_message(&self) -> Option<&'static str> {
        if self.list.is_empty() {
            Some("No options found matching the filter")
        } else if self.submitted && !self.checked.contains(&true) {
            Some("At least one option must be selected")
        } else {
            None
        }
    }

    fn selected_labels(&self) -> Vec<&str> {
        self.list
            .entries()
            .iter()
            .zip(&self.checked)
            .filter(|&(_, &checked)| checked)
            .map(|(entry, _)| entry.label.as_str())
            .collect()
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
        if self.enable_filtering {
            // Space both toggles and lands in the edited value; it never filters.
            self.list.set_filter(args.value.trim());
        }
        if self.list.current().is_none() && !self.list.is_empty() {
            self.list.move_down();
        }

        match args.key {
            Some(Key::Up) => self.list.move_up(),
            Some(Key::Down) => self.list.move_down(),
            Some(Key::Char(' ')) => {
                if let Some(current) = self.list.current() {
                    self.checked[current] = !self.checked[current];
                }
            }
            Some(Key::Right) => self.checked.iter_mut().for_each(|checked| *checked = true),
            Some(Key::Left) => self.checked.iter_mut().for_each(|checked| *checked = false),
            Some(Key::Enter) => {
                self.submitted = true;
                if self.validation_message().is_none() {
                    self.phase = Phase::Complete;
                    return false;
                }
            }
            _ => {}
        }
        true
    }

    fn render(&mut self, printer: &Printer) -> Result<()> {
        let style = *printer.style();
        render_question(printer, &self.message);
        match self.phase {
            Phase::Cancelled => printer.print(&style.error("(Cancelled)")),
            Phase::TimedOut => printer.print(&style.error("(Timed out)")),
            _ => printer.print(&style.highlight(&self.selected_labels().join(", "))),
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

        let checked = &self.checked;
        self.list.render(printer, "  ", |index, label, number, highlighted| {
            let mark = if checked[index] {
                style.success("✔")
            } else {
                " ".to_string()
            };
            if highlighted {
                printer.fprintln(format_args!(
                    "  {} {}{}{} {}{}",
                    style.highlight(">"),
                    style.highlight("["),
                    style.highlight(&mark),
                    style.highlight("]"),
                    style.highlight(number),
                    style.highlight(label)
                ));
            } else {
                printer.fprintln(format_args!("    [{mark}] {number}{label}"));
            }
        });

        if !self.show_help {
            if let Some(message) = self.validation_message() {
                printer.println("");
                printer.println(&style.warning(&format!("  {message}")));
            }
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

/// Asks the user to check any number of choices.
pub struct MultiSelect {
    state: Arc<Mutex<MultiSelectState>>,
    slot: CanvasSlot,
    io: PromptIo,
}

impl MultiSelect {
    pub fn new(options: MultiSelectOptions) -> Self {
        let checked = options.choices.iter().map(|choice| choice.selected).collect();
        let entries = options
            .choices
            .into_iter()
            .map(|choice| SelectChoice::new(choice.value, choice.label))
            .collect();
        let mut list = ChoiceList::new(entries, options.display_count, options.display_numbers);
        list.highlight(0);
        let state = MultiSelectState {
            message: options.message,
            help_message: options.help_message,
            enable_filtering: options.enable_filtering,
            list,
            checked,
            submitted: false,
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

    pub fn with_canvas(mut self, canvas: &Canvas) -> Self {
        canvas.add_visual(self.visual());
        self.slot = CanvasSlot::Shared(canvas.clone());
        self
    }

    pub fn visual(&self) -> Box<dyn Visual> {
        multi_select_visual(Arc::clone(&self.state))
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).phase
    }

    /// Runs the prompt and returns the checked choices in their original order.
    pub fn ask(&mut self, token: &CancelToken) -> Result<Vec<MultiSelectChoice>> {
        let state = Arc::clone(&self.state);
        let (canvas, owned) = self
            .slot
            .resolve(|| multi_select_visual(Arc::clone(&state)));
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

        let state = state.lock().unwrap_or_else(PoisonError::into_inner);
        let chosen = state
            .list
            .entries()
            .iter()
            .zip(&state.checked)
            .filter(|&(_, &checked)| checked)
            .map(|(entry, _)| MultiSelectChoice {
                value: entry.value.clone(),
                label: entry.label.clone(),
                selected: true,
            })
            .collect();
        Ok(chosen)
    }
}

fn multi_select_visual(state: Arc<Mutex<MultiSelectState>>) -> Box<dyn Visual> {
    visual(move |printer: &Printer| {
        state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .render(printer)
    })
}
