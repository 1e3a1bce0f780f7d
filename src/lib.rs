//! Inline terminal canvases with focus arbitration.
//!
//! Invariant: single output gate. Frames reach the terminal only through
//! `core::output::write_chunked`, called by a [`Canvas`] under its own lock.
//!
//! # Public API Overview
//! - Draw repaintable regions with [`Canvas`] and [`Printer`]; arbitrate them with a
//!   [`CanvasManager`] so an interactive prompt owns the screen while it runs.
//! - Ask questions with [`Confirm`], [`Prompt`], [`Select`] and [`MultiSelect`].
//! - Show progress with [`Spinner`] and [`TaskList`].
//! - Read raw keys through [`Input`] when the provided widgets do not fit.
//! - Measure ANSI-styled text with [`visible_length`] and [`count_line_breaks`].

#![allow(clippy::new_without_default, clippy::type_complexity)]

pub mod config;
pub mod error;
pub mod logging;

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;
pub mod widgets;

/// Process configuration read from the environment.
pub use crate::config::{parse_prompt_timeout, EnvConfig};
/// Crate error and result types.
pub use crate::error::{Result, UxError};

/// Cursor control and key primitives.
pub use crate::core::cursor::CursorCmd;
pub use crate::core::input::Key;
/// The output gate and an in-memory writer for capturing frames.
pub use crate::core::output::{write_chunked, SharedBuffer, MAX_CHUNK_SIZE};
/// Color capability threaded through printers.
pub use crate::core::style::Style;
/// Keyboard source abstraction.
pub use crate::core::terminal::{InputSource, ReadStatus};
/// ANSI-aware measurement helpers.
pub use crate::core::text::width::{count_line_breaks, visible_length};

/// Deterministic keyboard input for tests and demos.
pub use crate::platform::scripted::ScriptedSource;
/// Raw-mode stdin source.
#[cfg(unix)]
pub use crate::platform::process_terminal::StdinSource;

/// Render engine.
pub use crate::render::{
    visual, Canvas, CanvasManager, CanvasSize, CursorPosition, FocusGuard, Printer, Visual,
    WidthSource,
};

/// Keyboard loop, cancellation and timeouts.
pub use crate::runtime::{
    with_prompt_timeout, CancelToken, Input, InputConfig, KeyPressEventArgs, Ticker,
};

/// Built-in widgets.
pub use crate::widgets::{
    CanvasOptions, Confirm, ConfirmOptions, MultiSelect, MultiSelectChoice, MultiSelectOptions,
    Phase, Progress, Prompt, PromptOptions, Select, SelectChoice, SelectOptions, Spinner,
    SpinnerOptions, TaskError, TaskFailure, TaskList, TaskListError, TaskListOptions,
    TaskOptions, TaskState, Validator,
};
