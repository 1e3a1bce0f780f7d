//! Core primitives: cursor control, text measurement, keys, styling and the output gate.

pub mod cursor;
pub mod input;
pub mod output;
pub mod style;
pub mod terminal;
pub mod text;
