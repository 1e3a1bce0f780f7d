//! Rendering engine: printer, canvas and focus arbitration.

pub mod canvas;
pub mod manager;
pub mod printer;

pub use canvas::{visual, Canvas, Visual, WidthSource};
pub use manager::{CanvasManager, FocusGuard, UpdateGuard};
pub use printer::{CanvasSize, CursorPosition, Printer};
