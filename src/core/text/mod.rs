//! Text helpers (ANSI scanning, visible length, wrap accounting).
//!
//! These helpers are pure (string in, number or string out) and live under `core` so widgets
//! can depend on them without importing anything from the render layer.

pub mod ansi;
pub mod width;
