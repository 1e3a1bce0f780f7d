//! Platform-specific implementations (libc terminal access, signals, scripted input).

pub mod process_terminal;
pub mod scripted;
pub mod signals;
pub mod stdin_buffer;
