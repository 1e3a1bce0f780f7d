//! Color and text-format capability.
//!
//! A [`Style`] value travels with the printer instead of living in a process global, so one
//! canvas can render plain text into a log buffer while another colors the terminal.

use crate::config::EnvConfig;
use crate::platform::process_terminal::stdout_is_terminal;

const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    color: bool,
}

impl Style {
    pub const fn new(color: bool) -> Self {
        Self { color }
    }

    /// Plain output, no escape sequences.
    pub const fn plain() -> Self {
        Self::new(false)
    }

    pub const fn colored() -> Self {
        Self::new(true)
    }

    /// Colors when `FORCE_COLOR` asks for it or stdout is a terminal.
    pub fn detect(config: &EnvConfig) -> Self {
        Self::new(config.force_color || stdout_is_terminal())
    }

    pub fn color_enabled(&self) -> bool {
        self.color
    }

    pub fn highlight(&self, text: &str) -> String {
        self.sgr("36", text)
    }

    pub fn error(&self, text: &str) -> String {
        self.sgr("31", text)
    }

    pub fn warning(&self, text: &str) -> String {
        self.sgr("33", text)
    }

    pub fn success(&self, text: &str) -> String {
        self.sgr("32", text)
    }

    pub fn gray(&self, text: &str) -> String {
        self.sgr("90", text)
    }

    pub fn hint(&self, text: &str) -> String {
        self.sgr("35", text)
    }

    pub fn bold(&self, text: &str) -> String {
        self.sgr("1", text)
    }

    pub fn underline(&self, text: &str) -> String {
        if !self.color || text.is_empty() {
            return text.to_string();
        }
        format!("\x1b[4m{text}\x1b[24m")
    }

    /// OSC 8 hyperlink; without color support the URL is printed next to the text.
    pub fn hyperlink(&self, url: &str, text: &str) -> String {
        if self.color {
            return format!("\x1b]8;;{url}\x1b\\{text}\x1b]8;;\x1b\\");
        }
        if text.is_empty() || text == url {
            url.to_string()
        } else {
            format!("{text} ({url})")
        }
    }

    fn sgr(&self, code: &str, text: &str) -> String {
        if !self.color || text.is_empty() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}{RESET}")
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::detect(&EnvConfig::from_env())
    }
}
