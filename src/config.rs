//! Environment configuration.

use std::env;
use std::time::Duration;

pub const FORCE_COLOR_ENV: &str = "FORCE_COLOR";
pub const PROMPT_TIMEOUT_ENV: &str = "INLINE_CANVAS_PROMPT_TIMEOUT";
pub const LOG_FILE_ENV: &str = "INLINE_CANVAS_LOG";
pub const LOG_FILTER_ENV: &str = "INLINE_CANVAS_LOG_FILTER";

/// Prompts wait forever unless a timeout is configured.
pub const DEFAULT_PROMPT_TIMEOUT: Option<Duration> = None;
pub const DEFAULT_LOG_FILTER: &str = "debug";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub force_color: bool,
    pub prompt_timeout: Option<Duration>,
    pub log_file: Option<String>,
    pub log_filter: String,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            force_color: false,
            prompt_timeout: DEFAULT_PROMPT_TIMEOUT,
            log_file: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            force_color: env_flag(FORCE_COLOR_ENV),
            prompt_timeout: env_string_opt(PROMPT_TIMEOUT_ENV)
                .map(|value| parse_prompt_timeout(&value))
                .unwrap_or(DEFAULT_PROMPT_TIMEOUT),
            log_file: env_string_opt(LOG_FILE_ENV),
            log_filter: env_string_opt(LOG_FILTER_ENV)
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}

/// Parses a prompt timeout: bare integers are seconds, otherwise a duration such as `90s`,
/// `1m30s` or `250ms`. Zero or negative values disable the timeout; unparseable input yields
/// the default.
pub fn parse_prompt_timeout(raw: &str) -> Option<Duration> {
    let value = raw.trim();
    if value.is_empty() {
        return DEFAULT_PROMPT_TIMEOUT;
    }
    if let Some(rest) = value.strip_prefix('-') {
        return match parse_duration(rest) {
            Some(_) => None,
            None => DEFAULT_PROMPT_TIMEOUT,
        };
    }
    match parse_duration(value) {
        Some(duration) if duration.is_zero() => None,
        Some(duration) => Some(duration),
        None => DEFAULT_PROMPT_TIMEOUT,
    }
}

/// A bare integer is seconds; anything else is a run of `<number><unit>` segments such as
/// `1m30s` or `1.5h`, with units `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`.
fn parse_duration(value: &str) -> Option<Duration> {
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let is_numeric = |ch: char| ch.is_ascii_digit() || ch == '.';
    let mut nanos = 0.0_f64;
    let mut rest = value;
    while !rest.is_empty() {
        let (number, tail) = rest.split_at(rest.find(|ch: char| !is_numeric(ch)).unwrap_or(rest.len()));
        let (unit, tail) = tail.split_at(tail.find(is_numeric).unwrap_or(tail.len()));
        if number.is_empty() {
            return None;
        }
        nanos += number.parse::<f64>().ok()? * unit_nanos(unit)?;
        rest = tail;
    }
    if !nanos.is_finite() || nanos >= u64::MAX as f64 {
        return None;
    }
    Some(Duration::from_nanos(nanos.round() as u64))
}

fn unit_nanos(unit: &str) -> Option<f64> {
    let nanos = match unit {
        "ns" => 1.0,
        "us" | "µs" | "μs" => 1e3,
        "ms" => 1e6,
        "s" => 1e9,
        "m" => 60e9,
        "h" => 3600e9,
        _ => return None,
    };
    Some(nanos)
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|value| {
            let value = value.trim();
            !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
        })
        .unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{
        parse_prompt_timeout, EnvConfig, DEFAULT_LOG_FILTER, FORCE_COLOR_ENV, LOG_FILE_ENV,
        LOG_FILTER_ENV, PROMPT_TIMEOUT_ENV,
    };
    use std::env;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn env_defaults() {
        let _lock = env_lock();
        let _g1 = set_env_guard(FORCE_COLOR_ENV, None);
        let _g2 = set_env_guard(PROMPT_TIMEOUT_ENV, None);
        let _g3 = set_env_guard(LOG_FILE_ENV, None);
        let _g4 = set_env_guard(LOG_FILTER_ENV, None);

        let config = EnvConfig::from_env();
        assert_eq!(config, EnvConfig::default());
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn env_values_are_read() {
        let _lock = env_lock();
        let _g1 = set_env_guard(FORCE_COLOR_ENV, Some("1"));
        let _g2 = set_env_guard(PROMPT_TIMEOUT_ENV, Some("45"));
        let _g3 = set_env_guard(LOG_FILE_ENV, Some("/tmp/canvas.log"));
        let _g4 = set_env_guard(LOG_FILTER_ENV, Some("inline_canvas=trace"));

        let config = EnvConfig::from_env();
        assert!(config.force_color);
        assert_eq!(config.prompt_timeout, Some(Duration::from_secs(45)));
        assert_eq!(config.log_file.as_deref(), Some("/tmp/canvas.log"));
        assert_eq!(config.log_filter, "inline_canvas=trace");
    }

    #[test]
    fn force_color_zero_stays_off() {
        let _lock = env_lock();
        let _g1 = set_env_guard(FORCE_COLOR_ENV, Some("0"));
        assert!(!EnvConfig::from_env().force_color);
    }

    #[test]
    fn timeout_accepts_integer_seconds_and_units() {
        assert_eq!(parse_prompt_timeout("30"), Some(Duration::from_secs(30)));
        assert_eq!(parse_prompt_timeout(" 2m "), Some(Duration::from_secs(120)));
        assert_eq!(parse_prompt_timeout("1.5s"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_prompt_timeout("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_prompt_timeout("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_prompt_timeout("1500000us"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_prompt_timeout("2500000000ns"), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn timeout_accepts_compound_durations() {
        assert_eq!(parse_prompt_timeout("1m30s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_prompt_timeout("1h2m3s"), Some(Duration::from_secs(3723)));
        assert_eq!(parse_prompt_timeout("2h45m"), Some(Duration::from_secs(9900)));
        assert_eq!(parse_prompt_timeout("1s500ms"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_prompt_timeout("-1m30s"), None);
    }

    #[test]
    fn timeout_zero_or_negative_disables() {
        assert_eq!(parse_prompt_timeout("0"), None);
        assert_eq!(parse_prompt_timeout("0s"), None);
        assert_eq!(parse_prompt_timeout("-5"), None);
        assert_eq!(parse_prompt_timeout("-1m"), None);
    }

    #[test]
    fn invalid_timeout_falls_back_to_default() {
        assert_eq!(parse_prompt_timeout(""), None);
        assert_eq!(parse_prompt_timeout("soon"), None);
        assert_eq!(parse_prompt_timeout("s"), None);
        assert_eq!(parse_prompt_timeout("1.5"), None);
        assert_eq!(parse_prompt_timeout("1m30"), None);
        assert_eq!(parse_prompt_timeout("1m 30s"), None);
        assert_eq!(parse_prompt_timeout("5d"), None);
    }
}
