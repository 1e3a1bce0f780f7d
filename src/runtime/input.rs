//! Keyboard loop: a reader thread feeding decoded keys to a synchronous callback.
//!
//! Keys, OS interrupts and reader failures travel over one channel, so Ctrl-C typed in raw
//! mode, SIGINT, SIGTERM and [`CancelToken::cancel`] all end the loop the same way.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use unicode_segmentation::UnicodeSegmentation;

use crate::core::input::Key;
use crate::core::terminal::{InputSource, RawModeGuard, ReadStatus};
use crate::error::{Result, UxError};
use crate::platform::signals::SignalWatcher;
use crate::platform::stdin_buffer::StdinBuffer;
use crate::runtime::cancel::CancelToken;

/// How long the reader blocks before checking for a stop request.
const READ_POLL: Duration = Duration::from_millis(50);
/// How often the consumer re-checks the cancel token while no key arrives.
const CANCEL_POLL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputConfig {
    pub initial_value: String,
    /// Treat `?` as text instead of toggling hint mode.
    pub ignore_hint_keys: bool,
}

/// State handed to the key callback after each keypress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPressEventArgs {
    /// Edited text so far.
    pub value: String,
    /// The key just pressed; `None` on the final cancelled/timed-out event.
    pub key: Option<Key>,
    pub hint: bool,
    pub cancelled: bool,
    pub timed_out: bool,
}

impl KeyPressEventArgs {
    fn apply(&mut self, key: Key, config: &InputConfig) {
        self.key = Some(key);
        match key {
            Key::Char('?') if !config.ignore_hint_keys => self.hint = !self.hint,
            Key::Escape => self.hint = false,
            Key::Backspace => {
                if let Some((idx, _)) = self.value.grapheme_indices(true).next_back() {
                    self.value.truncate(idx);
                }
            }
            Key::Char(ch) => self.value.push(ch),
            _ => {}
        }
    }
}

#[derive(Debug)]
enum InputMsg {
    Key(Key),
    Interrupt,
    Failed(io::Error),
    Closed,
}

/// Owns the keyboard source between reads.
pub struct Input {
    source: Option<Box<dyn InputSource>>,
    watch_signals: bool,
}

impl Input {
    /// Input from an arbitrary source. OS signals are not watched.
    pub fn new(source: Box<dyn InputSource>) -> Self {
        Self {
            source: Some(source),
            watch_signals: false,
        }
    }

    /// Input from the process's stdin, with SIGINT/SIGTERM routed into cancellation.
    #[cfg(unix)]
    pub fn stdin() -> Self {
        Self::new(Box::new(crate::platform::process_terminal::StdinSource::new()))
            .with_signal_watch(true)
    }

    #[cfg(not(unix))]
    pub fn stdin() -> Self {
        Self {
            source: None,
            watch_signals: false,
        }
    }

    pub fn with_signal_watch(mut self, watch: bool) -> Self {
        self.watch_signals = watch;
        self
    }

    /// Gives the keyboard source back, e.g. to hand it to the next prompt.
    pub fn into_source(self) -> Option<Box<dyn InputSource>> {
        self.source
    }

    /// Reads keys until `on_key` returns `Ok(false)`, fails, or the loop is interrupted.
    ///
    /// Interruption (Ctrl-C, Ctrl-X, SIGINT, SIGTERM, `token.cancel()`) delivers one final
    /// event with `cancelled` set and returns [`UxError::Cancelled`]. An expired deadline
    /// delivers an event with `timed_out` set and returns [`UxError::DeadlineExceeded`].
    pub fn read_input<F>(&mut self, token: &CancelToken, config: &InputConfig, on_key: F) -> Result<()>
    where
        F: FnMut(&KeyPressEventArgs) -> Result<bool>,
    {
        let source = self.source.take().ok_or_else(|| {
            UxError::Keyboard(io::Error::new(
                io::ErrorKind::Unsupported,
                "no keyboard source available",
            ))
        })?;

        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let reader = spawn_reader(source, tx.clone(), Arc::clone(&stop))
            .map_err(UxError::Keyboard)?;
        let signals = if self.watch_signals {
            watch_interrupts(tx)
        } else {
            drop(tx);
            None
        };
        tracing::debug!("input loop started");

        let result = pump(&rx, token, config, on_key);

        drop(signals);
        stop.store(true, Ordering::SeqCst);
        drop(rx);
        match reader.join() {
            Ok(source) => self.source = Some(source),
            Err(_) => tracing::warn!("keyboard reader thread panicked"),
        }
        tracing::debug!(ok = result.is_ok(), "input loop stopped");
        result
    }
}

fn watch_interrupts(tx: Sender<InputMsg>) -> Option<SignalWatcher> {
    match SignalWatcher::on_interrupt(move || {
        let _ = tx.send(InputMsg::Interrupt);
    }) {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            tracing::warn!(error = %err, "interrupt signals unavailable");
            None
        }
    }
}

fn spawn_reader(
    mut source: Box<dyn InputSource>,
    tx: Sender<InputMsg>,
    stop: Arc<AtomicBool>,
) -> io::Result<JoinHandle<Box<dyn InputSource>>> {
    thread::Builder::new()
        .name("canvas-keyboard".to_string())
        .spawn(move || {
            read_loop(source.as_mut(), &tx, &stop);
            source
        })
}

fn read_loop(source: &mut dyn InputSource, tx: &Sender<InputMsg>, stop: &AtomicBool) {
    let mut guard = match RawModeGuard::enter(source) {
        Ok(guard) => guard,
        Err(err) => {
            let _ = tx.send(InputMsg::Failed(err));
            return;
        }
    };
    let mut decoder = StdinBuffer::new();
    let mut buf = [0u8; 1024];

    while !stop.load(Ordering::SeqCst) {
        let keys = match guard.source().read_timeout(&mut buf, READ_POLL) {
            Ok(ReadStatus::Data(len)) => decoder.process(&buf[..len]),
            Ok(ReadStatus::Idle) if decoder.has_pending() => decoder.flush(),
            Ok(ReadStatus::Idle) => continue,
            Ok(ReadStatus::Closed) => {
                let _ = send_keys(tx, decoder.flush());
                let _ = tx.send(InputMsg::Closed);
                break;
            }
            Err(err) => {
                let _ = tx.send(InputMsg::Failed(err));
                break;
            }
        };
        if !send_keys(tx, keys) {
            break;
        }
    }

    if let Err(err) = guard.leave() {
        tracing::warn!(error = %err, "failed to restore terminal mode");
    }
}

/// Returns `false` once the consumer is gone.
fn send_keys(tx: &Sender<InputMsg>, keys: Vec<Key>) -> bool {
    keys.into_iter().all(|key| tx.send(InputMsg::Key(key)).is_ok())
}

fn pump<F>(
    rx: &Receiver<InputMsg>,
    token: &CancelToken,
    config: &InputConfig,
    mut on_key: F,
) -> Result<()>
where
    F: FnMut(&KeyPressEventArgs) -> Result<bool>,
{
    let mut args = KeyPressEventArgs {
        value: config.initial_value.clone(),
        ..KeyPressEventArgs::default()
    };

    loop {
        if token.is_cancelled() {
            return finish_cancelled(&mut args, &mut on_key);
        }
        if token.is_expired() {
            return finish_timed_out(&mut args, &mut on_key);
        }
        let wait = token
            .remaining()
            .map(|remaining| remaining.min(CANCEL_POLL))
            .unwrap_or(CANCEL_POLL);

        match rx.recv_timeout(wait) {
            Ok(InputMsg::Key(Key::Interrupt)) | Ok(InputMsg::Interrupt) => {
                return finish_cancelled(&mut args, &mut on_key);
            }
            Ok(InputMsg::Key(key)) => {
                args.apply(key, config);
                if !on_key(&args)? {
                    return Ok(());
                }
            }
            Ok(InputMsg::Failed(err)) => return Err(UxError::Keyboard(err)),
            Ok(InputMsg::Closed) | Err(RecvTimeoutError::Disconnected) => {
                return Err(UxError::Keyboard(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "keyboard input closed",
                )));
            }
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}

fn finish_cancelled<F>(args: &mut KeyPressEventArgs, on_key: &mut F) -> Result<()>
where
    F: FnMut(&KeyPressEventArgs) -> Result<bool>,
{
    args.key = None;
    args.cancelled = true;
    if let Err(err) = on_key(args) {
        tracing::warn!(error = %err, "final cancelled frame failed");
    }
    Err(UxError::Cancelled)
}

fn finish_timed_out<F>(args: &mut KeyPressEventArgs, on_key: &mut F) -> Result<()>
where
    F: FnMut(&KeyPressEventArgs) -> Result<bool>,
{
    args.key = None;
    args.timed_out = true;
    if let Err(err) = on_key(args) {
        tracing::warn!(error = %err, "final timed-out frame failed");
    }
    Err(UxError::DeadlineExceeded)
}

#[cfg(test)]
mod tests {
    use super::{Input, InputConfig, KeyPressEventArgs};
    use crate::core::input::Key;
    use crate::error::UxError;
    use crate::platform::scripted::ScriptedSource;
    use crate::runtime::cancel::CancelToken;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use std::thread;
    use std::time::Duration;

    fn collect(
        source: ScriptedSource,
        config: &InputConfig,
        token: &CancelToken,
        stop_on_enter: bool,
    ) -> (Vec<KeyPressEventArgs>, crate::error::Result<()>) {
        let mut input = Input::new(Box::new(source));
        let mut events = Vec::new();
        let result = input.read_input(token, config, |args| {
            events.push(args.clone());
            Ok(!(stop_on_enter && args.key == Some(Key::Enter)))
        });
        (events, result)
    }

    fn chars(text: &str) -> Vec<Key> {
        text.chars().map(Key::Char).collect()
    }

    #[test]
    fn accumulates_value_and_stops_when_callback_declines() {
        let mut keys = chars("héllo");
        keys.push(Key::Backspace);
        keys.push(Key::Enter);
        let (events, result) = collect(
            ScriptedSource::from_keys(keys),
            &InputConfig::default(),
            &CancelToken::new(),
            true,
        );

        result.expect("read");
        let last = events.last().expect("events");
        assert_eq!(last.value, "héll");
        assert_eq!(last.key, Some(Key::Enter));
        assert_eq!(events.len(), 7);
    }

    #[test]
    fn question_mark_toggles_hint_and_escape_clears_it() {
        let (events, _) = collect(
            ScriptedSource::from_keys([Key::Char('?'), Key::Char('?'), Key::Char('?'), Key::Escape]),
            &InputConfig::default(),
            &CancelToken::new(),
            false,
        );
        let hints: Vec<bool> = events.iter().map(|args| args.hint).collect();
        assert_eq!(hints, vec![true, false, true, false]);
        assert!(events.iter().all(|args| args.value.is_empty()));
    }

    #[test]
    fn ignored_hint_keys_are_text() {
        let config = InputConfig {
            initial_value: "why".into(),
            ignore_hint_keys: true,
        };
        let (events, _) = collect(
            ScriptedSource::from_keys([Key::Char('?')]),
            &config,
            &CancelToken::new(),
            false,
        );
        assert_eq!(events[0].value, "why?");
        assert!(!events[0].hint);
    }

    #[test]
    fn ctrl_c_cancels_with_a_final_event() {
        let (events, result) = collect(
            ScriptedSource::from_keys([Key::Char('a'), Key::Interrupt, Key::Char('b')]),
            &InputConfig::default(),
            &CancelToken::new(),
            false,
        );
        assert_matches!(result, Err(UxError::Cancelled));
        let last = events.last().expect("final event");
        assert!(last.cancelled);
        assert_eq!(last.key, None);
        assert_eq!(last.value, "a");
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn token_cancel_from_another_thread_ends_the_loop() {
        let token = CancelToken::new();
        let remote = token.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            remote.cancel();
        });
        let (events, result) = collect(
            ScriptedSource::new(Vec::<Vec<u8>>::new()).then_idle(),
            &InputConfig::default(),
            &token,
            false,
        );
        canceller.join().expect("join");
        assert_matches!(result, Err(UxError::Cancelled));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn deadline_reports_timed_out() {
        let token = CancelToken::new().with_timeout(Duration::from_millis(40));
        let (events, result) = collect(
            ScriptedSource::new(Vec::<Vec<u8>>::new()).then_idle(),
            &InputConfig::default(),
            &token,
            false,
        );
        assert_matches!(result, Err(UxError::DeadlineExceeded));
        assert!(events.last().expect("final event").timed_out);
    }

    #[test]
    fn closed_source_is_a_keyboard_error() {
        let (_, result) = collect(
            ScriptedSource::from_keys([Key::Char('x')]),
            &InputConfig::default(),
            &CancelToken::new(),
            false,
        );
        assert_matches!(result, Err(UxError::Keyboard(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn source_is_reusable_after_a_read() {
        let mut input = Input::new(Box::new(ScriptedSource::from_keys([Key::Enter])));
        let token = CancelToken::new();
        input
            .read_input(&token, &InputConfig::default(), |_| Ok(false))
            .expect("first read");
        let second = input.read_input(&token, &InputConfig::default(), |_| Ok(false));
        assert_matches!(second, Err(UxError::Keyboard(_)));
    }

    #[test]
    fn callback_errors_propagate() {
        let mut input = Input::new(Box::new(ScriptedSource::from_keys([Key::Char('z')])));
        let result = input.read_input(&CancelToken::new(), &InputConfig::default(), |_| {
            Err(UxError::Render("bad frame".into()))
        });
        assert_matches!(result, Err(UxError::Render(_)));
    }
}
