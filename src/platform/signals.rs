//! Signal watchers (terminal resize, interrupt/terminate).
//!
//! Interrupts go through one process-wide dispatcher. While no watcher is listening, a
//! SIGINT or SIGTERM gets its default disposition, so a finished prompt never leaves the
//! process deaf to Ctrl-C.

use std::io;

#[cfg(unix)]
use once_cell::sync::{Lazy, OnceCell};
#[cfg(unix)]
use signal_hook::iterator::{Handle, Signals};
#[cfg(unix)]
use signal_hook::low_level::emulate_default_handler;
#[cfg(unix)]
use std::sync::{Mutex, MutexGuard, PoisonError};
#[cfg(unix)]
use std::thread::{self, JoinHandle};

#[cfg(unix)]
type InterruptHandler = Box<dyn FnMut() + Send>;

#[cfg(unix)]
#[derive(Default)]
struct InterruptListeners {
    next_id: u64,
    handlers: Vec<(u64, InterruptHandler)>,
}

#[cfg(unix)]
static INTERRUPTS: Lazy<Mutex<InterruptListeners>> = Lazy::new(Mutex::default);

#[cfg(unix)]
static DISPATCHER: OnceCell<()> = OnceCell::new();

#[cfg(unix)]
fn listeners() -> MutexGuard<'static, InterruptListeners> {
    INTERRUPTS.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(unix)]
fn start_interrupt_dispatcher() -> io::Result<()> {
    let mut signals = Signals::new([libc::SIGINT, libc::SIGTERM])?;
    thread::Builder::new()
        .name("canvas-interrupt".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                dispatch_interrupt(signal);
            }
        })?;
    Ok(())
}

#[cfg(unix)]
fn dispatch_interrupt(signal: libc::c_int) {
    let mut listeners = listeners();
    if listeners.handlers.is_empty() {
        drop(listeners);
        if let Err(err) = emulate_default_handler(signal) {
            tracing::warn!(signal, error = %err, "failed to apply default signal action");
        }
        return;
    }
    tracing::debug!(signal, listeners = listeners.handlers.len(), "interrupt delivered");
    for (_, handler) in listeners.handlers.iter_mut() {
        handler();
    }
}

#[cfg(unix)]
enum Watch {
    Thread {
        handle: Handle,
        thread: Option<JoinHandle<()>>,
    },
    Interrupt(u64),
}

/// Delivers selected signals to a handler until dropped.
///
/// Dropping a resize watcher unregisters SIGWINCH and joins its thread. Dropping an
/// interrupt watcher removes its handler from the dispatcher.
#[cfg(unix)]
pub struct SignalWatcher {
    watch: Watch,
}

#[cfg(unix)]
impl SignalWatcher {
    pub fn spawn<F>(name: &str, signals: &[libc::c_int], mut handler: F) -> io::Result<Self>
    where
        F: FnMut(libc::c_int) + Send + 'static,
    {
        let mut signals = Signals::new(signals)?;
        let handle = signals.handle();
        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                for signal in signals.forever() {
                    handler(signal);
                }
            })?;
        Ok(Self {
            watch: Watch::Thread {
                handle,
                thread: Some(thread),
            },
        })
    }

    /// Calls `handler` whenever the terminal is resized.
    pub fn on_resize<F>(handler: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let mut handler = handler;
        Self::spawn("canvas-resize", &[libc::SIGWINCH], move |_| handler())
    }

    /// Calls `handler` on SIGINT or SIGTERM for as long as the watcher lives.
    pub fn on_interrupt<F>(handler: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        DISPATCHER.get_or_try_init(start_interrupt_dispatcher)?;
        let mut listeners = listeners();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.handlers.push((id, Box::new(handler)));
        Ok(Self {
            watch: Watch::Interrupt(id),
        })
    }
}

#[cfg(unix)]
impl Drop for SignalWatcher {
    fn drop(&mut self) {
        match &mut self.watch {
            Watch::Thread { handle, thread } => {
                handle.close();
                if let Some(thread) = thread.take() {
                    let _ = thread.join();
                }
            }
            Watch::Interrupt(id) => {
                let id = *id;
                listeners().handlers.retain(|(listener, _)| *listener != id);
            }
        }
    }
}

/// Signals are not watched on this platform; the watcher is inert.
#[cfg(not(unix))]
pub struct SignalWatcher;

#[cfg(not(unix))]
impl SignalWatcher {
    pub fn on_resize<F>(_handler: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        Ok(Self)
    }

    pub fn on_interrupt<F>(_handler: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        Ok(Self)
    }
}
