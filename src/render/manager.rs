//! Registry of live canvases and the single focus slot.
//!
//! Lock order: update lock, then registry, then a canvas's own state lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;

use crate::render::canvas::{Canvas, CanvasId, WeakCanvas};

static GLOBAL_MANAGER: Lazy<CanvasManager> = Lazy::new(CanvasManager::new);

#[derive(Default)]
struct Registry {
    canvases: Vec<(CanvasId, WeakCanvas)>,
    focused: Option<CanvasId>,
}

#[derive(Default)]
struct ManagerInner {
    update_lock: Mutex<()>,
    registry: Mutex<Registry>,
    next_id: AtomicU64,
}

/// Held while a canvas repaints; no other canvas of the same manager writes meanwhile.
pub type UpdateGuard<'a> = MutexGuard<'a, ()>;

/// Arbitrates which canvas may repaint.
///
/// While one canvas holds focus every other canvas's `update` returns without writing.
#[derive(Clone, Default)]
pub struct CanvasManager {
    inner: Arc<ManagerInner>,
}

impl CanvasManager {
    /// An isolated manager. Canvases registered here never contend with the global one.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide manager shared by widgets that are not given one.
    pub fn global() -> Self {
        GLOBAL_MANAGER.clone()
    }

    pub(crate) fn next_id(&self) -> CanvasId {
        self.inner.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn add(&self, canvas: &Canvas) {
        let mut registry = self.registry();
        registry.canvases.retain(|(_, weak)| weak.is_alive());
        if registry.canvases.iter().all(|(id, _)| *id != canvas.id()) {
            registry.canvases.push((canvas.id(), canvas.downgrade()));
        }
    }

    /// Drops `canvas` from the registry, releasing focus if it held it.
    pub fn remove(&self, canvas: &Canvas) {
        let mut registry = self.registry();
        registry
            .canvases
            .retain(|(id, weak)| *id != canvas.id() && weak.is_alive());
        if registry.focused == Some(canvas.id()) {
            registry.focused = None;
        }
    }

    /// Number of registered canvases still alive.
    pub fn len(&self) -> usize {
        self.registry()
            .canvases
            .iter()
            .filter(|(_, weak)| weak.is_alive())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when nobody holds focus or `canvas` does.
    pub fn can_update(&self, canvas: &Canvas) -> bool {
        match self.registry().focused {
            None => true,
            Some(id) => id == canvas.id(),
        }
    }

    pub fn has_focus(&self, canvas: &Canvas) -> bool {
        self.registry().focused == Some(canvas.id())
    }

    /// Serializes repaints across canvases of this manager.
    pub fn lock(&self) -> UpdateGuard<'_> {
        self.inner.update_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Gives `canvas` exclusive repaint rights and erases every other canvas.
    ///
    /// The transfer and the erase happen under the update lock, so no other canvas can sneak a
    /// frame in between. Focus returns when the guard is released or dropped.
    pub fn focus(&self, canvas: &Canvas) -> FocusGuard {
        let _update = self.lock();
        let others: Vec<Canvas> = {
            let mut registry = self.registry();
            registry.focused = Some(canvas.id());
            registry
                .canvases
                .iter()
                .filter(|(id, _)| *id != canvas.id())
                .filter_map(|(_, weak)| weak.upgrade())
                .collect()
        };
        tracing::debug!(canvas = canvas.id(), cleared = others.len(), "canvas focused");
        for other in others {
            if let Err(err) = other.clear_unchecked() {
                tracing::warn!(canvas = other.id(), error = %err, "failed to clear unfocused canvas");
            }
        }
        FocusGuard {
            manager: self.clone(),
            canvas: canvas.id(),
            released: false,
        }
    }

    fn release(&self, canvas: CanvasId) {
        let _update = self.lock();
        let mut registry = self.registry();
        if registry.focused == Some(canvas) {
            registry.focused = None;
            tracing::debug!(canvas, "canvas focus released");
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof of focus. Releasing twice, or after focus moved elsewhere, changes nothing.
///
/// Unfocused canvases are not repainted on release; each redraws on its next `update`.
#[must_use = "focus is released as soon as the guard is dropped"]
pub struct FocusGuard {
    manager: CanvasManager,
    canvas: CanvasId,
    released: bool,
}

impl FocusGuard {
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.manager.release(self.canvas);
        }
    }
}

impl Drop for FocusGuard {
    fn drop(&mut self) {
        self.release_once();
    }
}
