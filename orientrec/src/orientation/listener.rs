//! Change listeners and the listener set used by every source.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use super::source::OrientationReader;
use super::state::ChangeKind;

/// Receives change notifications from an orientation source.
///
/// Implementations must be `Send + Sync`: replay sources invoke listeners on
/// their worker thread, not on the thread that registered them.
pub trait ChangeListener: Send + Sync {
    /// Called once per change, with the source that changed.
    fn on_change(&self, kind: ChangeKind, source: &dyn OrientationReader);
}

impl<F> ChangeListener for F
where
    F: Fn(ChangeKind, &dyn OrientationReader) + Send + Sync,
{
    fn on_change(&self, kind: ChangeKind, source: &dyn OrientationReader) {
        self(kind, source)
    }
}

/// Shared listener handle. Identity is the allocation, not the value.
pub type SharedListener = Arc<dyn ChangeListener>;

/// Whether two handles point at the same allocation.
pub(crate) fn same_handle<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    // Compare data pointers only; vtable pointers are not unique.
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Insertion-ordered set of listeners.
///
/// Notification iterates over a snapshot taken outside the lock, so a
/// listener may add or remove listeners (including itself) from within its
/// callback. A panicking listener is logged and skipped; the remaining
/// listeners are still notified.
#[derive(Default)]
pub struct ListenerSet {
    listeners: Mutex<Vec<SharedListener>>,
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.len())
            .finish()
    }
}

impl ListenerSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener. Returns false if it was already registered.
    pub fn add(&self, listener: SharedListener) -> bool {
        let mut listeners = self.listeners.lock();
        if listeners.iter().any(|l| same_handle(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn remove(&self, listener: &SharedListener) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|l| !same_handle(l, listener));
        listeners.len() != before
    }

    /// Whether the listener is registered.
    pub fn contains(&self, listener: &SharedListener) -> bool {
        self.listeners
            .lock()
            .iter()
            .any(|l| same_handle(l, listener))
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Whether no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notify every listener, in registration order.
    pub fn notify(&self, kind: ChangeKind, source: &dyn OrientationReader) {
        let snapshot: Vec<SharedListener> = self.listeners.lock().clone();
        for listener in snapshot {
            let result = catch_unwind(AssertUnwindSafe(|| listener.on_change(kind, source)));
            if result.is_err() {
                tracing::error!(kind = %kind, "Change listener panicked; continuing with the rest");
            }
        }
    }
}
