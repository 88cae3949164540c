//! Named-channel dispatch table.
//!
//! The registry maps exact channel names to ordered listener lists and
//! delivers published payloads synchronously, in registration order. It is
//! the foundation both the structured bus and the global broadcast channel
//! are built on; neither layer adds delivery semantics of its own.
//!
//! Re-entrancy rule: `publish` snapshots the listener list at call time, so
//! a listener that subscribes or unsubscribes during delivery only affects
//! subsequent publishes, never the one in flight.

use log::{error, trace, warn};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

/// Listener callback stored in the registry.
///
/// Removal matches on the `Arc` allocation (`Arc::ptr_eq`), so callers must
/// keep the handle they registered with and pass that same handle back.
pub type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Per-channel listener count above which subscribing logs a warning.
/// The subscribe still succeeds; this is a leak diagnostic, not a limit.
pub const DEFAULT_MAX_LISTENERS: usize = 100;

struct Registration<T> {
    handler: Handler<T>,
    once: bool,
}

/// Channel name → ordered listeners, shared across threads.
///
/// The lock is held only while the table is read or mutated, never across a
/// listener invocation, so listeners may freely call back into the registry.
pub struct Channels<T> {
    inner: Mutex<HashMap<String, Vec<Registration<T>>>>,
    max_listeners: usize,
}

impl<T> Channels<T> {
    pub fn new() -> Self {
        Self::with_max_listeners(DEFAULT_MAX_LISTENERS)
    }

    /// Registry with a custom listener-count warning ceiling.
    pub fn with_max_listeners(max_listeners: usize) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            max_listeners,
        }
    }

    /// Append a listener to `channel`.
    /// Subscribing the same handle twice is allowed and fires it twice.
    pub fn subscribe(&self, channel: &str, handler: &Handler<T>) {
        self.add(channel, handler, false);
    }

    /// Append a listener that is removed after its first delivery.
    /// If the channel is never published to, it stays registered.
    pub fn subscribe_once(&self, channel: &str, handler: &Handler<T>) {
        self.add(channel, handler, true);
    }

    fn add(&self, channel: &str, handler: &Handler<T>, once: bool) {
        let mut inner = self.lock();
        let regs = inner.entry(channel.to_string()).or_default();
        regs.push(Registration {
            handler: Arc::clone(handler),
            once,
        });
        if regs.len() > self.max_listeners {
            warn!(
                "channel {} has {} listeners (warning ceiling is {}); possible listener leak",
                channel,
                regs.len(),
                self.max_listeners
            );
        }
    }

    /// Remove the first registration of `handler` on `channel`.
    /// Unknown channel or handler is a silent no-op.
    pub fn unsubscribe(&self, channel: &str, handler: &Handler<T>) {
        let mut inner = self.lock();
        if let Some(regs) = inner.get_mut(channel) {
            if let Some(pos) = regs
                .iter()
                .position(|r| Arc::ptr_eq(&r.handler, handler))
            {
                regs.remove(pos);
            }
        }
    }

    /// Deliver `payload` to every listener currently on `channel`, in
    /// registration order. No listeners is a silent no-op.
    ///
    /// One-shot registrations are dropped from the live set when the
    /// snapshot is taken, so they fire at most once even if a listener
    /// re-publishes the same channel re-entrantly. A panicking listener is
    /// caught and logged; delivery continues with the next listener.
    pub fn publish(&self, channel: &str, payload: &T) {
        let snapshot: Vec<Handler<T>> = {
            let mut inner = self.lock();
            match inner.get_mut(channel) {
                Some(regs) => {
                    let snapshot = regs.iter().map(|r| Arc::clone(&r.handler)).collect();
                    regs.retain(|r| !r.once);
                    snapshot
                }
                None => return,
            }
        };

        trace!("publish {} -> {} listener(s)", channel, snapshot.len());

        for handler in snapshot {
            if panic::catch_unwind(AssertUnwindSafe(|| handler(payload))).is_err() {
                error!(
                    "listener on {} panicked; continuing delivery to remaining listeners",
                    channel
                );
            }
        }
    }

    /// Number of listeners currently registered on `channel`.
    pub fn listener_count(&self, channel: &str) -> usize {
        self.lock().get(channel).map(Vec::len).unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Registration<T>>>> {
        // A poisoned lock only means a panic elsewhere while holding it;
        // the table itself is still consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for Channels<T> {
    fn default() -> Self {
        Self::new()
    }
}
