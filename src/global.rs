//! Unscoped broadcast channel for ad hoc signals.
//!
//! Escape hatch for collaborators whose signaling falls outside the
//! tab/command vocabulary: any string channel, any JSON payload, agreed
//! out-of-band between one producer and its consumers. The shell uses this
//! for things like a screenshot component listening on
//! `/screenshot/element`, or a config-mutating command wrapper broadcasting
//! `/kubectl/config/change` to whoever watches config state.
//!
//! Delivery semantics are the registry's: synchronous, registration order,
//! silent no-op with no listeners. There is no fan-out and no structure;
//! a channel name means exactly what its two parties agree it means.

use crate::registry::{Channels, Handler};
use serde_json::Value;
use std::sync::Arc;

/// Listener callback for broadcast payloads.
pub type BroadcastListener = Handler<Value>;

/// Wrap a closure as a [`BroadcastListener`].
pub fn broadcast_listener<F>(f: F) -> BroadcastListener
where
    F: Fn(&Value) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Free-form counterpart to [`EventBus`](crate::EventBus).
///
/// Constructed once at startup alongside the structured bus and shared the
/// same way.
pub struct GlobalChannel {
    channels: Channels<Value>,
}

impl GlobalChannel {
    pub fn new() -> Self {
        Self {
            channels: Channels::new(),
        }
    }

    pub fn publish(&self, channel: &str, payload: &Value) {
        self.channels.publish(channel, payload);
    }

    pub fn on(&self, channel: &str, listener: &BroadcastListener) {
        self.channels.subscribe(channel, listener);
    }

    pub fn off(&self, channel: &str, listener: &BroadcastListener) {
        self.channels.unsubscribe(channel, listener);
    }

    pub fn once(&self, channel: &str, listener: &BroadcastListener) {
        self.channels.subscribe_once(channel, listener);
    }
}

impl Default for GlobalChannel {
    fn default() -> Self {
        Self::new()
    }
}
