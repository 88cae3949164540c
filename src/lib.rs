//! Event bus for the TidalShell terminal client.
//!
//! Decouples the command executor, tab manager, and plugin-hosted views
//! behind two delivery surfaces: a structured [`EventBus`] whose channels
//! carry typed [`ShellEvent`] payloads and fan command-lifecycle events out
//! by tab, split, and trigger kind, and a free-form [`GlobalChannel`] for ad
//! hoc JSON signals between loosely coupled collaborators.
//!
//! Both are plain values with interior locking; construct them once at
//! startup and hand references to whoever needs them. Delivery is
//! synchronous and in registration order, a listener panic is logged and
//! contained, and removal requires the same [`Listener`] handle that was
//! registered.

mod event_bus;
mod global;
mod registry;
mod routes;
mod types;

pub use event_bus::{EventBus, Listener, listener, wire_to_standard_events};
pub use global::{BroadcastListener, GlobalChannel, broadcast_listener};
pub use registry::{Channels, DEFAULT_MAX_LISTENERS, Handler};
pub use types::{
    Channel, CommandCompleteEvent, CommandStartEvent, ExecKind, ResponseKind, ShellEvent,
    TabIdChannel, TabRef,
};
