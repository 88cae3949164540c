//! Core event types for the shell bus.
//!
//! [`ShellEvent`] carries every structured payload the bus can route, and
//! [`Channel`] names the fixed structural channels a consumer can bind to.
//! Event types derive serde so plugins can ship them across the process
//! boundary as JSON.

use crate::routes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// How a command execution was triggered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecKind {
    /// Typed or replayed by the user.
    Normal,
    /// Triggered by a click on a UI affordance.
    ClickHandler,
    /// Programmatic execution nested inside another command.
    /// Invisible to every user-facing channel.
    Nested,
}

impl ExecKind {
    /// Channel segment for this kind.
    pub fn segment(self) -> &'static str {
        match self {
            ExecKind::Normal => "normal",
            ExecKind::ClickHandler => "click",
            ExecKind::Nested => "nested",
        }
    }
}

impl fmt::Display for ExecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// Shape of a completed command's response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseKind {
    /// Plain text or a simple table.
    Scalar,
    /// Multi-modal response rendered in a sidecar view.
    MultiModal,
    /// Navigational response (a menu of further commands).
    Nav,
}

impl ResponseKind {
    /// Channel segment for this kind.
    pub fn segment(self) -> &'static str {
        match self {
            ResponseKind::Scalar => "scalar",
            ResponseKind::MultiModal => "multimodal",
            ResponseKind::Nav => "nav",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// Identity of a tab or of a split inside a tab.
///
/// A split belongs to exactly one primary tab; lifecycle events from a split
/// fan out to both identities so a listener bound to the owning tab observes
/// events from any of its splits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabRef {
    uuid: String,
    primary: Option<String>,
}

impl TabRef {
    /// A top-level tab (its own primary).
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            primary: None,
        }
    }

    /// A split belonging to the tab `primary`.
    pub fn split(uuid: impl Into<String>, primary: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            primary: Some(primary.into()),
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// The owning tab id.
    ///
    /// Explicit for splits; otherwise derived as the id prefix before the
    /// first `_` (split ids are minted as `<tabId>_<splitId>`), which makes
    /// a non-split tab its own primary.
    pub fn primary_id(&self) -> &str {
        match &self.primary {
            Some(primary) => primary,
            None => self.uuid.split('_').next().unwrap_or(&self.uuid),
        }
    }

    /// Whether this identity is a split with a distinct owning tab.
    pub fn is_split(&self) -> bool {
        self.primary_id() != self.uuid
    }
}

/// Emitted when a command begins executing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommandStartEvent {
    /// Tab or split the command runs in.
    pub tab: TabRef,
    /// Command line as typed (or replayed).
    pub command: String,
    /// Correlates the start and completion of one execution.
    pub exec_uuid: String,
    pub exec_kind: ExecKind,
}

/// Emitted when a command finishes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommandCompleteEvent {
    /// Tab or split the command ran in.
    pub tab: TabRef,
    pub command: String,
    /// Correlates with the matching [`CommandStartEvent`].
    pub exec_uuid: String,
    pub exec_kind: ExecKind,
    pub response_kind: ResponseKind,
    /// Response body; shape depends on `response_kind`.
    pub response: Value,
    /// True if the execution was cancelled before producing output.
    pub cancelled: bool,
}

/// Every event the structured bus can carry.
///
/// Listeners receive `&ShellEvent` and match the variant of the channel they
/// subscribed to; one closed enum keeps every payload typed without a
/// per-channel callback signature.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ShellEvent {
    /// A tab was created.
    TabNew(TabRef),
    /// A tab was closed.
    TabClose(TabRef),
    /// Someone asked for a tab to close.
    TabCloseRequest {
        tab_id: String,
        tab: Option<TabRef>,
    },
    /// A tab's backing session went offline.
    TabOffline {
        tab_id: String,
        tab: Option<TabRef>,
    },
    /// Someone asked for a new tab.
    TabNewRequest,
    /// Someone asked to switch to the tab at this index.
    TabSwitchRequest(usize),
    CommandStart(CommandStartEvent),
    CommandComplete(CommandCompleteEvent),
}

impl ShellEvent {
    /// Base structural channel for this event.
    pub fn channel(&self) -> &'static str {
        match self {
            ShellEvent::TabNew(_) => routes::TAB_NEW,
            ShellEvent::TabClose(_) => routes::TAB_CLOSE,
            ShellEvent::TabCloseRequest { .. } => routes::TAB_CLOSE_REQUEST,
            ShellEvent::TabOffline { .. } => routes::TAB_OFFLINE,
            ShellEvent::TabNewRequest => routes::TAB_NEW_REQUEST,
            ShellEvent::TabSwitchRequest(_) => routes::TAB_SWITCH_REQUEST,
            ShellEvent::CommandStart(_) => routes::COMMAND_START,
            ShellEvent::CommandComplete(_) => routes::COMMAND_COMPLETE,
        }
    }
}

/// Fixed structural channels a consumer can bind to directly.
///
/// The command variants are the unscoped base channels, which see every
/// lifecycle event including nested executions; the scoped `fromuser`
/// channels are reached through the `on_*` convenience methods instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    TabNew,
    TabClose,
    TabCloseRequest,
    TabOffline,
    TabNewRequest,
    TabSwitchRequest,
    CommandStart,
    CommandComplete,
}

impl Channel {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Channel::TabNew => routes::TAB_NEW,
            Channel::TabClose => routes::TAB_CLOSE,
            Channel::TabCloseRequest => routes::TAB_CLOSE_REQUEST,
            Channel::TabOffline => routes::TAB_OFFLINE,
            Channel::TabNewRequest => routes::TAB_NEW_REQUEST,
            Channel::TabSwitchRequest => routes::TAB_SWITCH_REQUEST,
            Channel::CommandStart => routes::COMMAND_START,
            Channel::CommandComplete => routes::COMMAND_COMPLETE,
        }
    }
}

/// Structural channels that also take a per-tab parameterized form
/// (`<base>/<tabId>`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TabIdChannel {
    Offline,
    CloseRequest,
}

impl TabIdChannel {
    pub(crate) fn base(self) -> &'static str {
        match self {
            TabIdChannel::Offline => routes::TAB_OFFLINE,
            TabIdChannel::CloseRequest => routes::TAB_CLOSE_REQUEST,
        }
    }
}
