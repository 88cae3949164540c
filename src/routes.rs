//! Channel-name composition and command-lifecycle fan-out.
//!
//! Channel names are `/`-delimited, case-sensitive and matched exactly; the
//! registry does no wildcarding, so fan-out happens here by expanding one
//! logical occurrence into the full set of concrete names. Producers emit a
//! single event and stay ignorant of who listens at which granularity.

use crate::types::{ExecKind, ResponseKind, TabIdChannel, TabRef};

pub(crate) const TAB_NEW: &str = "/tab/new";
pub(crate) const TAB_CLOSE: &str = "/tab/close";
pub(crate) const TAB_CLOSE_REQUEST: &str = "/tab/close/request";
pub(crate) const TAB_OFFLINE: &str = "/tab/offline";
pub(crate) const TAB_NEW_REQUEST: &str = "/tab/new/request";
pub(crate) const TAB_SWITCH_REQUEST: &str = "/tab/switch/request";
pub(crate) const COMMAND_START: &str = "/command/start";
pub(crate) const COMMAND_COMPLETE: &str = "/command/complete";

/// Start or completion side of the command lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CommandPhase {
    Start,
    Complete,
}

impl CommandPhase {
    fn base(self) -> &'static str {
        match self {
            CommandPhase::Start => COMMAND_START,
            CommandPhase::Complete => COMMAND_COMPLETE,
        }
    }
}

/// `/command/<phase>/fromuser`: every non-nested lifecycle event.
pub(crate) fn from_user(phase: CommandPhase) -> String {
    format!("{}/fromuser", phase.base())
}

/// `/command/<phase>/fromuser/<scopeId>`: scoped to one tab or split.
pub(crate) fn from_user_scoped(phase: CommandPhase, scope_id: &str) -> String {
    format!("{}/fromuser/{}", phase.base(), scope_id)
}

/// `/command/<phase>/fromuser/<tabId>/type/<kind>`: scoped to one tab and
/// one triggering mechanism.
pub(crate) fn from_user_typed(phase: CommandPhase, tab_id: &str, kind: ExecKind) -> String {
    format!("{}/fromuser/{}/type/{}", phase.base(), tab_id, kind.segment())
}

/// `/command/complete/fromuser/<responseKind>`: keyed by response shape.
pub(crate) fn response(kind: ResponseKind) -> String {
    format!("{}/fromuser/{}", COMMAND_COMPLETE, kind.segment())
}

/// `/command/complete/fromuser/<responseKind>/<scopeId>`.
pub(crate) fn response_scoped(kind: ResponseKind, scope_id: &str) -> String {
    format!("{}/fromuser/{}/{}", COMMAND_COMPLETE, kind.segment(), scope_id)
}

/// `<base>/<tabId>` form of an offline/close-request channel.
pub(crate) fn with_tab_id(channel: TabIdChannel, tab_id: &str) -> String {
    format!("{}/{}", channel.base(), tab_id)
}

/// Expand a lifecycle occurrence into every channel that must see it.
///
/// The base channel always fires. Nested executions stop there: user-scoped
/// visibility is defined by the absence of nesting. Otherwise the event
/// fans out to the `fromuser` family: unscoped, the originating split, the
/// owning tab when it differs, and the owning tab keyed by trigger kind.
pub(crate) fn command_channels(phase: CommandPhase, tab: &TabRef, kind: ExecKind) -> Vec<String> {
    let mut channels = vec![phase.base().to_string()];
    if kind == ExecKind::Nested {
        return channels;
    }

    channels.push(from_user(phase));
    channels.push(from_user_scoped(phase, tab.uuid()));

    let primary = tab.primary_id();
    if primary != tab.uuid() {
        channels.push(from_user_scoped(phase, primary));
    }
    channels.push(from_user_typed(phase, primary, kind));

    channels
}

/// Response-kind fan-out for a completion: unscoped, the originating split,
/// and the owning tab when it differs. Callers skip this for nested
/// executions.
pub(crate) fn response_channels(tab: &TabRef, kind: ResponseKind) -> Vec<String> {
    let mut channels = vec![response(kind), response_scoped(kind, tab.uuid())];

    let primary = tab.primary_id();
    if primary != tab.uuid() {
        channels.push(response_scoped(kind, primary));
    }

    channels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_start_on_plain_tab() {
        let tab = TabRef::new("tab1");
        let channels = command_channels(CommandPhase::Start, &tab, ExecKind::Normal);
        assert_eq!(
            channels,
            vec![
                "/command/start",
                "/command/start/fromuser",
                "/command/start/fromuser/tab1",
                "/command/start/fromuser/tab1/type/normal",
            ]
        );
    }

    #[test]
    fn start_on_split_fans_out_to_primary() {
        let tab = TabRef::split("T1", "P1");
        let channels = command_channels(CommandPhase::Start, &tab, ExecKind::ClickHandler);
        assert_eq!(
            channels,
            vec![
                "/command/start",
                "/command/start/fromuser",
                "/command/start/fromuser/T1",
                "/command/start/fromuser/P1",
                "/command/start/fromuser/P1/type/click",
            ]
        );
    }

    #[test]
    fn nested_stops_at_base_channel() {
        let tab = TabRef::split("T1", "P1");
        let channels = command_channels(CommandPhase::Complete, &tab, ExecKind::Nested);
        assert_eq!(channels, vec!["/command/complete"]);
    }

    #[test]
    fn response_channels_for_split() {
        let tab = TabRef::split("T1", "P1");
        let channels = response_channels(&tab, ResponseKind::MultiModal);
        assert_eq!(
            channels,
            vec![
                "/command/complete/fromuser/multimodal",
                "/command/complete/fromuser/multimodal/T1",
                "/command/complete/fromuser/multimodal/P1",
            ]
        );
    }

    #[test]
    fn response_channels_for_plain_tab() {
        let tab = TabRef::new("tab1");
        let channels = response_channels(&tab, ResponseKind::Scalar);
        assert_eq!(
            channels,
            vec![
                "/command/complete/fromuser/scalar",
                "/command/complete/fromuser/scalar/tab1",
            ]
        );
    }

    #[test]
    fn with_tab_id_forms() {
        assert_eq!(with_tab_id(TabIdChannel::Offline, "T9"), "/tab/offline/T9");
        assert_eq!(
            with_tab_id(TabIdChannel::CloseRequest, "T9"),
            "/tab/close/request/T9"
        );
    }
}
