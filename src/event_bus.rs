//! The structured shell event bus.
//!
//! One [`EventBus`] is constructed at startup and passed by reference to
//! every producer and consumer; it is the only coordination point between
//! independently-rendered tabs and splits and the lifecycle of long-running
//! commands. Delivery is synchronous and fire-and-forget: no history, no
//! queue, nothing retained after a publish returns.
//!
//! Producers see only the emit methods; consumers see matched `on_*`/`off_*`
//! pairs (plus `once_*` variants). Removal matches on the exact [`Listener`]
//! handle that was registered; a structurally identical closure in a fresh
//! `Arc` silently removes nothing.

use crate::registry::{Channels, Handler};
use crate::routes::{self, CommandPhase};
use crate::types::{
    Channel, CommandCompleteEvent, CommandStartEvent, ExecKind, ResponseKind, ShellEvent,
    TabIdChannel, TabRef,
};
use std::sync::Arc;

/// Listener callback for structured bus events.
pub type Listener = Handler<ShellEvent>;

/// Wrap a closure as a [`Listener`].
///
/// Keep the returned handle if you ever want to `off_*` it later.
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&ShellEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Hierarchical publish/subscribe router for tab and command lifecycle
/// events. Process lifetime, single shared instance.
pub struct EventBus {
    channels: Channels<ShellEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            channels: Channels::new(),
        }
    }

    // === Write interface ===

    /// Publish an event on its structural channel.
    ///
    /// Command variants are routed through the full lifecycle fan-out, as if
    /// emitted through [`emit_command_start`](Self::emit_command_start) /
    /// [`emit_command_complete`](Self::emit_command_complete).
    pub fn publish(&self, event: ShellEvent) {
        match event {
            ShellEvent::CommandStart(event) => self.emit_command_start(event),
            ShellEvent::CommandComplete(event) => self.emit_command_complete(event),
            other => self.channels.publish(other.channel(), &other),
        }
    }

    /// Publish on the per-tab form (`<base>/<tabId>`) of an offline or
    /// close-request channel. Only the parameterized channel fires.
    pub fn publish_with_tab_id(&self, channel: TabIdChannel, tab_id: &str, tab: Option<TabRef>) {
        let event = match channel {
            TabIdChannel::Offline => ShellEvent::TabOffline {
                tab_id: tab_id.to_string(),
                tab,
            },
            TabIdChannel::CloseRequest => ShellEvent::TabCloseRequest {
                tab_id: tab_id.to_string(),
                tab,
            },
        };
        self.channels
            .publish(&routes::with_tab_id(channel, tab_id), &event);
    }

    /// Announce that a command started, fanning out per originating context.
    pub fn emit_command_start(&self, event: CommandStartEvent) {
        let channels = routes::command_channels(CommandPhase::Start, &event.tab, event.exec_kind);
        let payload = ShellEvent::CommandStart(event);
        for channel in &channels {
            self.channels.publish(channel, &payload);
        }
    }

    /// Announce that a command completed: the lifecycle fan-out plus, for
    /// non-nested executions, the response-kind channels.
    pub fn emit_command_complete(&self, event: CommandCompleteEvent) {
        let mut channels =
            routes::command_channels(CommandPhase::Complete, &event.tab, event.exec_kind);
        if event.exec_kind != ExecKind::Nested {
            channels.extend(routes::response_channels(&event.tab, event.response_kind));
        }
        let payload = ShellEvent::CommandComplete(event);
        for channel in &channels {
            self.channels.publish(channel, &payload);
        }
    }

    // === Read interface: fixed vocabulary ===

    pub fn on(&self, channel: Channel, listener: &Listener) {
        self.channels.subscribe(channel.name(), listener);
    }

    pub fn off(&self, channel: Channel, listener: &Listener) {
        self.channels.unsubscribe(channel.name(), listener);
    }

    pub fn once(&self, channel: Channel, listener: &Listener) {
        self.channels.subscribe_once(channel.name(), listener);
    }

    // === Read interface: command lifecycle ===

    /// Hear every user-initiated command start, whichever tab it runs in.
    pub fn on_any_command_start(&self, listener: &Listener) {
        self.channels
            .subscribe(&routes::from_user(CommandPhase::Start), listener);
    }

    pub fn off_any_command_start(&self, listener: &Listener) {
        self.channels
            .unsubscribe(&routes::from_user(CommandPhase::Start), listener);
    }

    /// Hear every user-initiated command completion.
    pub fn on_any_command_complete(&self, listener: &Listener) {
        self.channels
            .subscribe(&routes::from_user(CommandPhase::Complete), listener);
    }

    pub fn off_any_command_complete(&self, listener: &Listener) {
        self.channels
            .unsubscribe(&routes::from_user(CommandPhase::Complete), listener);
    }

    fn on_command(
        &self,
        phase: CommandPhase,
        split_id: &str,
        split_handler: &Listener,
        tab_id: Option<&str>,
        tab_handler: Option<&Listener>,
    ) {
        self.channels
            .subscribe(&routes::from_user_scoped(phase, split_id), split_handler);

        if let Some(tab_id) = tab_id {
            let handler = tab_handler.unwrap_or(split_handler);
            self.channels.subscribe(
                &routes::from_user_typed(phase, tab_id, ExecKind::ClickHandler),
                handler,
            );
        }
    }

    fn off_command(
        &self,
        phase: CommandPhase,
        split_id: &str,
        split_handler: &Listener,
        tab_id: Option<&str>,
        tab_handler: Option<&Listener>,
    ) {
        self.channels
            .unsubscribe(&routes::from_user_scoped(phase, split_id), split_handler);

        if let Some(tab_id) = tab_id {
            let handler = tab_handler.unwrap_or(split_handler);
            self.channels.unsubscribe(
                &routes::from_user_typed(phase, tab_id, ExecKind::ClickHandler),
                handler,
            );
        }
    }

    /// Hear command starts in one split, and optionally click-triggered
    /// starts anywhere in the owning tab.
    ///
    /// `tab_handler` defaults to the same handle as `split_handler` when
    /// omitted, so one callback can serve both granularities; pass a
    /// distinct handler to react differently at the tab level.
    pub fn on_command_start(
        &self,
        split_id: &str,
        split_handler: &Listener,
        tab_id: Option<&str>,
        tab_handler: Option<&Listener>,
    ) {
        self.on_command(
            CommandPhase::Start,
            split_id,
            split_handler,
            tab_id,
            tab_handler,
        );
    }

    /// Mirror of [`on_command_start`](Self::on_command_start); call with the
    /// same handles and ids to remove both registrations.
    pub fn off_command_start(
        &self,
        split_id: &str,
        split_handler: &Listener,
        tab_id: Option<&str>,
        tab_handler: Option<&Listener>,
    ) {
        self.off_command(
            CommandPhase::Start,
            split_id,
            split_handler,
            tab_id,
            tab_handler,
        );
    }

    /// One-shot: fires on the next user-initiated command start in `tab_id`.
    pub fn once_command_starts(&self, tab_id: &str, listener: &Listener) {
        self.channels.subscribe_once(
            &routes::from_user_scoped(CommandPhase::Start, tab_id),
            listener,
        );
    }

    /// Hear command completions in one split, and optionally click-triggered
    /// completions anywhere in the owning tab.
    pub fn on_command_complete(
        &self,
        split_id: &str,
        split_handler: &Listener,
        tab_id: Option<&str>,
        tab_handler: Option<&Listener>,
    ) {
        self.on_command(
            CommandPhase::Complete,
            split_id,
            split_handler,
            tab_id,
            tab_handler,
        );
    }

    pub fn off_command_complete(
        &self,
        split_id: &str,
        split_handler: &Listener,
        tab_id: Option<&str>,
        tab_handler: Option<&Listener>,
    ) {
        self.off_command(
            CommandPhase::Complete,
            split_id,
            split_handler,
            tab_id,
            tab_handler,
        );
    }

    // === Read interface: response kinds ===

    fn on_response(
        &self,
        kind: ResponseKind,
        split_id: &str,
        split_handler: &Listener,
        tab_id: Option<&str>,
        tab_handler: Option<&Listener>,
    ) {
        self.channels
            .subscribe(&routes::response_scoped(kind, split_id), split_handler);

        if let Some(tab_id) = tab_id {
            let handler = tab_handler.unwrap_or(split_handler);
            self.channels
                .subscribe(&routes::response_scoped(kind, tab_id), handler);
        }
    }

    fn off_response(
        &self,
        kind: ResponseKind,
        split_id: &str,
        split_handler: &Listener,
        tab_id: Option<&str>,
        tab_handler: Option<&Listener>,
    ) {
        self.channels
            .unsubscribe(&routes::response_scoped(kind, split_id), split_handler);

        if let Some(tab_id) = tab_id {
            let handler = tab_handler.unwrap_or(split_handler);
            self.channels
                .unsubscribe(&routes::response_scoped(kind, tab_id), handler);
        }
    }

    /// Hear scalar-response completions in one split (and optionally at the
    /// owning tab level).
    pub fn on_scalar_response(
        &self,
        split_id: &str,
        split_handler: &Listener,
        tab_id: Option<&str>,
        tab_handler: Option<&Listener>,
    ) {
        self.on_response(
            ResponseKind::Scalar,
            split_id,
            split_handler,
            tab_id,
            tab_handler,
        );
    }

    pub fn off_scalar_response(
        &self,
        split_id: &str,
        split_handler: &Listener,
        tab_id: Option<&str>,
        tab_handler: Option<&Listener>,
    ) {
        self.off_response(
            ResponseKind::Scalar,
            split_id,
            split_handler,
            tab_id,
            tab_handler,
        );
    }

    /// Hear multi-modal completions addressed to one tab.
    pub fn on_multi_modal_response(&self, tab_id: &str, handler: &Listener) {
        self.on_response(ResponseKind::MultiModal, tab_id, handler, None, None);
    }

    pub fn off_multi_modal_response(&self, tab_id: &str, handler: &Listener) {
        self.off_response(ResponseKind::MultiModal, tab_id, handler, None, None);
    }

    /// Hear navigational completions addressed to one tab.
    pub fn on_nav_response(&self, tab_id: &str, handler: &Listener) {
        self.on_response(ResponseKind::Nav, tab_id, handler, None, None);
    }

    pub fn off_nav_response(&self, tab_id: &str, handler: &Listener) {
        self.off_response(ResponseKind::Nav, tab_id, handler, None, None);
    }

    // === Read interface: per-tab parameterized channels ===

    pub fn on_with_tab_id(&self, channel: TabIdChannel, tab_id: &str, listener: &Listener) {
        self.channels
            .subscribe(&routes::with_tab_id(channel, tab_id), listener);
    }

    pub fn off_with_tab_id(&self, channel: TabIdChannel, tab_id: &str, listener: &Listener) {
        self.channels
            .unsubscribe(&routes::with_tab_id(channel, tab_id), listener);
    }

    pub fn once_with_tab_id(&self, channel: TabIdChannel, tab_id: &str, listener: &Listener) {
        self.channels
            .subscribe_once(&routes::with_tab_id(channel, tab_id), listener);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Hook one listener up to the family of standard user interaction events:
/// new tab, tab switch request, any user command completion. Sugar for the
/// common "refresh my UI state on any notable interaction" case.
pub fn wire_to_standard_events(bus: &EventBus, listener: &Listener) {
    bus.on(Channel::TabNew, listener);
    bus.on(Channel::TabSwitchRequest, listener);
    bus.on_any_command_complete(listener);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (Listener, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (
            listener(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
            count,
        )
    }

    fn start_event(tab: TabRef, exec_kind: ExecKind) -> CommandStartEvent {
        CommandStartEvent {
            tab,
            command: "ls -l".to_string(),
            exec_uuid: "exec-1".to_string(),
            exec_kind,
        }
    }

    fn complete_event(
        tab: TabRef,
        exec_kind: ExecKind,
        response_kind: ResponseKind,
    ) -> CommandCompleteEvent {
        CommandCompleteEvent {
            tab,
            command: "ls -l".to_string(),
            exec_uuid: "exec-1".to_string(),
            exec_kind,
            response_kind,
            response: json!({"rows": 3}),
            cancelled: false,
        }
    }

    #[test]
    fn fan_out_completeness_for_split_start() {
        let bus = EventBus::new();
        let (any, any_count) = counting();
        let (split, split_count) = counting();
        let (primary, primary_count) = counting();
        let (typed, typed_count) = counting();
        let (dummy, _) = counting();

        bus.on_any_command_start(&any);
        bus.on_command_start("T1", &split, None, None);
        bus.on_command_start("P1", &primary, None, None);
        // Tab-level binding lands on /command/start/fromuser/P1/type/click.
        bus.on_command_start("elsewhere", &dummy, Some("P1"), Some(&typed));

        bus.emit_command_start(start_event(
            TabRef::split("T1", "P1"),
            ExecKind::ClickHandler,
        ));

        assert_eq!(any_count.load(Ordering::SeqCst), 1);
        assert_eq!(split_count.load(Ordering::SeqCst), 1);
        assert_eq!(primary_count.load(Ordering::SeqCst), 1);
        assert_eq!(typed_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nested_execution_reaches_only_base_channel() {
        let bus = EventBus::new();
        let (base, base_count) = counting();
        let (any, any_count) = counting();
        let (split, split_count) = counting();

        bus.on(Channel::CommandStart, &base);
        bus.on_any_command_start(&any);
        bus.on_command_start("T1", &split, Some("P1"), None);

        bus.emit_command_start(start_event(TabRef::split("T1", "P1"), ExecKind::Nested));

        assert_eq!(base_count.load(Ordering::SeqCst), 1);
        assert_eq!(any_count.load(Ordering::SeqCst), 0);
        assert_eq!(split_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn response_kind_isolation_on_same_tab() {
        let bus = EventBus::new();
        let (scalar, scalar_count) = counting();
        let (mmr, mmr_count) = counting();
        let (nav, nav_count) = counting();

        bus.on_scalar_response("T1", &scalar, None, None);
        bus.on_multi_modal_response("T1", &mmr);
        bus.on_nav_response("T1", &nav);

        bus.emit_command_complete(complete_event(
            TabRef::new("T1"),
            ExecKind::Normal,
            ResponseKind::Scalar,
        ));

        assert_eq!(scalar_count.load(Ordering::SeqCst), 1);
        assert_eq!(mmr_count.load(Ordering::SeqCst), 0);
        assert_eq!(nav_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn completion_fans_out_to_primary_response_channel() {
        let bus = EventBus::new();
        let (at_split, split_count) = counting();
        let (at_tab, tab_count) = counting();

        bus.on_scalar_response("T1", &at_split, None, None);
        bus.on_scalar_response("P1", &at_tab, None, None);

        bus.emit_command_complete(complete_event(
            TabRef::split("T1", "P1"),
            ExecKind::Normal,
            ResponseKind::Scalar,
        ));

        assert_eq!(split_count.load(Ordering::SeqCst), 1);
        assert_eq!(tab_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn split_and_tab_handlers_fire_once_each() {
        let bus = EventBus::new();
        let (h1, h1_count) = counting();
        let (h2, h2_count) = counting();

        bus.on_command_start("T1", &h1, Some("P1"), Some(&h2));

        bus.emit_command_start(start_event(
            TabRef::split("T1", "P1"),
            ExecKind::ClickHandler,
        ));

        // One split-level and one tab-level invocation, not both handlers
        // at both levels: the default aliasing was overridden for the tab.
        assert_eq!(h1_count.load(Ordering::SeqCst), 1);
        assert_eq!(h2_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tab_handler_defaults_to_split_handler() {
        let bus = EventBus::new();
        let (h, count) = counting();

        bus.on_command_start("T1", &h, Some("P1"), None);

        bus.emit_command_start(start_event(
            TabRef::split("T1", "P1"),
            ExecKind::ClickHandler,
        ));

        // Same handle registered at both granularities.
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn tab_level_binding_is_click_scoped() {
        let bus = EventBus::new();
        let (h1, h1_count) = counting();
        let (h2, h2_count) = counting();

        bus.on_command_start("T1", &h1, Some("P1"), Some(&h2));

        bus.emit_command_start(start_event(TabRef::split("T1", "P1"), ExecKind::Normal));

        assert_eq!(h1_count.load(Ordering::SeqCst), 1);
        assert_eq!(h2_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn off_command_start_removes_both_registrations() {
        let bus = EventBus::new();
        let (h1, h1_count) = counting();
        let (h2, h2_count) = counting();

        bus.on_command_start("T1", &h1, Some("P1"), Some(&h2));
        bus.off_command_start("T1", &h1, Some("P1"), Some(&h2));

        bus.emit_command_start(start_event(
            TabRef::split("T1", "P1"),
            ExecKind::ClickHandler,
        ));

        assert_eq!(h1_count.load(Ordering::SeqCst), 0);
        assert_eq!(h2_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn off_any_command_complete_removes_listener() {
        let bus = EventBus::new();
        let (h, count) = counting();

        bus.on_any_command_complete(&h);
        bus.off_any_command_complete(&h);

        bus.emit_command_complete(complete_event(
            TabRef::new("T1"),
            ExecKind::Normal,
            ResponseKind::Scalar,
        ));

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn once_command_starts_fires_once() {
        let bus = EventBus::new();
        let (h, count) = counting();

        bus.once_command_starts("T1", &h);

        bus.emit_command_start(start_event(TabRef::new("T1"), ExecKind::Normal));
        bus.emit_command_start(start_event(TabRef::new("T1"), ExecKind::Normal));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn with_tab_id_hits_only_the_parameterized_channel() {
        let bus = EventBus::new();
        let (scoped, scoped_count) = counting();
        let (plain, plain_count) = counting();
        let (wrong_channel, wrong_count) = counting();

        bus.on_with_tab_id(TabIdChannel::Offline, "T9", &scoped);
        bus.on(Channel::TabOffline, &plain);
        bus.on_with_tab_id(TabIdChannel::CloseRequest, "T9", &wrong_channel);

        bus.publish_with_tab_id(TabIdChannel::Offline, "T9", Some(TabRef::new("T9")));

        assert_eq!(scoped_count.load(Ordering::SeqCst), 1);
        assert_eq!(plain_count.load(Ordering::SeqCst), 0);
        assert_eq!(wrong_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn once_with_tab_id_fires_once() {
        let bus = EventBus::new();
        let (h, count) = counting();

        bus.once_with_tab_id(TabIdChannel::CloseRequest, "T9", &h);

        bus.publish_with_tab_id(TabIdChannel::CloseRequest, "T9", None);
        bus.publish_with_tab_id(TabIdChannel::CloseRequest, "T9", None);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn publish_routes_command_variants_through_fan_out() {
        let bus = EventBus::new();
        let (h, count) = counting();

        bus.on_any_command_start(&h);
        bus.publish(ShellEvent::CommandStart(start_event(
            TabRef::new("T1"),
            ExecKind::Normal,
        )));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_receives_typed_payload() {
        let bus = EventBus::new();
        let seen = Arc::new(std::sync::Mutex::new(None));
        let sink = Arc::clone(&seen);

        let h = listener(move |event| {
            if let ShellEvent::CommandStart(start) = event {
                *sink.lock().unwrap() =
                    Some((start.tab.uuid().to_string(), start.command.clone()));
            }
        });
        bus.on_command_start("T1", &h, None, None);

        bus.emit_command_start(start_event(TabRef::new("T1"), ExecKind::Normal));

        let seen = seen.lock().unwrap();
        assert_eq!(
            seen.clone(),
            Some(("T1".to_string(), "ls -l".to_string()))
        );
    }

    #[test]
    fn wire_to_standard_events_covers_the_family() {
        let bus = EventBus::new();
        let (h, count) = counting();

        wire_to_standard_events(&bus, &h);

        bus.publish(ShellEvent::TabNew(TabRef::new("T1")));
        bus.publish(ShellEvent::TabSwitchRequest(2));
        bus.emit_command_complete(complete_event(
            TabRef::new("T1"),
            ExecKind::Normal,
            ResponseKind::Scalar,
        ));

        assert_eq!(count.load(Ordering::SeqCst), 3);

        // Nested completions are not a notable user interaction.
        bus.emit_command_complete(complete_event(
            TabRef::new("T1"),
            ExecKind::Nested,
            ResponseKind::Scalar,
        ));
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn tab_lifecycle_on_off_once() {
        let bus = EventBus::new();
        let (h, count) = counting();
        let (once_h, once_count) = counting();

        bus.on(Channel::TabNew, &h);
        bus.once(Channel::TabNew, &once_h);

        bus.publish(ShellEvent::TabNew(TabRef::new("T1")));
        bus.publish(ShellEvent::TabNew(TabRef::new("T2")));

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(once_count.load(Ordering::SeqCst), 1);

        bus.off(Channel::TabNew, &h);
        bus.publish(ShellEvent::TabNew(TabRef::new("T3")));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
