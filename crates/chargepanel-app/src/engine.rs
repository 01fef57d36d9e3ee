//! Engine - orchestration state shared by every shell
//!
//! The Engine owns the panel state, the message channel, the shutdown signal,
//! the write transport and the DOM binding. Shells feed it push snapshots and
//! operator commands; it applies them one at a time and flushes the resulting
//! DOM operations to the binding.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};

use chargepanel_core::prelude::*;
use chargepanel_core::{ModuleAvailability, PushEvent, Topic};
use chargepanel_device::{PushChannel, Transport};

use crate::config::Settings;
use crate::dom::{ids, DomBinding, Prop};
use crate::edit::EditState;
use crate::message::Message;
use crate::process;
use crate::render;
use crate::state::PanelState;

/// Capacity of the message channel
const MESSAGE_CHANNEL_CAPACITY: usize = 256;

/// Latest snapshot per topic that found the message channel full
type ParkedSnapshots = Arc<Mutex<HashMap<Topic, PushEvent>>>;

/// Orchestration engine for the charge manager panel.
///
/// Mutation of [`PanelState`] happens only inside [`Engine::process_message`];
/// pushes and write completions arrive through `msg_tx` and are applied in
/// arrival order.
pub struct Engine<T, B> {
    /// Panel state (the Model)
    pub state: PanelState,

    /// Sender half of the unified message channel.
    /// Clone this to give to input sources (push listeners, signal handler, stdin).
    pub msg_tx: mpsc::Sender<Message>,

    /// Receiver half of the unified message channel.
    pub msg_rx: mpsc::Receiver<Message>,

    /// Sender for the shutdown signal. Send `true` to stop background feeds.
    pub shutdown_tx: watch::Sender<bool>,

    /// Receiver for the shutdown signal. Clone for background tasks.
    pub shutdown_rx: watch::Receiver<bool>,

    transport: Arc<T>,

    /// Snapshots waiting for room in the channel, newest per topic
    parked: ParkedSnapshots,

    /// Where DOM operations end up
    pub binding: B,

    /// Loaded settings
    pub settings: Settings,
}

impl<T, B> Engine<T, B>
where
    T: Transport + Send + Sync + 'static,
    B: DomBinding,
{
    pub fn new(transport: T, binding: B, settings: Settings) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel::<Message>(MESSAGE_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            state: PanelState::new(),
            msg_tx,
            msg_rx,
            shutdown_tx,
            shutdown_rx,
            transport: Arc::new(transport),
            parked: ParkedSnapshots::default(),
            binding,
            settings,
        }
    }

    /// Render the initial control state. Callable once.
    ///
    /// Both save buttons start disabled, the confirmation mark hidden, and
    /// the status section hidden until a snapshot reports chargers.
    pub fn init(&mut self) -> Result<()> {
        if self.state.initialized {
            return Err(Error::AlreadyInitialized);
        }
        self.state.initialized = true;

        let dom = &mut self.state.dom;
        render::render_save_button(dom, EditState::Clean);
        render::render_available_current_control(dom, &self.state.available_current);
        dom.set(ids::STATUS_SECTION, Prop::Hidden(true));
        dom.set(ids::AVAILABLE_CURRENT_FORM, Prop::Hidden(true));

        info!("Panel initialized");
        self.flush_render();
        Ok(())
    }

    /// Subscribe the panel to its topics on `channel`.
    ///
    /// Listeners decode the payload and queue it; malformed payloads are
    /// logged and dropped. A snapshot that finds the channel full is parked
    /// until the engine drains it, replacing any older one for its topic.
    pub fn add_event_listeners(&self, channel: &PushChannel) {
        for topic in Topic::PANEL {
            self.forward_topic(channel, topic);
        }
    }

    /// Subscribe to the shell's module availability topic
    pub fn add_module_listener(&self, channel: &PushChannel) {
        self.forward_topic(channel, Topic::Modules);
    }

    fn forward_topic(&self, channel: &PushChannel, topic: Topic) {
        let tx = self.msg_tx.clone();
        let parked = Arc::clone(&self.parked);
        channel.add_listener(topic.as_str(), move |data: &str| {
            match PushEvent::decode(topic.as_str(), data) {
                Ok(Some(event)) => forward_snapshot(&tx, &parked, topic, event),
                Ok(None) => {}
                Err(e) => warn!("Dropping malformed push: {}", e),
            }
        });
        debug!("Listening on {}", topic);
    }

    /// Show or hide the panel's navigation entry
    pub fn update_lock_state(&mut self, modules: ModuleAvailability) {
        self.process_message(Message::LockStateChanged(modules));
        self.flush_render();
    }

    /// Process a single message through the TEA update cycle
    pub fn process_message(&mut self, msg: Message) {
        process::process_message(&mut self.state, msg, &self.msg_tx, &self.transport);
    }

    /// Hand queued DOM operations to the binding. Returns how many were applied.
    pub fn flush_render(&mut self) -> usize {
        let ops = self.state.dom.take_ops();
        for op in &ops {
            self.binding.apply(op);
        }
        if !ops.is_empty() {
            trace!("Flushed {} DOM operation(s)", ops.len());
        }
        ops.len()
    }

    /// Drain and process all pending messages from the channel, then any
    /// parked snapshots.
    ///
    /// Returns the number of messages processed.
    pub fn drain_pending_messages(&mut self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.process_message(msg);
            count += 1;
        }
        for event in self.take_parked() {
            self.process_message(Message::Push(event));
            count += 1;
        }
        if count > 0 {
            self.flush_render();
        }
        count
    }

    /// Process messages until a quit is requested or every sender is gone
    pub async fn run(&mut self) {
        while !self.should_quit() {
            let Some(msg) = self.msg_rx.recv().await else {
                warn!("Message channel closed");
                break;
            };
            self.process_message(msg);
            self.drain_pending_messages();
            self.flush_render();
        }
    }

    fn take_parked(&self) -> Vec<PushEvent> {
        let mut parked = match self.parked.lock() {
            Ok(parked) => parked,
            Err(poisoned) => poisoned.into_inner(),
        };
        [
            Topic::ManagerConfig,
            Topic::ManagerState,
            Topic::AvailableCurrent,
            Topic::Modules,
        ]
        .iter()
        .filter_map(|topic| parked.remove(topic))
        .collect()
    }

    /// Get a clone of the message sender for spawning input sources.
    pub fn msg_sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    /// Get a clone of the shutdown receiver for background tasks.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn should_quit(&self) -> bool {
        self.state.should_quit()
    }

    /// Signal background feeds to stop
    pub fn shutdown(&mut self) {
        info!("Shutting down");
        let _ = self.shutdown_tx.send(true);
    }
}

/// Queue a decoded snapshot, parking it if the channel is full.
///
/// A snapshot that makes it into the channel supersedes whatever was parked
/// for its topic.
fn forward_snapshot(
    tx: &mpsc::Sender<Message>,
    parked: &ParkedSnapshots,
    topic: Topic,
    event: PushEvent,
) {
    let mut parked = match parked.lock() {
        Ok(parked) => parked,
        Err(poisoned) => poisoned.into_inner(),
    };
    match tx.try_send(Message::Push(event)) {
        Ok(()) => {
            parked.remove(&topic);
        }
        Err(TrySendError::Full(Message::Push(event))) => {
            error!("Message channel full; parking latest {} snapshot", topic);
            parked.insert(topic, event);
        }
        Err(TrySendError::Full(_)) => {}
        Err(TrySendError::Closed(_)) => warn!("Dropping {} snapshot: engine stopped", topic),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementTree;
    use chargepanel_device::test_utils::RecordingTransport;

    fn engine() -> Engine<RecordingTransport, ElementTree> {
        Engine::new(
            RecordingTransport::new(),
            ElementTree::with_panel_skeleton(),
            Settings::default(),
        )
    }

    #[test]
    fn test_init_disables_save_buttons() {
        let mut engine = engine();

        engine.init().unwrap();

        assert!(engine.binding.is_disabled(ids::SAVE_BUTTON));
        assert!(engine.binding.is_disabled(ids::AVAILABLE_CURRENT_SAVE));
        assert!(engine.binding.is_hidden(ids::STATUS_SECTION));
    }

    #[test]
    fn test_init_twice_fails() {
        let mut engine = engine();
        engine.init().unwrap();

        assert!(matches!(engine.init(), Err(Error::AlreadyInitialized)));
    }

    #[test]
    fn test_lock_state_only_touches_sidebar() {
        let mut engine = engine();
        engine.init().unwrap();
        let before = engine.binding.mutation_count();

        engine.update_lock_state(ModuleAvailability {
            charge_manager: false,
        });

        assert!(engine.binding.is_hidden(ids::SIDEBAR));
        assert_eq!(engine.binding.mutation_count(), before + 1);
    }

    #[test]
    fn test_listeners_queue_decoded_snapshots() {
        let mut engine = engine();
        let channel = PushChannel::new();
        engine.add_event_listeners(&channel);

        channel.dispatch("charge_manager/available_current", r#"{"current": 8000}"#);
        channel.dispatch("charge_manager/state", "not json");

        assert_eq!(engine.drain_pending_messages(), 1);
        assert_eq!(engine.binding.value(ids::AVAILABLE_CURRENT), Some("8.000"));
    }

    #[test]
    fn test_panel_listeners_ignore_module_topic() {
        let engine = engine();
        let channel = PushChannel::new();

        engine.add_event_listeners(&channel);

        assert_eq!(channel.dispatch("info/modules", "{}"), 0);
        assert_eq!(channel.topics().len(), 3);
    }

    fn config_json(minimum_current: u32) -> String {
        serde_json::json!({
            "enable_charge_manager": true,
            "enable_watchdog": false,
            "verbose": false,
            "default_available_current": 32_000,
            "maximum_available_current": 40_000,
            "minimum_current": minimum_current,
            "chargers": [{ "host": "10.0.0.2", "name": "Garage" }]
        })
        .to_string()
    }

    fn fill_channel(engine: &Engine<RecordingTransport, ElementTree>) {
        for _ in 0..MESSAGE_CHANNEL_CAPACITY {
            engine
                .msg_tx
                .try_send(Message::DismissAlert {
                    id: "filler".to_string(),
                })
                .unwrap();
        }
    }

    #[test]
    fn test_full_channel_parks_latest_config() {
        let mut engine = engine();
        let channel = PushChannel::new();
        engine.add_event_listeners(&channel);
        fill_channel(&engine);

        channel.dispatch("charge_manager/config", &config_json(6_000));
        channel.dispatch("charge_manager/config", &config_json(8_000));

        assert_eq!(
            engine.drain_pending_messages(),
            MESSAGE_CHANNEL_CAPACITY + 1
        );
        assert_eq!(engine.binding.value(ids::MINIMUM_CURRENT), Some("8.000"));
        assert_eq!(engine.drain_pending_messages(), 0);
    }

    #[test]
    fn test_queued_snapshot_supersedes_parked_one() {
        let mut engine = engine();
        let channel = PushChannel::new();
        engine.add_event_listeners(&channel);
        fill_channel(&engine);

        channel.dispatch("charge_manager/config", &config_json(6_000));
        let filler = engine.msg_rx.try_recv().unwrap();
        engine.process_message(filler);
        channel.dispatch("charge_manager/config", &config_json(10_000));

        engine.drain_pending_messages();

        assert_eq!(engine.binding.value(ids::MINIMUM_CURRENT), Some("10.000"));
    }
}
