//! Integration tests: push snapshots and operator commands through the engine
//!
//! Drives the full panel (engine, handlers, write tasks) against a recording
//! transport and an in-memory page.

use std::time::Duration;

use serde_json::json;

use chargepanel_app::alerts::{self, DEVICE_BUSY_MESSAGE};
use chargepanel_app::config::Settings;
use chargepanel_app::dom::ids;
use chargepanel_app::form::FormField;
use chargepanel_app::{CurrentPreset, ElementTree, Engine, Message};
use chargepanel_device::test_utils::RecordingTransport;
use chargepanel_device::{PushChannel, AVAILABLE_CURRENT_UPDATE_PATH, CONFIG_UPDATE_PATH};

type TestEngine = Engine<RecordingTransport, ElementTree>;

fn setup(transport: RecordingTransport) -> (TestEngine, PushChannel) {
    let mut engine = Engine::new(
        transport,
        ElementTree::with_panel_skeleton(),
        Settings::default(),
    );
    engine.init().unwrap();

    let channel = PushChannel::new();
    engine.add_event_listeners(&channel);
    (engine, channel)
}

fn state_payload(count: usize, allocated: u32) -> String {
    let chargers: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "name": format!("Charger {}", i),
                "last_update": 90_000,
                "uptime": 30_000,
                "supported_current": 32_000,
                "allowed_current": 16_000,
                "wants_to_charge": true,
                "wants_to_charge_low_priority": false,
                "is_charging": true,
                "last_sent_config": 89_000,
                "allocated_current": allocated,
                "state": 3,
                "error": 0
            })
        })
        .collect();

    json!({ "state": 1, "uptime": 90_000, "chargers": chargers }).to_string()
}

fn config_payload(count: usize, minimum_current: u32) -> String {
    let chargers: Vec<_> = (0..count)
        .map(|i| json!({ "host": format!("10.0.0.{}", i + 2), "name": format!("Charger {}", i) }))
        .collect();

    json!({
        "enable_charge_manager": true,
        "enable_watchdog": false,
        "verbose": false,
        "default_available_current": 32_000,
        "maximum_available_current": 40_000,
        "minimum_current": minimum_current,
        "chargers": chargers
    })
    .to_string()
}

/// Process operator messages and flush them to the page
fn operate(engine: &mut TestEngine, messages: impl IntoIterator<Item = Message>) {
    for msg in messages {
        engine.process_message(msg);
    }
    engine.flush_render();
}

/// Wait for one write completion and apply it
async fn settle(engine: &mut TestEngine) {
    let msg = tokio::time::timeout(Duration::from_secs(1), engine.msg_rx.recv())
        .await
        .expect("no completion arrived")
        .expect("channel closed");
    engine.process_message(msg);
    engine.flush_render();
}

#[tokio::test]
async fn test_constant_length_pushes_never_rebuild() {
    let (mut engine, channel) = setup(RecordingTransport::new());

    channel.dispatch("charge_manager/state", &state_payload(3, 6_000));
    engine.drain_pending_messages();
    assert_eq!(engine.binding.rebuild_count(), 1);
    assert_eq!(engine.binding.children(ids::STATUS_CHARGERS).len(), 2);

    for allocated in [7_000, 8_000, 9_000] {
        channel.dispatch("charge_manager/state", &state_payload(3, allocated));
        engine.drain_pending_messages();
    }
    assert_eq!(engine.binding.rebuild_count(), 1);
    assert_eq!(
        engine
            .binding
            .text(&ids::status_card(2, "info")),
        Some("9.000 A allocated")
    );

    channel.dispatch("charge_manager/state", &state_payload(4, 9_000));
    engine.drain_pending_messages();
    assert_eq!(engine.binding.rebuild_count(), 2);
    assert!(engine.binding.contains(&ids::status_card(3, "card")));
}

#[tokio::test]
async fn test_duplicate_snapshot_does_not_touch_page() {
    let (mut engine, channel) = setup(RecordingTransport::new());
    channel.dispatch("charge_manager/state", &state_payload(2, 6_000));
    channel.dispatch("charge_manager/config", &config_payload(2, 6_000));
    engine.drain_pending_messages();
    let before = engine.binding.mutation_count();

    channel.dispatch("charge_manager/state", &state_payload(2, 6_000));
    channel.dispatch("charge_manager/config", &config_payload(2, 6_000));
    engine.drain_pending_messages();

    assert_eq!(engine.binding.mutation_count(), before);
}

#[tokio::test]
async fn test_roster_at_cap_shows_limit_note() {
    let (mut engine, channel) = setup(RecordingTransport::new());

    channel.dispatch("charge_manager/config", &config_payload(10, 6_000));
    engine.drain_pending_messages();

    assert!(engine.binding.is_hidden(ids::ADD_CHARGER));
    assert!(!engine.binding.is_hidden(ids::ADD_CHARGER_DISABLED));

    operate(&mut engine, [Message::RemoveCharger { index: 4 }]);

    assert!(!engine.binding.is_hidden(ids::ADD_CHARGER));
    assert!(engine.binding.is_hidden(ids::ADD_CHARGER_DISABLED));
    assert_eq!(
        engine.binding.value(&ids::roster_entry(4, "host")),
        Some("10.0.0.7")
    );
}

#[tokio::test]
async fn test_dirty_form_survives_config_push_until_saved() {
    let transport = RecordingTransport::new();
    let (mut engine, channel) = setup(transport.clone());
    channel.dispatch("charge_manager/config", &config_payload(2, 6_000));
    engine.drain_pending_messages();
    assert_eq!(engine.binding.value(ids::MINIMUM_CURRENT), Some("6.000"));

    operate(
        &mut engine,
        [Message::FieldEdited {
            field: FormField::MinimumCurrent,
            value: "8".to_string(),
        }],
    );
    assert!(!engine.binding.is_disabled(ids::SAVE_BUTTON));

    channel.dispatch("charge_manager/config", &config_payload(2, 10_000));
    engine.drain_pending_messages();
    assert_eq!(engine.binding.value(ids::MINIMUM_CURRENT), Some("6.000"));

    operate(&mut engine, [Message::SubmitConfig]);
    settle(&mut engine).await;

    let writes = transport.writes_to(CONFIG_UPDATE_PATH);
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0]["minimum_current"], 8_000);
    assert!(engine.binding.is_disabled(ids::SAVE_BUTTON));
    assert!(engine.binding.is_modal_open(ids::REBOOT_MODAL));

    // Clean again: the next push is applied
    channel.dispatch("charge_manager/config", &config_payload(2, 8_000));
    engine.drain_pending_messages();
    assert_eq!(engine.binding.value(ids::MINIMUM_CURRENT), Some("8.000"));
}

#[tokio::test]
async fn test_edit_during_save_keeps_save_enabled() {
    let transport = RecordingTransport::gated();
    let (mut engine, channel) = setup(transport.clone());
    channel.dispatch("charge_manager/config", &config_payload(1, 6_000));
    engine.drain_pending_messages();

    operate(
        &mut engine,
        [
            Message::FieldEdited {
                field: FormField::Verbose,
                value: "on".to_string(),
            },
            Message::SubmitConfig,
            Message::FieldEdited {
                field: FormField::EnableWatchdog,
                value: "on".to_string(),
            },
        ],
    );

    transport.release(1);
    settle(&mut engine).await;

    assert!(!engine.binding.is_disabled(ids::SAVE_BUTTON));
    assert!(engine.state.edit.is_dirty());
}

#[tokio::test]
async fn test_busy_device_reports_vehicle_connected() {
    let transport = RecordingTransport::new();
    transport.fail_next(423, "");
    let (mut engine, channel) = setup(transport.clone());
    channel.dispatch("charge_manager/config", &config_payload(1, 6_000));
    channel.dispatch("charge_manager/state", &state_payload(1, 6_000));
    engine.drain_pending_messages();

    operate(
        &mut engine,
        [
            Message::AvailableCurrentEdited {
                value: "20".to_string(),
            },
            Message::SubmitAvailableCurrent,
        ],
    );
    assert!(engine.binding.is_disabled(ids::AVAILABLE_CURRENT_SAVE));

    settle(&mut engine).await;

    let alert = engine
        .binding
        .alert(alerts::SET_AVAILABLE_CURRENT_FAILED)
        .expect("alert shown");
    assert_eq!(alert.body, DEVICE_BUSY_MESSAGE);
    assert!(!engine.binding.is_disabled(ids::AVAILABLE_CURRENT_SAVE));
    assert_eq!(
        transport.writes_to(AVAILABLE_CURRENT_UPDATE_PATH),
        vec![json!({ "current": 20_000 })]
    );

    operate(
        &mut engine,
        [Message::DismissAlert {
            id: alerts::SET_AVAILABLE_CURRENT_FAILED.to_string(),
        }],
    );
    assert!(engine.binding.alerts().is_empty());
}

#[tokio::test]
async fn test_confirmed_current_matches_following_readout() {
    let (mut engine, channel) = setup(RecordingTransport::new());
    channel.dispatch("charge_manager/config", &config_payload(1, 6_000));
    engine.drain_pending_messages();

    operate(
        &mut engine,
        [Message::AvailableCurrentPreset(CurrentPreset::Minimum)],
    );
    settle(&mut engine).await;

    assert!(!engine.binding.is_hidden(ids::AVAILABLE_CURRENT_CONFIRMED));
    assert_eq!(engine.binding.value(ids::AVAILABLE_CURRENT), Some("0.000"));
    let before = engine.binding.mutation_count();

    channel.dispatch("charge_manager/available_current", r#"{"current": 0}"#);
    engine.drain_pending_messages();

    assert_eq!(engine.binding.mutation_count(), before);
}
