//! Domain types mirroring the charge manager's wire format
//!
//! Field names follow the device JSON exactly. Currents are milliamps,
//! timestamps are milliseconds on the device's uptime clock.

use serde::{Deserialize, Serialize};

/// Maximum number of chargers a charge manager can control
pub const MAX_CHARGERS: usize = 10;

// ─────────────────────────────────────────────────────────────────
// Enumerations
// ─────────────────────────────────────────────────────────────────

/// Overall state of the charge manager
///
/// Values the panel does not know are preserved in [`ManagerPhase::Unknown`]
/// so newer firmware never breaks decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ManagerPhase {
    #[default]
    NotConfigured,
    Active,
    /// Another charge manager on the network controls the same chargers
    BlockedByPeer,
    Unknown(u8),
}

impl From<u8> for ManagerPhase {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::NotConfigured,
            1 => Self::Active,
            2 => Self::BlockedByPeer,
            other => Self::Unknown(other),
        }
    }
}

impl From<ManagerPhase> for u8 {
    fn from(phase: ManagerPhase) -> Self {
        match phase {
            ManagerPhase::NotConfigured => 0,
            ManagerPhase::Active => 1,
            ManagerPhase::BlockedByPeer => 2,
            ManagerPhase::Unknown(other) => other,
        }
    }
}

/// State of a single controlled charger as seen by the manager
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChargerState {
    #[default]
    NoVehicle,
    WaitingForManager,
    ReadyToCharge,
    Charging,
    ChargingDone,
    Error,
    Unknown(u8),
}

impl From<u8> for ChargerState {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::NoVehicle,
            1 => Self::WaitingForManager,
            2 => Self::ReadyToCharge,
            3 => Self::Charging,
            4 => Self::ChargingDone,
            5 => Self::Error,
            other => Self::Unknown(other),
        }
    }
}

impl From<ChargerState> for u8 {
    fn from(state: ChargerState) -> Self {
        match state {
            ChargerState::NoVehicle => 0,
            ChargerState::WaitingForManager => 1,
            ChargerState::ReadyToCharge => 2,
            ChargerState::Charging => 3,
            ChargerState::ChargingDone => 4,
            ChargerState::Error => 5,
            ChargerState::Unknown(other) => other,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Live state
// ─────────────────────────────────────────────────────────────────

/// Status of one charger, as reported in `charge_manager/state`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargerStatus {
    pub name: String,
    /// Manager uptime (ms) at which this charger last answered
    #[serde(default)]
    pub last_update: u64,
    #[serde(default)]
    pub uptime: u64,
    #[serde(default)]
    pub supported_current: u32,
    #[serde(default)]
    pub allowed_current: u32,
    #[serde(default)]
    pub wants_to_charge: bool,
    #[serde(default)]
    pub wants_to_charge_low_priority: bool,
    #[serde(default)]
    pub is_charging: bool,
    #[serde(default)]
    pub last_sent_config: u64,
    #[serde(default)]
    pub allocated_current: u32,
    #[serde(default)]
    pub state: ChargerState,
    #[serde(default)]
    pub error: u8,
}

/// Snapshot pushed on `charge_manager/state`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerState {
    pub state: ManagerPhase,
    #[serde(default)]
    pub uptime: u64,
    #[serde(default)]
    pub chargers: Vec<ChargerStatus>,
}

// ─────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────

/// One configured charger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargerEntry {
    pub host: String,
    pub name: String,
}

impl ChargerEntry {
    pub fn new(host: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            name: name.into(),
        }
    }
}

/// Configuration pushed on `charge_manager/config` and written back on save
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    pub enable_charge_manager: bool,
    pub enable_watchdog: bool,
    pub verbose: bool,
    pub default_available_current: u32,
    pub maximum_available_current: u32,
    pub minimum_current: u32,
    #[serde(default)]
    pub chargers: Vec<ChargerEntry>,
}

/// Payload of `charge_manager/available_current` and its update endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableCurrent {
    pub current: u32,
}

/// Capability flags supplied by the application shell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleAvailability {
    #[serde(default)]
    pub charge_manager: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_state_deserializes_device_payload() {
        let json = r#"{
            "state": 1,
            "uptime": 120000,
            "chargers": [{
                "name": "Garage",
                "last_update": 119000,
                "uptime": 5000,
                "supported_current": 32000,
                "allowed_current": 16000,
                "wants_to_charge": true,
                "wants_to_charge_low_priority": false,
                "is_charging": true,
                "last_sent_config": 118000,
                "allocated_current": 16000,
                "state": 3,
                "error": 0
            }]
        }"#;

        let state: ManagerState = serde_json::from_str(json).unwrap();
        assert_eq!(state.state, ManagerPhase::Active);
        assert_eq!(state.chargers.len(), 1);
        assert_eq!(state.chargers[0].state, ChargerState::Charging);
        assert_eq!(state.chargers[0].allocated_current, 16000);
    }

    #[test]
    fn test_unknown_enum_values_are_preserved() {
        let state: ManagerState =
            serde_json::from_str(r#"{"state": 7, "uptime": 0, "chargers": []}"#).unwrap();
        assert_eq!(state.state, ManagerPhase::Unknown(7));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], 7);
    }

    #[test]
    fn test_charger_state_round_trips_all_known_values() {
        for raw in 0u8..=5 {
            let state = ChargerState::from(raw);
            assert!(!matches!(state, ChargerState::Unknown(_)));
            assert_eq!(u8::from(state), raw);
        }
        assert_eq!(ChargerState::from(9), ChargerState::Unknown(9));
    }

    #[test]
    fn test_manager_config_serializes_wire_names() {
        let config = ManagerConfig {
            enable_charge_manager: true,
            default_available_current: 32000,
            maximum_available_current: 32000,
            minimum_current: 6000,
            chargers: vec![ChargerEntry::new("10.0.0.2", "Garage")],
            ..Default::default()
        };

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["enable_charge_manager"], true);
        assert_eq!(json["minimum_current"], 6000);
        assert_eq!(json["chargers"][0]["host"], "10.0.0.2");
    }

    #[test]
    fn test_module_availability_defaults_missing_flag() {
        let modules: ModuleAvailability = serde_json::from_str(r#"{"mqtt": true}"#).unwrap();
        assert!(!modules.charge_manager);
    }
}
