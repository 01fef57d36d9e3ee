//! Typed push-channel payloads
//!
//! The device publishes snapshots on named topics. Each message carries the
//! topic string and a serialized snapshot whose shape depends on the topic.

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::types::{AvailableCurrent, ManagerConfig, ManagerState, ModuleAvailability};

/// Topics consumed by the charge manager panel and its shell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// `charge_manager/state` - live status of the manager and its chargers
    ManagerState,
    /// `charge_manager/config` - authoritative configuration
    ManagerConfig,
    /// `charge_manager/available_current` - live available current readout
    AvailableCurrent,
    /// `info/modules` - capability flags, consumed by the shell
    Modules,
}

impl Topic {
    /// Topics the panel itself subscribes to
    pub const PANEL: [Topic; 3] = [
        Topic::ManagerState,
        Topic::ManagerConfig,
        Topic::AvailableCurrent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::ManagerState => "charge_manager/state",
            Topic::ManagerConfig => "charge_manager/config",
            Topic::AvailableCurrent => "charge_manager/available_current",
            Topic::Modules => "info/modules",
        }
    }

    pub fn parse(topic: &str) -> Option<Self> {
        match topic {
            "charge_manager/state" => Some(Topic::ManagerState),
            "charge_manager/config" => Some(Topic::ManagerConfig),
            "charge_manager/available_current" => Some(Topic::AvailableCurrent),
            "info/modules" => Some(Topic::Modules),
            _ => None,
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded push message
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    State(ManagerState),
    Config(ManagerConfig),
    /// Available current in milliamps
    AvailableCurrent(u32),
    Modules(ModuleAvailability),
}

impl PushEvent {
    /// Decode a raw push message.
    ///
    /// Returns `Ok(None)` for topics this crate does not know about; those are
    /// meant for other modules sharing the channel.
    pub fn decode(topic: &str, data: &str) -> Result<Option<Self>> {
        let Some(topic) = Topic::parse(topic) else {
            return Ok(None);
        };

        let event = match topic {
            Topic::ManagerState => PushEvent::State(decode_payload(topic, data)?),
            Topic::ManagerConfig => PushEvent::Config(decode_payload(topic, data)?),
            Topic::AvailableCurrent => {
                let payload: AvailableCurrent = decode_payload(topic, data)?;
                PushEvent::AvailableCurrent(payload.current)
            }
            Topic::Modules => PushEvent::Modules(decode_payload(topic, data)?),
        };

        Ok(Some(event))
    }

    pub fn topic(&self) -> Topic {
        match self {
            PushEvent::State(_) => Topic::ManagerState,
            PushEvent::Config(_) => Topic::ManagerConfig,
            PushEvent::AvailableCurrent(_) => Topic::AvailableCurrent,
            PushEvent::Modules(_) => Topic::Modules,
        }
    }
}

fn decode_payload<T: DeserializeOwned>(topic: Topic, data: &str) -> Result<T> {
    serde_json::from_str(data).map_err(|e| Error::payload(topic.as_str(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ManagerPhase;

    #[test]
    fn test_topic_names_round_trip() {
        for topic in [
            Topic::ManagerState,
            Topic::ManagerConfig,
            Topic::AvailableCurrent,
            Topic::Modules,
        ] {
            assert_eq!(Topic::parse(topic.as_str()), Some(topic));
        }
        assert_eq!(Topic::parse("evse/state"), None);
    }

    #[test]
    fn test_decode_state() {
        let event = PushEvent::decode("charge_manager/state", r#"{"state":2,"uptime":10,"chargers":[]}"#)
            .unwrap()
            .unwrap();

        match event {
            PushEvent::State(state) => assert_eq!(state.state, ManagerPhase::BlockedByPeer),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decode_available_current() {
        let event = PushEvent::decode("charge_manager/available_current", r#"{"current":6000}"#)
            .unwrap();
        assert_eq!(event, Some(PushEvent::AvailableCurrent(6000)));
    }

    #[test]
    fn test_decode_unknown_topic_is_ignored() {
        let event = PushEvent::decode("evse/state", "{}").unwrap();
        assert!(event.is_none());
    }

    #[test]
    fn test_decode_malformed_payload_reports_topic() {
        let err = PushEvent::decode("charge_manager/config", "[1,2,3]").unwrap_err();
        assert!(matches!(err, Error::Payload { ref topic, .. } if topic == "charge_manager/config"));
    }

    #[test]
    fn test_event_topic_matches_decoded_topic() {
        let event = PushEvent::decode("info/modules", r#"{"charge_manager":true}"#)
            .unwrap()
            .unwrap();
        assert_eq!(event.topic(), Topic::Modules);
    }
}
