//! Headless mode - NDJSON output of every panel mutation
//!
//! The headless shell runs the panel against a real device without a
//! browser. Every DOM operation and lifecycle event is written to stdout as
//! NDJSON, one event per line, and operator commands are read from stdin.
//!
//! # Example Output
//!
//! ```json
//! {"event":"started","device":"http://192.168.0.10/","push":"event_stream","timestamp":1704700001000}
//! {"event":"dom","op":{"op":"set","id":"charge_manager_save_button","prop":"disabled","value":true},"timestamp":1704700001002}
//! {"event":"command_rejected","line":"preset half","reason":"expected 'max' or 'min'","timestamp":1704700003000}
//! ```

pub mod commands;
pub mod runner;

use chrono::Utc;
use serde::Serialize;
use std::io::{self, Write};
use tracing::error;

use chargepanel_app::DomOp;

/// Events emitted in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// Panel initialized and push feed starting
    Started {
        device: String,
        push: String,
        timestamp: i64,
    },

    /// One DOM operation applied to the in-memory page
    Dom { op: DomOp, timestamp: i64 },

    /// A stdin line that could not be turned into a command
    CommandRejected {
        line: String,
        reason: String,
        timestamp: i64,
    },

    /// Error occurred
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },

    /// Panel shut down
    Stopped { timestamp: i64 },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        // Write to stdout with newline (NDJSON format)
        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }

        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    // ─────────────────────────────────────────────────────────
    // Convenience constructors
    // ─────────────────────────────────────────────────────────

    pub fn started(device: &str, push: &str) -> Self {
        Self::Started {
            device: device.to_string(),
            push: push.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn dom(op: DomOp) -> Self {
        Self::Dom {
            op,
            timestamp: Self::now(),
        }
    }

    pub fn command_rejected(line: &str, reason: String) -> Self {
        Self::CommandRejected {
            line: line.to_string(),
            reason,
            timestamp: Self::now(),
        }
    }

    pub fn error(message: String, fatal: bool) -> Self {
        Self::Error {
            message,
            fatal,
            timestamp: Self::now(),
        }
    }

    pub fn stopped() -> Self {
        Self::Stopped {
            timestamp: Self::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chargepanel_app::Prop;

    #[test]
    fn test_started_serialization() {
        let event = HeadlessEvent::started("http://10.0.0.7/", "websocket");
        let json = serde_json::to_string(&event).expect("serialization failed");

        let value: serde_json::Value = serde_json::from_str(&json).expect("invalid JSON");

        assert_eq!(value["event"], "started");
        assert_eq!(value["device"], "http://10.0.0.7/");
        assert_eq!(value["push"], "websocket");
        assert!(value["timestamp"].is_number());
    }

    #[test]
    fn test_dom_serialization_nests_op() {
        let event = HeadlessEvent::dom(DomOp::Set {
            id: "charge_manager_save_button".to_string(),
            prop: Prop::Disabled(true),
        });
        let json = serde_json::to_string(&event).expect("serialization failed");

        let value: serde_json::Value = serde_json::from_str(&json).expect("invalid JSON");

        assert_eq!(value["event"], "dom");
        assert_eq!(value["op"]["op"], "set");
        assert_eq!(value["op"]["id"], "charge_manager_save_button");
        assert_eq!(value["op"]["value"], true);
    }

    #[test]
    fn test_error_serialization() {
        let event = HeadlessEvent::error("Invalid device URL: nope".to_string(), true);
        let json = serde_json::to_string(&event).expect("serialization failed");

        let value: serde_json::Value = serde_json::from_str(&json).expect("invalid JSON");

        assert_eq!(value["event"], "error");
        assert_eq!(value["fatal"], true);
    }
}
