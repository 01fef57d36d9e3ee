//! Write side of the device transport
//!
//! All writes replace the current value of a resource (PUT semantics), so
//! repeating an identical write is harmless on the device. Nothing here
//! deduplicates.

use std::fmt;

/// Resource updated when the configuration form is saved
pub const CONFIG_UPDATE_PATH: &str = "charge_manager/config_update";

/// Resource updated by the available current control
pub const AVAILABLE_CURRENT_UPDATE_PATH: &str = "charge_manager/available_current_update";

/// Resource that restarts the device
pub const REBOOT_PATH: &str = "reboot";

/// HTTP status the device uses while the hardware is busy (vehicle connected)
pub const STATUS_DEVICE_BUSY: u16 = 423;

/// A failed write, as reported by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    /// HTTP status, `None` when the request never got an answer
    pub status: Option<u16>,
    /// Short reason (status text or network error)
    pub reason: String,
    /// Raw response body
    pub body: String,
}

impl WriteFailure {
    /// The device answered with a non-success status
    pub fn from_status(status: u16, reason: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            reason: reason.into(),
            body: body.into(),
        }
    }

    /// The request failed before any answer arrived
    pub fn network(reason: impl Into<String>) -> Self {
        Self {
            status: None,
            reason: reason.into(),
            body: String::new(),
        }
    }

    /// The device refused because an operation is in progress on the hardware
    pub fn is_device_busy(&self) -> bool {
        self.status == Some(STATUS_DEVICE_BUSY)
    }
}

impl fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} {}: {}", status, self.reason, self.body),
            None => write!(f, "{}", self.reason),
        }
    }
}

impl std::error::Error for WriteFailure {}

/// Outcome of a single write
pub type WriteResult = std::result::Result<(), WriteFailure>;

/// Device write operations
///
/// The panel dispatches writes from spawned tasks, so it depends on the
/// `Send` variant [`Transport`].
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Replace the value of `path` with `payload`
    async fn put(&self, path: &str, payload: serde_json::Value) -> WriteResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_busy_detection() {
        assert!(WriteFailure::from_status(423, "Locked", "").is_device_busy());
        assert!(!WriteFailure::from_status(500, "Internal Server Error", "").is_device_busy());
        assert!(!WriteFailure::network("connection reset").is_device_busy());
    }

    #[test]
    fn test_display_includes_status_and_body() {
        let failure = WriteFailure::from_status(400, "Bad Request", "minimum_current too low");
        assert_eq!(failure.to_string(), "400 Bad Request: minimum_current too low");

        let failure = WriteFailure::network("connection refused");
        assert_eq!(failure.to_string(), "connection refused");
    }
}
