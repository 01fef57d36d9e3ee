//! Dismissible alerts raised by failed writes

use serde::{Deserialize, Serialize};

use chargepanel_device::WriteFailure;

/// Shown when the device answers 423 (Locked)
pub const DEVICE_BUSY_MESSAGE: &str =
    "A vehicle is connected; the charger cannot be updated right now.";

pub const CONFIG_UPDATE_FAILED: &str = "charge_manager_config_update_failed";
pub const SET_AVAILABLE_CURRENT_FAILED: &str = "charge_manager_set_available_current_failed";
pub const REBOOT_FAILED: &str = "charge_manager_reboot_failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Danger,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    /// Alerts with the same id replace each other
    pub id: String,
    pub level: AlertLevel,
    pub title: String,
    pub body: String,
}

impl Alert {
    /// Danger alert describing a failed write
    pub fn write_failed(id: &str, title: &str, failure: &WriteFailure) -> Self {
        Self {
            id: id.to_string(),
            level: if failure.is_device_busy() {
                AlertLevel::Warning
            } else {
                AlertLevel::Danger
            },
            title: title.to_string(),
            body: describe_failure(failure),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Operator-facing text for a failed write.
///
/// Answered requests lead with the status line, `"<status> <reason>"`. A JSON
/// body of the form `{"error": "..."}` supplies the message after it; any
/// other non-empty body is appended verbatim.
pub fn describe_failure(failure: &WriteFailure) -> String {
    if failure.is_device_busy() {
        return DEVICE_BUSY_MESSAGE.to_string();
    }

    let Some(status) = failure.status else {
        return failure.reason.clone();
    };

    let detail = match serde_json::from_str::<ErrorBody>(&failure.body) {
        Ok(parsed) => parsed.error,
        Err(_) => failure.body.clone(),
    };

    if detail.is_empty() {
        format!("{} {}", status, failure.reason)
    } else {
        format!("{} {}: {}", status, failure.reason, detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_status_gets_distinct_message() {
        let failure = WriteFailure::from_status(423, "Locked", "whatever the device says");
        assert_eq!(describe_failure(&failure), DEVICE_BUSY_MESSAGE);
    }

    #[test]
    fn test_json_error_body_is_unwrapped() {
        let failure = WriteFailure::from_status(400, "Bad Request", r#"{"error":"Host is invalid"}"#);
        assert_eq!(describe_failure(&failure), "400 Bad Request: Host is invalid");
    }

    #[test]
    fn test_plain_body_follows_status_line() {
        let failure = WriteFailure::from_status(500, "Internal Server Error", "flash full");
        assert_eq!(
            describe_failure(&failure),
            "500 Internal Server Error: flash full"
        );
    }

    #[test]
    fn test_empty_body_shows_status_line_only() {
        let failure = WriteFailure::from_status(503, "Service Unavailable", "");
        assert_eq!(describe_failure(&failure), "503 Service Unavailable");
    }

    #[test]
    fn test_failed_write_alert_carries_status_code() {
        let plain = WriteFailure::from_status(500, "Internal Server Error", "flash full");
        let alert = Alert::write_failed(CONFIG_UPDATE_FAILED, "Failed to save the configuration", &plain);
        assert!(alert.body.contains("500"));
        assert!(alert.body.contains("flash full"));

        let json = WriteFailure::from_status(400, "Bad Request", r#"{"error":"Host is invalid"}"#);
        let alert = Alert::write_failed(CONFIG_UPDATE_FAILED, "Failed to save the configuration", &json);
        assert!(alert.body.contains("400"));
        assert!(alert.body.contains("Host is invalid"));
        assert_eq!(alert.level, AlertLevel::Danger);
    }

    #[test]
    fn test_malformed_json_never_panics() {
        let failure = WriteFailure::from_status(400, "Bad Request", r#"{"error": 5"#);
        assert_eq!(describe_failure(&failure), r#"400 Bad Request: {"error": 5"#);
    }

    #[test]
    fn test_network_failure_uses_reason_only() {
        let failure = WriteFailure::network("connection refused");
        assert_eq!(describe_failure(&failure), "connection refused");
    }

    #[test]
    fn test_busy_alert_is_a_warning() {
        let failure = WriteFailure::from_status(423, "Locked", "");
        let alert = Alert::write_failed(REBOOT_FAILED, "Reboot failed", &failure);
        assert_eq!(alert.level, AlertLevel::Warning);
    }
}
