//! View projection - pure mapping from snapshots to display text
//!
//! Nothing in here touches the DOM or the network. The app crate feeds the
//! results into its list reconciler, which decides what actually gets written.

use std::borrow::Cow;

use serde::Serialize;

use crate::types::{ChargerState, ChargerStatus, ManagerPhase, ManagerState};

/// A charger is annotated as stale once its last answer is this old
pub const STALE_AFTER_SECS: u64 = 10;

/// Number of buttons in the manager state indicator group
pub const PHASE_BUTTON_COUNT: usize = 3;

// ─────────────────────────────────────────────────────────────────
// Formatting
// ─────────────────────────────────────────────────────────────────

/// Format a milliamp value as amperes with a fixed number of decimals
pub fn format_amps(milliamps: u32, decimals: usize) -> String {
    format!("{:.*}", decimals, f64::from(milliamps) / 1000.0)
}

/// Format an elapsed number of seconds as `h:mm:ss`, prefixed by days when needed
pub fn format_timespan(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let mins = (total_secs % 3_600) / 60;
    let secs = total_secs % 60;

    let clock = format!("{}:{:02}:{:02}", hours, mins, secs);
    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        n => format!("{} days, {}", n, clock),
    }
}

/// Seconds since the charger last answered, measured on the manager's uptime clock
pub fn seconds_since_update(manager_uptime: u64, last_update: u64) -> u64 {
    manager_uptime.saturating_sub(last_update) / 1000
}

/// Staleness suffix for a charger, empty while the data is fresh
pub fn stale_annotation(manager_uptime: u64, last_update: u64) -> Option<String> {
    let elapsed = seconds_since_update(manager_uptime, last_update);
    (elapsed >= STALE_AFTER_SECS).then(|| format!("; last update {} ago", format_timespan(elapsed)))
}

// ─────────────────────────────────────────────────────────────────
// Error taxonomy
// ─────────────────────────────────────────────────────────────────

/// Origin band of a charger error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorBand {
    /// Code 0
    None,
    /// Codes 1..=191, raised by the charge manager itself
    Management,
    /// Codes 192..=255, reported by the controlled charger
    Client,
}

impl ErrorBand {
    pub fn of(code: u8) -> Self {
        match code {
            0 => ErrorBand::None,
            1..=191 => ErrorBand::Management,
            192..=u8::MAX => ErrorBand::Client,
        }
    }

    /// Card title shown for a charger in the error state
    pub fn title(&self) -> &'static str {
        match self {
            // A charger in the error state without a code is still reported
            // by the manager.
            ErrorBand::None | ErrorBand::Management => "Charge management error",
            ErrorBand::Client => "Charger error",
        }
    }
}

/// Human-readable description of an error code
///
/// Codes outside the table fall back to a band-specific generic message.
pub fn error_message(code: u8) -> Cow<'static, str> {
    let known = match code {
        0 => Some("No error"),
        1 => Some("Charger not reachable"),
        2 => Some("Charger did not answer in time"),
        3 => Some("Charger uses an incompatible protocol version"),
        4 => Some("Charge management is disabled on the charger"),
        192 => Some("Charger is in an error state"),
        193 => Some("Charger reports a contactor fault"),
        194 => Some("Charger reports a communication fault with the vehicle"),
        195 => Some("Charger is blocked by a key switch"),
        _ => None,
    };

    match (known, ErrorBand::of(code)) {
        (Some(text), _) => Cow::Borrowed(text),
        (None, ErrorBand::Client) => Cow::Owned(format!("Charger error {}", code)),
        (None, _) => Cow::Owned(format!("Management error {}", code)),
    }
}

// ─────────────────────────────────────────────────────────────────
// Enum labels
// ─────────────────────────────────────────────────────────────────

pub fn charger_state_label(state: ChargerState) -> Cow<'static, str> {
    match state {
        ChargerState::NoVehicle => Cow::Borrowed("No vehicle connected"),
        ChargerState::WaitingForManager => Cow::Borrowed("Waiting for charge release"),
        ChargerState::ReadyToCharge => Cow::Borrowed("Ready to charge"),
        ChargerState::Charging => Cow::Borrowed("Charging"),
        ChargerState::ChargingDone => Cow::Borrowed("Charging finished"),
        ChargerState::Error => Cow::Borrowed("Error"),
        ChargerState::Unknown(raw) => Cow::Owned(format!("Unknown state ({})", raw)),
    }
}

pub fn manager_phase_label(phase: ManagerPhase) -> Cow<'static, str> {
    match phase {
        ManagerPhase::NotConfigured => Cow::Borrowed("Not configured"),
        ManagerPhase::Active => Cow::Borrowed("Active"),
        ManagerPhase::BlockedByPeer => Cow::Borrowed("Blocked by another charge manager"),
        ManagerPhase::Unknown(raw) => Cow::Owned(format!("Unknown state ({})", raw)),
    }
}

/// State of the manager button group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseIndicator {
    /// Index of the highlighted button, `None` for phases without a button
    pub active: Option<usize>,
    pub label: String,
}

pub fn phase_indicator(phase: ManagerPhase) -> PhaseIndicator {
    let active = match phase {
        ManagerPhase::Unknown(_) => None,
        known => Some(usize::from(u8::from(known))),
    };

    PhaseIndicator {
        active: active.filter(|index| *index < PHASE_BUTTON_COUNT),
        label: manager_phase_label(phase).into_owned(),
    }
}

// ─────────────────────────────────────────────────────────────────
// Charger cards
// ─────────────────────────────────────────────────────────────────

/// Everything a status card displays, compared field by field when patching
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChargerCardView {
    pub name: String,
    pub title: String,
    pub info: String,
    pub details: String,
    /// Danger styling on the card body
    pub alarm: bool,
}

/// Project one charger of a manager snapshot into its card
///
/// A charger in the error state always shows its error, even when the
/// manager as a whole is blocked by a peer.
pub fn project_charger(manager: &ManagerState, charger: &ChargerStatus) -> ChargerCardView {
    let (title, info, alarm) = if charger.state == ChargerState::Error {
        let band = ErrorBand::of(charger.error);
        (
            band.title().to_string(),
            error_message(charger.error).into_owned(),
            true,
        )
    } else if manager.state == ManagerPhase::BlockedByPeer {
        (
            "Blocked by another charge manager".to_string(),
            "Another charge manager controls this charger. Disable one of them.".to_string(),
            true,
        )
    } else {
        (
            charger_state_label(charger.state).into_owned(),
            format!("{} A allocated", format_amps(charger.allocated_current, 3)),
            false,
        )
    };

    let mut details = format!("{} A supported", format_amps(charger.supported_current, 3));
    if let Some(stale) = stale_annotation(manager.uptime, charger.last_update) {
        details.push_str(&stale);
    }

    ChargerCardView {
        name: charger.name.clone(),
        title,
        info,
        details,
        alarm,
    }
}

/// Project every charger of a snapshot, preserving order
pub fn project_chargers(manager: &ManagerState) -> Vec<ChargerCardView> {
    manager
        .chargers
        .iter()
        .map(|charger| project_charger(manager, charger))
        .collect()
}
