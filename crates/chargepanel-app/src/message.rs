//! Message types for the application (TEA pattern)

use chargepanel_core::{ModuleAvailability, PushEvent};
use chargepanel_device::WriteFailure;

use crate::edit::{CurrentTicket, SaveTicket};
use crate::form::FormField;

/// Preset buttons next to the available current input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentPreset {
    /// The configured default available current
    Maximum,
    /// Zero: stop all charging
    Minimum,
}

/// All possible messages/actions in the panel
#[derive(Debug, Clone)]
pub enum Message {
    // ─────────────────────────────────────────────────────────
    // Push channel
    // ─────────────────────────────────────────────────────────
    /// Decoded snapshot from the device
    Push(PushEvent),

    // ─────────────────────────────────────────────────────────
    // Configuration form
    // ─────────────────────────────────────────────────────────
    /// Operator changed a scalar control
    FieldEdited { field: FormField, value: String },
    /// Operator changed the host input of a roster entry
    ChargerHostEdited { index: usize, value: String },
    /// Save button pressed
    SubmitConfig,
    ConfigSaved { ticket: SaveTicket },
    ConfigSaveFailed {
        ticket: SaveTicket,
        failure: WriteFailure,
    },
    /// Remove button of a roster entry pressed
    RemoveCharger { index: usize },
    /// Add-charger dialog submitted
    AddCharger { host: String, name: String },

    // ─────────────────────────────────────────────────────────
    // Available current
    // ─────────────────────────────────────────────────────────
    /// Operator typed into the available current input
    AvailableCurrentEdited { value: String },
    SubmitAvailableCurrent,
    AvailableCurrentPreset(CurrentPreset),
    AvailableCurrentSet { ticket: CurrentTicket, current: u32 },
    AvailableCurrentFailed {
        ticket: CurrentTicket,
        failure: WriteFailure,
    },

    // ─────────────────────────────────────────────────────────
    // Reboot prompt
    // ─────────────────────────────────────────────────────────
    RebootConfirmed,
    RebootDismissed,
    RebootFailed { failure: WriteFailure },

    // ─────────────────────────────────────────────────────────
    // Shell
    // ─────────────────────────────────────────────────────────
    DismissAlert { id: String },
    LockStateChanged(ModuleAvailability),
    Quit,
}
