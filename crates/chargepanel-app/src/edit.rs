//! Local edit buffer
//!
//! Tracks whether the working copy of the configuration has unsaved changes,
//! and whether the available current input holds an unsubmitted value. Both
//! decide which incoming pushes may overwrite what the operator sees.

use serde::Serialize;

/// Whether a config push may replace the working copy.
///
/// Local structural mutations (adding or removing a charger) always render.
pub fn should_apply_incoming_config(dirty: bool, forced_by_local_mutation: bool) -> bool {
    forced_by_local_mutation || !dirty
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditState {
    #[default]
    Clean,
    Dirty,
}

/// Follow-up required by an edit buffer transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum EditTransition {
    None,
    /// Re-render the working copy immediately, bypassing the dirty gate
    ForceRender,
}

/// Identifies the edit generation a save was started from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveTicket {
    generation: u64,
}

/// Dirty-flag state machine for the configuration form
#[derive(Debug, Clone, Default)]
pub struct EditBuffer {
    state: EditState,
    generation: u64,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == EditState::Dirty
    }

    /// The operator changed a tracked control
    pub fn mark_edited(&mut self) {
        self.generation += 1;
        self.state = EditState::Dirty;
    }

    /// The working copy changed structurally (charger added or removed)
    pub fn apply_local_mutation(&mut self) -> EditTransition {
        self.mark_edited();
        EditTransition::ForceRender
    }

    pub fn begin_save(&self) -> SaveTicket {
        SaveTicket {
            generation: self.generation,
        }
    }

    /// A save completed. Edits made after `ticket` was issued keep the buffer dirty.
    pub fn save_succeeded(&mut self, ticket: SaveTicket) -> EditState {
        if ticket.generation == self.generation {
            self.state = EditState::Clean;
        }
        self.state
    }

    pub fn save_failed(&mut self) -> EditState {
        self.state = EditState::Dirty;
        self.state
    }
}

// ─────────────────────────────────────────────────────────────────
// Available current
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrentPhase {
    /// Input shows the live readout
    #[default]
    Idle,
    /// Operator typed a value that was not submitted yet
    Edited,
    InFlight,
    /// Last submitted value was accepted
    Confirmed,
}

/// Identifies one available current write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentTicket {
    serial: u64,
}

/// State of the available current input and its save button
#[derive(Debug, Clone, Default)]
pub struct AvailableCurrentControl {
    phase: CurrentPhase,
    serial: u64,
}

impl AvailableCurrentControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CurrentPhase {
        self.phase
    }

    /// Live readouts overwrite the input unless it holds an unsubmitted edit
    pub fn accepts_readout(&self) -> bool {
        self.phase != CurrentPhase::Edited
    }

    /// Save button is enabled only while an edit is pending
    pub fn save_enabled(&self) -> bool {
        self.phase == CurrentPhase::Edited
    }

    pub fn edit(&mut self) {
        self.phase = CurrentPhase::Edited;
    }

    pub fn submit(&mut self) -> CurrentTicket {
        self.serial += 1;
        self.phase = CurrentPhase::InFlight;
        CurrentTicket {
            serial: self.serial,
        }
    }

    /// Returns `true` when `ticket` is still the latest write and nothing was
    /// typed since it was submitted
    pub fn succeeded(&mut self, ticket: CurrentTicket) -> bool {
        if ticket.serial != self.serial || self.phase != CurrentPhase::InFlight {
            return false;
        }
        self.phase = CurrentPhase::Confirmed;
        true
    }

    /// Returns `true` when the failure applies to the latest write; the
    /// control then holds the value for another attempt
    pub fn failed(&mut self, ticket: CurrentTicket) -> bool {
        if ticket.serial != self.serial {
            return false;
        }
        self.phase = CurrentPhase::Edited;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_truth_table() {
        assert!(should_apply_incoming_config(false, false));
        assert!(!should_apply_incoming_config(true, false));
        assert!(should_apply_incoming_config(true, true));
        assert!(should_apply_incoming_config(false, true));
    }

    #[test]
    fn test_edit_then_save_returns_to_clean() {
        let mut buffer = EditBuffer::new();
        buffer.mark_edited();

        let ticket = buffer.begin_save();

        assert_eq!(buffer.save_succeeded(ticket), EditState::Clean);
    }

    #[test]
    fn test_superseding_edit_stays_dirty() {
        let mut buffer = EditBuffer::new();
        buffer.mark_edited();
        let ticket = buffer.begin_save();

        buffer.mark_edited();

        assert_eq!(buffer.save_succeeded(ticket), EditState::Dirty);
        assert!(buffer.is_dirty());
    }

    #[test]
    fn test_failed_save_stays_dirty() {
        let mut buffer = EditBuffer::new();
        buffer.mark_edited();
        let _ticket = buffer.begin_save();

        assert_eq!(buffer.save_failed(), EditState::Dirty);
    }

    #[test]
    fn test_local_mutation_forces_render() {
        let mut buffer = EditBuffer::new();

        assert_eq!(buffer.apply_local_mutation(), EditTransition::ForceRender);
        assert!(buffer.is_dirty());
    }

    #[test]
    fn test_readouts_blocked_only_while_edited() {
        let mut control = AvailableCurrentControl::new();
        assert!(control.accepts_readout());

        control.edit();
        assert!(!control.accepts_readout());
        assert!(control.save_enabled());

        let ticket = control.submit();
        assert!(control.accepts_readout());
        assert!(!control.save_enabled());

        assert!(control.succeeded(ticket));
        assert_eq!(control.phase(), CurrentPhase::Confirmed);
        assert!(control.accepts_readout());
    }

    #[test]
    fn test_failed_write_reopens_the_edit() {
        let mut control = AvailableCurrentControl::new();
        control.edit();
        let ticket = control.submit();

        assert!(control.failed(ticket));
        assert_eq!(control.phase(), CurrentPhase::Edited);
        assert!(control.save_enabled());
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let mut control = AvailableCurrentControl::new();
        let first = control.submit();
        let second = control.submit();

        assert!(!control.succeeded(first));
        assert!(!control.failed(first));
        assert!(control.succeeded(second));
    }

    #[test]
    fn test_typing_during_flight_wins_over_success() {
        let mut control = AvailableCurrentControl::new();
        let ticket = control.submit();

        control.edit();

        assert!(!control.succeeded(ticket));
        assert_eq!(control.phase(), CurrentPhase::Edited);
    }
}
