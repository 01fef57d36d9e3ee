//! Main update function - handles state transitions (TEA pattern)

use chargepanel_core::prelude::*;

use crate::dom::{ids, Prop};
use crate::message::Message;
use crate::state::{PanelPhase, PanelState};

use super::{commands, push, UpdateResult};

/// Process a message and update state
/// Returns an optional action and follow-up message
pub fn update(state: &mut PanelState, message: Message) -> UpdateResult {
    match message {
        Message::Push(event) => push::handle_push(state, event),

        // ─────────────────────────────────────────────────────────
        // Configuration form
        // ─────────────────────────────────────────────────────────
        Message::FieldEdited { field, value } => {
            commands::handle_field_edited(state, field, &value)
        }
        Message::ChargerHostEdited { index, value } => {
            commands::handle_host_edited(state, index, value)
        }
        Message::SubmitConfig => commands::handle_submit_config(state),
        Message::ConfigSaved { ticket } => commands::handle_config_saved(state, ticket),
        Message::ConfigSaveFailed { failure, .. } => {
            commands::handle_config_save_failed(state, &failure)
        }
        Message::RemoveCharger { index } => commands::handle_remove_charger(state, index),
        Message::AddCharger { host, name } => commands::handle_add_charger(state, &host, &name),

        // ─────────────────────────────────────────────────────────
        // Available current
        // ─────────────────────────────────────────────────────────
        Message::AvailableCurrentEdited { value } => {
            commands::handle_available_current_edited(state, value)
        }
        Message::SubmitAvailableCurrent => commands::handle_submit_available_current(state),
        Message::AvailableCurrentPreset(preset) => {
            commands::handle_available_current_preset(state, preset)
        }
        Message::AvailableCurrentSet { ticket, current } => {
            commands::handle_available_current_set(state, ticket, current)
        }
        Message::AvailableCurrentFailed { ticket, failure } => {
            commands::handle_available_current_failed(state, ticket, &failure)
        }

        // ─────────────────────────────────────────────────────────
        // Reboot prompt
        // ─────────────────────────────────────────────────────────
        Message::RebootConfirmed => commands::handle_reboot_confirmed(state),
        Message::RebootDismissed => {
            state.dom.hide_modal(ids::REBOOT_MODAL);
            UpdateResult::none()
        }
        Message::RebootFailed { failure } => commands::handle_reboot_failed(state, &failure),

        // ─────────────────────────────────────────────────────────
        // Shell
        // ─────────────────────────────────────────────────────────
        Message::DismissAlert { id } => {
            state.dom.remove_alert(&id);
            UpdateResult::none()
        }
        Message::LockStateChanged(modules) => {
            state
                .dom
                .set(ids::SIDEBAR, Prop::Hidden(!modules.charge_manager));
            UpdateResult::none()
        }
        Message::Quit => {
            info!("Quit requested");
            state.phase = PanelPhase::Quitting;
            UpdateResult::none()
        }
    }
}
