//! Operator commands and write completions
//!
//! Every write follows the same shape: update the display optimistically,
//! return an [`UpdateAction`], and settle the display when the completion
//! message comes back.

use chargepanel_core::prelude::*;
use chargepanel_device::WriteFailure;

use crate::alerts::{self, Alert};
use crate::dom::{ids, Prop};
use crate::edit::{should_apply_incoming_config, CurrentTicket, EditTransition, SaveTicket};
use crate::form::{parse_amps, validate_new_charger, FormField};
use crate::message::CurrentPreset;
use crate::render;
use crate::state::PanelState;

use super::{UpdateAction, UpdateResult};

// ─────────────────────────────────────────────────────────────────
// Configuration form
// ─────────────────────────────────────────────────────────────────

fn mark_dirty(state: &mut PanelState) {
    state.edit.mark_edited();
    render::render_save_button(&mut state.dom, state.edit.state());
}

pub(crate) fn handle_field_edited(
    state: &mut PanelState,
    field: FormField,
    value: &str,
) -> UpdateResult {
    if let Err(e) = state.form.set_field(field, value) {
        warn!("Ignoring edit of {}: {}", field, e);
        return UpdateResult::none();
    }

    // The control already shows what the operator entered
    state
        .dom
        .observe(field.element_id(), state.form.field_prop(field));
    mark_dirty(state);
    UpdateResult::none()
}

pub(crate) fn handle_host_edited(state: &mut PanelState, index: usize, value: String) -> UpdateResult {
    if !state.form.set_host(index, &value) {
        warn!("Ignoring host edit for unknown charger {}", index);
        return UpdateResult::none();
    }

    if let Some(entry) = state.form.chargers.get(index) {
        state.roster_list.observe(index, entry.clone());
    }
    state
        .dom
        .observe(ids::roster_entry(index, "host"), Prop::Value(value));
    mark_dirty(state);
    UpdateResult::none()
}

pub(crate) fn handle_submit_config(state: &mut PanelState) -> UpdateResult {
    let result = state.form.validate();
    let errors = result.as_ref().err().cloned().unwrap_or_default();

    render::render_validation(
        &mut state.dom,
        ids::CONFIG_FORM,
        &state.invalid_fields,
        &errors,
    );
    state.invalid_fields = errors.iter().map(|error| error.field).collect();

    match result {
        Ok(config) => {
            let ticket = state.edit.begin_save();
            info!("Saving configuration with {} charger(s)", config.chargers.len());
            UpdateResult::action(UpdateAction::PutConfig { ticket, config })
        }
        Err(errors) => {
            for error in &errors {
                info!("Config not saved: {:?} {}", error.field, error);
            }
            UpdateResult::none()
        }
    }
}

pub(crate) fn handle_config_saved(state: &mut PanelState, ticket: SaveTicket) -> UpdateResult {
    let edit_state = state.edit.save_succeeded(ticket);
    info!("Configuration saved, form is now {:?}", edit_state);

    render::render_save_button(&mut state.dom, edit_state);
    state.dom.show_modal(ids::REBOOT_MODAL);
    UpdateResult::none()
}

pub(crate) fn handle_config_save_failed(
    state: &mut PanelState,
    failure: &WriteFailure,
) -> UpdateResult {
    warn!("Saving configuration failed: {}", failure);

    let edit_state = state.edit.save_failed();
    render::render_save_button(&mut state.dom, edit_state);
    state.dom.add_alert(Alert::write_failed(
        alerts::CONFIG_UPDATE_FAILED,
        "Failed to save the configuration",
        failure,
    ));
    UpdateResult::none()
}

/// Re-render the working copy after a structural change
fn apply_local_mutation(state: &mut PanelState) {
    let transition = state.edit.apply_local_mutation();
    if transition == EditTransition::ForceRender
        && should_apply_incoming_config(state.edit.is_dirty(), true)
    {
        render::render_form(&mut state.dom, &mut state.roster_list, &state.form);
    }
    render::render_save_button(&mut state.dom, state.edit.state());
}

pub(crate) fn handle_remove_charger(state: &mut PanelState, index: usize) -> UpdateResult {
    let Some(form) = state.form.without(index) else {
        warn!(
            "Ignoring removal of charger {}: roster has {} entries",
            index,
            state.form.chargers.len()
        );
        return UpdateResult::none();
    };

    info!("Removing charger {} from the roster", index);
    state.form = form;
    apply_local_mutation(state);
    UpdateResult::none()
}

pub(crate) fn handle_add_charger(state: &mut PanelState, host: &str, name: &str) -> UpdateResult {
    let result = validate_new_charger(host, name);
    let errors = result.as_ref().err().cloned().unwrap_or_default();

    render::render_validation(
        &mut state.dom,
        ids::ADD_CHARGER_FORM,
        &state.invalid_new_charger,
        &errors,
    );
    state.invalid_new_charger = errors.iter().map(|error| error.field).collect();

    let Ok(entry) = result else {
        return UpdateResult::none();
    };

    let Some(form) = state.form.with_added(entry) else {
        warn!("Ignoring new charger: roster is full");
        return UpdateResult::none();
    };

    info!("Adding charger {} to the roster", host.trim());
    state.dom.hide_modal(ids::ADD_CHARGER_MODAL);
    state.form = form;
    apply_local_mutation(state);
    UpdateResult::none()
}

// ─────────────────────────────────────────────────────────────────
// Available current
// ─────────────────────────────────────────────────────────────────

pub(crate) fn handle_available_current_edited(state: &mut PanelState, value: String) -> UpdateResult {
    state.available_current.edit();
    state
        .dom
        .observe(ids::AVAILABLE_CURRENT, Prop::Value(value.clone()));
    state.available_current_input = value;

    state
        .dom
        .set(ids::AVAILABLE_CURRENT, Prop::class("is-invalid", false));
    render::render_available_current_control(&mut state.dom, &state.available_current);
    UpdateResult::none()
}

pub(crate) fn handle_submit_available_current(state: &mut PanelState) -> UpdateResult {
    let limit = state
        .config
        .as_ref()
        .map(|config| config.maximum_available_current);

    let current = parse_amps(&state.available_current_input).and_then(|current| match limit {
        Some(limit) if current > limit => Err(format!("exceeds the maximum of {} mA", limit)),
        _ => Ok(current),
    });

    match current {
        Ok(current) => dispatch_available_current(state, current),
        Err(message) => {
            info!("Available current not sent: {}", message);
            state
                .dom
                .set(ids::AVAILABLE_CURRENT, Prop::class("is-invalid", true));
            UpdateResult::none()
        }
    }
}

pub(crate) fn handle_available_current_preset(
    state: &mut PanelState,
    preset: CurrentPreset,
) -> UpdateResult {
    let current = match preset {
        CurrentPreset::Maximum => match &state.config {
            Some(config) => config.default_available_current,
            None => {
                warn!("Maximum preset ignored: no configuration received yet");
                return UpdateResult::none();
            }
        },
        CurrentPreset::Minimum => 0,
    };

    dispatch_available_current(state, current)
}

fn dispatch_available_current(state: &mut PanelState, current: u32) -> UpdateResult {
    let ticket = state.available_current.submit();
    info!("Setting available current to {} mA", current);

    state
        .dom
        .set(ids::AVAILABLE_CURRENT, Prop::class("is-invalid", false));
    render::render_available_current_control(&mut state.dom, &state.available_current);
    UpdateResult::action(UpdateAction::PutAvailableCurrent { ticket, current })
}

pub(crate) fn handle_available_current_set(
    state: &mut PanelState,
    ticket: CurrentTicket,
    current: u32,
) -> UpdateResult {
    if state.available_current.succeeded(ticket) {
        state.available_current_input =
            render::render_available_current_value(&mut state.dom, current);
    } else {
        debug!("Available current confirmation superseded");
    }

    render::render_available_current_control(&mut state.dom, &state.available_current);
    UpdateResult::none()
}

pub(crate) fn handle_available_current_failed(
    state: &mut PanelState,
    ticket: CurrentTicket,
    failure: &WriteFailure,
) -> UpdateResult {
    warn!("Setting available current failed: {}", failure);

    if state.available_current.failed(ticket) {
        render::render_available_current_control(&mut state.dom, &state.available_current);
    }
    state.dom.add_alert(Alert::write_failed(
        alerts::SET_AVAILABLE_CURRENT_FAILED,
        "Failed to set the available current",
        failure,
    ));
    UpdateResult::none()
}

// ─────────────────────────────────────────────────────────────────
// Reboot
// ─────────────────────────────────────────────────────────────────

pub(crate) fn handle_reboot_confirmed(state: &mut PanelState) -> UpdateResult {
    info!("Reboot confirmed");
    state.dom.hide_modal(ids::REBOOT_MODAL);
    UpdateResult::action(UpdateAction::Reboot)
}

pub(crate) fn handle_reboot_failed(state: &mut PanelState, failure: &WriteFailure) -> UpdateResult {
    warn!("Reboot failed: {}", failure);
    state.dom.add_alert(Alert::write_failed(
        alerts::REBOOT_FAILED,
        "Failed to reboot the device",
        failure,
    ));
    UpdateResult::none()
}
