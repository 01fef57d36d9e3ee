//! Push channel snapshot handlers

use chargepanel_core::prelude::*;
use chargepanel_core::{ManagerConfig, ManagerState, PushEvent};

use crate::edit::should_apply_incoming_config;
use crate::form::ConfigForm;
use crate::message::Message;
use crate::render;
use crate::state::PanelState;

use super::UpdateResult;

pub(crate) fn handle_push(state: &mut PanelState, event: PushEvent) -> UpdateResult {
    match event {
        PushEvent::State(manager) => handle_manager_state(state, manager),
        PushEvent::Config(config) => handle_config(state, config),
        PushEvent::AvailableCurrent(current) => handle_available_current(state, current),
        PushEvent::Modules(modules) => UpdateResult::message(Message::LockStateChanged(modules)),
    }
}

fn handle_manager_state(state: &mut PanelState, manager: ManagerState) -> UpdateResult {
    if render::render_status(&mut state.dom, &mut state.status_list, &manager) {
        info!("Charger count changed to {}", manager.chargers.len());
    }
    state.manager = Some(manager);
    UpdateResult::none()
}

/// Apply an authoritative config.
///
/// Limits of the available current control always follow the device. The
/// form itself is only replaced while the operator has no unsaved edits.
fn handle_config(state: &mut PanelState, config: ManagerConfig) -> UpdateResult {
    render::render_available_current_limits(&mut state.dom, &config);
    handle_available_current(state, config.default_available_current);

    let dirty = state.edit.is_dirty();
    state.config = Some(config);

    if !should_apply_incoming_config(dirty, false) {
        debug!("Config push kept back: form has unsaved edits");
        return UpdateResult::none();
    }

    if let Some(config) = &state.config {
        state.form = ConfigForm::from_config(config);
        render::render_form(&mut state.dom, &mut state.roster_list, &state.form);
    }
    UpdateResult::none()
}

fn handle_available_current(state: &mut PanelState, current: u32) -> UpdateResult {
    if !state.available_current.accepts_readout() {
        trace!("Available current readout ignored: input holds an unsubmitted edit");
        return UpdateResult::none();
    }

    state.available_current_input =
        render::render_available_current_value(&mut state.dom, current);
    UpdateResult::none()
}
