//! Rendering of panel state into DOM operations
//!
//! Every function here writes through the [`DomQueue`] render cache, so it is
//! safe to call after any state change: unchanged values produce no ops.

use chargepanel_core::prelude::*;
use chargepanel_core::{
    format_amps, phase_indicator, project_chargers, ChargerCardView, ChargerEntry, ManagerConfig,
    ManagerState, MAX_CHARGERS,
};

use crate::dom::{ids, DomQueue, ElementSpec, Prop, ALARM_CLASSES};
use crate::edit::{AvailableCurrentControl, CurrentPhase, EditState};
use crate::form::{ConfigForm, FieldError, FieldRef, FormField};
use crate::reconcile::{ListReconciler, RenderPlan};

/// Status cards are laid out in decks of this many cards
pub const CARDS_PER_DECK: usize = 2;

// ─────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────

/// Element structure of `count` status cards
pub fn status_skeleton(count: usize) -> Vec<ElementSpec> {
    (0..count)
        .collect::<Vec<_>>()
        .chunks(CARDS_PER_DECK)
        .enumerate()
        .map(|(deck, indices)| {
            ElementSpec::new(ids::status_deck(deck), "div")
                .with_children(indices.iter().map(|&index| status_card_skeleton(index)))
        })
        .collect()
}

fn status_card_skeleton(index: usize) -> ElementSpec {
    let body = ElementSpec::new(ids::status_card(index, "body"), "div")
        .with_child(ElementSpec::new(ids::status_card(index, "state"), "h5"))
        .with_child(ElementSpec::new(ids::status_card(index, "info"), "p"));

    ElementSpec::new(ids::status_card(index, "card"), "div")
        .with_child(ElementSpec::new(ids::status_card(index, "name"), "h5"))
        .with_child(body)
        .with_child(ElementSpec::new(ids::status_card(index, "details"), "small"))
}

/// Render a manager state snapshot. Returns `true` when the card list was rebuilt.
pub fn render_status(
    dom: &mut DomQueue,
    list: &mut ListReconciler<ChargerCardView>,
    manager: &ManagerState,
) -> bool {
    let cards = project_chargers(manager);
    let empty = cards.is_empty();

    let rebuilt = match list.reconcile(cards) {
        RenderPlan::Rebuild { items } => {
            debug!("Rebuilding {} status card(s)", items.len());
            dom.replace_children(ids::STATUS_CHARGERS, status_skeleton(items.len()));
            for (index, card) in items.iter().enumerate() {
                write_card(dom, index, card, None);
            }
            true
        }
        RenderPlan::Patch { changes } => {
            for change in &changes {
                write_card(dom, change.index, &change.current, Some(&change.previous));
            }
            false
        }
    };

    dom.set(ids::STATUS_SECTION, Prop::Hidden(empty));
    dom.set(ids::AVAILABLE_CURRENT_FORM, Prop::Hidden(empty));

    let indicator = phase_indicator(manager.state);
    for index in 0..chargepanel_core::view::PHASE_BUTTON_COUNT {
        dom.set(
            ids::phase_button(index),
            Prop::class("active", indicator.active == Some(index)),
        );
    }
    dom.set(ids::PHASE_LABEL, Prop::Text(indicator.label));

    rebuilt
}

fn write_card(
    dom: &mut DomQueue,
    index: usize,
    card: &ChargerCardView,
    previous: Option<&ChargerCardView>,
) {
    let changed = |same: fn(&ChargerCardView, &ChargerCardView) -> bool| {
        previous.map_or(true, |previous| !same(previous, card))
    };

    if changed(|a, b| a.name == b.name) {
        dom.set(ids::status_card(index, "name"), Prop::Text(card.name.clone()));
    }
    if changed(|a, b| a.title == b.title) {
        dom.set(ids::status_card(index, "state"), Prop::Text(card.title.clone()));
    }
    if changed(|a, b| a.info == b.info) {
        dom.set(ids::status_card(index, "info"), Prop::Text(card.info.clone()));
    }
    if changed(|a, b| a.details == b.details) {
        dom.set(
            ids::status_card(index, "details"),
            Prop::Text(card.details.clone()),
        );
    }
    if changed(|a, b| a.alarm == b.alarm) {
        for class in ALARM_CLASSES {
            dom.set(ids::status_card(index, "body"), Prop::class(class, card.alarm));
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Configuration form
// ─────────────────────────────────────────────────────────────────

/// Element structure of `count` roster entries plus the add affordance
pub fn roster_skeleton(count: usize) -> Vec<ElementSpec> {
    let mut entries: Vec<ElementSpec> = (0..count)
        .map(|index| {
            ElementSpec::new(ids::roster_entry(index, "card"), "div")
                .with_child(ElementSpec::new(ids::roster_entry(index, "name"), "span"))
                .with_child(ElementSpec::new(ids::roster_remove(index), "button"))
                .with_child(ElementSpec::new(ids::roster_entry(index, "host"), "input"))
        })
        .collect();

    entries.push(
        ElementSpec::new(ids::ADD_CHARGER_CARD, "div")
            .with_child(ElementSpec::new(ids::ADD_CHARGER, "button"))
            .with_child(
                ElementSpec::new(ids::ADD_CHARGER_DISABLED, "span").with_prop(Prop::Hidden(true)),
            ),
    );
    entries
}

/// Render the roster. Returns `true` when the entries were rebuilt.
pub fn render_roster(
    dom: &mut DomQueue,
    list: &mut ListReconciler<ChargerEntry>,
    chargers: &[ChargerEntry],
) -> bool {
    let rebuilt = match list.reconcile(chargers.to_vec()) {
        RenderPlan::Rebuild { items } => {
            debug!("Rebuilding {} roster entr(ies)", items.len());
            dom.replace_children(ids::CONFIGS, roster_skeleton(items.len()));
            for (index, entry) in items.iter().enumerate() {
                write_entry(dom, index, entry, None);
            }
            true
        }
        RenderPlan::Patch { changes } => {
            for change in &changes {
                write_entry(dom, change.index, &change.current, Some(&change.previous));
            }
            false
        }
    };

    let full = chargers.len() >= MAX_CHARGERS;
    dom.set(ids::ADD_CHARGER, Prop::Hidden(full));
    dom.set(ids::ADD_CHARGER_DISABLED, Prop::Hidden(!full));

    rebuilt
}

fn write_entry(
    dom: &mut DomQueue,
    index: usize,
    entry: &ChargerEntry,
    previous: Option<&ChargerEntry>,
) {
    if previous.map_or(true, |previous| previous.name != entry.name) {
        dom.set(ids::roster_entry(index, "name"), Prop::Text(entry.name.clone()));
    }
    if previous.map_or(true, |previous| previous.host != entry.host) {
        dom.set(ids::roster_entry(index, "host"), Prop::Value(entry.host.clone()));
    }
}

/// Write every scalar control and the roster of the working copy
pub fn render_form(dom: &mut DomQueue, list: &mut ListReconciler<ChargerEntry>, form: &ConfigForm) {
    for field in FormField::ALL {
        dom.set(field.element_id(), form.field_prop(field));
    }
    render_roster(dom, list, &form.chargers);
}

pub fn render_save_button(dom: &mut DomQueue, state: EditState) {
    dom.set(ids::SAVE_BUTTON, Prop::Disabled(state == EditState::Clean));
}

/// Mark `errors` invalid and clear marks left from `previous`
pub fn render_validation(
    dom: &mut DomQueue,
    form_id: &str,
    previous: &[FieldRef],
    errors: &[FieldError],
) {
    dom.set(form_id, Prop::class("was-validated", true));
    for field in previous {
        if !errors.iter().any(|error| error.field == *field) {
            dom.set(field.element_id(), Prop::class("is-invalid", false));
        }
    }
    for error in errors {
        dom.set(error.field.element_id(), Prop::class("is-invalid", true));
    }
}

// ─────────────────────────────────────────────────────────────────
// Available current
// ─────────────────────────────────────────────────────────────────

/// Input bound and preset label, derived from the authoritative config
pub fn render_available_current_limits(dom: &mut DomQueue, config: &ManagerConfig) {
    dom.set(
        ids::AVAILABLE_CURRENT,
        Prop::Max(format_amps(config.maximum_available_current, 3)),
    );
    dom.set(
        ids::AVAILABLE_CURRENT_MAXIMUM,
        Prop::Text(format!(
            "{} A",
            format_amps(config.default_available_current, 0)
        )),
    );
}

pub fn render_available_current_control(dom: &mut DomQueue, control: &AvailableCurrentControl) {
    dom.set(
        ids::AVAILABLE_CURRENT_SAVE,
        Prop::Disabled(!control.save_enabled()),
    );
    dom.set(
        ids::AVAILABLE_CURRENT_CONFIRMED,
        Prop::Hidden(control.phase() != CurrentPhase::Confirmed),
    );
}

/// Show a value in the available current input
pub fn render_available_current_value(dom: &mut DomQueue, milliamps: u32) -> String {
    let text = format_amps(milliamps, 3);
    dom.set(ids::AVAILABLE_CURRENT, Prop::Value(text.clone()));
    text
}
