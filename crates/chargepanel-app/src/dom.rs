//! DOM binding layer
//!
//! The panel never touches a document directly. Handlers queue [`DomOp`]s in a
//! [`DomQueue`], and the engine flushes them into a [`DomBinding`]. The
//! headless shell and the tests bind to [`ElementTree`], an in-memory element
//! map that counts every mutation it applies.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use chargepanel_core::prelude::*;

use crate::alerts::Alert;

/// Element ids of the charge manager page
pub mod ids {
    pub const SIDEBAR: &str = "sidebar-charge_manager";

    // Status section
    pub const STATUS_SECTION: &str = "charge_manager_status_controlled_chargers";
    pub const STATUS_CHARGERS: &str = "charge_manager_status_chargers";
    pub const PHASE_GROUP: &str = "btn_group_charge_manager_state";
    pub const PHASE_LABEL: &str = "charge_manager_status_state";

    // Available current form
    pub const AVAILABLE_CURRENT_FORM: &str = "charge_manager_status_available_current_form";
    pub const AVAILABLE_CURRENT: &str = "charge_manager_status_available_current";
    pub const AVAILABLE_CURRENT_SAVE: &str = "charge_manager_status_available_current_save";
    pub const AVAILABLE_CURRENT_CONFIRMED: &str =
        "charge_manager_status_available_current_confirmed";
    pub const AVAILABLE_CURRENT_MAXIMUM: &str = "charge_manager_status_available_current_maximum";
    pub const AVAILABLE_CURRENT_MINIMUM: &str = "charge_manager_status_available_current_minimum";

    // Configuration form
    pub const CONFIG_FORM: &str = "charge_manager_config_form";
    pub const ENABLE: &str = "charge_manager_enable";
    pub const ENABLE_WATCHDOG: &str = "charge_manager_enable_watchdog";
    pub const VERBOSE: &str = "charge_manager_verbose";
    pub const DEFAULT_AVAILABLE_CURRENT: &str = "charge_manager_default_available_current";
    pub const MAXIMUM_AVAILABLE_CURRENT: &str = "charge_manager_maximum_available_current";
    pub const MINIMUM_CURRENT: &str = "charge_manager_minimum_current";
    pub const SAVE_BUTTON: &str = "charge_manager_save_button";

    // Roster
    pub const CONFIGS: &str = "charge_manager_configs";
    pub const ADD_CHARGER_CARD: &str = "charge_manager_add_charger_card";
    pub const ADD_CHARGER: &str = "charge_manager_add_charger";
    pub const ADD_CHARGER_DISABLED: &str = "charge_manager_add_charger_disabled";

    // Add-charger dialog
    pub const ADD_CHARGER_MODAL: &str = "charge_manager_add_charger_modal";
    pub const ADD_CHARGER_FORM: &str = "charge_manager_add_charger_form";
    pub const NEW_CHARGER_HOST: &str = "charge_manager_config_charger_new_host";
    pub const NEW_CHARGER_NAME: &str = "charge_manager_config_charger_new_name";

    // Reboot prompt and alerts
    pub const REBOOT_MODAL: &str = "charge_manager_reboot";
    pub const ALERTS: &str = "alert_placeholder";

    /// Prefix shared by every element of the status cards
    pub const STATUS_CARD_PREFIX: &str = "charge_manager_status_charger_";

    /// Prefix shared by every element of the roster entries
    pub const ROSTER_ENTRY_PREFIX: &str = "charge_manager_config_charger_";

    pub fn phase_button(index: usize) -> String {
        format!("{}_{}", PHASE_GROUP, index)
    }

    pub fn status_deck(deck: usize) -> String {
        format!("charge_manager_status_deck_{}", deck)
    }

    /// `part` is one of `card`, `name`, `body`, `state`, `info`, `details`
    pub fn status_card(index: usize, part: &str) -> String {
        format!("{}{}_{}", STATUS_CARD_PREFIX, index, part)
    }

    /// `part` is one of `card`, `name`, `host`
    pub fn roster_entry(index: usize, part: &str) -> String {
        format!("{}{}_{}", ROSTER_ENTRY_PREFIX, index, part)
    }

    pub fn roster_remove(index: usize) -> String {
        format!("charge_manager_content_{}_remove", index)
    }
}

/// Danger styling applied to a status card body
pub const ALARM_CLASSES: [&str; 3] = ["bg-danger", "text-white", "bg-disabled"];

// ─────────────────────────────────────────────────────────────────
// Operations
// ─────────────────────────────────────────────────────────────────

/// One writable property of an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "prop", content = "value", rename_all = "snake_case")]
pub enum Prop {
    Text(String),
    Value(String),
    Checked(bool),
    Hidden(bool),
    Disabled(bool),
    Max(String),
    /// Add (`true`) or remove (`false`) a class
    Class(String, bool),
}

impl Prop {
    pub fn class(name: &str, on: bool) -> Self {
        Prop::Class(name.to_string(), on)
    }

    /// Storage slot of this property; two props with the same slot overwrite each other
    fn slot(&self) -> String {
        match self {
            Prop::Text(_) => "text".to_string(),
            Prop::Value(_) => "value".to_string(),
            Prop::Checked(_) => "checked".to_string(),
            Prop::Hidden(_) => "hidden".to_string(),
            Prop::Disabled(_) => "disabled".to_string(),
            Prop::Max(_) => "max".to_string(),
            Prop::Class(name, _) => format!("class:{}", name),
        }
    }
}

/// Structure of an element created by a rebuild
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementSpec {
    pub id: String,
    pub tag: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub props: Vec<Prop>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(id: impl Into<String>, tag: &'static str) -> Self {
        Self {
            id: id.into(),
            tag,
            props: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_prop(mut self, prop: Prop) -> Self {
        self.props.push(prop);
        self
    }

    pub fn with_child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = ElementSpec>) -> Self {
        self.children.extend(children);
        self
    }

    /// Visit this element and all of its descendants, depth first
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a ElementSpec)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// A single mutation of the document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DomOp {
    Set {
        id: String,
        #[serde(flatten)]
        prop: Prop,
    },
    /// Destroy every child of `id` and create `children` in order
    ReplaceChildren {
        id: String,
        children: Vec<ElementSpec>,
    },
    ShowModal {
        id: String,
    },
    HideModal {
        id: String,
    },
    /// Show an alert, replacing any alert with the same id
    AddAlert {
        alert: Alert,
    },
    RemoveAlert {
        id: String,
    },
}

/// Sink for DOM operations
pub trait DomBinding: Send {
    fn apply(&mut self, op: &DomOp);
}

// ─────────────────────────────────────────────────────────────────
// Queue with render cache
// ─────────────────────────────────────────────────────────────────

/// Pending DOM operations plus the last value written to every property.
///
/// Writing a value the element already shows is dropped here, so callers can
/// render unconditionally.
#[derive(Debug, Default)]
pub struct DomQueue {
    ops: Vec<DomOp>,
    cache: HashMap<(String, String), Prop>,
}

impl DomQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a property write. Returns `false` when the value is already shown.
    pub fn set(&mut self, id: impl Into<String>, prop: Prop) -> bool {
        let id = id.into();
        let key = (id.clone(), prop.slot());
        if self.cache.get(&key) == Some(&prop) {
            return false;
        }
        self.cache.insert(key, prop.clone());
        self.ops.push(DomOp::Set { id, prop });
        true
    }

    /// Record a value the element already shows (typed by the operator)
    pub fn observe(&mut self, id: impl Into<String>, prop: Prop) {
        let key = (id.into(), prop.slot());
        self.cache.insert(key, prop);
    }

    /// Queue a rebuild of `id`'s children.
    ///
    /// Cached values of the new elements are replaced by their initial props.
    pub fn replace_children(&mut self, id: impl Into<String>, children: Vec<ElementSpec>) {
        let mut fresh: Vec<(String, Vec<Prop>)> = Vec::new();
        for child in &children {
            child.walk(&mut |spec| fresh.push((spec.id.clone(), spec.props.clone())));
        }

        let fresh_ids: BTreeSet<&str> = fresh.iter().map(|(id, _)| id.as_str()).collect();
        self.cache
            .retain(|(id, _), _| !fresh_ids.contains(id.as_str()));
        for (id, props) in &fresh {
            for prop in props {
                self.cache.insert((id.clone(), prop.slot()), prop.clone());
            }
        }

        self.ops.push(DomOp::ReplaceChildren {
            id: id.into(),
            children,
        });
    }

    pub fn show_modal(&mut self, id: &str) {
        self.ops.push(DomOp::ShowModal { id: id.to_string() });
    }

    pub fn hide_modal(&mut self, id: &str) {
        self.ops.push(DomOp::HideModal { id: id.to_string() });
    }

    pub fn add_alert(&mut self, alert: Alert) {
        self.ops.push(DomOp::AddAlert { alert });
    }

    pub fn remove_alert(&mut self, id: &str) {
        self.ops.push(DomOp::RemoveAlert { id: id.to_string() });
    }

    pub fn pending(&self) -> &[DomOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<DomOp> {
        std::mem::take(&mut self.ops)
    }
}

// ─────────────────────────────────────────────────────────────────
// In-memory document
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub text: String,
    pub value: String,
    pub checked: bool,
    pub hidden: bool,
    pub disabled: bool,
    pub max: Option<String>,
    pub classes: BTreeSet<String>,
    pub children: Vec<String>,
    pub parent: Option<String>,
}

impl Element {
    fn new(tag: &str, parent: Option<String>) -> Self {
        Self {
            tag: tag.to_string(),
            parent,
            ..Default::default()
        }
    }

    fn set(&mut self, prop: &Prop) {
        match prop {
            Prop::Text(text) => self.text = text.clone(),
            Prop::Value(value) => self.value = value.clone(),
            Prop::Checked(checked) => self.checked = *checked,
            Prop::Hidden(hidden) => self.hidden = *hidden,
            Prop::Disabled(disabled) => self.disabled = *disabled,
            Prop::Max(max) => self.max = Some(max.clone()),
            Prop::Class(name, true) => {
                self.classes.insert(name.clone());
            }
            Prop::Class(name, false) => {
                self.classes.remove(name);
            }
        }
    }
}

/// In-memory element map implementing [`DomBinding`]
#[derive(Debug, Default)]
pub struct ElementTree {
    elements: HashMap<String, Element>,
    open_modals: BTreeSet<String>,
    alerts: Vec<Alert>,
    mutations: usize,
    rebuilds: usize,
}

impl ElementTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree holding the static elements of the charge manager page
    pub fn with_panel_skeleton() -> Self {
        let mut tree = Self::new();
        for spec in panel_skeleton() {
            tree.insert(&spec, None);
        }
        tree
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.get(id).map(|e| e.text.as_str())
    }

    pub fn value(&self, id: &str) -> Option<&str> {
        self.get(id).map(|e| e.value.as_str())
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.get(id).is_some_and(|e| e.hidden)
    }

    pub fn is_disabled(&self, id: &str) -> bool {
        self.get(id).is_some_and(|e| e.disabled)
    }

    pub fn is_checked(&self, id: &str) -> bool {
        self.get(id).is_some_and(|e| e.checked)
    }

    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.get(id).is_some_and(|e| e.classes.contains(class))
    }

    pub fn children(&self, id: &str) -> &[String] {
        self.get(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    pub fn is_modal_open(&self, id: &str) -> bool {
        self.open_modals.contains(id)
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn alert(&self, id: &str) -> Option<&Alert> {
        self.alerts.iter().find(|alert| alert.id == id)
    }

    /// Number of operations applied so far
    pub fn mutation_count(&self) -> usize {
        self.mutations
    }

    /// Number of `ReplaceChildren` operations applied so far
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    fn insert(&mut self, spec: &ElementSpec, parent: Option<&str>) {
        let mut element = Element::new(spec.tag, parent.map(str::to_string));
        for prop in &spec.props {
            element.set(prop);
        }
        element.children = spec.children.iter().map(|c| c.id.clone()).collect();
        self.elements.insert(spec.id.clone(), element);

        for child in &spec.children {
            self.insert(child, Some(&spec.id));
        }
    }

    fn remove_subtree(&mut self, id: &str) {
        if let Some(element) = self.elements.remove(id) {
            for child in element.children {
                self.remove_subtree(&child);
            }
        }
    }
}

impl DomBinding for ElementTree {
    fn apply(&mut self, op: &DomOp) {
        match op {
            DomOp::Set { id, prop } => match self.elements.get_mut(id) {
                Some(element) => element.set(prop),
                None => {
                    trace!("Ignoring write to missing element {}", id);
                    return;
                }
            },
            DomOp::ReplaceChildren { id, children } => {
                let Some(old_children) = self.elements.get(id).map(|e| e.children.clone()) else {
                    warn!("Cannot rebuild missing container {}", id);
                    return;
                };
                for child in &old_children {
                    self.remove_subtree(child);
                }
                for child in children {
                    self.insert(child, Some(id));
                }
                if let Some(container) = self.elements.get_mut(id) {
                    container.children = children.iter().map(|c| c.id.clone()).collect();
                }
                self.rebuilds += 1;
            }
            DomOp::ShowModal { id } => {
                self.open_modals.insert(id.clone());
            }
            DomOp::HideModal { id } => {
                self.open_modals.remove(id);
            }
            DomOp::AddAlert { alert } => {
                self.alerts.retain(|existing| existing.id != alert.id);
                self.alerts.push(alert.clone());
            }
            DomOp::RemoveAlert { id } => {
                self.alerts.retain(|existing| existing.id != *id);
            }
        }
        self.mutations += 1;
    }
}

/// Static part of the page, present before any push arrives
pub fn panel_skeleton() -> Vec<ElementSpec> {
    use ids::*;

    let phase_group = ElementSpec::new(PHASE_GROUP, "div").with_children(
        (0..chargepanel_core::view::PHASE_BUTTON_COUNT)
            .map(|index| ElementSpec::new(phase_button(index), "button")),
    );

    let available_current_form = ElementSpec::new(AVAILABLE_CURRENT_FORM, "form")
        .with_child(ElementSpec::new(AVAILABLE_CURRENT, "input"))
        .with_child(ElementSpec::new(AVAILABLE_CURRENT_SAVE, "button"))
        .with_child(ElementSpec::new(AVAILABLE_CURRENT_CONFIRMED, "span"))
        .with_child(ElementSpec::new(AVAILABLE_CURRENT_MAXIMUM, "button"))
        .with_child(ElementSpec::new(AVAILABLE_CURRENT_MINIMUM, "button"));

    let status = ElementSpec::new(STATUS_SECTION, "div")
        .with_child(ElementSpec::new(STATUS_CHARGERS, "div"));

    let config_form = ElementSpec::new(CONFIG_FORM, "form")
        .with_child(ElementSpec::new(ENABLE, "input"))
        .with_child(ElementSpec::new(ENABLE_WATCHDOG, "input"))
        .with_child(ElementSpec::new(VERBOSE, "input"))
        .with_child(ElementSpec::new(DEFAULT_AVAILABLE_CURRENT, "input"))
        .with_child(ElementSpec::new(MAXIMUM_AVAILABLE_CURRENT, "input"))
        .with_child(ElementSpec::new(MINIMUM_CURRENT, "input"))
        .with_child(ElementSpec::new(CONFIGS, "div"))
        .with_child(ElementSpec::new(SAVE_BUTTON, "button"));

    vec![
        ElementSpec::new(SIDEBAR, "li"),
        ElementSpec::new(PHASE_LABEL, "span"),
        phase_group,
        available_current_form,
        status,
        config_form,
        ElementSpec::new(ADD_CHARGER_MODAL, "div").with_child(
            ElementSpec::new(ADD_CHARGER_FORM, "form")
                .with_child(ElementSpec::new(NEW_CHARGER_HOST, "input"))
                .with_child(ElementSpec::new(NEW_CHARGER_NAME, "input")),
        ),
        ElementSpec::new(REBOOT_MODAL, "div"),
        ElementSpec::new(ALERTS, "div"),
    ]
}
