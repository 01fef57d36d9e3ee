//! Panel state (the Model in TEA)

use chargepanel_core::{ChargerCardView, ChargerEntry, ManagerConfig, ManagerState};

use crate::dom::DomQueue;
use crate::edit::{AvailableCurrentControl, EditBuffer};
use crate::form::{ConfigForm, FieldRef};
use crate::reconcile::ListReconciler;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PanelPhase {
    #[default]
    Running,
    Quitting,
}

/// Everything the panel knows, mutated only by [`crate::handler::update`]
#[derive(Debug, Default)]
pub struct PanelState {
    pub phase: PanelPhase,
    pub initialized: bool,

    /// Last manager state pushed by the device
    pub manager: Option<ManagerState>,
    /// Last configuration pushed by the device (authoritative copy)
    pub config: Option<ManagerConfig>,
    /// Configuration as shown and edited in the form (working copy)
    pub form: ConfigForm,
    pub edit: EditBuffer,

    pub available_current: AvailableCurrentControl,
    /// Text currently shown in the available current input
    pub available_current_input: String,

    pub status_list: ListReconciler<ChargerCardView>,
    pub roster_list: ListReconciler<ChargerEntry>,

    /// Controls currently marked invalid in the config form
    pub invalid_fields: Vec<FieldRef>,
    /// Controls currently marked invalid in the add-charger dialog
    pub invalid_new_charger: Vec<FieldRef>,

    /// Pending DOM operations, flushed by the engine
    pub dom: DomQueue,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_quit(&self) -> bool {
        self.phase == PanelPhase::Quitting
    }
}
