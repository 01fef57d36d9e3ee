//! Handler module - TEA update function and event handlers
//!
//! Organized into submodules:
//! - `update`: Main update() function and message dispatch
//! - `push`: Push channel snapshots (state, config, available current)
//! - `commands`: Operator commands and write completions

pub(crate) mod commands;
pub(crate) mod push;
pub(crate) mod update;


use chargepanel_core::ManagerConfig;

use crate::edit::{CurrentTicket, SaveTicket};
use crate::message::Message;

// Re-export main entry point
pub use update::update;

/// Writes the event loop should perform after update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    /// PUT the validated configuration
    PutConfig {
        ticket: SaveTicket,
        config: ManagerConfig,
    },

    /// PUT a new available current (milliamps)
    PutAvailableCurrent { ticket: CurrentTicket, current: u32 },

    /// Restart the device so a saved configuration takes effect
    Reboot,
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Optional action for the event loop to perform
    pub action: Option<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(msg: Message) -> Self {
        Self {
            message: Some(msg),
            action: None,
        }
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            message: None,
            action: Some(action),
        }
    }
}
