//! chargepanel-app - Panel state and orchestration for the charge manager
//!
//! This crate implements the TEA (The Elm Architecture) pattern for the
//! panel: push snapshots and operator commands become [`Message`]s, the
//! update function mutates [`PanelState`] and queues DOM operations, and
//! writes run as background tasks that report back through the same channel.
//! The [`Engine`] ties it together for a shell.

pub mod actions;
pub mod alerts;
pub mod config;
pub mod dom;
pub mod edit;
pub mod engine;
pub mod form;
pub mod handler;
pub mod message;
pub mod process;
pub mod reconcile;
pub mod render;
pub mod signals;
pub mod state;

// Re-export primary types
pub use dom::{DomBinding, DomOp, DomQueue, ElementTree, Prop};
pub use edit::{should_apply_incoming_config, EditBuffer, EditState};
pub use engine::Engine;
pub use handler::{UpdateAction, UpdateResult};
pub use message::{CurrentPreset, Message};
pub use reconcile::{ListReconciler, RenderPlan};
pub use state::PanelState;
