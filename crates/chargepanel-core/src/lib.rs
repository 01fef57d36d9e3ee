//! # chargepanel-core - Core Domain Types
//!
//! Foundation crate for the charge manager panel. Provides the device's
//! domain types, push payload decoding, error handling, logging setup, and
//! the pure view projection.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`ManagerState`], [`ChargerStatus`] - Live status snapshots
//! - [`ManagerConfig`], [`ChargerEntry`] - Configuration and roster entries
//! - [`ManagerPhase`], [`ChargerState`] - Numeric enums with unknown-value fallback
//! - [`ModuleAvailability`] - Capability flags from the shell
//!
//! ### Events (`events`)
//! - [`Topic`] - Push channel topic names
//! - [`PushEvent`] - Typed payload decoded from a topic and raw data
//!
//! ### View Projection (`view`)
//! - [`project_charger()`] - Map a charger status to its card text
//! - [`ErrorBand`] - Management vs. charger error classification
//! - [`format_amps()`], [`format_timespan()`] - Display formatting
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use chargepanel_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod prelude;
pub mod types;
pub mod view;

pub use error::{Error, Result, ResultExt};
pub use events::{PushEvent, Topic};
pub use types::{
    AvailableCurrent, ChargerEntry, ChargerState, ChargerStatus, ManagerConfig, ManagerPhase,
    ManagerState, ModuleAvailability, MAX_CHARGERS,
};
pub use view::{
    error_message, format_amps, format_timespan, phase_indicator, project_charger,
    project_chargers, ChargerCardView, ErrorBand, PhaseIndicator,
};
