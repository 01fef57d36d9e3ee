//! chargepanel - headless shell for the charge manager panel
//!
//! Runs the panel engine against a device, echoing every DOM operation as
//! NDJSON and reading operator commands from stdin.

pub mod headless;

// Re-export main entry point
pub use headless::runner::run_headless;
