//! Working copy of the charge manager configuration
//!
//! The form keeps numeric fields as the text the operator sees (amperes), so
//! half-typed values survive until the next submit. [`ConfigForm::validate`]
//! turns it back into a wire [`ManagerConfig`].

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use chargepanel_core::prelude::*;
use chargepanel_core::{format_amps, ChargerEntry, ManagerConfig, MAX_CHARGERS};

use crate::dom::{ids, Prop};

/// Scalar controls of the configuration form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    EnableChargeManager,
    EnableWatchdog,
    Verbose,
    DefaultAvailableCurrent,
    MaximumAvailableCurrent,
    MinimumCurrent,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        FormField::EnableChargeManager,
        FormField::EnableWatchdog,
        FormField::Verbose,
        FormField::DefaultAvailableCurrent,
        FormField::MaximumAvailableCurrent,
        FormField::MinimumCurrent,
    ];

    /// Wire name of the field
    pub fn name(&self) -> &'static str {
        match self {
            FormField::EnableChargeManager => "enable_charge_manager",
            FormField::EnableWatchdog => "enable_watchdog",
            FormField::Verbose => "verbose",
            FormField::DefaultAvailableCurrent => "default_available_current",
            FormField::MaximumAvailableCurrent => "maximum_available_current",
            FormField::MinimumCurrent => "minimum_current",
        }
    }

    pub fn element_id(&self) -> &'static str {
        match self {
            FormField::EnableChargeManager => ids::ENABLE,
            FormField::EnableWatchdog => ids::ENABLE_WATCHDOG,
            FormField::Verbose => ids::VERBOSE,
            FormField::DefaultAvailableCurrent => ids::DEFAULT_AVAILABLE_CURRENT,
            FormField::MaximumAvailableCurrent => ids::MAXIMUM_AVAILABLE_CURRENT,
            FormField::MinimumCurrent => ids::MINIMUM_CURRENT,
        }
    }

    /// Checkbox fields hold a flag, the others an ampere value
    pub fn is_toggle(&self) -> bool {
        matches!(
            self,
            FormField::EnableChargeManager | FormField::EnableWatchdog | FormField::Verbose
        )
    }
}

impl FromStr for FormField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FormField::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| Error::validation(s, "unknown configuration field"))
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A form control that can be marked invalid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRef {
    Field(FormField),
    ChargerHost(usize),
    NewChargerHost,
    NewChargerName,
}

impl FieldRef {
    pub fn element_id(&self) -> String {
        match self {
            FieldRef::Field(field) => field.element_id().to_string(),
            FieldRef::ChargerHost(index) => ids::roster_entry(*index, "host"),
            FieldRef::NewChargerHost => ids::NEW_CHARGER_HOST.to_string(),
            FieldRef::NewChargerName => ids::NEW_CHARGER_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FieldError {
    pub field: FieldRef,
    pub message: String,
}

impl FieldError {
    fn new(field: FieldRef, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Parse an ampere value typed by the operator into milliamps
pub fn parse_amps(text: &str) -> std::result::Result<u32, String> {
    let amps: f64 = text
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", text.trim()))?;

    if !amps.is_finite() || amps < 0.0 {
        return Err("must be a non-negative number of amperes".to_string());
    }

    let milliamps = (amps * 1000.0).round();
    if milliamps > f64::from(u32::MAX) {
        return Err("value is too large".to_string());
    }
    Ok(milliamps as u32)
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Some(true),
        "false" | "off" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Editable copy of the configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigForm {
    pub enable_charge_manager: bool,
    pub enable_watchdog: bool,
    pub verbose: bool,
    pub default_available_current: String,
    pub maximum_available_current: String,
    pub minimum_current: String,
    pub chargers: Vec<ChargerEntry>,
}

impl ConfigForm {
    pub fn from_config(config: &ManagerConfig) -> Self {
        Self {
            enable_charge_manager: config.enable_charge_manager,
            enable_watchdog: config.enable_watchdog,
            verbose: config.verbose,
            default_available_current: format_amps(config.default_available_current, 3),
            maximum_available_current: format_amps(config.maximum_available_current, 3),
            minimum_current: format_amps(config.minimum_current, 3),
            chargers: config.chargers.clone(),
        }
    }

    /// Property the control of `field` displays
    pub fn field_prop(&self, field: FormField) -> Prop {
        match field {
            FormField::EnableChargeManager => Prop::Checked(self.enable_charge_manager),
            FormField::EnableWatchdog => Prop::Checked(self.enable_watchdog),
            FormField::Verbose => Prop::Checked(self.verbose),
            FormField::DefaultAvailableCurrent => {
                Prop::Value(self.default_available_current.clone())
            }
            FormField::MaximumAvailableCurrent => {
                Prop::Value(self.maximum_available_current.clone())
            }
            FormField::MinimumCurrent => Prop::Value(self.minimum_current.clone()),
        }
    }

    /// Store what the operator entered into `field`
    pub fn set_field(&mut self, field: FormField, value: &str) -> Result<()> {
        if field.is_toggle() {
            let flag = parse_flag(value)
                .ok_or_else(|| Error::validation(field.name(), "expected on or off"))?;
            match field {
                FormField::EnableChargeManager => self.enable_charge_manager = flag,
                FormField::EnableWatchdog => self.enable_watchdog = flag,
                _ => self.verbose = flag,
            }
            return Ok(());
        }

        let text = value.to_string();
        match field {
            FormField::DefaultAvailableCurrent => self.default_available_current = text,
            FormField::MaximumAvailableCurrent => self.maximum_available_current = text,
            _ => self.minimum_current = text,
        }
        Ok(())
    }

    /// Store an edited host. Returns `false` for an index outside the roster.
    pub fn set_host(&mut self, index: usize, host: &str) -> bool {
        match self.chargers.get_mut(index) {
            Some(entry) => {
                entry.host = host.to_string();
                true
            }
            None => false,
        }
    }

    /// Copy of the form without the charger at `index`
    pub fn without(&self, index: usize) -> Option<Self> {
        if index >= self.chargers.len() {
            return None;
        }
        let mut form = self.clone();
        form.chargers.remove(index);
        Some(form)
    }

    /// Copy of the form with `entry` appended, `None` once the roster is full
    pub fn with_added(&self, entry: ChargerEntry) -> Option<Self> {
        if self.chargers.len() >= MAX_CHARGERS {
            return None;
        }
        let mut form = self.clone();
        form.chargers.push(entry);
        Some(form)
    }

    /// Check every field and build the config to send
    pub fn validate(&self) -> std::result::Result<ManagerConfig, Vec<FieldError>> {
        let mut errors = Vec::new();

        let mut amps = |field: FormField, text: &str| match parse_amps(text) {
            Ok(value) => value,
            Err(message) => {
                errors.push(FieldError::new(FieldRef::Field(field), message));
                0
            }
        };

        let default_available_current = amps(
            FormField::DefaultAvailableCurrent,
            &self.default_available_current,
        );
        let maximum_available_current = amps(
            FormField::MaximumAvailableCurrent,
            &self.maximum_available_current,
        );
        let minimum_current = amps(FormField::MinimumCurrent, &self.minimum_current);

        if default_available_current > maximum_available_current {
            errors.push(FieldError::new(
                FieldRef::Field(FormField::DefaultAvailableCurrent),
                format!(
                    "must not exceed the maximum available current ({} A)",
                    format_amps(maximum_available_current, 3)
                ),
            ));
        }

        for (index, entry) in self.chargers.iter().enumerate() {
            if entry.host.trim().is_empty() {
                errors.push(FieldError::new(
                    FieldRef::ChargerHost(index),
                    "host must not be empty",
                ));
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ManagerConfig {
            enable_charge_manager: self.enable_charge_manager,
            enable_watchdog: self.enable_watchdog,
            verbose: self.verbose,
            default_available_current,
            maximum_available_current,
            minimum_current,
            chargers: self
                .chargers
                .iter()
                .map(|entry| ChargerEntry::new(entry.host.trim(), entry.name.clone()))
                .collect(),
        })
    }
}

/// Check the add-charger dialog; both inputs are required
pub fn validate_new_charger(host: &str, name: &str) -> std::result::Result<ChargerEntry, Vec<FieldError>> {
    let mut errors = Vec::new();
    if host.trim().is_empty() {
        errors.push(FieldError::new(FieldRef::NewChargerHost, "host must not be empty"));
    }
    if name.trim().is_empty() {
        errors.push(FieldError::new(FieldRef::NewChargerName, "name must not be empty"));
    }

    if errors.is_empty() {
        Ok(ChargerEntry::new(host.trim(), name.trim()))
    } else {
        Err(errors)
    }
}
