//! Settings file loading

use std::path::{Path, PathBuf};

use chargepanel_core::prelude::*;

use super::types::Settings;

const CONFIG_DIR: &str = "chargepanel";
const CONFIG_FILENAME: &str = "config.toml";

/// `<config_dir>/chargepanel/config.toml`, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILENAME))
}

/// Load settings from `path`, or from the default location when `None`.
///
/// A missing or broken file never stops the panel: it falls back to defaults.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let Some(config_path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
        debug!("No config directory on this platform, using defaults");
        return Settings::default();
    };

    if !config_path.exists() {
        if path.is_some() {
            warn!("Config file {:?} does not exist, using defaults", config_path);
        } else {
            debug!("No config file at {:?}, using defaults", config_path);
        }
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}
