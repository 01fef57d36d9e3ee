//! Configuration types for the panel

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use chargepanel_core::prelude::*;

/// Settings file (`config.toml`)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub device: DeviceSettings,

    #[serde(default)]
    pub behavior: BehaviorSettings,
}

/// Which push feed the device offers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PushKind {
    /// Server-sent events (`text/event-stream`)
    #[default]
    EventStream,
    /// JSON frames over a websocket
    Websocket,
}

impl FromStr for PushKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "event_stream" | "event-stream" | "sse" => Ok(PushKind::EventStream),
            "websocket" | "ws" => Ok(PushKind::Websocket),
            other => Err(Error::config(format!("unknown push kind '{}'", other))),
        }
    }
}

impl fmt::Display for PushKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushKind::EventStream => write!(f, "event_stream"),
            PushKind::Websocket => write!(f, "websocket"),
        }
    }
}

/// Where the device lives and how to talk to it
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceSettings {
    /// Base URL of the device web interface
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default)]
    pub push: PushKind,

    /// Path of the server-sent events feed
    #[serde(default = "default_events_path")]
    pub events_path: String,

    /// Path of the websocket feed
    #[serde(default = "default_websocket_path")]
    pub websocket_path: String,

    /// Upper bound for a single write (0 = wait for the transport)
    #[serde(default)]
    pub write_timeout_ms: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            url: default_url(),
            push: PushKind::default(),
            events_path: default_events_path(),
            websocket_path: default_websocket_path(),
            write_timeout_ms: 0,
        }
    }
}

impl DeviceSettings {
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.url).map_err(|_| Error::invalid_url(self.url.clone()))
    }

    pub fn events_url(&self) -> Result<Url> {
        self.join(&self.events_path)
    }

    /// Websocket feed URL, with the scheme switched to `ws`/`wss`
    pub fn websocket_url(&self) -> Result<Url> {
        let mut url = self.join(&self.websocket_path)?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| Error::invalid_url(url.to_string()))?;
        Ok(url)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_ms > 0).then(|| Duration::from_millis(self.write_timeout_ms))
    }

    fn join(&self, path: &str) -> Result<Url> {
        let base = self.base_url()?;
        base.join(path)
            .map_err(|_| Error::invalid_url(format!("{}{}", self.url, path)))
    }
}

fn default_url() -> String {
    "http://192.168.0.10".to_string()
}

fn default_events_path() -> String {
    "/events".to_string()
}

fn default_websocket_path() -> String {
    "/ws".to_string()
}

/// Behavior settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BehaviorSettings {
    /// Delay before reconnecting a dropped push feed
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl BehaviorSettings {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_kind_parses_aliases() {
        assert_eq!("sse".parse::<PushKind>().unwrap(), PushKind::EventStream);
        assert_eq!("WebSocket".parse::<PushKind>().unwrap(), PushKind::Websocket);
        assert!("carrier-pigeon".parse::<PushKind>().is_err());
    }

    #[test]
    fn test_websocket_url_switches_scheme() {
        let device = DeviceSettings {
            url: "https://charger.local/".to_string(),
            ..Default::default()
        };

        assert_eq!(
            device.websocket_url().unwrap().as_str(),
            "wss://charger.local/ws"
        );
        assert_eq!(
            device.events_url().unwrap().as_str(),
            "https://charger.local/events"
        );
    }

    #[test]
    fn test_write_timeout_zero_means_none() {
        let mut device = DeviceSettings::default();
        assert_eq!(device.write_timeout(), None);

        device.write_timeout_ms = 1500;
        assert_eq!(device.write_timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_invalid_url_is_reported() {
        let device = DeviceSettings {
            url: "not a url".to_string(),
            ..Default::default()
        };

        assert!(matches!(device.base_url(), Err(Error::InvalidUrl { .. })));
    }
}
