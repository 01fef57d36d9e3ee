//! # chargepanel-device - Device Transport
//!
//! Everything that talks to the charge manager over the network: resource
//! writes and the push feeds that deliver live snapshots.
//!
//! Depends on [`chargepanel_core`] for error handling and logging.
//!
//! ## Public API
//!
//! ### Writes
//! - [`Transport`] - Async PUT of a JSON payload to a device resource
//! - [`HttpTransport`] - reqwest-backed implementation
//! - [`WriteFailure`] - Status, reason and body of a rejected write
//!
//! ### Push
//! - [`PushChannel`] - Topic-keyed listener registry
//! - [`run_event_stream()`] - Server-sent events feed with reconnect
//! - [`run_websocket()`] - WebSocket feed with reconnect
//! - [`SseDecoder`] - Incremental `text/event-stream` parser

pub mod http;
pub mod push;
pub mod sse;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;
pub mod transport;

pub use http::HttpTransport;
pub use push::{parse_topic_frames, run_event_stream, run_websocket, PushChannel};
pub use sse::{SseDecoder, SseEvent};
pub use transport::{
    LocalTransport, Transport, WriteFailure, WriteResult, AVAILABLE_CURRENT_UPDATE_PATH,
    CONFIG_UPDATE_PATH, REBOOT_PATH, STATUS_DEVICE_BUSY,
};
