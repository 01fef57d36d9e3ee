//! Push channel: topic demultiplexing and the feeds that fill it
//!
//! The shell owns one [`PushChannel`] and hands it to every module that wants
//! live data; modules register per-topic listeners, and a feed task
//! ([`run_event_stream`] or [`run_websocket`]) dispatches raw payloads.
//!
//! Delivery is at-least-once: a reconnect may replay the current snapshot of
//! every topic. Listeners must tolerate duplicates.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures_util::StreamExt;
use rand::Rng;
use serde::Deserialize;
use tokio::sync::watch;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use url::Url;

use chargepanel_core::prelude::*;

use crate::sse::SseDecoder;

type Listener = Arc<dyn Fn(&str) + Send + Sync>;

/// Topic-keyed fan-out of raw push payloads
#[derive(Clone, Default)]
pub struct PushChannel {
    listeners: Arc<RwLock<HashMap<String, Vec<Listener>>>>,
}

impl std::fmt::Debug for PushChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushChannel")
            .field("topics", &self.topics())
            .finish()
    }
}

impl PushChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for every payload published on `topic`
    pub fn add_listener<F>(&self, topic: impl Into<String>, listener: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let topic = topic.into();
        debug!("Push listener registered for {}", topic);
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(topic)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Deliver a payload to the listeners of `topic`.
    ///
    /// Returns the number of listeners invoked; unknown topics are dropped.
    pub fn dispatch(&self, topic: &str, data: &str) -> usize {
        let listeners: Vec<Listener> = {
            let map = self.listeners.read().unwrap_or_else(|e| e.into_inner());
            match map.get(topic) {
                Some(listeners) => listeners.clone(),
                None => {
                    trace!("No listener for topic {}", topic);
                    return 0;
                }
            }
        };

        for listener in &listeners {
            listener(data);
        }
        listeners.len()
    }

    /// Topics with at least one listener, sorted
    pub fn topics(&self) -> Vec<String> {
        let map = self.listeners.read().unwrap_or_else(|e| e.into_inner());
        let mut topics: Vec<String> = map.keys().cloned().collect();
        topics.sort();
        topics
    }
}

// ─────────────────────────────────────────────────────────────────
// Event stream feed
// ─────────────────────────────────────────────────────────────────

/// Read server-sent events from `url` until shutdown, reconnecting on failure
pub async fn run_event_stream(
    client: reqwest::Client,
    url: Url,
    channel: PushChannel,
    reconnect_delay: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!("Event stream feed starting: {}", url);
    let mut decoder = SseDecoder::new();

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            result = stream_events_once(&client, &url, &channel, &mut decoder) => {
                match result {
                    Ok(()) => info!("Event stream closed by device"),
                    Err(e) => warn!("Event stream error: {}", e),
                }
            }
        }

        decoder.reset();
        let delay = decoder.retry().unwrap_or(reconnect_delay);
        if !wait_before_reconnect(delay, &mut shutdown_rx).await {
            break;
        }
    }

    info!("Event stream feed stopped");
}

async fn stream_events_once(
    client: &reqwest::Client,
    url: &Url,
    channel: &PushChannel,
    decoder: &mut SseDecoder,
) -> Result<()> {
    let mut response = client
        .get(url.clone())
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await
        .map_err(|e| Error::push_disconnected(e.to_string()))?;

    if !response.status().is_success() {
        return Err(Error::push_disconnected(format!(
            "event stream answered {}",
            response.status()
        )));
    }

    info!("Event stream connected");

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| Error::push_disconnected(e.to_string()))?
    {
        for event in decoder.feed(&chunk) {
            channel.dispatch(&event.event, &event.data);
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────
// WebSocket feed
// ─────────────────────────────────────────────────────────────────

/// One websocket frame line: `{"topic": "...", "payload": {...}}`
#[derive(Debug, Deserialize)]
struct TopicFrame {
    topic: String,
    payload: serde_json::Value,
}

/// Split a websocket text frame into `(topic, payload)` pairs.
///
/// The device may batch several newline-separated updates in one frame;
/// malformed lines are skipped.
pub fn parse_topic_frames(text: &str) -> Vec<(String, String)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<TopicFrame>(line) {
            Ok(frame) => Some((frame.topic, frame.payload.to_string())),
            Err(e) => {
                warn!("Skipping malformed websocket frame: {}", e);
                None
            }
        })
        .collect()
}

/// Read topic frames from a websocket until shutdown, reconnecting on failure
pub async fn run_websocket(
    url: Url,
    channel: PushChannel,
    reconnect_delay: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!("WebSocket feed starting: {}", url);

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            result = websocket_once(&url, &channel) => {
                match result {
                    Ok(()) => info!("WebSocket closed by device"),
                    Err(e) => warn!("WebSocket error: {}", e),
                }
            }
        }

        if !wait_before_reconnect(reconnect_delay, &mut shutdown_rx).await {
            break;
        }
    }

    info!("WebSocket feed stopped");
}

async fn websocket_once(url: &Url, channel: &PushChannel) -> Result<()> {
    let (mut socket, _) = connect_async(url.as_str())
        .await
        .map_err(|e| Error::push_disconnected(e.to_string()))?;

    info!("WebSocket connected");

    while let Some(frame) = socket.next().await {
        match frame.map_err(|e| Error::push_disconnected(e.to_string()))? {
            WsMessage::Text(text) => {
                for (topic, payload) in parse_topic_frames(text.as_str()) {
                    channel.dispatch(&topic, &payload);
                }
            }
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────
// Reconnect helpers
// ─────────────────────────────────────────────────────────────────

/// Sleep for `delay` plus up to 25% jitter. Returns `false` on shutdown.
async fn wait_before_reconnect(delay: Duration, shutdown_rx: &mut watch::Receiver<bool>) -> bool {
    if *shutdown_rx.borrow() {
        return false;
    }

    let delay = jittered(delay);
    debug!("Reconnecting push feed in {:?}", delay);

    tokio::select! {
        _ = shutdown_rx.changed() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

fn jittered(delay: Duration) -> Duration {
    let max_jitter = (delay.as_millis() / 4) as u64;
    if max_jitter == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::thread_rng().gen_range(0..=max_jitter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_dispatch_reaches_topic_listeners_only() {
        let channel = PushChannel::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        channel.add_listener("charge_manager/state", move |data| {
            sink.lock().unwrap().push(data.to_string());
        });

        assert_eq!(channel.dispatch("charge_manager/state", "{}"), 1);
        assert_eq!(channel.dispatch("evse/state", "{}"), 0);
        assert_eq!(*seen.lock().unwrap(), vec!["{}".to_string()]);
    }

    #[test]
    fn test_clones_share_listeners() {
        let channel = PushChannel::new();
        let feed_side = channel.clone();

        channel.add_listener("info/modules", |_| {});

        assert_eq!(feed_side.dispatch("info/modules", "{}"), 1);
        assert_eq!(feed_side.topics(), vec!["info/modules".to_string()]);
    }

    #[test]
    fn test_parse_topic_frames_batched() {
        let frames = parse_topic_frames(
            "{\"topic\":\"charge_manager/available_current\",\"payload\":{\"current\":6000}}\n\
             not json\n\
             {\"topic\":\"info/modules\",\"payload\":{\"charge_manager\":true}}\n",
        );

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].0, "charge_manager/available_current");
        assert_eq!(frames[0].1, "{\"current\":6000}");
        assert_eq!(frames[1].0, "info/modules");
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let base = Duration::from_millis(2000);
        for _ in 0..50 {
            let delay = jittered(base);
            assert!(delay >= base);
            assert!(delay <= Duration::from_millis(2500));
        }
    }

    #[tokio::test]
    async fn test_wait_before_reconnect_stops_on_shutdown() {
        let (tx, mut rx) = watch::channel(false);
        tx.send(true).unwrap();

        assert!(!wait_before_reconnect(Duration::from_secs(60), &mut rx).await);
    }
}
