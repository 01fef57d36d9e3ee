//! Incremental decoder for `text/event-stream` bodies
//!
//! Bytes arrive in arbitrary chunks; the decoder buffers partial lines and
//! emits an [`SseEvent`] at every blank line that terminates an event block.

use std::time::Duration;

/// Event name used when a block carries no `event:` field
pub const DEFAULT_EVENT: &str = "message";

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name; the device uses the topic here
    pub event: String,
    /// Data lines joined with `\n`
    pub data: String,
    /// Last event ID seen on the stream
    pub id: Option<String>,
}

/// Line-oriented event-stream decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    last_id: Option<String>,
    retry: Option<Duration>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the response body, returning every completed event
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Reconnection delay requested by the server, if any
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    /// Drop any partially received event (after a reconnect)
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.event = None;
        self.data.clear();
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }

        // Comment / keep-alive
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" if !value.contains('\0') => self.last_id = Some(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry = Some(Duration::from_millis(ms));
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }

        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event: event
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data,
            id: self.last_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"event: charge_manager/available_current\ndata: {\"current\":6000}\n\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "charge_manager/available_current");
        assert_eq!(events[0].data, "{\"current\":6000}");
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.feed(b"event: charge_manager/st").is_empty());
        assert!(decoder.feed(b"ate\r\ndata: {\"state\":1,").is_empty());
        let events = decoder.feed(b"\"uptime\":5,\"chargers\":[]}\r\n\r\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "charge_manager/state");
        assert_eq!(events[0].data, "{\"state\":1,\"uptime\":5,\"chargers\":[]}");
    }

    #[test]
    fn test_multiline_data_is_joined() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: first\ndata: second\n\n");

        assert_eq!(events[0].event, DEFAULT_EVENT);
        assert_eq!(events[0].data, "first\nsecond");
    }

    #[test]
    fn test_comments_and_empty_blocks_are_skipped() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b": keep-alive\n\nevent: ping\n\n");
        assert!(events.is_empty());
    }

    #[test]
    fn test_multiple_events_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"event: a\ndata: 1\n\nevent: b\ndata: 2\n\n");

        let names: Vec<_> = events.iter().map(|e| e.event.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_id_and_retry_fields() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"retry: 3000\nid: 42\ndata: x\n\n");

        assert_eq!(events[0].id.as_deref(), Some("42"));
        assert_eq!(decoder.retry(), Some(Duration::from_millis(3000)));
    }

    #[test]
    fn test_reset_discards_partial_event() {
        let mut decoder = SseDecoder::new();
        decoder.feed(b"event: a\ndata: partial");
        decoder.reset();

        let events = decoder.feed(b"data: fresh\n\n");
        assert_eq!(events[0].event, DEFAULT_EVENT);
        assert_eq!(events[0].data, "fresh");
    }
}
