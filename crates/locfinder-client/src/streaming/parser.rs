//! SSE (Server-Sent Events) parser
//!
//! Parses the SSE wire format into frames. Payload decoding is left to the
//! consumer, the parser only reassembles `data` lines.

use bytes::Bytes;
use tracing::trace;

/// One dispatched SSE event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Event type, `None` when the server sent no `event:` field
    pub event: Option<String>,
    /// Data lines joined with `\n`
    pub data: String,
    /// Last event ID seen on the stream
    pub id: Option<String>,
}

impl SseFrame {
    /// Whether an `EventSource` would deliver this frame to `onmessage`
    pub fn is_message(&self) -> bool {
        matches!(self.event.as_deref(), None | Some("message"))
    }
}

/// SSE parser state
#[derive(Debug, Default)]
pub struct SseParser {
    /// Buffer for incomplete lines
    buffer: Vec<u8>,
    /// Current event data being accumulated
    data_buffer: String,
    /// Whether a `data` field was seen for the current event
    has_data: bool,
    /// Current event type (if any)
    event_type: Option<String>,
    /// Last event ID (if any)
    last_id: Option<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes into the parser and extract any complete frames
    pub fn feed(&mut self, bytes: Bytes) -> Vec<SseFrame> {
        let mut frames = Vec::new();

        self.buffer.extend_from_slice(&bytes);

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.drain(..=pos).collect::<Vec<_>>();
            let line = &line[..line.len() - 1];

            // Handle \r\n line endings
            let line = line.strip_suffix(b"\r").unwrap_or(line);

            if let Some(frame) = self.process_line(line) {
                frames.push(frame);
            }
        }

        frames
    }

    /// Last event ID reported by the server
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_id.as_deref()
    }

    fn process_line(&mut self, line: &[u8]) -> Option<SseFrame> {
        // Empty line signals end of event
        if line.is_empty() {
            return self.dispatch();
        }

        // Comment line (keepalive)
        if line.starts_with(b":") {
            trace!("SSE keepalive/comment");
            return None;
        }

        let line = String::from_utf8_lossy(line);

        // Split on first colon; a line without one is a field with no value
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (&*line, ""),
        };

        match field {
            "data" => {
                if self.has_data {
                    self.data_buffer.push('\n');
                }
                self.data_buffer.push_str(value);
                self.has_data = true;
            }
            "event" => {
                self.event_type = Some(value.to_string());
            }
            "id" => {
                self.last_id = Some(value.to_string());
            }
            "retry" => {
                // No reconnection is attempted
                trace!(retry = %value, "SSE retry ignored");
            }
            _ => {
                trace!(field = %field, "SSE unknown field");
            }
        }

        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event_type.take();

        if !self.has_data {
            return None;
        }
        self.has_data = false;

        Some(SseFrame {
            event,
            data: std::mem::take(&mut self.data_buffer),
            id: self.last_id.clone(),
        })
    }
}
