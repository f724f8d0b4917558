//! SSE streaming for the `/location` endpoint
//!
//! - `parser` turns the `text/event-stream` wire format into frames
//! - `factory` opens one HTTP connection per stream and pumps frames into a
//!   `StreamHandle`

mod factory;
mod parser;

pub use factory::SseStreamFactory;
pub use parser::{SseFrame, SseParser};
