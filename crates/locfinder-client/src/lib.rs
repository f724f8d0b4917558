//! Location stream client
//!
//! Implements [`EventStreamFactory`](locfinder_core::EventStreamFactory) over
//! Server-Sent Events: every `open` issues a fresh `GET /location` request
//! and feeds the `data` of each SSE message into a
//! [`StreamHandle`](locfinder_core::StreamHandle).
//!
//! # Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use locfinder_client::SseStreamFactory;
//! use locfinder_core::{EventStreamFactory, LocationEventCodec, StreamFilter, StreamItem, DEFAULT_CENTER};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let factory = SseStreamFactory::new("http://localhost:8080")?;
//!     let mut handle = factory.open(&DEFAULT_CENTER, &StreamFilter::new("FoodTruck"))?;
//!
//!     while let Some(item) = handle.next().await {
//!         match item {
//!             StreamItem::Message(raw) => println!("{:?}", LocationEventCodec::decode(&raw)),
//!             StreamItem::Error(e) => eprintln!("{}", e),
//!             StreamItem::End => break,
//!         }
//!     }
//!
//!     // Explicit cleanup (also happens on drop)
//!     handle.cancel();
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module provides a scripted `/location` server:
//!
//! ```rust,ignore
//! use locfinder_client::testing::LocationTestServer;
//!
//! let server = LocationTestServer::start().await?;
//! let factory = server.factory()?;
//! server.publish(&LocationEvent::new("Taco Cart", 37.78, -122.43));
//! ```

mod error;
pub mod streaming;
pub mod testing;

pub use error::{ClientError, Result};
pub use streaming::{SseParser, SseStreamFactory};
