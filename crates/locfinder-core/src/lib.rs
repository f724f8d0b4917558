//! locfinder-core - Core traits and types for the live location map client
//!
//! This crate provides the abstractions shared by the transport
//! (`locfinder-client`) and the map-side coordination (`locfinder-map`):
//!
//! - the data model (coordinates, filters, location events, markers)
//! - the location event codec
//! - the cancellable stream handle and the `EventStreamFactory` trait
//! - the `MapSurface` trait the coordinator renders into

pub mod codec;
pub mod error;
pub mod models;
pub mod stream;
pub mod surface;

pub use codec::LocationEventCodec;
pub use error::{DecodeError, OpenError, TransportError};
pub use models::*;
pub use stream::{EventStreamFactory, StreamCanceller, StreamFeed, StreamHandle, StreamItem};
pub use surface::{MapSurface, ViewportNotifier};
