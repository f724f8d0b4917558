//! locfinder-map - Binds a live location stream to a map viewport
//!
//! The [`SubscriptionCoordinator`] keeps exactly one stream open for the
//! visible viewport. When the surface reports a settled viewport it cancels
//! the current stream, clears the rendered markers and opens a replacement.
//! Messages still in flight from a replaced stream are dropped by generation.
//!
//! # Usage
//!
//! ```ignore
//! use locfinder_client::SseStreamFactory;
//! use locfinder_core::{MapOptions, MapSurface, ViewportState};
//! use locfinder_map::{HeadlessMapSurface, SubscriptionCoordinator};
//!
//! let mut surface = HeadlessMapSurface::new();
//! surface.initialize(&MapOptions::default());
//!
//! let factory = SseStreamFactory::new("http://localhost:8080")?;
//! let coordinator = SubscriptionCoordinator::new(factory, surface, ViewportState::default());
//! coordinator.run().await;
//! ```

pub mod coordinator;
pub mod error;
pub mod renderer;
pub mod surface;

pub use coordinator::{Generation, SignalOutcome, StreamSignal, SubscriptionCoordinator};
pub use error::CoordinatorError;
pub use renderer::{MarkerLabelCounter, MarkerRenderer};
pub use surface::{HeadlessMapSurface, SurfaceController};
