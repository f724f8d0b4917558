//! MapSurface trait - the rendering surface the coordinator draws into
//!
//! The actual map widget (tiles, projection, input handling) lives outside
//! this workspace. The coordinator only needs a center coordinate, an entity
//! collection and a "viewport settled" notification.

use tokio::sync::mpsc;

use crate::models::{Coordinate, MapOptions, Marker};

/// Sender half used by a surface to report settled viewports
pub type ViewportNotifier = mpsc::UnboundedSender<Coordinate>;

pub trait MapSurface: Send {
    /// Set up the surface with a center, zoom level and credential
    fn initialize(&mut self, options: &MapOptions);

    /// Current center of the visible region
    fn center(&self) -> Coordinate;

    /// Register where "viewport settled" notifications go
    ///
    /// The surface sends the new center after every pan/zoom completes.
    /// Registering again replaces the previous notifier.
    fn on_viewport_settled(&mut self, notifier: ViewportNotifier);

    /// Append a marker to the entity collection
    fn append(&mut self, marker: Marker);

    /// Remove every marker from the entity collection
    fn clear(&mut self);

    /// Number of markers currently in the entity collection
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
