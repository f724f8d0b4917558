//! In-memory map surface
//!
//! Stands in for a real map widget: it keeps the entity collection in memory
//! and lets a [`SurfaceController`] simulate the user settling the viewport
//! after a pan or zoom.

use std::sync::Arc;

use locfinder_core::{Coordinate, MapOptions, MapSurface, Marker, ViewportNotifier};
use parking_lot::Mutex;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct SurfaceState {
    options: Option<MapOptions>,
    center: Coordinate,
    markers: Vec<Marker>,
    notifier: Option<ViewportNotifier>,
    clears: usize,
}

/// Headless [`MapSurface`] backed by shared in-memory state
#[derive(Debug, Default)]
pub struct HeadlessMapSurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl HeadlessMapSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for driving and inspecting the surface from outside the coordinator
    pub fn controller(&self) -> SurfaceController {
        SurfaceController {
            state: self.state.clone(),
        }
    }
}

impl MapSurface for HeadlessMapSurface {
    fn initialize(&mut self, options: &MapOptions) {
        info!(center = %options.center, zoom = options.zoom, "Map surface initialized");
        let mut state = self.state.lock();
        state.center = options.center;
        state.options = Some(options.clone());
    }

    fn center(&self) -> Coordinate {
        self.state.lock().center
    }

    fn on_viewport_settled(&mut self, notifier: ViewportNotifier) {
        self.state.lock().notifier = Some(notifier);
    }

    fn append(&mut self, marker: Marker) {
        self.state.lock().markers.push(marker);
    }

    fn clear(&mut self) {
        let mut state = self.state.lock();
        state.markers.clear();
        state.clears += 1;
    }

    fn len(&self) -> usize {
        self.state.lock().markers.len()
    }
}

/// Cloneable view onto a [`HeadlessMapSurface`]
#[derive(Debug, Clone)]
pub struct SurfaceController {
    state: Arc<Mutex<SurfaceState>>,
}

impl SurfaceController {
    /// Move the viewport and emit a "viewport settled" notification
    ///
    /// Returns `false` when nobody is listening for notifications.
    pub fn settle_at(&self, center: Coordinate) -> bool {
        let mut state = self.state.lock();
        state.center = center;
        debug!(%center, "Viewport settled");
        match &state.notifier {
            Some(notifier) => notifier.send(center).is_ok(),
            None => false,
        }
    }

    /// Drop the notifier so the coordinator's run loop ends
    pub fn detach(&self) {
        self.state.lock().notifier = None;
    }

    pub fn center(&self) -> Coordinate {
        self.state.lock().center
    }

    pub fn options(&self) -> Option<MapOptions> {
        self.state.lock().options.clone()
    }

    /// Snapshot of the entity collection
    pub fn markers(&self) -> Vec<Marker> {
        self.state.lock().markers.clone()
    }

    /// How many times the entity collection was cleared
    pub fn clear_count(&self) -> usize {
        self.state.lock().clears
    }
}
