//! Marker rendering

use locfinder_core::{LocationEvent, MapSurface, Marker};
use tracing::debug;

/// First label handed out in a session
const FIRST_LABEL: u64 = 1;

/// Session-wide source of marker labels
///
/// Strictly increasing and never reset, including across resubscriptions.
#[derive(Debug)]
pub struct MarkerLabelCounter {
    next: u64,
}

impl MarkerLabelCounter {
    pub fn new() -> Self {
        Self { next: FIRST_LABEL }
    }

    /// Take the next label
    pub fn next_label(&mut self) -> u64 {
        let label = self.next;
        self.next += 1;
        label
    }

    /// The label the next render will receive
    pub fn peek(&self) -> u64 {
        self.next
    }
}

impl Default for MarkerLabelCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns location events into labeled markers on a surface
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerRenderer;

impl MarkerRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Append a marker for `event` and return it
    ///
    /// Consumes exactly one label from `counter`.
    pub fn render<S>(
        &self,
        event: LocationEvent,
        surface: &mut S,
        counter: &mut MarkerLabelCounter,
    ) -> Marker
    where
        S: MapSurface + ?Sized,
    {
        let marker = Marker {
            position: event.position(),
            title: event.name,
            label: counter.next_label(),
        };

        debug!(
            label = marker.label,
            title = %marker.title,
            position = %marker.position,
            "Rendering marker"
        );
        surface.append(marker.clone());

        marker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessMapSurface;
    use locfinder_core::Coordinate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_counter_is_strictly_increasing() {
        let mut counter = MarkerLabelCounter::new();
        assert_eq!(counter.peek(), 1);
        assert_eq!(counter.next_label(), 1);
        assert_eq!(counter.next_label(), 2);
        assert_eq!(counter.peek(), 3);
    }

    #[test]
    fn test_render_appends_labeled_marker() {
        let mut surface = HeadlessMapSurface::new();
        let controller = surface.controller();
        let mut counter = MarkerLabelCounter::new();
        let renderer = MarkerRenderer::new();

        let first = renderer.render(
            LocationEvent::new("Taco Cart", 37.78, -122.43),
            &mut surface,
            &mut counter,
        );
        let second = renderer.render(
            LocationEvent::new("Curry Up", 37.79, -122.41),
            &mut surface,
            &mut counter,
        );

        assert_eq!(
            first,
            Marker {
                position: Coordinate::new(37.78, -122.43),
                title: "Taco Cart".into(),
                label: 1,
            }
        );
        assert_eq!(second.label, 2);
        assert_eq!(controller.markers(), vec![first, second]);
    }
}
