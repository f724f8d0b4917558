//! End-to-end tests for the live location map
//!
//! These tests run the full client stack:
//! 1. Start the scripted `/location` server
//! 2. Run a `SubscriptionCoordinator` over a real SSE stream factory
//! 3. Move the headless map surface and publish locations
//! 4. Verify which markers end up on the surface
//!
//! Run with: cargo test -p locfinder-tests --test e2e_test

use std::time::Duration;

use locfinder_client::testing::{wait_for, LocationTestServer};
use locfinder_core::{
    Coordinate, LocationEvent, MapOptions, MapSurface, Marker, StreamFilter, ViewportState,
    DEFAULT_CENTER,
};
use locfinder_map::{HeadlessMapSurface, SubscriptionCoordinator, SurfaceController};
use pretty_assertions::assert_eq;
use tokio::task::JoinHandle;

const WAIT: Duration = Duration::from_secs(5);

/// Test harness that runs a coordinator against a local location server
struct TestHarness {
    server: LocationTestServer,
    controller: SurfaceController,
    coordinator: Option<JoinHandle<()>>,
}

impl TestHarness {
    async fn new() -> Self {
        Self::with_filter(StreamFilter::default()).await
    }

    async fn with_filter(filter: StreamFilter) -> Self {
        let server = LocationTestServer::start().await.unwrap();
        let factory = server.factory().unwrap();

        let mut surface = HeadlessMapSurface::new();
        surface.initialize(&MapOptions::default());
        let controller = surface.controller();

        let viewport = ViewportState::new(DEFAULT_CENTER, filter);
        let coordinator = SubscriptionCoordinator::new(factory, surface, viewport);
        let coordinator = tokio::spawn(coordinator.run());

        let harness = Self {
            server,
            controller,
            coordinator: Some(coordinator),
        };
        assert!(
            harness.server.wait_for_requests(1, WAIT).await,
            "initial stream was never opened"
        );
        harness
    }

    async fn wait_for_markers(&self, count: usize) -> bool {
        wait_for(|| async { self.controller.markers().len() == count }, WAIT).await
    }

    /// Settle the viewport and wait for the replacement stream to connect
    async fn move_to(&self, center: Coordinate) {
        let expected = self.server.requests().len() + 1;
        assert!(self.controller.settle_at(center));
        assert!(
            self.server.wait_for_requests(expected, WAIT).await,
            "replacement stream was never opened"
        );
    }

    fn labels(&self) -> Vec<u64> {
        self.controller
            .markers()
            .iter()
            .map(|marker| marker.label)
            .collect()
    }

    async fn teardown(mut self) {
        self.controller.detach();
        if let Some(coordinator) = self.coordinator.take() {
            tokio::time::timeout(WAIT, coordinator)
                .await
                .expect("coordinator did not stop")
                .unwrap();
        }
        self.server.shutdown().await;
    }
}

#[tokio::test]
async fn test_initial_stream_renders_markers() {
    let harness = TestHarness::new().await;

    let request = &harness.server.requests()[0];
    assert_eq!(request.latitude, DEFAULT_CENTER.latitude);
    assert_eq!(request.longitude, DEFAULT_CENTER.longitude);
    assert_eq!(request.location_type, "FoodTruck");

    harness
        .server
        .publish(&LocationEvent::new("Truck A", 37.78, -122.43));
    harness
        .server
        .publish(&LocationEvent::new("Truck B", 37.77, -122.42));
    assert!(harness.wait_for_markers(2).await);

    assert_eq!(
        harness.controller.markers(),
        vec![
            Marker {
                position: Coordinate::new(37.78, -122.43),
                title: "Truck A".into(),
                label: 1,
            },
            Marker {
                position: Coordinate::new(37.77, -122.42),
                title: "Truck B".into(),
                label: 2,
            },
        ]
    );

    harness.teardown().await;
}

#[tokio::test]
async fn test_viewport_change_rebinds_stream() {
    let harness = TestHarness::new().await;

    harness
        .server
        .publish(&LocationEvent::new("Truck A", 37.78, -122.43));
    harness
        .server
        .publish(&LocationEvent::new("Truck B", 37.77, -122.42));
    assert!(harness.wait_for_markers(2).await);

    let moved = Coordinate::new(37.80, -122.40);
    harness.move_to(moved).await;

    let request = &harness.server.requests()[1];
    assert_eq!(request.latitude, 37.80);
    assert_eq!(request.longitude, -122.40);
    assert_eq!(harness.controller.clear_count(), 1);

    harness
        .server
        .publish(&LocationEvent::new("Truck C", 37.801, -122.401));
    assert!(harness.wait_for_markers(1).await);

    // Only the replacement stream renders, so label 3 appears exactly once
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.labels(), vec![3]);
    assert_eq!(harness.controller.markers()[0].title, "Truck C");

    harness.teardown().await;
}

#[tokio::test]
async fn test_rapid_viewport_changes_keep_one_live_stream() {
    let harness = TestHarness::new().await;

    let centers: Vec<Coordinate> = (1..=5)
        .map(|step| Coordinate::new(37.78 + step as f64 * 0.01, -122.42))
        .collect();
    for center in &centers {
        harness.move_to(*center).await;
    }

    let requests = harness.server.requests();
    assert_eq!(requests.len(), 6);
    let last = centers[4];
    assert_eq!(requests[5].latitude, last.latitude);
    assert_eq!(harness.controller.clear_count(), 5);

    harness
        .server
        .publish(&LocationEvent::new("Truck", last.latitude, last.longitude));
    assert!(harness.wait_for_markers(1).await);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.labels(), vec![1]);

    harness.teardown().await;
}

#[tokio::test]
async fn test_malformed_payload_is_skipped() {
    let harness = TestHarness::new().await;

    harness.server.publish_raw("not json");
    harness.server.publish_raw(r#"{"name":"No Position"}"#);
    harness
        .server
        .publish(&LocationEvent::new("Truck A", 37.78, -122.43));
    assert!(harness.wait_for_markers(1).await);

    assert_eq!(harness.labels(), vec![1]);
    assert_eq!(harness.controller.markers()[0].title, "Truck A");

    harness.teardown().await;
}

#[tokio::test]
async fn test_stream_completion_keeps_markers_until_next_move() {
    let harness = TestHarness::new().await;

    harness
        .server
        .publish(&LocationEvent::new("Truck A", 37.78, -122.43));
    assert!(harness.wait_for_markers(1).await);

    harness.server.close_streams();
    assert!(harness.server.wait_for_active(0, WAIT).await);
    assert_eq!(harness.labels(), vec![1]);

    harness.move_to(Coordinate::new(37.80, -122.40)).await;
    harness
        .server
        .publish(&LocationEvent::new("Truck B", 37.80, -122.40));
    assert!(wait_for(|| async { harness.labels() == vec![2] }, WAIT).await);

    harness.teardown().await;
}

#[tokio::test]
async fn test_filter_criteria_reach_server() {
    let filter = StreamFilter::new("Restaurant")
        .with_number_of_locations(3)
        .with_radius(2);
    let harness = TestHarness::with_filter(filter).await;

    let request = &harness.server.requests()[0];
    assert_eq!(request.location_type, "Restaurant");
    assert_eq!(request.number_of_locations, Some(3));
    assert_eq!(request.radius, Some(2));

    harness.move_to(Coordinate::new(37.80, -122.40)).await;
    let request = &harness.server.requests()[1];
    assert_eq!(request.location_type, "Restaurant");
    assert_eq!(request.radius, Some(2));

    harness.teardown().await;
}
