//! Test utilities for locfinder-client
//!
//! Provides a scripted `/location` SSE server for integration tests. Every
//! connected stream receives whatever is published after it connected, and
//! every request's query is recorded so tests can check how streams were
//! scoped.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use locfinder_core::{LocationEvent, LocationEventCodec};
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::{Result, SseStreamFactory};

/// Query of one `GET /location` request
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StreamRequest {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(rename = "type")]
    pub location_type: String,
    #[serde(rename = "numberOfLocations", default)]
    pub number_of_locations: Option<u32>,
    #[serde(default)]
    pub radius: Option<u32>,
}

#[derive(Debug, Clone)]
enum Push {
    Data(String),
    Close,
}

#[derive(Clone)]
struct ServerState {
    pushes: broadcast::Sender<Push>,
    requests: Arc<Mutex<Vec<StreamRequest>>>,
    active: Arc<AtomicUsize>,
}

/// Decrements the live connection count when a stream body is dropped
struct ConnectionGuard(Arc<AtomicUsize>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// GET /location?longitude=..&latitude=..&type=..
async fn stream_locations(
    State(state): State<ServerState>,
    Query(request): Query<StreamRequest>,
) -> Response {
    if request.location_type.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "type must not be blank").into_response();
    }

    // Subscribe before recording so nothing published afterwards is missed
    let receiver = state.pushes.subscribe();
    state.requests.lock().push(request);
    state.active.fetch_add(1, Ordering::SeqCst);
    let guard = ConnectionGuard(state.active.clone());

    let stream = BroadcastStream::new(receiver)
        .take_while(|push| !matches!(push, Ok(Push::Close)))
        .filter_map(move |push| {
            let _guard = &guard;
            match push {
                Ok(Push::Data(data)) => Some(Ok::<_, Infallible>(Event::default().data(data))),
                _ => None,
            }
        });

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// A `/location` server that automatically shuts down when dropped
pub struct LocationTestServer {
    pub addr: SocketAddr,
    state: ServerState,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl LocationTestServer {
    /// Bind to an ephemeral port and start serving
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (pushes, _) = broadcast::channel(256);
        let state = ServerState {
            pushes,
            requests: Arc::new(Mutex::new(Vec::new())),
            active: Arc::new(AtomicUsize::new(0)),
        };

        let router = Router::new()
            .route("/location", get(stream_locations))
            .with_state(state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        Ok(Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A stream factory pointed at this server
    pub fn factory(&self) -> Result<SseStreamFactory> {
        SseStreamFactory::with_config(&self.base_url(), Duration::from_secs(2))
    }

    /// Push a location to every connected stream. Returns the number of streams reached.
    pub fn publish(&self, event: &LocationEvent) -> usize {
        let data = LocationEventCodec::encode(event).unwrap_or_default();
        self.publish_raw(data)
    }

    /// Push an arbitrary `data` payload to every connected stream
    pub fn publish_raw(&self, data: impl Into<String>) -> usize {
        self.state.pushes.send(Push::Data(data.into())).unwrap_or(0)
    }

    /// End every connected stream from the server side
    pub fn close_streams(&self) -> usize {
        self.state.pushes.send(Push::Close).unwrap_or(0)
    }

    /// Every stream request received so far, in arrival order
    pub fn requests(&self) -> Vec<StreamRequest> {
        self.state.requests.lock().clone()
    }

    /// Number of stream bodies still held open
    pub fn active_connections(&self) -> usize {
        self.state.active.load(Ordering::SeqCst)
    }

    /// Wait until `count` stream requests have been received
    pub async fn wait_for_requests(&self, count: usize, timeout: Duration) -> bool {
        let requests = self.state.requests.clone();
        wait_for(|| async { requests.lock().len() >= count }, timeout).await
    }

    /// Wait until exactly `count` streams are open
    pub async fn wait_for_active(&self, count: usize, timeout: Duration) -> bool {
        let active = self.state.active.clone();
        wait_for(
            || async { active.load(Ordering::SeqCst) == count },
            timeout,
        )
        .await
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        // Open SSE bodies would otherwise hold the graceful shutdown
        self.close_streams();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for LocationTestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Wait for a condition with timeout
pub async fn wait_for<F, Fut>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;

    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    false
}
