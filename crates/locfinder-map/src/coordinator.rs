//! SubscriptionCoordinator - keeps one live stream bound to the viewport
//!
//! # Lifecycle
//!
//! ```text
//!   Idle ──start()──> Live ──on_viewport_changed()──> Live
//! ```
//!
//! While `Live`, a viewport change runs one reconciliation:
//!
//! 1. cancel the active stream handle
//! 2. clear the entity collection
//! 3. record the new center in the viewport state
//! 4. open a replacement stream
//!
//! Each opened stream is tagged with a fresh [`Generation`]. A pump task
//! forwards the stream's items into the coordinator's inbox with that tag, so
//! items from a replaced stream that were queued before its cancellation took
//! effect are recognised and dropped instead of rendered.
//!
//! All rendering happens on whichever task drives the coordinator; stream
//! pumps and viewport notifications are serialized through channels.

use std::fmt;

use futures::StreamExt;
use locfinder_core::{
    Coordinate, DecodeError, EventStreamFactory, LocationEventCodec, MapSurface, Marker,
    StreamCanceller, StreamHandle, StreamItem, ViewportState,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::error::CoordinatorError;
use crate::renderer::{MarkerLabelCounter, MarkerRenderer};

/// Identity of one subscription, strictly increasing per coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A stream item tagged with the subscription it came from
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSignal {
    pub generation: Generation,
    pub item: StreamItem,
}

/// What the coordinator did with one signal
#[derive(Debug)]
pub enum SignalOutcome {
    /// The message became a marker
    Rendered(Marker),
    /// The signal belongs to a replaced subscription
    Stale,
    /// The message could not be decoded and was skipped
    Dropped(DecodeError),
    /// The active stream failed; `logged` is false for benign failures
    TransportFailed { logged: bool },
    /// The active stream ended normally
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Live,
}

struct ActiveSubscription {
    generation: Generation,
    viewport: Coordinate,
    canceller: StreamCanceller,
    pump: JoinHandle<()>,
}

impl ActiveSubscription {
    fn retire(self) {
        self.canceller.cancel();
        self.pump.abort();
    }
}

/// Owns the single live subscription and the rendered markers
///
/// Must be driven from within a Tokio runtime: every opened stream gets a
/// pump task.
pub struct SubscriptionCoordinator<F, S> {
    factory: F,
    surface: S,
    viewport: ViewportState,
    renderer: MarkerRenderer,
    counter: MarkerLabelCounter,
    phase: Phase,
    active: Option<ActiveSubscription>,
    last_generation: u64,
    inbox_tx: mpsc::UnboundedSender<StreamSignal>,
    inbox_rx: mpsc::UnboundedReceiver<StreamSignal>,
}

impl<F, S> SubscriptionCoordinator<F, S>
where
    F: EventStreamFactory,
    S: MapSurface,
{
    /// Create an idle coordinator
    ///
    /// The surface is expected to be initialized already, centered on
    /// `viewport.center`.
    pub fn new(factory: F, surface: S, viewport: ViewportState) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            factory,
            surface,
            viewport,
            renderer: MarkerRenderer::new(),
            counter: MarkerLabelCounter::new(),
            phase: Phase::Idle,
            active: None,
            last_generation: 0,
            inbox_tx,
            inbox_rx,
        }
    }

    /// Open the first stream for the current viewport (`Idle -> Live`)
    ///
    /// If the stream cannot be opened the coordinator is still `Live`; the
    /// next viewport change tries again.
    pub fn start(&mut self) -> Result<Generation, CoordinatorError> {
        if self.phase == Phase::Live {
            return Err(CoordinatorError::AlreadyStarted);
        }
        self.phase = Phase::Live;
        info!(
            center = %self.viewport.center,
            location_type = %self.viewport.filter.location_type,
            "Starting location subscription"
        );
        self.subscribe()
    }

    /// Rebind the live stream to a new viewport center
    pub fn on_viewport_changed(
        &mut self,
        center: Coordinate,
    ) -> Result<Generation, CoordinatorError> {
        if self.phase != Phase::Live {
            return Err(CoordinatorError::NotStarted);
        }

        if let Some(previous) = self.active.take() {
            debug!(
                generation = %previous.generation,
                viewport = %previous.viewport,
                "Cancelling location stream"
            );
            previous.retire();
        }
        self.surface.clear();
        self.viewport.center = center;

        self.subscribe()
    }

    fn subscribe(&mut self) -> Result<Generation, CoordinatorError> {
        let handle = match self
            .factory
            .open(&self.viewport.center, &self.viewport.filter)
        {
            Ok(handle) => handle,
            Err(e) => {
                warn!(
                    center = %self.viewport.center,
                    error = %e,
                    "Failed to open location stream"
                );
                return Err(e.into());
            }
        };

        self.last_generation += 1;
        let generation = Generation(self.last_generation);
        let canceller = handle.canceller();
        let pump = tokio::spawn(pump(generation, handle, self.inbox_tx.clone()));

        self.active = Some(ActiveSubscription {
            generation,
            viewport: self.viewport.center,
            canceller,
            pump,
        });

        info!(%generation, center = %self.viewport.center, "Subscribed to location stream");
        Ok(generation)
    }

    /// Apply one tagged stream item
    ///
    /// Items not belonging to the active subscription are dropped before
    /// they are decoded.
    pub fn handle_signal(&mut self, signal: StreamSignal) -> SignalOutcome {
        let generation = signal.generation;
        if self.active_generation() != Some(generation) {
            trace!(%generation, "Dropping signal from replaced stream");
            return SignalOutcome::Stale;
        }

        match signal.item {
            StreamItem::Message(raw) => match LocationEventCodec::decode(&raw) {
                Ok(event) => SignalOutcome::Rendered(self.renderer.render(
                    event,
                    &mut self.surface,
                    &mut self.counter,
                )),
                Err(e) => {
                    warn!(%generation, error = %e, "Dropping undecodable location payload");
                    SignalOutcome::Dropped(e)
                }
            },
            StreamItem::Error(err) if err.benign => {
                SignalOutcome::TransportFailed { logged: false }
            }
            StreamItem::Error(err) => {
                warn!(%generation, error = %err, status = ?err.status, "Location stream failed");
                SignalOutcome::TransportFailed { logged: true }
            }
            StreamItem::End => {
                info!(%generation, "Location stream completed");
                SignalOutcome::Completed
            }
        }
    }

    /// Wait for the next signal from any stream pump
    pub async fn next_signal(&mut self) -> Option<StreamSignal> {
        self.inbox_rx.recv().await
    }

    /// Wait for the next signal and apply it
    pub async fn process_next(&mut self) -> Option<SignalOutcome> {
        let signal = self.next_signal().await?;
        Some(self.handle_signal(signal))
    }

    /// Sender into the coordinator's inbox, for additional signal sources
    pub fn signal_sender(&self) -> mpsc::UnboundedSender<StreamSignal> {
        self.inbox_tx.clone()
    }

    /// Drive the coordinator until the surface stops sending viewport notifications
    ///
    /// Starts the first subscription if `start()` was not called yet.
    pub async fn run(mut self) {
        let (notifier, mut settled) = mpsc::unbounded_channel();
        self.surface.on_viewport_settled(notifier);

        if self.phase == Phase::Idle {
            if let Err(e) = self.start() {
                error!(error = %e, "Initial location subscription failed");
            }
        }

        loop {
            tokio::select! {
                biased;
                center = settled.recv() => match center {
                    Some(center) => {
                        info!(%center, "Viewport settled");
                        if let Err(e) = self.on_viewport_changed(center) {
                            error!(%center, error = %e, "Failed to rebind location stream");
                        }
                    }
                    None => {
                        debug!("Viewport notifications closed, stopping coordinator");
                        break;
                    }
                },
                Some(signal) = self.inbox_rx.recv() => {
                    self.handle_signal(signal);
                }
            }
        }
    }

    pub fn is_live(&self) -> bool {
        self.phase == Phase::Live
    }

    /// Generation of the active subscription, if a stream is open
    pub fn active_generation(&self) -> Option<Generation> {
        self.active.as_ref().map(|active| active.generation)
    }

    /// Viewport center the active subscription is scoped to
    pub fn active_viewport(&self) -> Option<Coordinate> {
        self.active.as_ref().map(|active| active.viewport)
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Label the next rendered marker will carry
    pub fn next_label(&self) -> u64 {
        self.counter.peek()
    }
}

impl<F, S> Drop for SubscriptionCoordinator<F, S> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.retire();
        }
    }
}

/// Forward one stream's items into the coordinator inbox
async fn pump(
    generation: Generation,
    mut handle: StreamHandle,
    inbox: mpsc::UnboundedSender<StreamSignal>,
) {
    while let Some(item) = handle.next().await {
        if inbox.send(StreamSignal { generation, item }).is_err() {
            break;
        }
    }
    trace!(%generation, "Stream pump finished");
}
