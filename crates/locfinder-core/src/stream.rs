//! Cancellable push streams
//!
//! A stream is split into two halves:
//!
//! - [`StreamFeed`] - held by the transport, pushes raw messages in arrival order
//! - [`StreamHandle`] - held by the consumer, yields [`StreamItem`]s and owns
//!   the cancellation capability
//!
//! Once the handle reports an error or the end of the stream it yields
//! `None` forever. Once it is cancelled it yields `None` even if messages are
//! still buffered, and the feed refuses further messages.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::{FutureExt, Stream};
use tokio::sync::{mpsc, watch};

use crate::error::{OpenError, TransportError};
use crate::models::{Coordinate, StreamFilter};

/// One item delivered by a push stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    /// Raw message payload
    Message(String),
    /// The transport failed; nothing follows
    Error(TransportError),
    /// The stream completed normally; nothing follows
    End,
}

/// Opens push streams scoped to a viewport and filter
///
/// Every call must produce a fresh underlying connection.
pub trait EventStreamFactory: Send + Sync {
    fn open(&self, viewport: &Coordinate, filter: &StreamFilter)
        -> Result<StreamHandle, OpenError>;
}

impl<T: EventStreamFactory + ?Sized> EventStreamFactory for Arc<T> {
    fn open(
        &self,
        viewport: &Coordinate,
        filter: &StreamFilter,
    ) -> Result<StreamHandle, OpenError> {
        (**self).open(viewport, filter)
    }
}

/// Cloneable cancellation capability of a [`StreamHandle`]
#[derive(Debug, Clone)]
pub struct StreamCanceller {
    signal: Arc<watch::Sender<bool>>,
}

impl StreamCanceller {
    /// Request cancellation. Returns `false` if it was already requested.
    pub fn cancel(&self) -> bool {
        self.signal.send_if_modified(|cancelled| {
            if *cancelled {
                false
            } else {
                *cancelled = true;
                true
            }
        })
    }

    pub fn is_cancelled(&self) -> bool {
        *self.signal.borrow()
    }
}

/// Consumer side of a push stream
pub struct StreamHandle {
    items: mpsc::UnboundedReceiver<StreamItem>,
    canceller: StreamCanceller,
    /// Resolves once cancellation is requested
    cancelled: BoxFuture<'static, ()>,
    /// Set after an error or end was delivered
    terminated: bool,
}

impl StreamHandle {
    /// Create a connected feed/handle pair
    pub fn channel() -> (StreamFeed, StreamHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (signal, cancel_rx) = watch::channel(false);

        let mut wait_rx = signal.subscribe();
        let cancelled = async move {
            let _ = wait_rx.wait_for(|cancelled| *cancelled).await;
        }
        .boxed();

        let feed = StreamFeed {
            items: tx,
            cancel: cancel_rx,
            closed: false,
        };
        let handle = StreamHandle {
            items: rx,
            canceller: StreamCanceller {
                signal: Arc::new(signal),
            },
            cancelled,
            terminated: false,
        };
        (feed, handle)
    }

    /// Terminate the stream and suppress further delivery
    ///
    /// Safe to call more than once, and after the stream failed or ended.
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.canceller.is_cancelled()
    }

    /// Get a cancellation capability that outlives a move of the handle
    pub fn canceller(&self) -> StreamCanceller {
        self.canceller.clone()
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("cancelled", &self.is_cancelled())
            .field("terminated", &self.terminated)
            .finish()
    }
}

impl Stream for StreamHandle {
    type Item = StreamItem;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.terminated || this.canceller.is_cancelled() {
            return Poll::Ready(None);
        }
        // Registers the waker so a parked consumer observes a later cancel
        if this.cancelled.poll_unpin(cx).is_ready() {
            return Poll::Ready(None);
        }

        match this.items.poll_recv(cx) {
            Poll::Ready(Some(item)) => {
                if !matches!(item, StreamItem::Message(_)) {
                    this.terminated = true;
                }
                Poll::Ready(Some(item))
            }
            Poll::Ready(None) => {
                this.terminated = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.canceller.cancel();
    }
}

/// Producer side of a push stream
#[derive(Debug)]
pub struct StreamFeed {
    items: mpsc::UnboundedSender<StreamItem>,
    cancel: watch::Receiver<bool>,
    /// Set after an error or end was pushed
    closed: bool,
}

impl StreamFeed {
    /// Deliver a raw message. Returns `false` if the stream no longer accepts messages.
    pub fn push(&mut self, message: impl Into<String>) -> bool {
        if self.closed || self.is_cancelled() {
            return false;
        }
        self.items.send(StreamItem::Message(message.into())).is_ok()
    }

    /// Report a transport failure and close the stream
    ///
    /// A failure observed after cancellation was requested is marked benign.
    pub fn fail(&mut self, error: TransportError) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        let error = if self.is_cancelled() {
            error.benign()
        } else {
            error
        };
        self.items.send(StreamItem::Error(error)).is_ok()
    }

    /// Report normal completion and close the stream
    pub fn finish(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        self.items.send(StreamItem::End).is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Wait until the consumer cancels (or drops) the handle
    pub async fn cancelled(&mut self) {
        let _ = self.cancel.wait_for(|cancelled| *cancelled).await;
    }
}
