//! `EventStreamFactory` over HTTP Server-Sent Events

use std::time::Duration;

use futures::StreamExt;
use locfinder_core::{
    Coordinate, EventStreamFactory, OpenError, StreamFeed, StreamFilter, StreamHandle,
    TransportError,
};
use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::{debug, instrument, trace};
use url::Url;

use super::parser::SseParser;
use crate::error::Result;

/// Path of the push-stream resource
const LOCATION_PATH: &str = "/location";

/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens `/location` SSE streams against a server
///
/// No total request timeout is configured: a push stream stays open for as
/// long as the server keeps it open or the handle is cancelled.
#[derive(Debug, Clone)]
pub struct SseStreamFactory {
    client: Client,
    base_url: Url,
}

impl SseStreamFactory {
    /// Create a factory for a server
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the location server (e.g., "http://localhost:8080")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a factory with a custom connection timeout
    pub fn with_config(base_url: &str, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        let base_url = Url::parse(base_url)?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the stream URL for a viewport and filter
    ///
    /// `GET /location?longitude=..&latitude=..&type=..[&numberOfLocations=..][&radius=..]`
    pub fn stream_url(
        &self,
        viewport: &Coordinate,
        filter: &StreamFilter,
    ) -> std::result::Result<Url, OpenError> {
        let mut url = self
            .base_url
            .join(LOCATION_PATH)
            .map_err(|e| OpenError::InvalidUrl(e.to_string()))?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("longitude", &viewport.longitude.to_string())
                .append_pair("latitude", &viewport.latitude.to_string())
                .append_pair("type", &filter.location_type);
            if let Some(count) = filter.number_of_locations {
                query.append_pair("numberOfLocations", &count.to_string());
            }
            if let Some(radius) = filter.radius {
                query.append_pair("radius", &radius.to_string());
            }
        }

        Ok(url)
    }
}

impl EventStreamFactory for SseStreamFactory {
    #[instrument(skip(self), fields(location_type = %filter.location_type))]
    fn open(
        &self,
        viewport: &Coordinate,
        filter: &StreamFilter,
    ) -> std::result::Result<StreamHandle, OpenError> {
        viewport.validate()?;
        filter.validate()?;

        let url = self.stream_url(viewport, filter)?;
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|e| OpenError::Runtime(e.to_string()))?;

        let (feed, handle) = StreamHandle::channel();
        runtime.spawn(read_stream(self.client.clone(), url, feed));

        Ok(handle)
    }
}

/// Drive one SSE connection until it ends, fails or is cancelled
///
/// A clean EOF from the server is reported as `End`. Once the handle is
/// cancelled the task returns without reporting anything; a failure that
/// still reaches `fail` after cancellation is marked benign by the feed.
async fn read_stream(client: Client, url: Url, mut feed: StreamFeed) {
    debug!(%url, "Connecting to location stream");

    let request = client
        .get(url.clone())
        .header(ACCEPT, "text/event-stream")
        .send();

    let response = tokio::select! {
        _ = feed.cancelled() => {
            debug!(%url, "Stream cancelled before connecting");
            return;
        }
        result = request => result,
    };

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            feed.fail(TransportError::new(format!("connection failed: {}", e)));
            return;
        }
    };

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let message = tokio::select! {
            _ = feed.cancelled() => {
                debug!(%url, status, "Stream cancelled while reading error response");
                return;
            }
            text = response.text() => text.unwrap_or_default(),
        };
        feed.fail(TransportError::server(status, message));
        return;
    }

    let mut body = response.bytes_stream();
    let mut parser = SseParser::new();

    loop {
        tokio::select! {
            _ = feed.cancelled() => {
                // Dropping the body closes the connection
                debug!(%url, "Stream cancelled, closing connection");
                return;
            }
            chunk = body.next() => match chunk {
                Some(Ok(bytes)) => {
                    for frame in parser.feed(bytes) {
                        if !frame.is_message() {
                            trace!(event = ?frame.event, "Skipping non-message SSE event");
                            continue;
                        }
                        if !feed.push(frame.data) {
                            return;
                        }
                    }
                }
                Some(Err(e)) => {
                    feed.fail(TransportError::new(format!("stream interrupted: {}", e)));
                    return;
                }
                None => {
                    // A clean close from the server is completion, not a failure
                    debug!(%url, "Server closed location stream");
                    feed.finish();
                    return;
                }
            }
        }
    }
}
