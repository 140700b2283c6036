//! Push-update stream with auto-reconnect.
//!
//! The hub publishes a Server-Sent-Events stream at `/events`. Whenever a
//! node is renamed it emits an `update` event whose `data` is a full
//! `/api/status` payload. This module parses the `text/event-stream`
//! framing, keeps the connection alive with exponential backoff, and
//! broadcasts decoded [`StatusResponse`] values.
//!
//! # Example
//!
//! ```rust,ignore
//! use hydro_api::{HubClient, ReconnectConfig, UpdateStreamHandle};
//! use tokio_util::sync::CancellationToken;
//!
//! let handle = UpdateStreamHandle::spawn(hub, ReconnectConfig::default(), CancellationToken::new());
//! let mut rx = handle.subscribe();
//! while let Ok(status) = rx.recv().await {
//!     println!("{} nodes", status.nodes.len());
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::client::{HubClient, decode};
use crate::error::Error;
use crate::models::StatusResponse;

// ── Broadcast channel capacity ───────────────────────────────────────

const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// Event name the hub uses for full status pushes.
pub const UPDATE_EVENT: &str = "update";

// ── SSE framing ──────────────────────────────────────────────────────

/// One dispatched Server-Sent Event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type; `"message"` when the stream did not name one.
    pub event: String,
    /// Data lines joined with `\n`.
    pub data: String,
    /// Last event id seen on the stream, if any.
    pub id: Option<String>,
}

/// Incremental `text/event-stream` parser.
///
/// Feed arbitrary byte chunks; complete events come out as soon as their
/// terminating blank line arrives. Lines split across chunks (including
/// inside a multi-byte character) are buffered.
#[derive(Debug, Default)]
pub struct SseParser {
    pending: Vec<u8>,
    event: Option<String>,
    data: String,
    has_data: bool,
    last_id: Option<String>,
    retry: Option<Duration>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconnection delay the server requested via `retry:` since the
    /// last call, if any.
    pub fn take_retry(&mut self) -> Option<Duration> {
        self.retry.take()
    }

    /// Consume a chunk and return every event it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.pending.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches('\n').trim_end_matches('\r');
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_owned()),
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            "id" => self.last_id = Some(value.to_owned()),
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry = Some(Duration::from_millis(ms));
                }
            }
            _ => tracing::trace!(field, "ignoring unknown SSE field"),
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if !self.has_data {
            return None;
        }
        self.has_data = false;
        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".into()),
            data: std::mem::take(&mut self.data),
            id: self.last_id.clone(),
        })
    }
}

// ── Single connection ────────────────────────────────────────────────

/// Items produced by one `/events` connection.
enum StreamItem {
    Update(StatusResponse),
    Retry(Duration),
}

impl HubClient {
    /// Open `/events` once and yield every decodable `update` payload.
    ///
    /// The stream ends when the hub closes the connection; transport
    /// failures surface as an `Err` item followed by the end of the stream.
    pub fn update_stream(
        &self,
    ) -> impl Stream<Item = Result<StatusResponse, Error>> + Send + 'static {
        self.event_stream().filter_map(|item| async move {
            match item {
                Ok(StreamItem::Update(status)) => Some(Ok(status)),
                Ok(StreamItem::Retry(_)) => None,
                Err(e) => Some(Err(e)),
            }
        })
    }

    fn event_stream(&self) -> impl Stream<Item = Result<StreamItem, Error>> + Send + 'static {
        let client = self.clone();
        async_stream::try_stream! {
            let resp = client.open_events().await?;
            let mut body = resp.bytes_stream();
            let mut parser = SseParser::new();

            while let Some(chunk) = body.next().await {
                let chunk = chunk.map_err(|e| Error::UpdateStream(e.to_string()))?;
                let events = parser.feed(&chunk);
                if let Some(retry) = parser.take_retry() {
                    yield StreamItem::Retry(retry);
                }
                for event in events {
                    if event.event != UPDATE_EVENT {
                        continue;
                    }
                    match decode::<StatusResponse>(&event.data) {
                        Ok(status) => { yield StreamItem::Update(status); }
                        Err(e) => tracing::debug!(error = %e, "discarding undecodable update"),
                    }
                }
            }
        }
    }
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for update-stream reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt, unless the hub sent a
    /// `retry:` hint. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── UpdateStreamHandle ───────────────────────────────────────────────

/// Handle to a running push-update reader.
pub struct UpdateStreamHandle {
    update_rx: broadcast::Receiver<Arc<StatusResponse>>,
    cancel: CancellationToken,
}

impl UpdateStreamHandle {
    /// Spawn the reconnecting reader. Returns immediately; the first
    /// connection attempt happens in the background.
    pub fn spawn(client: HubClient, reconnect: ReconnectConfig, cancel: CancellationToken) -> Self {
        let (update_tx, update_rx) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            stream_loop(client, update_tx, reconnect, task_cancel).await;
        });

        Self { update_rx, cancel }
    }

    /// Get a new receiver for decoded status pushes.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<StatusResponse>> {
        self.update_rx.resubscribe()
    }

    /// Signal the background task to shut down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for UpdateStreamHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on error, backoff → reconnect.
///
/// A `retry:` hint from the hub replaces `initial_delay` as the base delay
/// for every later reconnect.
async fn stream_loop(
    client: HubClient,
    update_tx: broadcast::Sender<Arc<StatusResponse>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;
    let mut retry_hint: Option<Duration> = None;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = read_until_closed(&client, &update_tx, &mut retry_hint) => {
                let base = retry_hint.unwrap_or(reconnect.initial_delay);
                match result {
                    Ok(()) => {
                        tracing::info!("update stream closed by hub, reconnecting");
                        attempt = 0;

                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(base) => {}
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "update stream error");

                        if reconnect.max_retries.is_some_and(|max| attempt >= max) {
                            tracing::error!("update stream reconnection limit reached, giving up");
                            break;
                        }

                        let delay = calculate_backoff(attempt, base, reconnect.max_delay);
                        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                        tracing::debug!(delay_ms, attempt, "waiting before reconnect");

                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(delay) => {}
                        }

                        attempt = attempt.saturating_add(1);
                    }
                }
            }
        }
    }

    tracing::debug!("update stream loop exiting");
}

async fn read_until_closed(
    client: &HubClient,
    update_tx: &broadcast::Sender<Arc<StatusResponse>>,
    retry_hint: &mut Option<Duration>,
) -> Result<(), Error> {
    let stream = client.event_stream();
    futures_util::pin_mut!(stream);

    while let Some(item) = stream.next().await {
        match item? {
            StreamItem::Update(status) => {
                // No subscribers is fine; the next one catches the following push.
                let _ = update_tx.send(Arc::new(status));
            }
            StreamItem::Retry(delay) => {
                let retry_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                tracing::debug!(retry_ms, "hub set reconnect delay");
                *retry_hint = Some(delay);
            }
        }
    }
    Ok(())
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) * (1 ± 0.25)`
fn calculate_backoff(attempt: u32, initial: Duration, max: Duration) -> Duration {
    let exponent = i32::try_from(attempt.min(16)).unwrap_or(16);
    let base = initial.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(max.as_secs_f64());

    // Deterministic jitter seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    Duration::from_secs_f64((capped * jitter_factor).max(0.0))
}

// ── Tests ────────────────────────────────────────────────────────────
