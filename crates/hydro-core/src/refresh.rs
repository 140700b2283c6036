// ── Refresh loop ──
//
// Fixed-period status poller. The first interval tick fires immediately,
// so the dashboard has data before the first period elapses. Every tick
// spawns its own fetch task: a slow hub produces overlapping fetches
// rather than a stalled timer. Results are published through a `watch`
// channel; the newest publish wins, whichever tick it came from.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hydro_api::StatusResponse;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::HubBackend;
use crate::error::FetchError;
use crate::model::DeviceSnapshot;

/// Outcome bookkeeping for the header line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshHealth {
    /// Fetch time of the last successful poll.
    pub last_success: Option<DateTime<Utc>>,
    /// Error of the most recent poll, cleared by the next success.
    pub last_error: Option<FetchError>,
    /// Failed polls since the last success.
    pub consecutive_failures: u32,
    /// Timer ticks fired so far.
    pub ticks: u64,
}

/// Builder for the polling task.
pub struct RefreshLoop<B> {
    backend: Arc<B>,
    period: Duration,
    push: Option<broadcast::Receiver<Arc<StatusResponse>>>,
}

impl<B: HubBackend> RefreshLoop<B> {
    pub fn new(backend: Arc<B>, period: Duration) -> Self {
        Self {
            backend,
            period,
            push: None,
        }
    }

    /// Also publish snapshots pushed by the hub between ticks.
    #[must_use]
    pub fn with_push_updates(mut self, updates: broadcast::Receiver<Arc<StatusResponse>>) -> Self {
        self.push = Some(updates);
        self
    }

    /// Start polling. Requires a running tokio runtime.
    pub fn spawn(self) -> RefreshHandle {
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let (health_tx, health_rx) = watch::channel(RefreshHealth::default());
        let cancel = CancellationToken::new();

        let publisher = Arc::new(Publisher {
            snapshots: snapshot_tx,
            health: health_tx,
            cancel: cancel.clone(),
        });

        info!(period_ms = duration_ms(self.period), "refresh loop started");

        let mut tasks = vec![tokio::spawn(tick_task(
            self.backend,
            self.period,
            Arc::clone(&publisher),
        ))];
        if let Some(updates) = self.push {
            tasks.push(tokio::spawn(push_task(updates, publisher)));
        }

        RefreshHandle {
            snapshots: snapshot_rx,
            health: health_rx,
            cancel,
            tasks,
        }
    }
}

/// Handle to a running [`RefreshLoop`]. Dropping it stops the loop.
pub struct RefreshHandle {
    snapshots: watch::Receiver<Option<Arc<DeviceSnapshot>>>,
    health: watch::Receiver<RefreshHealth>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Receiver of the most recently published snapshot (`None` until the
    /// first successful fetch).
    pub fn snapshots(&self) -> watch::Receiver<Option<Arc<DeviceSnapshot>>> {
        self.snapshots.clone()
    }

    pub fn health(&self) -> watch::Receiver<RefreshHealth> {
        self.health.clone()
    }

    pub fn latest(&self) -> Option<Arc<DeviceSnapshot>> {
        self.snapshots.borrow().clone()
    }

    /// Cancel the timer. Fetches already in flight run to completion but
    /// their results are discarded.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            info!("refresh loop stopped");
        }
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop and wait for the timer and push tasks to exit.
    pub async fn shutdown(mut self) {
        self.stop();
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Publishing ───────────────────────────────────────────────────────

struct Publisher {
    snapshots: watch::Sender<Option<Arc<DeviceSnapshot>>>,
    health: watch::Sender<RefreshHealth>,
    cancel: CancellationToken,
}

impl Publisher {
    fn publish_fetched(&self, snapshot: DeviceSnapshot) {
        if self.cancel.is_cancelled() {
            debug!("discarding snapshot fetched after stop");
            return;
        }
        let fetched_at = snapshot.fetched_at;
        self.health.send_modify(|health| {
            health.last_success = Some(fetched_at);
            health.last_error = None;
            health.consecutive_failures = 0;
        });
        self.snapshots.send_replace(Some(Arc::new(snapshot)));
    }

    fn publish_pushed(&self, snapshot: DeviceSnapshot) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.snapshots.send_replace(Some(Arc::new(snapshot)));
    }

    fn record_failure(&self, err: FetchError) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.health.send_modify(|health| {
            health.consecutive_failures = health.consecutive_failures.saturating_add(1);
            health.last_error = Some(err);
        });
    }

    fn record_tick(&self) {
        self.health.send_modify(|health| health.ticks += 1);
    }
}

// ── Background tasks ─────────────────────────────────────────────────

async fn tick_task<B: HubBackend>(backend: Arc<B>, period: Duration, publisher: Arc<Publisher>) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = publisher.cancel.cancelled() => break,
            _ = interval.tick() => {
                publisher.record_tick();
                let backend = Arc::clone(&backend);
                let publisher = Arc::clone(&publisher);
                tokio::spawn(async move { fetch_once(backend.as_ref(), &publisher).await });
            }
        }
    }
}

async fn fetch_once<B: HubBackend>(backend: &B, publisher: &Publisher) {
    match backend.fetch_snapshot().await {
        Ok(snapshot) => {
            debug!(nodes = snapshot.len(), "refresh tick fetched snapshot");
            publisher.publish_fetched(snapshot);
        }
        Err(e) => {
            warn!(error = %e, "status refresh failed");
            publisher.record_failure(e);
        }
    }
}

async fn push_task(
    mut updates: broadcast::Receiver<Arc<StatusResponse>>,
    publisher: Arc<Publisher>,
) {
    loop {
        tokio::select! {
            biased;
            () = publisher.cancel.cancelled() => break,
            update = updates.recv() => match update {
                Ok(status) => {
                    let snapshot = DeviceSnapshot::from(StatusResponse::clone(&status));
                    debug!(nodes = snapshot.len(), "hub pushed snapshot");
                    publisher.publish_pushed(snapshot);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "push updates lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{FakeHub, snapshot_of};
    use tokio::time::Instant;

    const PERIOD: Duration = Duration::from_secs(2);

    fn ids(snapshot: &DeviceSnapshot) -> Vec<&str> {
        snapshot.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_immediately_on_start() {
        let hub = Arc::new(FakeHub::new().with_fetches(vec![Ok(snapshot_of(&["N1"]))]));
        let start = Instant::now();
        let handle = RefreshLoop::new(Arc::clone(&hub), PERIOD).spawn();

        let mut rx = handle.snapshots();
        let snapshot = rx.wait_for(Option::is_some).await.unwrap().clone().unwrap();

        assert_eq!(ids(&snapshot), ["N1"]);
        assert!(start.elapsed() < PERIOD);
        assert_eq!(hub.fetch_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_keeps_previous_snapshot_and_next_tick_fires() {
        let hub = Arc::new(FakeHub::new().with_fetches(vec![
            Ok(snapshot_of(&["A"])),
            Err(FetchError::Unreachable {
                reason: "connection refused".into(),
            }),
            Ok(snapshot_of(&["B"])),
        ]));
        let start = Instant::now();
        let handle = RefreshLoop::new(Arc::clone(&hub), PERIOD).spawn();

        let mut snapshots = handle.snapshots();
        let mut health = handle.health();
        snapshots.wait_for(Option::is_some).await.unwrap();

        health.wait_for(|h| h.consecutive_failures == 1).await.unwrap();
        assert_eq!(ids(&handle.latest().unwrap()), ["A"]);
        assert!(matches!(
            handle.health().borrow().last_error,
            Some(FetchError::Unreachable { .. })
        ));

        let b = snapshots
            .wait_for(|s| s.as_ref().is_some_and(|s| ids(s) == ["B"]))
            .await
            .unwrap()
            .clone()
            .unwrap();
        assert_eq!(ids(&b), ["B"]);
        assert!(start.elapsed() >= PERIOD * 2);

        let health = handle.health().borrow().clone();
        assert_eq!(health.consecutive_failures, 0);
        assert!(health.last_error.is_none());
        assert!(health.last_success.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_timer() {
        let hub = Arc::new(FakeHub::new().with_fetches(vec![Ok(snapshot_of(&["A"]))]));
        let handle = RefreshLoop::new(Arc::clone(&hub), PERIOD).spawn();
        handle.snapshots().wait_for(Option::is_some).await.unwrap();

        handle.stop();
        let calls = hub.fetch_calls();
        tokio::time::sleep(PERIOD * 5).await;

        assert!(handle.is_stopped());
        assert_eq!(hub.fetch_calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_in_flight_at_stop_is_discarded() {
        let hub = Arc::new(
            FakeHub::new()
                .with_fetches(vec![Ok(snapshot_of(&["LATE"]))])
                .with_fetch_delay(Duration::from_secs(5)),
        );
        let handle = RefreshLoop::new(Arc::clone(&hub), PERIOD).spawn();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(hub.fetch_calls(), 1);
        handle.stop();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(handle.latest().is_none());
        assert_eq!(handle.health().borrow().last_success, None);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetches_do_not_delay_ticks() {
        let hub = Arc::new(
            FakeHub::new()
                .with_fetches(vec![
                    Ok(snapshot_of(&["T0"])),
                    Ok(snapshot_of(&["T2"])),
                    Ok(snapshot_of(&["T4"])),
                ])
                .with_fetch_delay(Duration::from_secs(5)),
        );
        let handle = RefreshLoop::new(Arc::clone(&hub), PERIOD).spawn();

        tokio::time::sleep(Duration::from_millis(4_500)).await;
        assert_eq!(hub.fetch_calls(), 3);
        assert!(handle.latest().is_none());
        assert_eq!(handle.health().borrow().ticks, 3);

        let first = handle
            .snapshots()
            .wait_for(Option::is_some)
            .await
            .unwrap()
            .clone()
            .unwrap();
        assert_eq!(ids(&first), ["T0"]);
    }

    #[tokio::test(start_paused = true)]
    async fn pushed_updates_replace_snapshot() {
        let hub = Arc::new(FakeHub::new().with_fetches(vec![Ok(snapshot_of(&["A"]))]));
        let (tx, rx) = broadcast::channel(4);
        let handle = RefreshLoop::new(Arc::clone(&hub), Duration::from_secs(60))
            .with_push_updates(rx)
            .spawn();
        let mut snapshots = handle.snapshots();
        snapshots.wait_for(Option::is_some).await.unwrap();

        let pushed: StatusResponse = serde_json::from_value(serde_json::json!({
            "nodeCount": 1,
            "nodes": [{ "id": "P1", "name": "Tank A", "type": "AquaReservPro",
                        "status": "OK", "rssi": -50, "lastSeen": 1000 }]
        }))
        .unwrap();
        tx.send(Arc::new(pushed)).unwrap();

        let snapshot = snapshots
            .wait_for(|s| s.as_ref().is_some_and(|s| ids(s) == ["P1"]))
            .await
            .unwrap()
            .clone()
            .unwrap();
        assert_eq!(snapshot.nodes[0].name, "Tank A");
        assert_eq!(hub.fetch_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_timer_does_not_burst_missed_ticks() {
        let hub = Arc::new(FakeHub::new().with_fetches(vec![Ok(snapshot_of(&["A"]))]));
        let handle = RefreshLoop::new(Arc::clone(&hub), PERIOD).spawn();
        handle.snapshots().wait_for(Option::is_some).await.unwrap();
        assert_eq!(handle.health().borrow().ticks, 1);

        // Jump the clock as a host suspend would.
        tokio::time::advance(PERIOD * 10).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(handle.health().borrow().ticks, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_waits_for_background_tasks() {
        let hub = Arc::new(FakeHub::new().with_fetches(vec![Ok(snapshot_of(&["A"]))]));
        let (tx, rx) = broadcast::channel::<Arc<StatusResponse>>(4);
        let handle = RefreshLoop::new(Arc::clone(&hub), PERIOD)
            .with_push_updates(rx)
            .spawn();
        handle.snapshots().wait_for(Option::is_some).await.unwrap();

        handle.shutdown().await;
        // The push task has exited and dropped its receiver.
        assert_eq!(tx.receiver_count(), 0);

        let calls = hub.fetch_calls();
        tokio::time::sleep(PERIOD * 3).await;
        assert_eq!(hub.fetch_calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_stops_polling() {
        let hub = Arc::new(FakeHub::new().with_fetches(vec![Ok(snapshot_of(&["A"]))]));
        let handle = RefreshLoop::new(Arc::clone(&hub), PERIOD).spawn();
        handle.snapshots().wait_for(Option::is_some).await.unwrap();
        drop(handle);

        let calls = hub.fetch_calls();
        tokio::time::sleep(PERIOD * 3).await;
        assert_eq!(hub.fetch_calls(), calls);
    }
}
