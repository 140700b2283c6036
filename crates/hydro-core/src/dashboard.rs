// ── Dashboard facade ──
//
// Wires one `StatusClient` to the refresh loop and both controllers. Front
// ends hold a `Dashboard` and never build the pieces themselves.

use std::sync::Arc;

use hydro_api::{ReconnectConfig, UpdateStreamHandle};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::assign::AssignmentController;
use crate::backend::StatusClient;
use crate::banner::StatusBanner;
use crate::config::DashboardConfig;
use crate::error::CoreError;
use crate::refresh::{RefreshHandle, RefreshLoop};
use crate::rename::RenameController;

pub struct Dashboard {
    config: DashboardConfig,
    client: Arc<StatusClient>,
    assignments: AssignmentController<StatusClient>,
    renames: RenameController<StatusClient>,
    updates: Option<UpdateStreamHandle>,
}

impl Dashboard {
    pub fn from_config(config: DashboardConfig) -> Result<Self, CoreError> {
        if config.refresh_interval.is_zero() {
            return Err(CoreError::Config {
                message: "refresh interval must be greater than zero".into(),
            });
        }
        if config.timeout.is_zero() {
            return Err(CoreError::Config {
                message: "request timeout must be greater than zero".into(),
            });
        }
        let client = Arc::new(StatusClient::from_config(&config)?);
        Ok(Self {
            assignments: AssignmentController::new(Arc::clone(&client)),
            renames: RenameController::new(Arc::clone(&client)),
            client,
            config,
            updates: None,
        })
    }

    /// Start polling (and, if configured, listening for pushes). Must be
    /// called from within a tokio runtime.
    pub fn start_refresh(&mut self) -> RefreshHandle {
        info!(
            hub = %self.config.url,
            push = self.config.push_updates,
            "starting dashboard refresh"
        );
        let mut refresh = RefreshLoop::new(Arc::clone(&self.client), self.config.refresh_interval);

        if self.config.push_updates {
            let updates = UpdateStreamHandle::spawn(
                self.client.hub().clone(),
                ReconnectConfig::default(),
                CancellationToken::new(),
            );
            refresh = refresh.with_push_updates(updates.subscribe());
            if let Some(previous) = self.updates.replace(updates) {
                previous.shutdown();
            }
        }

        refresh.spawn()
    }

    pub fn assignments(&self) -> &AssignmentController<StatusClient> {
        &self.assignments
    }

    pub fn renames(&self) -> &RenameController<StatusClient> {
        &self.renames
    }

    /// A banner using the configured clear delay.
    pub fn status_banner(&self) -> StatusBanner {
        StatusBanner::new(self.config.status_clear_delay)
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::FetchError;
    use crate::model::NodeId;
    use crate::rename::RenameRequest;

    async fn hub() -> (MockServer, DashboardConfig) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "nodeCount": 1,
                "nodes": [{ "id": "N1", "name": "", "type": "AquaReservPro",
                            "status": "Discovered", "rssi": -70, "lastSeen": 5000 }]
            })))
            .mount(&server)
            .await;
        let config = DashboardConfig::for_hub(Url::parse(&server.uri()).unwrap());
        (server, config)
    }

    fn local_config() -> DashboardConfig {
        DashboardConfig::for_hub(Url::parse("http://127.0.0.1:9").unwrap())
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = DashboardConfig {
            refresh_interval: Duration::ZERO,
            ..local_config()
        };
        assert!(matches!(
            Dashboard::from_config(config),
            Err(CoreError::Config { .. })
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = DashboardConfig {
            timeout: Duration::ZERO,
            ..local_config()
        };
        assert!(matches!(
            Dashboard::from_config(config),
            Err(CoreError::Config { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_hub_is_recorded_and_polling_continues() {
        // Reserve a free port, then release it so nothing is listening there.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = DashboardConfig {
            refresh_interval: Duration::from_millis(20),
            ..DashboardConfig::for_hub(Url::parse(&format!("http://{addr}")).unwrap())
        };
        let mut dashboard = Dashboard::from_config(config).unwrap();
        let handle = dashboard.start_refresh();

        let health = handle
            .health()
            .wait_for(|h| h.consecutive_failures >= 2)
            .await
            .unwrap()
            .clone();
        assert!(matches!(health.last_error, Some(FetchError::Unreachable { .. })));
        assert!(handle.latest().is_none());
        handle.stop();
    }

    #[tokio::test]
    async fn refresh_publishes_hub_snapshot() {
        let (_server, config) = hub().await;
        let mut dashboard = Dashboard::from_config(config).unwrap();
        let handle = dashboard.start_refresh();

        let snapshot = handle
            .snapshots()
            .wait_for(Option::is_some)
            .await
            .unwrap()
            .clone()
            .unwrap();
        assert_eq!(snapshot.nodes[0].id, NodeId::from("N1"));
        handle.stop();
    }

    #[tokio::test]
    async fn rename_goes_to_set_name_endpoint() {
        let (server, config) = hub().await;
        Mock::given(method("POST"))
            .and(path("/api/set-name"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Name updated successfully."))
            .expect(1)
            .mount(&server)
            .await;

        let dashboard = Dashboard::from_config(config).unwrap();
        let request = RenameRequest {
            id: NodeId::from("N1"),
            name: "Tank A".into(),
        };
        assert!(dashboard.renames().rename(request).await.is_ok());
    }
}
