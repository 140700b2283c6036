// ── Backend seam ──
//
// The refresh loop and both controllers talk to the hub through
// `HubBackend`, so tests can substitute an in-memory hub.

use std::future::Future;

use hydro_api::{AssignReply, HubClient};
use tracing::debug;

use crate::assign::AssignmentRequest;
use crate::config::DashboardConfig;
use crate::error::{AssignError, CoreError, FetchError, RenameError};
use crate::model::DeviceSnapshot;
use crate::rename::RenameRequest;

/// Everything the dashboard needs from a hub.
pub trait HubBackend: Send + Sync + 'static {
    /// Fetch the complete current node list.
    fn fetch_snapshot(&self) -> impl Future<Output = Result<DeviceSnapshot, FetchError>> + Send;

    /// Submit an assignment form. Any hub reply (whatever its status) is `Ok`.
    fn assign(
        &self,
        request: &AssignmentRequest,
    ) -> impl Future<Output = Result<AssignReply, AssignError>> + Send;

    /// Persist a node name. Non-success statuses are `Err(Rejected)`.
    fn set_name(
        &self,
        request: &RenameRequest,
    ) -> impl Future<Output = Result<(), RenameError>> + Send;
}

/// [`HubBackend`] over the real HTTP API. Pure I/O: no caching, no retry.
#[derive(Debug, Clone)]
pub struct StatusClient {
    hub: HubClient,
}

impl StatusClient {
    pub fn new(hub: HubClient) -> Self {
        Self { hub }
    }

    /// Build the HTTP client described by `config`.
    pub fn from_config(config: &DashboardConfig) -> Result<Self, CoreError> {
        let hub = HubClient::new(config.url.clone(), &config.transport())?;
        Ok(Self { hub })
    }

    /// The underlying API client (used to open the push-update stream).
    pub fn hub(&self) -> &HubClient {
        &self.hub
    }
}

impl HubBackend for StatusClient {
    async fn fetch_snapshot(&self) -> Result<DeviceSnapshot, FetchError> {
        let status = self.hub.status().await?;
        let snapshot = DeviceSnapshot::from(status);
        debug!(nodes = snapshot.len(), "status fetched");
        Ok(snapshot)
    }

    async fn assign(&self, request: &AssignmentRequest) -> Result<AssignReply, AssignError> {
        Ok(self.hub.assign(request.fields()).await?)
    }

    async fn set_name(&self, request: &RenameRequest) -> Result<(), RenameError> {
        Ok(self.hub.set_name(request.id.as_str(), &request.name).await?)
    }
}
