// ── Rename controller ──
//
// Prompt → validate → POST → patch the rendered row. The patch is the only
// edit to the render model outside a full render; the next refresh
// overwrites it either way.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::HubBackend;
use crate::error::RenameError;
use crate::model::NodeId;
use crate::render::RenderEngine;

/// Source of operator input for a rename.
///
/// `None` means the operator cancelled.
pub trait NamePrompt {
    fn prompt(&mut self, id: &NodeId) -> Option<String>;
}

impl<F> NamePrompt for F
where
    F: FnMut(&NodeId) -> Option<String>,
{
    fn prompt(&mut self, id: &NodeId) -> Option<String> {
        self(id)
    }
}

/// A validated rename, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRequest {
    pub id: NodeId,
    /// Sent as typed; only the blank check trims.
    pub name: String,
}

impl RenameRequest {
    /// Validate raw prompt input. Cancelled or blank input is declined.
    pub fn from_input(id: NodeId, input: Option<String>) -> Result<Self, RenameError> {
        match input {
            Some(name) if !name.trim().is_empty() => Ok(Self { id, name }),
            _ => Err(RenameError::Declined),
        }
    }

    /// Patch the rendered row for this node. `false` when the node is not
    /// currently rendered.
    pub fn apply_to(&self, engine: &mut RenderEngine) -> bool {
        let found = engine.patch_display_name(&self.id, &self.name);
        if !found {
            debug!(id = %self.id, "renamed node is no longer rendered");
        }
        found
    }
}

/// Sends renames to the hub.
pub struct RenameController<B> {
    backend: Arc<B>,
}

impl<B> Clone for RenameController<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: HubBackend> RenameController<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Ask `prompt` for a name and send it. On `Ok` the caller patches its
    /// render model with [`RenameRequest::apply_to`].
    pub async fn prompt_and_rename<P: NamePrompt + ?Sized>(
        &self,
        id: &NodeId,
        prompt: &mut P,
    ) -> Result<RenameRequest, RenameError> {
        let request = RenameRequest::from_input(id.clone(), prompt.prompt(id))?;
        self.rename(request).await
    }

    /// Send an already validated rename.
    pub async fn rename(&self, request: RenameRequest) -> Result<RenameRequest, RenameError> {
        match self.backend.set_name(&request).await {
            Ok(()) => {
                info!(id = %request.id, name = %request.name, "node renamed");
                Ok(request)
            }
            Err(e) => {
                warn!(id = %request.id, error = %e, "rename failed");
                Err(e)
            }
        }
    }
}
