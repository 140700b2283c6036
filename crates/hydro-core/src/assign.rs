// ── Assignment controller ──
//
// Posts the reservoir/well form to the hub and turns the outcome into the
// text of the status line. Fire-and-forget with respect to the refresh
// loop: the assignment shows up in the table on a later tick.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::backend::HubBackend;
use crate::banner::StatusBanner;
use crate::error::AssignError;
use crate::model::{AssignRole, NodeId};

/// Form fields of one assignment submit, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentRequest {
    fields: Vec<(String, String)>,
}

impl AssignmentRequest {
    /// The two fields the hub requires.
    pub fn new(reservoir: &NodeId, well: &NodeId) -> Self {
        Self::default()
            .with_field(AssignRole::Reservoir.field_name(), reservoir.as_str())
            .with_field(AssignRole::Well.field_name(), well.as_str())
    }

    pub fn from_fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        fields
            .into_iter()
            .fold(Self::default(), |req, (k, v)| req.with_field(k, v))
    }

    /// Set a field, replacing an earlier value of the same name in place.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Result of one submit, as far as the operator is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    /// The hub answered; `text` is its body, whatever the status.
    Replied { status: u16, text: String },
    /// No answer.
    Failed(AssignError),
}

impl AssignOutcome {
    /// Text for the status line.
    pub fn message(&self) -> String {
        match self {
            Self::Replied { text, .. } => text.clone(),
            Self::Failed(e) => format!("Error: {e}"),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Replies clear after the banner delay. Failures stay until the next
    /// submit replaces them.
    pub fn show_on(&self, banner: &mut StatusBanner, now: Instant) {
        match self {
            Self::Replied { .. } => banner.show(self.message(), now),
            Self::Failed(_) => banner.show_persistent(self.message()),
        }
    }
}

/// Submits assignment forms.
pub struct AssignmentController<B> {
    backend: Arc<B>,
}

impl<B> Clone for AssignmentController<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: HubBackend> AssignmentController<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub async fn submit(&self, request: &AssignmentRequest) -> AssignOutcome {
        match self.backend.assign(request).await {
            Ok(reply) => {
                info!(
                    status = reply.status,
                    reservoir = request.field("reservoir").unwrap_or_default(),
                    well = request.field("well").unwrap_or_default(),
                    "assignment submitted"
                );
                AssignOutcome::Replied {
                    status: reply.status,
                    text: reply.text,
                }
            }
            Err(e) => {
                warn!(error = %e, "assignment submit failed");
                AssignOutcome::Failed(e)
            }
        }
    }
}
