// ── Core error types ──
//
// Dashboard-facing errors, one family per write/read path. None of them is
// fatal: a failed fetch leaves the previous render in place, a failed
// assignment is shown inline, a failed rename is surfaced to the operator.
// The `From<hydro_api::Error>` impls translate transport-layer errors.

use thiserror::Error;

/// Status polling failed. Logged; the refresh loop keeps ticking.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Cannot reach hub: {reason}")]
    Unreachable { reason: String },

    #[error("Hub returned HTTP {status}")]
    Status { status: u16 },

    #[error("Hub reported an error: {message}")]
    Backend { message: String },

    #[error("Malformed status payload: {message}")]
    Malformed { message: String },
}

/// Assignment submit failed before the hub produced a reply.
///
/// A reply with a non-success status is NOT an error: its text is shown
/// to the operator verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssignError {
    #[error("{reason}")]
    Network { reason: String },

    #[error("Invalid hub address: {reason}")]
    InvalidUrl { reason: String },
}

/// Rename did not complete.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenameError {
    /// The operator cancelled the prompt or entered only whitespace.
    /// No request was sent.
    #[error("Rename cancelled")]
    Declined,

    /// The hub answered with a non-success status.
    #[error("Hub rejected the new name (HTTP {status})")]
    Rejected { status: u16 },

    /// The request never got an answer.
    #[error("Rename request failed: {reason}")]
    Transport { reason: String },
}

/// Setup errors: building the HTTP client or the dashboard facade.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Cannot create hub client: {reason}")]
    ClientSetup { reason: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<hydro_api::Error> for FetchError {
    fn from(err: hydro_api::Error) -> Self {
        match err {
            hydro_api::Error::Status { status, .. } => FetchError::Status { status },
            hydro_api::Error::Backend { message } => FetchError::Backend { message },
            hydro_api::Error::Deserialization { message, body: _ } => {
                FetchError::Malformed { message }
            }
            hydro_api::Error::Transport(e) => match e.status() {
                Some(status) => FetchError::Status {
                    status: status.as_u16(),
                },
                None => FetchError::Unreachable {
                    reason: e.to_string(),
                },
            },
            other @ (hydro_api::Error::InvalidUrl(_)
            | hydro_api::Error::Tls(_)
            | hydro_api::Error::UpdateStream(_)) => FetchError::Unreachable {
                reason: other.to_string(),
            },
        }
    }
}

impl From<hydro_api::Error> for AssignError {
    fn from(err: hydro_api::Error) -> Self {
        match err {
            hydro_api::Error::InvalidUrl(e) => AssignError::InvalidUrl {
                reason: e.to_string(),
            },
            other => AssignError::Network {
                reason: other.to_string(),
            },
        }
    }
}

impl From<hydro_api::Error> for RenameError {
    fn from(err: hydro_api::Error) -> Self {
        match err {
            hydro_api::Error::Status { status, .. } => RenameError::Rejected { status },
            other => RenameError::Transport {
                reason: other.to_string(),
            },
        }
    }
}

impl From<hydro_api::Error> for CoreError {
    fn from(err: hydro_api::Error) -> Self {
        CoreError::ClientSetup {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_map_to_fetch_status() {
        let err = FetchError::from(hydro_api::Error::Status {
            status: 500,
            body: "boom".into(),
        });
        assert_eq!(err, FetchError::Status { status: 500 });
    }

    #[test]
    fn hub_error_body_maps_to_backend() {
        let err = FetchError::from(hydro_api::Error::Backend {
            message: "Could not access node list".into(),
        });
        assert_eq!(err.to_string(), "Hub reported an error: Could not access node list");
    }

    #[test]
    fn rename_non_success_is_rejection() {
        let err = RenameError::from(hydro_api::Error::Status {
            status: 400,
            body: "Invalid request.".into(),
        });
        assert_eq!(err, RenameError::Rejected { status: 400 });
    }

    #[test]
    fn rename_stream_failure_is_transport() {
        let err = RenameError::from(hydro_api::Error::UpdateStream("reset".into()));
        assert!(matches!(err, RenameError::Transport { .. }));
    }
}
