use thiserror::Error;

/// Top-level error type for the `hydro-api` crate.
///
/// Covers every failure mode of the hub surface: transport, HTTP status,
/// payload decoding, and the push-update stream. `hydro-core` maps these
/// into the dashboard's fetch / assign / rename error families.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Hub responses ───────────────────────────────────────────────
    /// The hub answered with a non-success HTTP status.
    #[error("Hub returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The hub answered 200 but reported an internal failure
    /// (`{"error": "..."}` instead of a node list).
    #[error("Hub error: {message}")]
    Backend { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Push updates ────────────────────────────────────────────────
    /// The `/events` stream could not be opened or broke mid-read.
    #[error("Update stream failed: {0}")]
    UpdateStream(String),
}
