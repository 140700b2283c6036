// hydro-api: Async Rust client for the HydroControl GE hub HTTP API

pub mod client;
pub mod error;
pub mod events;
pub mod models;
pub mod transport;

pub use client::HubClient;
pub use error::Error;
pub use events::{ReconnectConfig, SseEvent, SseParser, UpdateStreamHandle};
pub use models::{AssignReply, NodeRecord, RawTimestamp, SetNameRequest, StatusResponse};
pub use transport::{TlsMode, TransportConfig};
