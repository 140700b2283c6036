// ── Runtime dashboard configuration ──
//
// Describes *how* to reach a hub and how often to poll it. Never touches
// disk: `hydro-config` (or CLI flags) build a `DashboardConfig` and hand
// it in.

use std::path::PathBuf;
use std::time::Duration;

use hydro_api::{TlsMode, TransportConfig};
use url::Url;

/// Address the hub answers on when it runs its own access point.
pub const DEFAULT_HUB_URL: &str = "http://192.168.4.1";

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll period of the status table.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(2);

/// How long an assignment reply stays on screen.
pub const DEFAULT_STATUS_CLEAR_DELAY: Duration = Duration::from_secs(3);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed reverse proxy in front of the hub).
    DangerAcceptInvalid,
}

/// Configuration for one dashboard session against one hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Hub base URL (e.g., `http://192.168.4.1`).
    pub url: Url,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Status poll period.
    pub refresh_interval: Duration,
    /// Auto-clear delay for the assignment status line.
    pub status_clear_delay: Duration,
    /// Also listen to the hub's `/events` push stream.
    pub push_updates: bool,
}

impl DashboardConfig {
    /// Config for the given hub URL with every other setting defaulted.
    pub fn for_hub(url: Url) -> Self {
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: DEFAULT_TIMEOUT,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            status_clear_delay: DEFAULT_STATUS_CLEAR_DELAY,
            push_updates: false,
        }
    }

    /// Transport settings for `hydro-api`.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: Some(self.timeout),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn hub_url() -> Url {
        Url::parse(DEFAULT_HUB_URL).unwrap()
    }

    #[test]
    fn defaults_match_hub_page() {
        let config = DashboardConfig::for_hub(hub_url());
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.refresh_interval, Duration::from_secs(2));
        assert_eq!(config.status_clear_delay, Duration::from_secs(3));
        assert!(!config.push_updates);
    }

    #[test]
    fn transport_carries_timeout_and_tls() {
        let config = DashboardConfig {
            tls: TlsVerification::DangerAcceptInvalid,
            timeout: Duration::from_secs(4),
            ..DashboardConfig::for_hub(hub_url())
        };
        let transport = config.transport();
        assert_eq!(transport.timeout, Some(Duration::from_secs(4)));
        assert!(matches!(transport.tls, TlsMode::DangerAcceptInvalid));
    }
}
