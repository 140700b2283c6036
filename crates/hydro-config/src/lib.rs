//! Configuration for the HydroControl GE dashboard.
//!
//! TOML profiles (one per hub), environment overrides, and translation to
//! `hydro_core::DashboardConfig`. Durations are written the human way:
//! `"2s"`, `"1500ms"`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hydro_core::config::{DEFAULT_HUB_URL, DEFAULT_REFRESH_INTERVAL, DEFAULT_STATUS_CLEAR_DELAY};
use hydro_core::{DashboardConfig, TlsVerification};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' is not defined")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    /// Values every profile falls back to.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named hub profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    ///
    /// A missing `default` profile resolves to an all-defaults profile, so
    /// a fresh install works without a config file.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, Profile), ConfigError> {
        let name = name
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into());

        match self.profiles.get(&name) {
            Some(profile) => Ok((name, profile.clone())),
            None if name == "default" => Ok((name, Profile::default())),
            None => Err(ConfigError::UnknownProfile { profile: name }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default)]
    pub insecure: bool,

    /// Per-request timeout.
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Status poll period.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: String,

    /// How long an assignment reply stays on screen.
    #[serde(default = "default_status_clear_delay")]
    pub status_clear_delay: String,

    /// Listen to the hub's `/events` stream.
    #[serde(default)]
    pub push_updates: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: default_timeout(),
            refresh_interval: default_refresh_interval(),
            status_clear_delay: default_status_clear_delay(),
            push_updates: false,
        }
    }
}

fn default_timeout() -> String {
    "10s".into()
}
fn default_refresh_interval() -> String {
    humantime::format_duration(DEFAULT_REFRESH_INTERVAL).to_string()
}
fn default_status_clear_delay() -> String {
    humantime::format_duration(DEFAULT_STATUS_CLEAR_DELAY).to_string()
}

/// A named hub profile. Unset fields fall back to [`Defaults`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Hub base URL (e.g., "http://192.168.4.1").
    #[serde(default = "default_hub")]
    pub hub: String,

    /// Path to a custom CA certificate (hub behind a TLS proxy).
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification.
    pub insecure: Option<bool>,

    pub timeout: Option<String>,

    pub refresh_interval: Option<String>,

    pub status_clear_delay: Option<String>,

    pub push_updates: Option<bool>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            hub: default_hub(),
            ca_cert: None,
            insecure: None,
            timeout: None,
            refresh_interval: None,
            status_clear_delay: None,
            push_updates: None,
        }
    }
}

fn default_hub() -> String {
    DEFAULT_HUB_URL.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "hydrocontrol", "hydrodash").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hydrodash");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load defaults, then `path` (if it exists), then `HYDRO_*` variables.
///
/// Nested keys use a double underscore: `HYDRO_DEFAULTS__TIMEOUT=5s`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HYDRO_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `DashboardConfig` from a profile, filling gaps from `defaults`.
pub fn profile_to_dashboard_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<DashboardConfig, ConfigError> {
    let url: url::Url = profile.hub.parse().map_err(|_| ConfigError::Validation {
        field: format!("profiles.{profile_name}.hub"),
        reason: format!("invalid URL: {}", profile.hub),
    })?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let duration = |field: &str, value: Option<&String>, fallback: &str| {
        parse_duration(
            &format!("profiles.{profile_name}.{field}"),
            value.map_or(fallback, String::as_str),
        )
    };

    let refresh_interval = duration(
        "refresh_interval",
        profile.refresh_interval.as_ref(),
        &defaults.refresh_interval,
    )?;
    if refresh_interval.is_zero() {
        return Err(ConfigError::Validation {
            field: format!("profiles.{profile_name}.refresh_interval"),
            reason: "must be greater than zero".into(),
        });
    }

    let timeout = duration("timeout", profile.timeout.as_ref(), &defaults.timeout)?;
    if timeout.is_zero() {
        return Err(ConfigError::Validation {
            field: format!("profiles.{profile_name}.timeout"),
            reason: "must be greater than zero".into(),
        });
    }

    Ok(DashboardConfig {
        url,
        tls,
        timeout,
        refresh_interval,
        status_clear_delay: duration(
            "status_clear_delay",
            profile.status_clear_delay.as_ref(),
            &defaults.status_clear_delay,
        )?,
        push_updates: profile.push_updates.unwrap_or(defaults.push_updates),
    })
}

/// Parse a human duration (`"2s"`, `"1m 30s"`, `"250ms"`).
pub fn parse_duration(field: &str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("'{value}' is not a duration ({e})"),
    })
}
