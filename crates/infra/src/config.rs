//! Process configuration, read from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
pub const DEFAULT_SUBSCRIPTIONS_PATH: &str = "data/subscriptions.db";
pub const DEFAULT_AUTH_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_SUBSCRIPTION_TERM_DAYS: u32 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub subscriptions_path: PathBuf,
    /// Base URL of the identity service. Unset means partner identity is
    /// taken from the request body.
    pub auth_service_url: Option<String>,
    pub auth_timeout: Duration,
    /// JSON catalog file; the built-in marketplace catalog when unset.
    pub catalog_path: Option<PathBuf>,
    pub subscription_term_days: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let term_days = parse(&get, "SUBSCRIPTION_TERM_DAYS", DEFAULT_SUBSCRIPTION_TERM_DAYS)?;
        if term_days == 0 {
            return Err(ConfigError::Invalid {
                key: "SUBSCRIPTION_TERM_DAYS",
                value: "0".into(),
                reason: "must be at least one day".into(),
            });
        }

        let auth_service_url = get("AUTH_SERVICE_URL");
        if let Some(url) = &auth_service_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    key: "AUTH_SERVICE_URL",
                    value: url.clone(),
                    reason: "expected an http(s) URL".into(),
                });
            }
        }

        Ok(Self {
            bind_addr: parse(&get, "BIND_ADDR", default_bind_addr())?,
            subscriptions_path: get("SUBSCRIPTIONS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SUBSCRIPTIONS_PATH)),
            auth_service_url,
            auth_timeout: Duration::from_millis(parse(
                &get,
                "AUTH_TIMEOUT_MS",
                DEFAULT_AUTH_TIMEOUT_MS,
            )?),
            catalog_path: get("CATALOG_PATH").map(PathBuf::from),
            subscription_term_days: term_days,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            subscriptions_path: PathBuf::from(DEFAULT_SUBSCRIPTIONS_PATH),
            auth_service_url: None,
            auth_timeout: Duration::from_millis(DEFAULT_AUTH_TIMEOUT_MS),
            catalog_path: None,
            subscription_term_days: DEFAULT_SUBSCRIPTION_TERM_DAYS,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3001))
}

fn parse<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}
