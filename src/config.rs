// src/config.rs

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::core::cache::DEFAULT_TTL_HOURS;
use crate::core::scanner::ct_source::DEFAULT_CT_BASE_URL;
use crate::core::scanner::fanout::DEFAULT_WORKERS;

/// Prefix of every environment override, e.g. `RECONKIT_PORT`.
pub const ENV_PREFIX: &str = "RECONKIT_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidValue { name: String, value: String, reason: String },
}

/// Runtime settings of the API server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// JSON file holding the subdomain result cache.
    pub cache_file: PathBuf,
    pub ct_base_url: String,
    pub ct_timeout_secs: u64,
    /// Per-record-type DNS timeout used during verification.
    pub dns_timeout_ms: u64,
    /// Width of the DNS verification pool.
    pub workers: usize,
    pub cache_ttl_hours: i64,
    pub cors_allow_any: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cache_file: PathBuf::from("cache").join("subdomain_cache.json"),
            ct_base_url: DEFAULT_CT_BASE_URL.to_string(),
            ct_timeout_secs: 15,
            dns_timeout_ms: 500,
            workers: DEFAULT_WORKERS,
            cache_ttl_hours: DEFAULT_TTL_HOURS,
            cors_allow_any: true,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `RECONKIT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `RECONKIT_*` name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        override_field(&lookup, "HOST", &mut config.host)?;
        override_field(&lookup, "PORT", &mut config.port)?;
        override_field(&lookup, "CACHE_FILE", &mut config.cache_file)?;
        override_field(&lookup, "CT_BASE_URL", &mut config.ct_base_url)?;
        override_field(&lookup, "CT_TIMEOUT_SECS", &mut config.ct_timeout_secs)?;
        override_field(&lookup, "DNS_TIMEOUT_MS", &mut config.dns_timeout_ms)?;
        override_field(&lookup, "WORKERS", &mut config.workers)?;
        override_field(&lookup, "CACHE_TTL_HOURS", &mut config.cache_ttl_hours)?;
        override_field(&lookup, "CORS_ALLOW_ANY", &mut config.cors_allow_any)?;
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_millis(self.dns_timeout_ms)
    }

    pub fn ct_timeout(&self) -> Duration {
        Duration::from_secs(self.ct_timeout_secs)
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cache_ttl_hours)
    }
}

fn override_field<F, T>(lookup: &F, field: &str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let name = format!("{}{}", ENV_PREFIX, field);
    let Some(value) = lookup(&name) else {
        return Ok(());
    };
    *slot = value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        name,
        value: value.clone(),
        reason: e.to_string(),
    })?;
    Ok(())
}
