//! Configuration management for gandi-ddns.
//!
//! Values come from `GANDI_DDNS_*` environment variables, optionally backed
//! by a TOML file. Environment values always win over the file.

use crate::error::{DdnsError, Result};
use crate::http::{IpVersion, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const BASE_URL_KEY: &str = "GANDI_DDNS_BASE_URL";
pub const DOMAIN_KEY: &str = "GANDI_DDNS_DOMAIN";
pub const SUBDOMAIN_KEY: &str = "GANDI_DDNS_SUBDOMAIN";
pub const TOKEN_KEY: &str = "GANDI_DDNS_TOKEN";
pub const TTL_KEY: &str = "GANDI_DDNS_TTL";
pub const TIMEOUT_KEY: &str = "GANDI_DDNS_TIMEOUT_SECS";

/// Where configuration values are looked up.
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<String>;
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Optional on-disk configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub domain: Option<String>,
    pub subdomain: Option<String>,
    pub token: Option<String>,
    pub ttl: Option<u32>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Get the default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DdnsError::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("gandi-ddns").join("config.toml"))
    }

    /// Load from a specific path. A missing file yields an empty config.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: FileConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

impl ConfigSource for FileConfig {
    fn get(&self, key: &str) -> Option<String> {
        match key {
            BASE_URL_KEY => self.base_url.clone(),
            DOMAIN_KEY => self.domain.clone(),
            SUBDOMAIN_KEY => self.subdomain.clone(),
            TOKEN_KEY => self.token.clone(),
            TTL_KEY => self.ttl.map(|ttl| ttl.to_string()),
            TIMEOUT_KEY => self.timeout_secs.map(|secs| secs.to_string()),
            _ => None,
        }
    }
}

/// Process environment, falling back to a file when a key is unset.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    fallback: FileConfig,
}

impl EnvSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(fallback: FileConfig) -> Self {
        Self { fallback }
    }
}

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().or_else(|| self.fallback.get(key))
    }
}

/// Settings for one run, read fresh per record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub domain: String,
    pub subdomain: String,
    pub token: String,
    pub ttl: u32,
}

impl Config {
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self> {
        let require =
            |key: &str| source.get(key).ok_or_else(|| DdnsError::MissingConfig(key.to_string()));

        let base_url = require(BASE_URL_KEY)?.trim_end_matches('/').to_string();
        let domain = require(DOMAIN_KEY)?;
        let subdomain = require(SUBDOMAIN_KEY)?;
        let token = require(TOKEN_KEY)?;
        let ttl = require(TTL_KEY)?;
        let ttl = ttl
            .trim()
            .parse()
            .map_err(|_| DdnsError::Config(format!("{} must be an integer, got {:?}", TTL_KEY, ttl)))?;

        Ok(Self {
            base_url,
            domain,
            subdomain,
            token,
            ttl,
        })
    }

    /// LiveDNS resource URL for one record type.
    pub fn record_url(&self, record_type: RecordType) -> String {
        format!(
            "{}/{}/records/{}/{}",
            self.base_url, self.domain, self.subdomain, record_type
        )
    }
}

/// Per-request timeout from the optional timeout key.
///
/// Read once for the whole process, not per record type.
pub fn timeout_from(source: &dyn ConfigSource) -> Result<Duration> {
    match source.get(TIMEOUT_KEY) {
        Some(raw) => raw.trim().parse().map(Duration::from_secs).map_err(|_| {
            DdnsError::Config(format!("{} must be an integer, got {:?}", TIMEOUT_KEY, raw))
        }),
        None => Ok(DEFAULT_TIMEOUT),
    }
}

/// Address record types kept in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    pub const ALL: [RecordType; 2] = [RecordType::A, RecordType::Aaaa];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// IP family the echo lookup must go out on for this record.
    pub fn ip_version(&self) -> IpVersion {
        match self {
            RecordType::A => IpVersion::V4,
            RecordType::Aaaa => IpVersion::V6,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one reconciliation needs, fixed for its duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationTarget {
    pub record_type: RecordType,
    pub ip_version: IpVersion,
    pub api_url: String,
    pub api_token: String,
    pub ttl: u32,
}

impl ReconciliationTarget {
    pub fn new(config: &Config, record_type: RecordType) -> Self {
        Self {
            record_type,
            ip_version: record_type.ip_version(),
            api_url: config.record_url(record_type),
            api_token: config.token.clone(),
            ttl: config.ttl,
        }
    }
}
