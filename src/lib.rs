//! # gandi-ddns
//!
//! Keeps a Gandi LiveDNS `A`/`AAAA` record pointed at the host's current
//! public address. Meant to be run periodically by an external scheduler
//! (cron, a systemd timer).
//!
//! Each run, per record type:
//!
//! 1. ask `me.gandi.net` for our address over the matching IP family,
//! 2. read the existing rrset,
//! 3. create it if missing, replace it if stale, or leave it alone.
//!
//! ## Usage
//!
//! ```bash
//! export GANDI_DDNS_BASE_URL=https://api.gandi.net/v5/livedns/domains
//! export GANDI_DDNS_DOMAIN=example.com
//! export GANDI_DDNS_SUBDOMAIN=home
//! export GANDI_DDNS_TOKEN=...
//! export GANDI_DDNS_TTL=300
//! gandi-ddns
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod http;
pub mod providers;
pub mod reconciler;

pub use config::{Config, ConfigSource, EnvSource, FileConfig, ReconciliationTarget, RecordType};
pub use detector::IpDetector;
pub use error::{DdnsError, Result};
pub use http::{HttpCaller, IpVersion, ReqwestCaller};
pub use reconciler::{Outcome, ReconcileReport, Reconciler};
