//! On-disk file format. Every field is optional; resolution fills defaults.
//!
//! ```toml
//! [server]
//! port = 8081
//! insecure = false
//!
//! [platform]
//! url = "https://api2.openx.solar"
//! project_index = 1
//!
//! [platform.recipient]
//! username = "aibonitoGsIoJ"
//! password = "${BEACON_RECIPIENT_PASSWORD}"
//!
//! [[probes]]
//! name = "website"
//! url = "https://openx.solar"
//! check = "body"
//! marker = "doctype html"
//! ```

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    pub server: Option<RawServer>,
    pub platform: Option<RawPlatform>,
    pub ledger: Option<RawEndpoint>,
    pub ticker: Option<RawEndpoint>,
    pub http: Option<RawHttp>,
    #[serde(default)]
    pub probes: Vec<RawProbe>,
    pub watcher: Option<RawWatcher>,
    pub smtp: Option<RawSmtp>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawServer {
    pub port: Option<u16>,
    #[serde(default)]
    pub insecure: bool,
    pub cert: Option<PathBuf>,
    pub key: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub template_dir: Option<PathBuf>,
    pub template: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawPlatform {
    pub url: Option<String>,
    pub project_index: Option<i64>,
    pub explorer_url: Option<String>,
    pub stable_asset: Option<String>,
    pub recipient: Option<RawPrincipal>,
    pub admin: Option<RawPrincipal>,
}

/// Either `password` (hashed at load) or a precomputed `password_hash`.
#[derive(Default, Deserialize)]
pub struct RawPrincipal {
    pub username: Option<String>,
    pub password: Option<String>,
    pub password_hash: Option<String>,
}

// Manual Debug impl to prevent leaking credentials in logs.
impl std::fmt::Debug for RawPrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn mask(opt: Option<&String>) -> &'static str {
            if opt.is_some() { "[REDACTED]" } else { "None" }
        }
        f.debug_struct("RawPrincipal")
            .field("username", &self.username)
            .field("password", &mask(self.password.as_ref()))
            .field("password_hash", &mask(self.password_hash.as_ref()))
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RawEndpoint {
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawHttp {
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RawCheck {
    #[default]
    Status,
    Body,
}

#[derive(Debug, Deserialize)]
pub struct RawProbe {
    pub name: String,
    pub label: Option<String>,
    pub url: String,
    pub display: Option<String>,
    #[serde(default)]
    pub check: RawCheck,
    pub expected: Option<i64>,
    pub marker: Option<String>,
}

#[derive(Deserialize)]
pub struct RawWatcher {
    pub ping_url: Option<String>,
    pub device_id: Option<String>,
    pub access_token: Option<String>,
    pub location: Option<String>,
    pub interval_secs: Option<u64>,
    #[serde(default)]
    pub recipients: Vec<String>,
}

impl std::fmt::Debug for RawWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawWatcher")
            .field("ping_url", &self.ping_url)
            .field("device_id", &self.device_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("location", &self.location)
            .field("interval_secs", &self.interval_secs)
            .field("recipients", &self.recipients)
            .finish()
    }
}

#[derive(Deserialize)]
pub struct RawSmtp {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
}

impl std::fmt::Debug for RawSmtp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawSmtp")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("from", &self.from)
            .finish()
    }
}
