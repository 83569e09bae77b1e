//! Clients for every upstream the dashboard aggregates.
//!
//! # Architecture
//!
//! - [`UpstreamClient`] - one HTTP round trip per call against a named [`Endpoint`]
//! - [`endpoints`] - platform endpoint descriptors and their wire shapes
//! - [`CredentialBroker`] - exchanges a [`Principal`](beacon_types::Principal) for a session token
//! - [`Ledger`] - native and issued-asset balance queries
//! - [`PriceTicker`] - native currency to USD conversion rate
//!
//! All clients share a single [`reqwest::Client`] built by [`http_client`], which
//! carries the per-call timeout. A slow upstream therefore fails its own call
//! with [`FetchError::Transport`] instead of stalling the whole snapshot.
//!
//! # Error Handling
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | `Transport` | Network failure or timeout |
//! | `Protocol` | Non-2xx status |
//! | `Decode` | Body did not match the expected shape |
//! | `Auth` | Credential exchange rejected |
//! | `DependencyUnresolved` | Required input never resolved; no request was sent |
//!
//! `Transport` and `Protocol` both count as "unreachable" for callers, since the
//! recovery action is the same.

pub mod auth;
mod client;
pub mod endpoints;
mod error;
pub mod ledger;
pub mod ticker;

use std::time::Duration;

pub use auth::{CredentialBroker, hash_password};
pub use client::{Endpoint, Method, UpstreamClient};
pub use error::FetchError;
pub use ledger::Ledger;
pub use ticker::PriceTicker;

pub use beacon_types;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const TCP_KEEPALIVE_SECS: u64 = 60;

const POOL_MAX_IDLE_PER_HOST: usize = 32;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const DEFAULT_USER_AGENT: &str = concat!("beacon/", env!("CARGO_PKG_VERSION"));

/// Process-wide HTTP settings. Read-only after start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    /// Upper bound on a single upstream call, including reading the body.
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

fn base_client_builder(settings: &HttpSettings) -> reqwest::ClientBuilder {
    use reqwest::header::{HeaderMap, HeaderValue};

    let mut default_headers = HeaderMap::new();
    default_headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("*/*"));

    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(settings.user_agent.clone())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .default_headers(default_headers)
}

/// Build the shared HTTP client. Built once at start-up and cloned into each client.
pub fn http_client(settings: &HttpSettings) -> Result<reqwest::Client, reqwest::Error> {
    base_client_builder(settings).build()
}
