//! Liveness probes for federated services.
//!
//! Each target carries its own success predicate. Some services answer
//! `{"Code": 200}` on `/ping`; the public website only serves HTML, so it is
//! checked for a marker in the raw body instead.

use std::collections::BTreeMap;

use beacon_types::ProbeResult;
use beacon_upstream::endpoints::StatusResponse;
use beacon_upstream::{FetchError, Method, UpstreamClient};
use futures_util::future::join_all;
use url::Url;

const STATUS_OK: i64 = 200;

/// How a probe decides that a service is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeCheck {
    /// Decode `{"Code": n}` and compare `n` with `expected`.
    Status { expected: i64 },
    /// The raw body contains `marker`.
    BodyContains { marker: String },
}

impl ProbeCheck {
    #[must_use]
    pub const fn status_ok() -> Self {
        Self::Status {
            expected: STATUS_OK,
        }
    }

    fn passes(&self, body: &[u8]) -> bool {
        match self {
            Self::Status { expected } => serde_json::from_slice::<StatusResponse>(body)
                .is_ok_and(|status| status.code == *expected),
            Self::BodyContains { marker } => {
                String::from_utf8_lossy(body).contains(marker.as_str())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    /// Key in [`Snapshot::status`](beacon_types::Snapshot::status).
    pub name: String,
    /// Human label, e.g. `Opensolar` in "Opensolar is Up".
    pub label: String,
    pub url: Url,
    /// Short form of the URL shown next to the status.
    pub display: String,
    pub check: ProbeCheck,
}

impl ProbeTarget {
    #[must_use]
    pub fn new(name: impl Into<String>, label: impl Into<String>, url: Url, check: ProbeCheck) -> Self {
        let display = url.host_str().unwrap_or_default().to_string();
        Self {
            name: name.into(),
            label: label.into(),
            url,
            display,
            check,
        }
    }

    fn result(&self, reachable: bool) -> ProbeResult {
        let verdict = if reachable { "Up" } else { "Down" };
        ProbeResult {
            name: self.name.clone(),
            reachable,
            text: format!("{} is {verdict}", self.label),
            link: link_text(&self.url),
            url: self.display.clone(),
        }
    }
}

/// The URL as written in config: a bare origin keeps no trailing slash.
fn link_text(url: &Url) -> String {
    let text = url.as_str();
    if url.path() == "/" && url.query().is_none() && url.fragment().is_none() {
        text.trim_end_matches('/').to_string()
    } else {
        text.to_string()
    }
}

/// Runs probes with the shared HTTP client.
#[derive(Debug, Clone)]
pub struct Prober {
    http: reqwest::Client,
}

impl Prober {
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Probe one service. Never fails: every error reduces to "down".
    pub async fn probe(&self, target: &ProbeTarget) -> ProbeResult {
        let client = UpstreamClient::new(self.http.clone(), target.url.clone());
        let reachable = match client
            .fetch(&target.name, Method::Get, target.url.clone(), &[])
            .await
        {
            Ok(body) => target.check.passes(&body),
            Err(e) => {
                log_probe_error(&target.name, &e);
                false
            }
        };
        if !reachable {
            tracing::info!(probe = %target.name, "Service is down");
        }
        target.result(reachable)
    }

    /// Probe every target concurrently, keyed by target name.
    pub async fn probe_all(&self, targets: &[ProbeTarget]) -> BTreeMap<String, ProbeResult> {
        join_all(targets.iter().map(|target| self.probe(target)))
            .await
            .into_iter()
            .map(|result| (result.name.clone(), result))
            .collect()
    }
}

fn log_probe_error(name: &str, error: &FetchError) {
    tracing::debug!(probe = name, error = %error, "Probe request failed");
}

/// Built-in federated services.
#[must_use]
pub fn default_targets(platform: &Url) -> Vec<ProbeTarget> {
    let mut ping = platform.clone();
    ping.set_path(&format!("{}/ping", platform.path().trim_end_matches('/')));

    let mut targets = vec![ProbeTarget::new(
        "opensolar",
        "Opensolar",
        ping,
        ProbeCheck::status_ok(),
    )];
    for (name, label, url, check) in [
        ("openx", "Openx", "https://api.openx.solar/ping", ProbeCheck::status_ok()),
        ("builds", "Builds", "https://builds.openx.solar/ping", ProbeCheck::status_ok()),
        (
            "website",
            "Website",
            "https://openx.solar",
            ProbeCheck::BodyContains {
                marker: "doctype html".to_string(),
            },
        ),
    ] {
        if let Ok(url) = Url::parse(url) {
            targets.push(ProbeTarget::new(name, label, url, check));
        }
    }
    targets
}
