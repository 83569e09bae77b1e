//! Per-request orchestration.
//!
//! One request runs the liveness probes alongside the token path
//! (authenticate, collect, assemble). The probes never wait on the token path,
//! and the collector never starts before both credential exchanges settle.

use beacon_types::{FieldFailure, Principal, SessionToken, Snapshot};
use beacon_upstream::{CredentialBroker, FetchError, Ledger, PriceTicker, UpstreamClient};
use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::probe::{ProbeTarget, Prober};
use crate::render::{RenderError, RenderSink};
use crate::stage::{RequestStage, StageCursor, StageTransitionError};

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("no usable session: neither principal could authenticate")]
    NoSession,
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Stage(#[from] StageTransitionError),
}

/// Read-only process configuration for the aggregator.
#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    pub title: String,
    pub platform_url: Url,
    pub ledger_url: Url,
    pub ticker_url: Url,
    /// Prefix for account links; the public key is appended.
    pub explorer_url: Url,
    pub recipient: Principal,
    pub admin: Principal,
    pub project_index: i64,
    pub stable_asset: String,
    pub probes: Vec<ProbeTarget>,
}

/// Tokens resolved for one request. Dropped with the request.
#[derive(Debug, Default)]
pub struct Sessions {
    pub user: Option<SessionToken>,
    pub admin: Option<SessionToken>,
}

impl Sessions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.admin.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    pub(crate) platform: UpstreamClient,
    pub(crate) broker: CredentialBroker,
    pub(crate) ledger: Ledger,
    pub(crate) ticker: PriceTicker,
    pub(crate) prober: Prober,
    pub(crate) settings: AggregatorSettings,
}

impl Aggregator {
    /// All upstream clients share `http`, and with it the per-call timeout.
    #[must_use]
    pub fn new(http: reqwest::Client, settings: AggregatorSettings) -> Self {
        let platform = UpstreamClient::new(http.clone(), settings.platform_url.clone());
        Self {
            broker: CredentialBroker::new(platform.clone()),
            ledger: Ledger::new(UpstreamClient::new(http.clone(), settings.ledger_url.clone())),
            ticker: PriceTicker::new(http.clone(), settings.ticker_url.clone()),
            prober: Prober::new(http),
            platform,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    /// Build a fresh snapshot, stamped with the current time.
    pub async fn snapshot(&self) -> Result<Snapshot, RequestError> {
        self.snapshot_at(Utc::now()).await
    }

    /// Build a fresh snapshot stamped with `now`.
    pub async fn snapshot_at(&self, now: DateTime<Utc>) -> Result<Snapshot, RequestError> {
        let mut cursor = StageCursor::new();
        self.aggregate(&mut cursor, now).await
    }

    /// Build a snapshot and hand it to `sink`.
    ///
    /// An unreadable template fails the whole request rather than producing a
    /// half-rendered page.
    pub async fn handle<S: RenderSink>(
        &self,
        sink: &S,
        template_id: &str,
    ) -> Result<S::Output, RequestError> {
        let mut cursor = StageCursor::new();
        let snapshot = self.aggregate(&mut cursor, Utc::now()).await?;

        match sink.render(template_id, &snapshot) {
            Ok(output) => {
                cursor.advance(RequestStage::Rendered)?;
                Ok(output)
            }
            Err(e) => {
                cursor.advance(RequestStage::Failed)?;
                tracing::error!(template = template_id, error = %e, "Render failed");
                Err(e.into())
            }
        }
    }

    async fn aggregate(
        &self,
        cursor: &mut StageCursor,
        now: DateTime<Utc>,
    ) -> Result<Snapshot, RequestError> {
        cursor.advance(RequestStage::ProbingAuthenticating)?;

        let (status, snapshot) = tokio::join!(
            self.prober.probe_all(&self.settings.probes),
            self.token_path(cursor, now),
        );

        let mut snapshot = snapshot?;
        snapshot.status = status;
        tracing::info!(
            failures = snapshot.failures.len(),
            down = snapshot.status.values().filter(|p| !p.reachable).count(),
            "Snapshot assembled"
        );
        Ok(snapshot)
    }

    async fn token_path(
        &self,
        cursor: &mut StageCursor,
        now: DateTime<Utc>,
    ) -> Result<Snapshot, RequestError> {
        let (user, admin) = self
            .broker
            .authenticate_pair(&self.settings.recipient, &self.settings.admin)
            .await;

        let mut failures = Vec::new();
        let sessions = Sessions {
            user: settle("session.user", user, &mut failures),
            admin: settle("session.admin", admin, &mut failures),
        };
        if sessions.is_empty() {
            cursor.advance(RequestStage::Failed)?;
            tracing::error!("Both principals failed to authenticate");
            return Err(RequestError::NoSession);
        }

        cursor.advance(RequestStage::Collecting)?;
        let (collected, collect_failures) = self.collect(&sessions).await;
        failures.extend(collect_failures);

        cursor.advance(RequestStage::Assembling)?;
        Ok(self.assemble(&sessions, collected, failures, now).await)
    }
}

/// Keep a successful value; record and log a failure against `field`.
pub(crate) fn settle<T>(
    field: &str,
    outcome: Result<T, FetchError>,
    failures: &mut Vec<FieldFailure>,
) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(field, kind = e.kind().as_str(), error = %e, "Field degraded");
            failures.push(e.into_failure(field));
            None
        }
    }
}
