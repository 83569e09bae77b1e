//! The request-scoped aggregate handed to the render sink.
//!
//! Every field has a documented default (empty string, zero, empty list). A
//! field whose source failed keeps that default and gets a matching entry in
//! [`Snapshot::failures`], so the snapshot is structurally complete for any mix
//! of upstream successes and failures.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{BalanceRecord, FieldFailure};

/// Display text plus an optional hyperlink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkField {
    pub text: String,
    pub link: String,
}

impl LinkField {
    #[must_use]
    pub fn new(text: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: link.into(),
        }
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: String::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Outcome of one liveness probe. Independent of every other probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub name: String,
    pub reachable: bool,
    pub text: String,
    pub link: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersonSummary {
    pub name: String,
    pub username: String,
    pub email: String,
}

/// Identities the request authenticated as. Tokens are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Principals {
    pub recipient: String,
    pub admin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub index: i64,
    pub payback_period: i64,
    pub balance_left: f64,
    pub ownership_shift: f64,
    pub date_initiated: String,
    pub date_funded: String,
    pub stage: i64,
    pub investor_asset_code: String,
}

/// Admin-only aggregate counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub projects: LinkField,
    pub users: LinkField,
    pub investors: LinkField,
    pub recipients: LinkField,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub title: String,
    /// Probe results keyed by probe name.
    pub status: BTreeMap<String, ProbeResult>,
    pub principals: Principals,
    pub validate: LinkField,
    pub next_interval: LinkField,
    pub teller_energy: LinkField,
    pub date_last_paid: LinkField,
    pub date_last_start: LinkField,
    pub device_id: LinkField,
    pub debt_balance: LinkField,
    pub payback_balance: LinkField,
    pub primary_account: LinkField,
    pub secondary_account: LinkField,
    pub escrow_balance: LinkField,
    pub recipient: PersonSummary,
    pub investor: PersonSummary,
    pub developer: PersonSummary,
    pub past_energy_values: Vec<u32>,
    pub device_location: String,
    pub state_hashes: Vec<String>,
    pub project: ProjectSummary,
    pub counts: Counts,
    pub balances: Vec<BalanceRecord>,
    pub failures: Vec<FieldFailure>,
    pub generated_at: String,
}

impl Snapshot {
    #[must_use]
    pub fn failure(&self, field: &str) -> Option<&FieldFailure> {
        self.failures.iter().find(|f| f.field == field)
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }

    #[must_use]
    pub fn probe(&self, name: &str) -> Option<&ProbeResult> {
        self.status.get(name)
    }

    #[must_use]
    pub fn balance(&self, account: &str, asset_code: &str) -> Option<&BalanceRecord> {
        self.balances
            .iter()
            .find(|b| b.account() == account && b.asset().code() == asset_code)
    }
}
