//! Ledger account references and clamped balance readings.

use serde::{Serialize, Serializer};

/// A resolved ledger account and the asset codes the dashboard cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRef {
    public_key: String,
    asset_codes: Vec<String>,
}

impl AccountRef {
    /// Returns `None` for a blank key; an unresolved account is not an account.
    #[must_use]
    pub fn new(public_key: impl Into<String>, asset_codes: Vec<String>) -> Option<Self> {
        let public_key = public_key.into();
        if public_key.trim().is_empty() {
            return None;
        }
        Some(Self {
            public_key,
            asset_codes,
        })
    }

    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    #[must_use]
    pub fn asset_codes(&self) -> &[String] {
        &self.asset_codes
    }
}

/// Which balance line of an account a reading came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Asset {
    /// The ledger's native currency, reported in USD after conversion.
    Native,
    /// An issued asset identified by its code.
    Issued(String),
}

impl Asset {
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Asset::Native => "XLM",
            Asset::Issued(code) => code,
        }
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// One balance reading. The amount is never negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceRecord {
    account: String,
    asset: Asset,
    amount: f64,
}

impl BalanceRecord {
    /// Negative and non-finite upstream readings are clamped to zero.
    #[must_use]
    pub fn new(account: &AccountRef, asset: Asset, raw_amount: f64) -> Self {
        Self {
            account: account.public_key().to_string(),
            asset,
            amount: clamp_amount(raw_amount),
        }
    }

    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    #[must_use]
    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    #[must_use]
    pub const fn amount(&self) -> f64 {
        self.amount
    }

    /// Display form used in the rendered page (shortest round-trip decimal).
    #[must_use]
    pub fn display_amount(&self) -> String {
        self.amount.to_string()
    }
}

fn clamp_amount(raw: f64) -> f64 {
    if raw.is_finite() && raw > 0.0 {
        raw
    } else {
        0.0
    }
}
