//! Account balance queries against a Horizon-style ledger API.

use serde::{Deserialize, Deserializer};
use url::Url;

use crate::client::{Method, decode};
use crate::{FetchError, UpstreamClient};

const ACCOUNTS_ENDPOINT: &str = "ledger/accounts";
const NATIVE_ASSET_TYPE: &str = "native";

#[derive(Debug, Deserialize)]
struct AccountResponse {
    #[serde(default)]
    balances: Vec<LedgerBalance>,
}

#[derive(Debug, Deserialize)]
struct LedgerBalance {
    #[serde(deserialize_with = "amount_from_str")]
    balance: f64,
    asset_type: String,
    #[serde(default)]
    asset_code: Option<String>,
}

/// The ledger reports amounts as decimal strings.
fn amount_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.trim().parse().map_err(serde::de::Error::custom)
}

/// Reads balances for one public key at a time.
///
/// Amounts are returned as reported; clamping happens when a
/// [`BalanceRecord`](beacon_types::BalanceRecord) is built.
#[derive(Debug, Clone)]
pub struct Ledger {
    client: UpstreamClient,
}

impl Ledger {
    #[must_use]
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    fn account_url(&self, public_key: &str) -> Url {
        let base = self.client.base_url();
        let mut url = base.clone();
        url.set_path(&format!(
            "{}/accounts/{public_key}",
            base.path().trim_end_matches('/')
        ));
        url
    }

    async fn balances(&self, public_key: &str) -> Result<Vec<LedgerBalance>, FetchError> {
        let url = self.account_url(public_key);
        let body = self
            .client
            .fetch(ACCOUNTS_ENDPOINT, Method::Get, url, &[])
            .await?;
        let account: AccountResponse = decode(ACCOUNTS_ENDPOINT, &body)?;
        Ok(account.balances)
    }

    /// Native (XLM) balance of `public_key`.
    pub async fn native_balance(&self, public_key: &str) -> Result<f64, FetchError> {
        let balances = self.balances(public_key).await?;
        Ok(balances
            .iter()
            .find(|b| b.asset_type == NATIVE_ASSET_TYPE)
            .map_or(0.0, |b| b.balance))
    }

    /// Balance of the issued asset `asset_code`. An account without a
    /// trustline for the asset holds zero of it.
    pub async fn asset_balance(&self, public_key: &str, asset_code: &str) -> Result<f64, FetchError> {
        let balances = self.balances(public_key).await?;
        Ok(balances
            .iter()
            .find(|b| b.asset_type != NATIVE_ASSET_TYPE && b.asset_code.as_deref() == Some(asset_code))
            .map_or(0.0, |b| b.balance))
    }
}
