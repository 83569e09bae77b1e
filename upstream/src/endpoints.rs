//! Platform endpoint descriptors and the JSON shapes they return.
//!
//! The platform serialises Go structs without tags, so field names are
//! PascalCase on the wire. Every model field defaults when absent; a record
//! missing optional fields is still a usable record.

use serde::Deserialize;

use crate::client::{Endpoint, Method};

macro_rules! endpoint {
    ($(#[$meta:meta])* $name:ident, $label:literal, $method:expr, $path:literal, $response:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl Endpoint for $name {
            const NAME: &'static str = $label;
            const PATH: &'static str = $path;
            const METHOD: Method = $method;
            type Response = $response;
        }
    };
}

endpoint!(
    /// `POST /token` with form `username`, `pwhash`.
    Token, "token", Method::PostForm, "/token", TokenResponse
);
endpoint!(
    /// `GET /ping`.
    Ping, "ping", Method::Get, "/ping", StatusResponse
);
endpoint!(
    /// `GET /recipient/validate?username&token`.
    ValidateRecipient, "recipient/validate", Method::Get, "/recipient/validate", RecipientRecord
);
endpoint!(
    /// `GET /project/get?index`.
    GetProject, "project/get", Method::Get, "/project/get", ProjectRecord
);
endpoint!(
    AllProjects, "admin/getallprojects", Method::Get, "/admin/getallprojects", LengthResponse
);
endpoint!(
    AllUsers, "admin/getallusers", Method::Get, "/admin/getallusers", LengthResponse
);
endpoint!(
    AllInvestors, "admin/getallinvestors", Method::Get, "/admin/getallinvestors", LengthResponse
);
endpoint!(
    AllRecipients, "admin/getallrecipients", Method::Get, "/admin/getallrecipients", LengthResponse
);
endpoint!(
    /// `GET /admin/getinvestor?username&token&index`.
    GetInvestor, "admin/getinvestor", Method::Get, "/admin/getinvestor", EntityRecord
);
endpoint!(
    /// `GET /admin/getentity?username&token&index`; used for developers.
    GetEntity, "admin/getentity", Method::Get, "/admin/getentity", EntityRecord
);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct StatusResponse {
    pub code: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LengthResponse {
    pub length: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Wallet {
    pub public_key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PlatformUser {
    pub index: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub stellar_wallet: Wallet,
    pub secondary_wallet: Wallet,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RecipientRecord {
    #[serde(rename = "U")]
    pub user: Option<PlatformUser>,
    pub next_payment_interval: String,
    pub teller_energy: u64,
    pub past_teller_energy: Vec<u32>,
    pub device_id: String,
    pub device_starts: Vec<String>,
    pub device_location: String,
    pub state_hashes: Vec<String>,
}

impl RecipientRecord {
    /// A recipient only counts as validated when the platform returned a real user.
    #[must_use]
    pub fn validated_user(&self) -> Option<&PlatformUser> {
        self.user.as_ref().filter(|u| u.index != 0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProjectRecord {
    pub index: i64,
    pub escrow_pubkey: String,
    pub debt_asset_code: String,
    pub payback_asset_code: String,
    pub investor_asset_code: String,
    pub investor_indices: Vec<i64>,
    /// The platform tags this one with a space.
    #[serde(rename = "Developer Indices")]
    pub developer_indices: Vec<i64>,
    /// Unix seconds; zero until the first payment.
    pub date_last_paid: i64,
    pub payback_period: i64,
    pub bal_left: f64,
    pub ownership_shift: f64,
    pub date_initiated: String,
    pub date_funded: String,
    pub stage: i64,
}

/// Investor and developer records share the embedded-user shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EntityRecord {
    #[serde(rename = "U")]
    pub user: Option<PlatformUser>,
}
