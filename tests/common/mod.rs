//! Shared test utilities and fixtures
//!
//! Three mock servers stand in for the platform API, the ledger and the price
//! ticker. `mount_healthy` wires a complete happy-path deployment; tests then
//! override or omit individual endpoints.

#![allow(dead_code)]

use beacon_engine::{AggregatorSettings, ProbeCheck, ProbeTarget};
use beacon_types::{Principal, Role};
use beacon_upstream::{HttpSettings, hash_password, http_client};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const RECIPIENT: &str = "recipient";
pub const ADMIN: &str = "admin";
pub const USER_TOKEN: &str = "user-token";
pub const ADMIN_TOKEN: &str = "admin-token";

pub const PRIMARY: &str = "GPRIMARY";
pub const SECONDARY: &str = "GSECONDARY";
pub const ESCROW: &str = "GESCROW";
pub const STABLE: &str = "STABLEUSD";
pub const DEBT: &str = "DEBT1";
pub const PAYBACK: &str = "PAYBACK1";

pub struct Deployment {
    pub platform: MockServer,
    pub ledger: MockServer,
    pub ticker: MockServer,
}

impl Deployment {
    pub async fn start() -> Self {
        Self {
            platform: MockServer::start().await,
            ledger: MockServer::start().await,
            ticker: MockServer::start().await,
        }
    }

    pub fn settings(&self) -> AggregatorSettings {
        let platform_url = Url::parse(&self.platform.uri()).unwrap();
        let ping = platform_url.join("/ping").unwrap();
        AggregatorSettings {
            title: "Test dashboard".into(),
            platform_url,
            ledger_url: Url::parse(&self.ledger.uri()).unwrap(),
            ticker_url: Url::parse(&format!("{}/price", self.ticker.uri())).unwrap(),
            explorer_url: Url::parse("https://explorer.test/account/").unwrap(),
            recipient: Principal::new(RECIPIENT, hash_password("password"), Role::User),
            admin: Principal::new(ADMIN, hash_password("password"), Role::Admin),
            project_index: 1,
            stable_asset: STABLE.into(),
            probes: vec![ProbeTarget::new(
                "opensolar",
                "Opensolar",
                ping,
                ProbeCheck::status_ok(),
            )],
        }
    }

    pub fn aggregator(&self) -> beacon_engine::Aggregator {
        let http = http_client(&HttpSettings::default()).unwrap();
        beacon_engine::Aggregator::new(http, self.settings())
    }

    pub async fn mount_healthy(&self) {
        self.mount_ping(200).await;
        self.mount_token(RECIPIENT, USER_TOKEN).await;
        self.mount_token(ADMIN, ADMIN_TOKEN).await;
        self.mount_recipient().await;
        self.mount_project().await;
        self.mount_counts().await;
        self.mount_entities().await;
        self.mount_price("0.5").await;
        self.mount_account(PRIMARY, "100.0", &[(STABLE, "25.5"), (DEBT, "900"), (PAYBACK, "12")])
            .await;
        self.mount_account(SECONDARY, "50.0", &[(STABLE, "3")]).await;
        self.mount_account(ESCROW, "1.0", &[(STABLE, "4000")]).await;
    }

    pub async fn mount_ping(&self, code: i64) {
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Code": code })))
            .mount(&self.platform)
            .await;
    }

    pub async fn mount_token(&self, username: &str, token: &str) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains(format!("username={username}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Token": token })))
            .mount(&self.platform)
            .await;
    }

    pub async fn mount_token_rejected(&self, username: &str) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains(format!("username={username}")))
            .respond_with(ResponseTemplate::new(401))
            .mount(&self.platform)
            .await;
    }

    pub async fn mount_recipient(&self) {
        Mock::given(method("GET"))
            .and(path("/recipient/validate"))
            .and(query_param("username", RECIPIENT))
            .and(query_param("token", USER_TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "U": {
                    "Index": 7,
                    "Name": "Pasto School",
                    "Username": RECIPIENT,
                    "Email": "pasto@example.com",
                    "StellarWallet": { "PublicKey": PRIMARY },
                    "SecondaryWallet": { "PublicKey": SECONDARY }
                },
                "NextPaymentInterval": "2026-11-01",
                "TellerEnergy": 1234,
                "PastTellerEnergy": [10, 20, 30],
                "DeviceId": "hub-1",
                "DeviceStarts": ["0", "86400"],
                "DeviceLocation": "Pasto",
                "StateHashes": ["abc"]
            })))
            .mount(&self.platform)
            .await;
    }

    pub async fn mount_project(&self) {
        Mock::given(method("GET"))
            .and(path("/project/get"))
            .and(query_param("index", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Index": 1,
                "EscrowPubkey": ESCROW,
                "DebtAssetCode": DEBT,
                "PaybackAssetCode": PAYBACK,
                "InvestorAssetCode": "INV1",
                "InvestorIndices": [3],
                "Developer Indices": [4],
                "DateLastPaid": 0,
                "PaybackPeriod": 4,
                "BalLeft": 900.0,
                "Stage": 4
            })))
            .mount(&self.platform)
            .await;
    }

    pub async fn mount_counts(&self) {
        for (route, length) in [
            ("/admin/getallprojects", 2),
            ("/admin/getallusers", 11),
            ("/admin/getallinvestors", 5),
            ("/admin/getallrecipients", 3),
        ] {
            Mock::given(method("GET"))
                .and(path(route))
                .and(query_param("token", ADMIN_TOKEN))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Length": length })))
                .mount(&self.platform)
                .await;
        }
    }

    pub async fn mount_entities(&self) {
        for (route, index, name) in [
            ("/admin/getinvestor", "3", "Ivy Investor"),
            ("/admin/getentity", "4", "Dev Co"),
        ] {
            Mock::given(method("GET"))
                .and(path(route))
                .and(query_param("index", index))
                .and(query_param("token", ADMIN_TOKEN))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "U": { "Index": index.parse::<i64>().unwrap(), "Name": name, "Username": name.to_lowercase() }
                })))
                .mount(&self.platform)
                .await;
        }
    }

    pub async fn mount_price(&self, price: &str) {
        Mock::given(method("GET"))
            .and(path("/price"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "price": price })))
            .mount(&self.ticker)
            .await;
    }

    pub async fn mount_account(&self, key: &str, native: &str, issued: &[(&str, &str)]) {
        let mut balances = vec![json!({ "balance": native, "asset_type": "native" })];
        balances.extend(issued.iter().map(|(code, amount)| {
            json!({
                "balance": amount,
                "asset_type": "credit_alphanum12",
                "asset_code": code
            })
        }));
        Mock::given(method("GET"))
            .and(path(format!("/accounts/{key}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "balances": balances })))
            .mount(&self.ledger)
            .await;
    }
}
