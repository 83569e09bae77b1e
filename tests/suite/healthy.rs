//! Every upstream answers.

use chrono::{DateTime, Utc};

use crate::common::{Deployment, ESCROW, PRIMARY, SECONDARY, STABLE};

#[tokio::test]
async fn full_snapshot_from_healthy_upstreams() {
    let deployment = Deployment::start().await;
    deployment.mount_healthy().await;

    let snapshot = deployment.aggregator().snapshot().await.unwrap();

    assert!(!snapshot.is_degraded(), "failures: {:?}", snapshot.failures);
    assert_eq!(snapshot.title, "Test dashboard");

    let probe = snapshot.probe("opensolar").unwrap();
    assert!(probe.reachable);
    assert_eq!(probe.text, "Opensolar is Up");

    assert_eq!(snapshot.validate.text, "Validated Recipient");
    assert_eq!(snapshot.recipient.name, "Pasto School");
    assert_eq!(
        snapshot.next_interval.text,
        "Next Payment Interval: 2026-11-01"
    );
    assert_eq!(
        snapshot.date_last_start.text,
        "Last Boot Time: 1970-01-02 00:00:00 UTC"
    );
    assert_eq!(
        snapshot.date_last_paid.text,
        "Date Last Paid: First Payment not yet made"
    );
    assert_eq!(snapshot.device_id.text, "hub-1");
    assert_eq!(snapshot.past_energy_values, vec![10, 20, 30]);
    assert_eq!(snapshot.project.stage, 4);

    assert_eq!(snapshot.counts.projects.text, "2");
    assert_eq!(snapshot.counts.users.text, "11");
    assert_eq!(snapshot.counts.investors.text, "5");
    assert_eq!(snapshot.counts.recipients.text, "3");

    assert_eq!(snapshot.investor.name, "Ivy Investor");
    assert_eq!(snapshot.developer.name, "Dev Co");
}

#[tokio::test]
async fn balances_are_converted_and_linked() {
    let deployment = Deployment::start().await;
    deployment.mount_healthy().await;

    let snapshot = deployment.aggregator().snapshot().await.unwrap();

    assert_eq!(snapshot.primary_account.text, "XLM: 50 STABLEUSD: 25.5");
    assert_eq!(
        snapshot.primary_account.link,
        format!("https://explorer.test/account/{PRIMARY}")
    );
    assert_eq!(snapshot.secondary_account.text, "XLM: 25 STABLEUSD: 3");
    assert_eq!(
        snapshot.secondary_account.link,
        format!("https://explorer.test/account/{SECONDARY}")
    );

    assert_eq!(snapshot.debt_balance.text, "900");
    assert_eq!(snapshot.payback_balance.text, "12");
    assert_eq!(snapshot.escrow_balance.text, "4000");
    assert_eq!(
        snapshot.escrow_balance.link,
        format!("https://explorer.test/account/{ESCROW}")
    );

    let native = snapshot.balance(PRIMARY, "XLM").unwrap();
    assert!((native.amount() - 50.0).abs() < f64::EPSILON);
    assert_eq!(snapshot.balances.len(), 7);
    assert!(snapshot.balance(ESCROW, STABLE).is_some());
}

#[tokio::test]
async fn tokens_never_reach_the_snapshot() {
    let deployment = Deployment::start().await;
    deployment.mount_healthy().await;

    let snapshot = deployment.aggregator().snapshot().await.unwrap();
    let json = serde_json::to_string(&snapshot).unwrap();

    assert!(!json.contains(crate::common::USER_TOKEN));
    assert!(!json.contains(crate::common::ADMIN_TOKEN));
    assert!(snapshot.counts.users.link.contains("username=admin"));
}

#[tokio::test]
async fn same_instant_same_snapshot() {
    let deployment = Deployment::start().await;
    deployment.mount_healthy().await;
    let aggregator = deployment.aggregator();
    let now: DateTime<Utc> = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

    let first = aggregator.snapshot_at(now).await.unwrap();
    let second = aggregator.snapshot_at(now).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.generated_at, "2023-11-14 22:13:20 UTC");
    assert_eq!(
        first.teller_energy.text,
        "Energy generated till 2023-11-14 22:13:20 UTC is: 1234 Wh"
    );
}

#[tokio::test]
async fn four_federated_services_all_up() {
    use beacon_engine::{Aggregator, ProbeCheck, ProbeTarget};
    use beacon_upstream::{HttpSettings, http_client};
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let deployment = Deployment::start().await;
    deployment.mount_healthy().await;
    let ok = || ResponseTemplate::new(200).set_body_string(r#"{"Code": 200}"#);
    for server in [&deployment.ledger, &deployment.ticker] {
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ok())
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<!doctype html><html></html>"))
        .mount(&deployment.platform)
        .await;

    let ping = |server: &MockServer| Url::parse(&format!("{}/ping", server.uri())).unwrap();
    let website = Url::parse(&deployment.platform.uri()).unwrap();
    let mut settings = deployment.settings();
    settings.probes = vec![
        ProbeTarget::new("opensolar", "Opensolar", ping(&deployment.platform), ProbeCheck::status_ok()),
        ProbeTarget::new("openx", "Openx", ping(&deployment.ledger), ProbeCheck::status_ok()),
        ProbeTarget::new("builds", "Builds", ping(&deployment.ticker), ProbeCheck::status_ok()),
        ProbeTarget::new(
            "website",
            "Website",
            website,
            ProbeCheck::BodyContains {
                marker: "doctype html".into(),
            },
        ),
    ];
    let aggregator = Aggregator::new(http_client(&HttpSettings::default()).unwrap(), settings);

    let snapshot = aggregator.snapshot().await.unwrap();

    let expected = [
        ("opensolar", "Opensolar", format!("{}/ping", deployment.platform.uri())),
        ("openx", "Openx", format!("{}/ping", deployment.ledger.uri())),
        ("builds", "Builds", format!("{}/ping", deployment.ticker.uri())),
        ("website", "Website", deployment.platform.uri()),
    ];
    assert_eq!(snapshot.status.len(), 4);
    for (name, label, link) in expected {
        let probe = snapshot.probe(name).unwrap();
        assert!(probe.reachable, "{name}");
        assert_eq!(probe.text, format!("{label} is Up"));
        assert_eq!(probe.link, link);
    }
}
