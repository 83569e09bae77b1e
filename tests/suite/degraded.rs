//! Partial upstream failure.

use beacon_engine::RequestError;
use beacon_types::{FailureKind, LinkField, PersonSummary};

use crate::common::{ADMIN, Deployment, ESCROW, RECIPIENT, STABLE, USER_TOKEN};

#[tokio::test]
async fn admin_login_failure_only_blanks_admin_fields() {
    let deployment = Deployment::start().await;
    deployment.mount_token_rejected(ADMIN).await;
    deployment.mount_healthy().await;

    let snapshot = deployment.aggregator().snapshot().await.unwrap();

    assert_eq!(
        snapshot.failure("session.admin").map(|f| f.kind),
        Some(FailureKind::Auth)
    );
    for field in [
        "counts.projects",
        "counts.users",
        "counts.investors",
        "counts.recipients",
        "investor",
        "developer",
    ] {
        assert_eq!(
            snapshot.failure(field).map(|f| f.kind),
            Some(FailureKind::DependencyUnresolved),
            "{field}"
        );
    }
    assert_eq!(snapshot.counts.users, LinkField::default());
    assert_eq!(snapshot.investor, PersonSummary::default());

    assert_eq!(snapshot.validate.text, "Validated Recipient");
    assert_eq!(snapshot.escrow_balance.text, "4000");
    assert!(snapshot.failure("session.user").is_none());
}

#[tokio::test]
async fn user_login_failure_keeps_admin_side() {
    let deployment = Deployment::start().await;
    deployment.mount_token_rejected(RECIPIENT).await;
    deployment.mount_healthy().await;

    let snapshot = deployment.aggregator().snapshot().await.unwrap();

    assert!(snapshot.failure("validate").is_some());
    assert!(snapshot.validate.is_empty());
    assert!(snapshot.primary_account.is_empty());
    assert_eq!(snapshot.counts.users.text, "11");
    // The project lookup needs no token, so its escrow still resolves.
    assert_eq!(snapshot.escrow_balance.text, "4000");
}

#[tokio::test]
async fn no_session_when_both_logins_fail() {
    let deployment = Deployment::start().await;
    deployment.mount_token_rejected(RECIPIENT).await;
    deployment.mount_token_rejected(ADMIN).await;
    deployment.mount_ping(200).await;

    let err = deployment.aggregator().snapshot().await.unwrap_err();
    assert!(matches!(err, RequestError::NoSession));
}

#[tokio::test]
async fn negative_balance_reads_as_zero() {
    let deployment = Deployment::start().await;
    deployment.mount_account(ESCROW, "1.0", &[(STABLE, "-5")]).await;
    deployment.mount_healthy().await;

    let snapshot = deployment.aggregator().snapshot().await.unwrap();

    assert_eq!(snapshot.escrow_balance.text, "0");
    let escrow = snapshot.balance(ESCROW, STABLE).unwrap();
    assert!(escrow.amount().abs() < f64::EPSILON);
}

#[tokio::test]
async fn missing_price_marks_native_part_unavailable() {
    let deployment = Deployment::start().await;
    deployment.mount_price("not a number").await;
    deployment.mount_healthy().await;

    let snapshot = deployment.aggregator().snapshot().await.unwrap();

    assert_eq!(
        snapshot.failure("xlm_usd").map(|f| f.kind),
        Some(FailureKind::Decode)
    );
    assert_eq!(
        snapshot.failure("balances.primary.native").map(|f| f.kind),
        Some(FailureKind::DependencyUnresolved)
    );
    assert_eq!(
        snapshot.primary_account.text,
        "XLM: unavailable STABLEUSD: 25.5"
    );
}

#[tokio::test]
async fn probe_down_does_not_affect_token_path() {
    let deployment = Deployment::start().await;
    deployment.mount_ping(500).await;
    deployment.mount_healthy().await;

    let snapshot = deployment.aggregator().snapshot().await.unwrap();

    let probe = snapshot.probe("opensolar").unwrap();
    assert!(!probe.reachable);
    assert_eq!(probe.text, "Opensolar is Down");
    assert_eq!(snapshot.validate.text, "Validated Recipient");
}

#[tokio::test]
async fn dead_backends_still_yield_complete_snapshot() {
    let deployment = Deployment::start().await;
    // Only the login succeeds; the ledger and ticker have nothing mounted.
    deployment.mount_token(RECIPIENT, USER_TOKEN).await;

    let snapshot = deployment.aggregator().snapshot().await.unwrap();

    assert!(snapshot.is_degraded());
    assert!(!snapshot.probe("opensolar").unwrap().reachable);
    for field in ["validate", "project", "xlm_usd", "escrow_balance", "investor"] {
        assert!(snapshot.failure(field).is_some(), "{field}");
    }

    let json = serde_json::to_value(&snapshot).unwrap();
    for key in [
        "validate",
        "next_interval",
        "teller_energy",
        "date_last_paid",
        "primary_account",
        "escrow_balance",
        "counts",
        "investor",
        "developer",
        "balances",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert!(snapshot.balances.is_empty());
    assert!(!snapshot.generated_at.is_empty());
}
