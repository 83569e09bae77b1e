//! Aggregation handed to the template renderer.

use beacon_engine::{RenderError, RequestError, TemplateRenderer};

use crate::common::Deployment;

const PAGE: &str = "<h1>{{ title }}</h1>\n\
    <p>{{ status.opensolar.text }}</p>\n\
    <p>{{ counts.users.text }} users</p>\n\
    <p>{{ investor.name }}</p>\n\
    <p>{{ past_energy_values }}</p>\n";

fn renderer_with(page: &str) -> (tempfile::TempDir, TemplateRenderer) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), page).unwrap();
    let renderer = TemplateRenderer::new(dir.path());
    (dir, renderer)
}

#[tokio::test]
async fn healthy_page_renders_every_placeholder() {
    let deployment = Deployment::start().await;
    deployment.mount_healthy().await;
    let (_dir, renderer) = renderer_with(PAGE);

    let html = deployment
        .aggregator()
        .handle(&renderer, "index")
        .await
        .unwrap();

    assert!(html.contains("<h1>Test dashboard</h1>"));
    assert!(html.contains("Opensolar is Up"));
    assert!(html.contains("11 users"));
    assert!(html.contains("Ivy Investor"));
    assert!(html.contains("10, 20, 30"));
    assert!(!html.contains("{{"));
}

#[tokio::test]
async fn failed_fields_render_as_unavailable() {
    let deployment = Deployment::start().await;
    deployment.mount_token_rejected(crate::common::ADMIN).await;
    deployment.mount_healthy().await;
    let (_dir, renderer) = renderer_with(PAGE);

    let html = deployment
        .aggregator()
        .handle(&renderer, "index")
        .await
        .unwrap();

    assert!(html.contains("unavailable users"));
    assert!(html.contains("Opensolar is Up"));
}

#[tokio::test]
async fn missing_template_fails_the_request() {
    let deployment = Deployment::start().await;
    deployment.mount_healthy().await;
    let (_dir, renderer) = renderer_with(PAGE);

    let err = deployment
        .aggregator()
        .handle(&renderer, "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, RequestError::Render(RenderError::Read { .. })));

    let err = deployment
        .aggregator()
        .handle(&renderer, "../index")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RequestError::Render(RenderError::UnknownTemplate(_))
    ));
}

#[tokio::test]
async fn shipped_template_renders() {
    let deployment = Deployment::start().await;
    deployment.mount_healthy().await;
    let templates = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../templates");
    let renderer = TemplateRenderer::new(templates);

    let html = deployment
        .aggregator()
        .handle(&renderer, "index")
        .await
        .unwrap();

    assert!(html.contains("Test dashboard"));
    assert!(html.contains("Validated Recipient"));
    assert!(!html.contains("{{"));
}

#[tokio::test]
async fn negative_balance_renders_as_zero() {
    let deployment = Deployment::start().await;
    deployment
        .mount_account(crate::common::ESCROW, "1.0", &[(crate::common::STABLE, "-5")])
        .await;
    deployment.mount_healthy().await;
    let (_dir, renderer) = renderer_with("<p>{{ escrow_balance.text }}</p>");

    let html = deployment
        .aggregator()
        .handle(&renderer, "index")
        .await
        .unwrap();

    assert_eq!(html, "<p>0</p>");
}

#[tokio::test]
async fn failed_counts_leave_links_empty() {
    let deployment = Deployment::start().await;
    deployment.mount_token_rejected(crate::common::ADMIN).await;
    deployment.mount_healthy().await;
    let templates = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../templates");
    let renderer = TemplateRenderer::new(templates);

    let html = deployment
        .aggregator()
        .handle(&renderer, "index")
        .await
        .unwrap();

    assert!(!html.contains(r#"href="unavailable""#));
    assert!(html.contains(r#"Users: <a href="">unavailable</a>"#));
}
