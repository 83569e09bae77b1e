//! HTTP(S) front end for the render sink.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use axum_server::tls_rustls::RustlsConfig;
use beacon_config::ServerSettings;
use beacon_engine::{Aggregator, RequestError, TemplateRenderer};
use tower_http::services::ServeDir;

/// Shared, read-only state. Each request builds its own snapshot.
#[derive(Clone)]
pub(crate) struct AppState {
    aggregator: Arc<Aggregator>,
    renderer: Arc<TemplateRenderer>,
    template: Arc<str>,
}

impl AppState {
    pub(crate) fn new(aggregator: Aggregator, server: &ServerSettings) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            renderer: Arc::new(TemplateRenderer::new(&server.template_dir)),
            template: Arc::from(server.template.as_str()),
        }
    }
}

pub(crate) fn router(state: AppState, server: &ServerSettings) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/snapshot", get(snapshot))
        .nest_service("/static", ServeDir::new(&server.static_dir))
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Response {
    match state
        .aggregator
        .handle(state.renderer.as_ref(), &state.template)
        .await
    {
        Ok(page) => Html(page).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn snapshot(State(state): State<AppState>) -> Response {
    match state.aggregator.snapshot().await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(error: &RequestError) -> Response {
    let status = match error {
        RequestError::NoSession => StatusCode::BAD_GATEWAY,
        RequestError::Render(_) | RequestError::Stage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::error!(error = %error, "Request failed");
    (status, error.to_string()).into_response()
}

pub(crate) async fn serve(app: Router, server: &ServerSettings) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], server.port));

    if server.insecure {
        tracing::warn!(%addr, "Starting server in insecure mode (plain HTTP)");
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        axum::serve(listener, app).await.context("server error")?;
        return Ok(());
    }

    let tls = RustlsConfig::from_pem_file(&server.cert_path, &server.key_path)
        .await
        .with_context(|| {
            format!(
                "failed to load TLS material from {} and {}",
                server.cert_path.display(),
                server.key_path.display()
            )
        })?;
    tracing::info!(%addr, "Starting server");
    axum_server::bind_rustls(addr, tls)
        .serve(app.into_make_service())
        .await
        .context("server error")?;
    Ok(())
}
