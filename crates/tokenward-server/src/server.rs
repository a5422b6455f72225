use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Router, middleware, routing::get};
use tokenward_auth::{
    AuthState, InMemoryAccountStore, InMemoryRevocationStore, TokenService,
    attach_request_identity, http::routes as auth_routes,
};
use tokio::task::JoinHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::AppConfig,
    handlers,
    middleware::{self as app_middleware, RequestId},
};

pub struct TokenwardServer {
    addr: SocketAddr,
    app: Router,
    token_service: Arc<TokenService>,
    cleanup_interval: Duration,
}

/// Builds the auth state from configuration, with in-memory stores.
pub fn build_auth_state(cfg: &AppConfig) -> anyhow::Result<AuthState> {
    let revocations = Arc::new(InMemoryRevocationStore::new());
    let token_service = TokenService::from_config(&cfg.auth, revocations)
        .map_err(|e| anyhow::anyhow!("auth config error: {e}"))?;
    let accounts = Arc::new(InMemoryAccountStore::new());
    Ok(AuthState::new(Arc::new(token_service), accounts))
}

pub fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = build_auth_state(cfg)?;
    Ok(router(cfg, state))
}

pub fn router(cfg: &AppConfig, state: AuthState) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .merge(auth_routes())
        // Middleware stack, innermost first: identity -> body limit -> trace/compression/cors -> request id
        .layer(middleware::from_fn_with_state(
            state.clone(),
            attach_request_identity,
        ))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<RequestId>()
                        .and_then(|v| v.0.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri().path(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(app_middleware::request_id))
        .with_state(state)
}

/// Periodically prunes revocation entries of expired tokens.
pub fn spawn_revocation_cleanup(
    token_service: Arc<TokenService>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match token_service.cleanup_revocations().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "Pruned expired revocation entries"),
                Err(e) => tracing::warn!(error = %e, "Revocation cleanup failed"),
            }
        }
    })
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> anyhow::Result<TokenwardServer> {
        let state = build_auth_state(&self.config)?;
        let token_service = state.token_service.clone();
        let app = router(&self.config, state);

        Ok(TokenwardServer {
            addr: self.addr,
            app,
            token_service,
            cleanup_interval: self.config.auth.revocation.cleanup_interval,
        })
    }
}

impl TokenwardServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);

        let cleanup = spawn_revocation_cleanup(self.token_service, self.cleanup_interval);
        let result = axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await;
        cleanup.abort();

        result?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
