//! HTTP server: GraphQL endpoint, REST routes and health check.

use std::future::Future;

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
};
use tracing::{debug, info};

use folio_core::services::ListingService;

use crate::rest;
use crate::schema::build_schema;
use crate::types::{FolioSchema, Viewer};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_playground: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            enable_playground: true,
        }
    }
}

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: ListingService,
    pub schema: FolioSchema,
}

impl AppState {
    pub fn new(service: ListingService) -> Self {
        Self {
            schema: build_schema(service.clone()),
            service,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState, enable_playground: bool) -> Router {
    let graphql = if enable_playground {
        get(graphql_playground).post(graphql_handler)
    } else {
        axum::routing::post(graphql_handler)
    };

    Router::new()
        .route("/graphql", graphql)
        .route("/api/articles", get(rest::list_articles))
        .route("/api/articles/feed", get(rest::feed))
        .route("/api/articles/{slug}", get(rest::get_article))
        .route("/api/articles/{slug}/comments", get(rest::list_comments))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Start the server with graceful shutdown support.
pub async fn serve_with_shutdown<F>(
    state: AppState,
    config: ServerConfig,
    shutdown_signal: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state, config.enable_playground);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("⚡ API listening on http://{}", addr);
    debug!(playground = config.enable_playground, "Routes mounted");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}

/// GraphQL query handler. The viewer header is attached as request data.
async fn graphql_handler(
    State(state): State<AppState>,
    viewer: Viewer,
    req: GraphQLRequest,
) -> GraphQLResponse {
    state
        .schema
        .execute(req.into_inner().data(viewer))
        .await
        .into()
}

/// GraphQL Playground UI.
async fn graphql_playground() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

/// Health check endpoint. Answers 503 while the store is unreachable.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.service.is_healthy().await {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE")
    }
}
