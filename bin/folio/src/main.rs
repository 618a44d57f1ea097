//! Folio - cursor-paginated article and comment API.
//!
//! # Usage
//!
//! ```bash
//! # Start against PostgreSQL
//! DATABASE_URL=postgres://localhost/folio folio
//!
//! # Start with demo data held in memory
//! folio --in-memory
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tracing::{Instrument, debug, error, info, info_span, warn};
use tracing_subscriber::{EnvFilter, fmt};

use folio_api::{AppState, ServerConfig, serve_with_shutdown};
use folio_core::metrics::init_metrics;
use folio_core::pagination::{DEFAULT_LIMIT, MAX_LIMIT};
use folio_core::ports::Repositories;
use folio_core::services::ListingService;
use folio_storage::{Database, DatabaseConfig, MemoryRepositories, PgRepositories};

/// Folio CLI - paginated article API.
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Folio - cursor-paginated article and comment API")]
#[command(version)]
struct Cli {
    /// PostgreSQL database URL.
    #[arg(long, env = "DATABASE_URL", default_value = "postgres://localhost/folio")]
    database_url: String,

    /// Interface the API binds to.
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    api_host: String,

    /// API server port (GraphQL and REST).
    #[arg(long, env = "API_PORT", default_value = "4000")]
    api_port: u16,

    /// Prometheus metrics port.
    #[arg(long, env = "METRICS_PORT", default_value = "9090")]
    metrics_port: u16,

    /// Serve the GraphiQL playground on `GET /graphql`.
    #[arg(long, env = "PLAYGROUND", default_value_t = true, action = clap::ArgAction::Set)]
    playground: bool,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Run database migrations and exit.
    #[arg(long)]
    migrate_only: bool,

    /// Serve a built-in demo data set instead of connecting to PostgreSQL.
    #[arg(long, conflicts_with = "migrate_only")]
    in_memory: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    // Prometheus metrics exporter (optional - failures don't crash the app)
    let metrics_enabled = match format!("0.0.0.0:{}", cli.metrics_port).parse::<std::net::SocketAddr>() {
        Ok(metrics_addr) => {
            match PrometheusBuilder::new()
                .with_http_listener(metrics_addr)
                .install()
            {
                Ok(()) => {
                    init_metrics();
                    true
                }
                Err(e) => {
                    warn!("⚠️  Failed to start metrics exporter: {}. Continuing without metrics.", e);
                    false
                }
            }
        }
        Err(e) => {
            warn!("⚠️  Invalid metrics address: {}. Continuing without metrics.", e);
            false
        }
    };

    // ─────────────────────────────────────────────────────────────────────────
    // 🚀 STARTUP
    // ─────────────────────────────────────────────────────────────────────────
    info!("🚀 Starting Folio");
    debug!(default = DEFAULT_LIMIT, max = MAX_LIMIT, "Page size limits");

    // ─────────────────────────────────────────────────────────────────────────
    // 🗄️ STORAGE
    // ─────────────────────────────────────────────────────────────────────────
    let (repositories, db): (Arc<dyn Repositories>, Option<Database>) = if cli.in_memory {
        info!("🧪 Using in-memory demo data");
        let repositories: Arc<dyn Repositories> = Arc::new(MemoryRepositories::demo());
        (repositories, None)
    } else {
        debug!(database_url = %mask_password(&cli.database_url), "Database endpoint");

        let db_config = if cli.migrate_only {
            DatabaseConfig::for_maintenance(&cli.database_url)
        } else {
            DatabaseConfig::for_api(&cli.database_url)
        };

        info!("🗄️  Connecting to database...");
        let db = Database::connect(&db_config)
            .await
            .context("Failed to connect to database")?;

        db.migrate().await.context("Failed to run migrations")?;
        info!("🗄️  Database ready (migrations applied)");

        if cli.migrate_only {
            info!("🛑 --migrate-only flag set, exiting");
            db.close().await;
            return Ok(());
        }

        let repositories: Arc<dyn Repositories> = Arc::new(PgRepositories::new(&db));
        (repositories, Some(db))
    };

    // ─────────────────────────────────────────────────────────────────────────
    // ⚡ SERVER START
    // ─────────────────────────────────────────────────────────────────────────
    let state = AppState::new(ListingService::new(repositories));
    let server_config = ServerConfig {
        host: cli.api_host.clone(),
        port: cli.api_port,
        enable_playground: cli.playground,
    };

    let server_handle = tokio::spawn(
        async move {
            if let Err(e) = serve_with_shutdown(state, server_config, shutdown_signal()).await {
                error!(error = %e, "❌ Server error");
            }
            debug!("Server stopped");
        }
        .instrument(info_span!("api")),
    );

    // ─────────────────────────────────────────────────────────────────────────
    // ✅ READY
    // ─────────────────────────────────────────────────────────────────────────
    info!("✅ Folio ready");
    info!("   ⚡ GraphQL:  http://localhost:{}/graphql", cli.api_port);
    info!("   📚 REST:     http://localhost:{}/api/articles", cli.api_port);
    if metrics_enabled {
        info!(
            "   📊 Metrics:  http://localhost:{}/metrics",
            cli.metrics_port
        );
    } else {
        info!("   📊 Metrics:  disabled");
    }
    info!("   Press Ctrl+C to stop");

    // The server task drains in-flight requests once the signal fires.
    if let Err(e) = server_handle.await {
        error!(error = %e, "❌ Server task failed");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 🛑 SHUTDOWN
    // ─────────────────────────────────────────────────────────────────────────
    if let Some(db) = db {
        db.close().await;
    }

    info!("🛑 Shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// Mask password in database URL for logging.
fn mask_password(url_str: &str) -> String {
    match url::Url::parse(url_str) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => url_str.to_string(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("🛑 Shutting down...");
}
