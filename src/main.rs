// Main entry point for the events platform backend

use anyhow::Context;
use eventhub::api::{create_router, AppState};
use eventhub::config::Config;
use eventhub::store::schema::ensure_schema;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load and validate configuration first (before any logging)
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // 2. Initialize tracing subscriber with config values
    // Must be done only once - tracing panics if init() is called multiple times
    init_tracing(&config)?;

    info!("Starting events service");
    info!(
        bind_address = %config.bind_address,
        port = config.port,
        token_ttl_secs = config.token_ttl_secs,
        "Configuration loaded"
    );

    // 3. Pick the store: PostgreSQL when configured, memory otherwise
    let app_state = if let Some(ref database_url) = config.database_url {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(database_url)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to connect to database");
                e
            })
            .context("could not connect to the database")?;

        ensure_schema(&db_pool)
            .await
            .context("could not create database tables")?;
        info!(
            max_connections = config.database_max_connections,
            "Database pool initialized"
        );

        AppState::with_postgres(db_pool, config)
    } else {
        warn!("DATABASE_URL not set, using the in-memory store; data is lost on restart");
        AppState::with_memory_store(config)
    };

    let addr = format!(
        "{}:{}",
        app_state.config.bind_address, app_state.config.port
    );

    // 4. Create router
    let router = create_router(app_state);

    // 5. Start HTTP server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| {
            error!(error = %e, addr = %addr, "Failed to bind to address");
            e
        })
        .with_context(|| format!("could not bind {}", addr))?;

    info!(addr = %addr, "Server listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber based on configuration
///
/// `RUST_LOG` takes precedence over `LOG_LEVEL` when set.
fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let level = parse_log_level(&config.log_level)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let subscriber = fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_env_filter(filter);

    if config.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}

/// Parse log level string to tracing Level
fn parse_log_level(level: &str) -> anyhow::Result<tracing::Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" => Ok(tracing::Level::WARN),
        "error" => Ok(tracing::Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {}", level),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
        _ = ctrl_c => {
            info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            info!("SIGTERM received, starting graceful shutdown");
        },
    }
}
