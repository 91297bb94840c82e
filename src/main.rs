use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use nova_chat_server::cli::Cli;
use nova_chat_server::config::{AppConfig, LoggingConfig};
use nova_chat_server::security::jwt::TokenService;
use nova_chat_server::state::AppState;
use nova_chat_server::{middleware, routes, server};

/// Requests are small JSON documents; anything larger is noise.
const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Cadence of the revocation-set sweep.
const REVOCATION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    // Load .env in development so RUST_LOG and friends apply.
    dotenvy::dotenv().ok();

    let config = match AppConfig::load(&cli.config_path()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("nova-chat-server: {e}");
            std::process::exit(1);
        }
    };

    let _log_guards = init_tracing(&config.logging);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.threads)
        .enable_all()
        .build()
        .expect("Failed to build the async runtime");

    if let Err(e) = runtime.block_on(run(config)) {
        tracing::error!("fatal: {e}");
        eprintln!("nova-chat-server: {e}");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Connect to database
    let db = &config.database;
    let connect_options = PgConnectOptions::new()
        .host(&db.address)
        .port(db.port)
        .username(&db.username)
        .password(&db.password)
        .database(&db.db_name);

    let pool = PgPoolOptions::new()
        .max_connections(db.max_connections)
        .acquire_timeout(Duration::from_secs(db.connection_timeout))
        .connect_with(connect_options)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied successfully");

    let tokens = TokenService::new(
        &config.jwt.secret_key,
        config.jwt.access_token_expiry_minutes,
        config.jwt.refresh_token_expiry_days,
    )?;

    let tls_config = server::tls::server_config(
        &config.ssl.certificate_file,
        &config.ssl.private_key_file,
    )?;

    // Build application state
    let state = Arc::new(AppState::new(pool, config.clone(), tokens));

    // Periodically drop expired revocation entries.
    let sweeper_state = state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(REVOCATION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            sweeper_state.tokens.sweep();
        }
    });

    // Build router. ServiceBuilder runs outermost-first: the response-header
    // stamp, then the dispatch deadline, then body limit.
    let mut app = routes::router()
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(
                    middleware::security::response_headers,
                ))
                .layer(axum::middleware::from_fn(
                    middleware::security::dispatch_deadline,
                ))
                .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES)),
        )
        .with_state(state);

    if config.logging.log_access {
        app = app.layer(TraceLayer::new_for_http());
    }

    // Start server
    let addr = (config.server.address.as_str(), config.server.port);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        "Server listening on https://{}:{}",
        config.server.address,
        config.server.port
    );

    server::serve(listener, tls_config, app, shutdown_signal()).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Console and/or file subscribers per the logging configuration. The
/// returned guards keep the non-blocking writers flushing; hold them for
/// the life of the process.
fn init_tracing(logging: &LoggingConfig) -> Vec<WorkerGuard> {
    let mut guards = Vec::new();

    let level = logging.tracing_level();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "nova_chat_server={level},tower_http={level}"
        ))
    });

    let console_layer = logging
        .console_output
        .then(tracing_subscriber::fmt::layer);

    let access_layer = logging.access_log.as_ref().map(|path| {
        let (writer, guard) = tracing_appender::non_blocking(file_appender(path));
        guards.push(guard);
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
    });

    // Error sink only sees warnings and up.
    let error_layer = logging.error_log.as_ref().map(|path| {
        let (writer, guard) = tracing_appender::non_blocking(file_appender(path));
        guards.push(guard);
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(tracing_subscriber::filter::LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(access_layer)
        .with(error_layer)
        .init();

    guards
}

fn file_appender(path: &Path) -> tracing_appender::rolling::RollingFileAppender {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file = path
        .file_name()
        .map(|f| f.to_os_string())
        .unwrap_or_else(|| "server.log".into());
    tracing_appender::rolling::never(dir, file)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
