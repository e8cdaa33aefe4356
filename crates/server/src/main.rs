//! txtpages server binary.

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use txtpages_core::config::AppConfig;
use txtpages_core::{StockPages, generate_passphrase};
use txtpages_server::config::{CONFIG_ENV, DEFAULT_CONFIG_FILE, load_config};
use txtpages_server::{AppState, ExpirySweeper, create_router};
use txtpages_store::{PageRepo, PageStore, SEED_SLUG, SqliteStore};

/// txtpages - anonymous Markdown pages
#[derive(Parser, Debug)]
#[command(name = "txtpages")]
#[command(version, about, long_about = None, arg_required_else_help = true)]
struct Args {
    /// Create a new page store at DBFILE and exit
    #[arg(
        short = 'i',
        value_name = "DBFILE",
        conflicts_with_all = ["dbfile", "port"]
    )]
    init: Option<PathBuf>,

    /// Page store to serve
    #[arg(required_unless_present = "init")]
    dbfile: Option<PathBuf>,

    /// Port to listen on
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayVersion
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
            let _ = e.print();
            return code;
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "txtpages failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config_path =
        std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    let mut config =
        load_config(Path::new(&config_path)).context("failed to load configuration")?;

    if let Some(path) = args.init {
        config.store.path = path;
        config.validate().context("invalid configuration")?;
        return init_store(&config).await;
    }

    if let Some(path) = args.dbfile {
        config.store.path = path;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate().context("invalid configuration")?;

    serve(config).await
}

/// Create a fresh store holding the seed page and print its edit code.
async fn init_store(config: &AppConfig) -> Result<()> {
    let secret = generate_passphrase(config.secret.words);
    let store = SqliteStore::initialize(&config.store, &secret)
        .await
        .with_context(|| format!("failed to create {}", config.store.path.display()))?;
    store.close().await;

    tracing::info!(path = %config.store.path.display(), "Page store created");
    println!("Created {}", config.store.path.display());
    println!("Edit code for /{SEED_SLUG}: {secret}");
    Ok(())
}

async fn serve(config: AppConfig) -> Result<()> {
    tracing::info!("txtpages v{}", env!("CARGO_PKG_VERSION"));

    let stock = StockPages::load(&config.server.stock_dir).context("failed to load stock pages")?;
    tracing::info!(count = stock.len(), "Stock pages loaded");

    let store = txtpages_store::from_config(&config, stock.reserved_slugs())
        .await
        .with_context(|| format!("failed to open {}", config.store.path.display()))?;
    store
        .health_check()
        .await
        .context("page store health check failed")?;
    let pages = store.count_pages().await.context("failed to count pages")?;
    tracing::info!(path = %config.store.path.display(), pages, "Page store opened");

    txtpages_server::metrics::register_metrics();
    tracing::info!("Prometheus metrics registered");

    let shutdown = CancellationToken::new();
    let sweeper = if config.sweep.enabled {
        Some(ExpirySweeper::from_config(store.clone(), &config.sweep).spawn(shutdown.clone()))
    } else {
        tracing::info!("Expiry sweeper disabled");
        None
    };

    let addr = config.server.bind_addr();
    let state = AppState::new(config, store.clone(), stock);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    tracing::info!("Listening on {}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("server error");

    shutdown.cancel();
    if let Some(handle) = sweeper
        && let Err(e) = handle.await
    {
        tracing::error!(error = %e, "Expiry sweeper task failed");
    }
    tracing::info!("Server stopped");
    served
}

/// Resolve on Ctrl-C, SIGTERM or cancellation of `token`, then cancel `token`.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = token.cancelled() => {},
    }

    tracing::info!("Shutting down");
    token.cancel();
}
