//! GraphFS server: a transactional, graph-backed file store served over
//! WebDAV.
//!
//! Main entry point that wires all crates together and starts the server.

use std::io::BufRead;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use graphfs_auth::{PasswordHasher, UserDirectory};
use graphfs_core::config::AppConfig;
use graphfs_core::error::AppError;
use graphfs_graph::TransactionManager;
use graphfs_vfs::Vfs;
use graphfs_webdav::{DavHandler, WebDavServer};

/// GraphFS: graph-backed file store
#[derive(Debug, Parser)]
#[command(name = "graphfs-server", version, about, long_about = None)]
struct Cli {
    /// Path to a configuration file; defaults to config/default.toml plus
    /// the overlay named by GRAPHFS_ENV
    #[arg(short, long)]
    config: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
enum Commands {
    /// Recover the graph and serve WebDAV (default)
    Serve,
    /// Print an Argon2 hash for a directory entry's password_hash
    HashPassword {
        /// Password to hash; read from stdin when omitted
        password: Option<String>,
    },
    /// Write a fresh checkpoint; the transaction log is only read
    Checkpoint,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(Commands::HashPassword { password }) = &cli.command {
        if let Err(e) = hash_password(password.clone()) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let config = match load_configuration(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    let result = match cli.command {
        Some(Commands::Checkpoint) => checkpoint(config).await,
        _ => run(config).await,
    };
    if let Err(e) = result {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration(path: Option<&str>) -> Result<AppConfig, AppError> {
    match path {
        Some(path) => AppConfig::from_file(path),
        None => {
            let env = std::env::var("GRAPHFS_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)
        }
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

fn hash_password(password: Option<String>) -> Result<(), AppError> {
    let password = match password {
        Some(p) => p,
        None => {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .map_err(|e| AppError::validation(format!("Failed to read password: {e}")))?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if password.is_empty() {
        return Err(AppError::validation("Password must not be empty"));
    }
    println!("{}", PasswordHasher::new().hash_password(&password)?);
    Ok(())
}

/// Recover the graph and bring the directory's principals up to date.
async fn open_graph(config: &AppConfig) -> Result<(Arc<TransactionManager>, UserDirectory), AppError> {
    tracing::info!(
        "Opening graph (dataset: '{}', log: '{}')...",
        config.graph.dataset_path,
        config.graph.transaction_log_path
    );
    let manager = TransactionManager::open(&config.graph).await?;
    tracing::info!("Graph recovered at sequence {}", manager.last_seq());

    let directory = UserDirectory::from_config(&config.directory)?;
    let changed = directory.sync_into(&manager).await?;
    tracing::info!(
        "User directory synced ({} users, {} changes)",
        directory.user_count(),
        changed
    );

    Ok((Arc::new(manager), directory))
}

/// Checkpoint from the files on disk. The log is only read, so this is
/// safe next to a running server; the directory is not synced here because
/// those writes would bypass the log.
async fn checkpoint(config: AppConfig) -> Result<(), AppError> {
    let seq = TransactionManager::checkpoint_offline(&config.graph).await?;
    tracing::info!("Checkpoint written at sequence {}", seq);
    Ok(())
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting GraphFS v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Graph recovery + principal sync ──────────────────
    let (manager, directory) = open_graph(&config).await?;

    // ── Step 2: Blob store ───────────────────────────────────────
    tracing::info!("Initializing blob store at '{}'...", config.blobs.path);
    let blobs = graphfs_storage::from_config(&config.blobs).await?;
    if !blobs.health_check().await? {
        return Err(AppError::storage("Blob store failed its health check"));
    }
    tracing::info!("Blob store initialized ({})", blobs.store_type());

    // ── Step 3: WebDAV server ────────────────────────────────────
    let handler = DavHandler::new(
        Arc::clone(&manager),
        Vfs::from_config(&config.graph),
        blobs,
        Arc::new(directory),
        &config.server,
    );
    let server = WebDavServer::new(config.server.clone(), handler);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut server_handle = tokio::spawn(async move { server.start(shutdown_rx).await });

    // ── Step 4: Graceful shutdown ────────────────────────────────
    let joined = tokio::select! {
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            let _ = shutdown_tx.send(true);
            server_handle.await
        }
        joined = &mut server_handle => joined,
    };
    joined.map_err(|e| AppError::internal(format!("Server task failed: {e}")))??;

    tracing::info!("GraphFS server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
}
