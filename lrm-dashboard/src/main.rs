//! lrm-dashboard - licensing compliance dashboard
//!
//! Serves the dashboard over HTTP, or copies JSON holder documents into
//! SQLite with `migrate-json`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lrm_common::config::{self, StorageBackend, TomlConfig, ROOT_FOLDER_ENV};
use lrm_common::content::ContentLibrary;
use lrm_common::db::init_database;
use lrm_common::store::{JsonStore, LicenseStore, SqlStore};
use lrm_dashboard::{build_router, AppState};
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "lrm-dashboard", version, about = "Licensing compliance dashboard")]
struct Cli {
    /// Config file (default: per-user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data folder holding license holder documents and content
    #[arg(long, global = true, env = ROOT_FOLDER_ENV)]
    root_folder: Option<PathBuf>,

    /// Listen port (overrides config)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Listen address (overrides config)
    #[arg(long, global = true)]
    host: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the web dashboard (default)
    Serve,
    /// Copy JSON holder documents and company coverage into SQLite
    MigrateJson,
}

fn init_tracing(config: &TomlConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::load_config(cli.config.as_deref())?
        .resolve_root_folder(cli.root_folder.as_deref());
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(host) = cli.host.clone() {
        config.host = host;
    }

    init_tracing(&config);

    // Build identification first, before any storage work
    info!(
        "Starting lrm-dashboard v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Data folder: {}", config.data_dir().display());

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::MigrateJson => migrate_json(config).await,
    }
}

async fn open_store(config: &TomlConfig) -> Result<Arc<dyn LicenseStore>> {
    let store: Arc<dyn LicenseStore> = match config.storage {
        StorageBackend::Json => {
            let dir = config.data_dir();
            info!("Storage: JSON documents under {}", dir.display());
            Arc::new(JsonStore::new(dir))
        }
        StorageBackend::Sqlite => {
            let path = config.database_path();
            info!("Storage: SQLite database {}", path.display());
            let pool = init_database(&path)
                .await
                .with_context(|| format!("Failed to open database {}", path.display()))?;
            Arc::new(SqlStore::new(pool))
        }
    };
    Ok(store)
}

async fn serve(config: TomlConfig) -> Result<()> {
    let store = open_store(&config).await?;
    let content = ContentLibrary::new(config.data_dir());

    if config.auth.require_pin {
        info!("PIN login required");
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(store, content, config);
    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return Err(e.into());
        }
    };
    info!("lrm-dashboard listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Copy every JSON holder (the director document is not a holder) and the
/// company coverage document into the SQLite database
async fn migrate_json(config: TomlConfig) -> Result<()> {
    let source = JsonStore::new(config.data_dir());
    let db_path = config.database_path();
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let target = SqlStore::new(pool);

    info!(
        "Migrating JSON documents from {} into {}",
        source.data_dir().display(),
        db_path.display()
    );

    let holders = source.list_holders().await?;
    let mut migrated = 0usize;
    let mut licenses = 0usize;
    let mut costs = 0usize;
    for holder in &holders {
        match target.upsert_holder(holder).await {
            Ok(()) => {
                migrated += 1;
                licenses += holder.licenses.len();
                costs += holder
                    .licenses
                    .iter()
                    .map(|l| l.actual_costs.len())
                    .sum::<usize>();
                info!("Migrated {} ({} licenses)", holder.user_id, holder.licenses.len());
            }
            Err(e) => warn!("Skipped {}: {}", holder.user_id, e),
        }
    }

    match source.company_coverage().await? {
        Some(coverage) => {
            target.put_company_coverage(&coverage).await?;
            info!(
                "Migrated company coverage ({} covered, {} in progress, {} targets)",
                coverage.covered_states.len(),
                coverage.in_progress_states.len(),
                coverage.target_states.len()
            );
        }
        None => info!("No company coverage document to migrate"),
    }

    info!(
        "Migration complete: {}/{} holders, {} licenses, {} cost entries",
        migrated,
        holders.len(),
        licenses,
        costs
    );
    if migrated < holders.len() {
        warn!("{} holders were not migrated", holders.len() - migrated);
    }
    Ok(())
}
