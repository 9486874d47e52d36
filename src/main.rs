use anyhow::Context;
use ssaa_navigator::config::{AppConfig, StoreConfig};
use ssaa_navigator::http;
use ssaa_navigator::service::Navigator;
use ssaa_navigator::store::{RowStore, SheetsStore, SqliteStore};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(config.log_dir.as_deref())?;

    let store: Arc<dyn RowStore> = match &config.store {
        StoreConfig::Sqlite { db_path } => {
            tracing::info!(db_path = %db_path.display(), "using local sqlite workbook");
            Arc::new(SqliteStore::new(db_path)?)
        }
        StoreConfig::Sheets {
            spreadsheet_id,
            token,
        } => {
            tracing::info!(spreadsheet_id, "using remote spreadsheet store");
            Arc::new(SheetsStore::new(spreadsheet_id.clone(), token.clone()))
        }
    };

    let navigator = Arc::new(Navigator::new(store, config.quadrant_threshold));
    let app = http::router(navigator);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!(bind = %config.bind, "ssaa-navigator listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(log_dir: Option<&Path>) -> anyhow::Result<()> {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "navigator.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let _ = LOG_GUARD.set(guard);
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .json()
                .with_writer(non_blocking)
                .try_init()
                .map_err(|error| anyhow::anyhow!("{error}"))
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .try_init()
            .map_err(|error| anyhow::anyhow!("{error}")),
    }
}
