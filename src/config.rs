//! Environment-driven configuration. Everything is read once at startup; a
//! missing or unusable value fails the boot instead of limping along.

use crate::errors::{AppError, AppResult};
use crate::score::DEFAULT_QUADRANT_THRESHOLD;
use std::env;
use std::path::PathBuf;

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_DB_PATH: &str = "ssaa.db";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: String,
    pub store: StoreConfig,
    pub log_dir: Option<PathBuf>,
    pub quadrant_threshold: f64,
}

#[derive(Debug, Clone)]
pub enum StoreConfig {
    Sqlite { db_path: PathBuf },
    Sheets { spreadsheet_id: String, token: String },
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let bind = get("SSAA_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());

        let store_kind = get("SSAA_STORE").unwrap_or_else(|| "sqlite".to_string());
        let store = match store_kind.trim() {
            "sqlite" => StoreConfig::Sqlite {
                db_path: PathBuf::from(
                    get("SSAA_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
                ),
            },
            "sheets" => StoreConfig::Sheets {
                spreadsheet_id: require(&get, "SSAA_SHEET_ID")?,
                token: sanitize_secret(&require(&get, "SSAA_SHEETS_TOKEN")?),
            },
            other => {
                return Err(AppError::ConfigurationMissing(format!(
                    "SSAA_STORE must be \"sqlite\" or \"sheets\", got {other:?}"
                )))
            }
        };

        let quadrant_threshold = match get("SSAA_QUADRANT_THRESHOLD") {
            Some(raw) => raw.trim().parse::<f64>().map_err(|_| {
                AppError::ConfigurationMissing(format!(
                    "SSAA_QUADRANT_THRESHOLD must be a number, got {raw:?}"
                ))
            })?,
            None => DEFAULT_QUADRANT_THRESHOLD,
        };

        Ok(Self {
            bind,
            store,
            log_dir: get("SSAA_LOG_DIR").map(PathBuf::from),
            quadrant_threshold,
        })
    }
}

fn require(get: &impl Fn(&str) -> Option<String>, key: &str) -> AppResult<String> {
    get(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::ConfigurationMissing(key.to_string()))
}

/// Deployment platforms mangle pasted secrets: literal `\n` sequences instead
/// of newlines and stray quotes around the value. Undo both before use.
pub fn sanitize_secret(raw: &str) -> String {
    raw.replace("\\n", "\n").replace('"', "").trim().to_string()
}
