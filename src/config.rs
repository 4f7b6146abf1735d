//! Configuration, read from the environment at startup.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Top-level service configuration.
pub struct Config {
    /// Token the platform echoes back during webhook subscription.
    pub verify_token: SecretString,
    /// Page access token for the Graph send API.
    pub page_access_token: SecretString,
    /// Lead sink (spreadsheet) settings.
    pub sheets: SheetsConfig,
    /// Path of the local conversation database.
    pub db_path: PathBuf,
    /// HTTP listen port.
    pub port: u16,
}

/// Google Sheets sink settings.
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub tab: String,
    pub access_token: SecretString,
}

impl Config {
    /// Read the full configuration from environment variables.
    ///
    /// Required: `VERIFY_TOKEN`, `PAGE_ACCESS_TOKEN`, `SHEETS_SPREADSHEET_ID`,
    /// `SHEETS_ACCESS_TOKEN`. Everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let verify_token = SecretString::from(require("VERIFY_TOKEN")?);
        let page_access_token = SecretString::from(require("PAGE_ACCESS_TOKEN")?);

        let sheets = SheetsConfig {
            spreadsheet_id: require("SHEETS_SPREADSHEET_ID")?,
            tab: std::env::var("SHEETS_TAB").unwrap_or_else(|_| "leads".to_string()),
            access_token: SecretString::from(require("SHEETS_ACCESS_TOKEN")?),
        };

        let db_path = std::env::var("LEADFLOW_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/leadflow.db"));

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        Ok(Self {
            verify_token,
            page_access_token,
            sheets,
            db_path,
            port,
        })
    }
}

fn require(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}
