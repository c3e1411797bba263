// Runtime configuration, read from the environment (after `.env` is loaded).
//
// Credentials are not handled here: `ServiceAccountAuth::from_env` reads
// its own variables so the key material never sits in this struct.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::core::export::{ExportSettings, RetryPolicy};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Error)]
#[error("invalid value for {var}: {value:?}")]
pub struct ConfigError {
    var: &'static str,
    value: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub export: ExportSettings,
    /// Drive folder that receives generated documents.
    pub drive_folder_id: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = ExportSettings::default();

        let bind_addr = parse(
            "PORTARIA_BIND_ADDR",
            lookup("PORTARIA_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        )?;

        let attempts: u32 = match lookup("SHEETS_FETCH_ATTEMPTS") {
            Some(value) => parse("SHEETS_FETCH_ATTEMPTS", value)?,
            None => defaults.retry.attempts,
        };
        let backoff = match lookup("SHEETS_RETRY_BACKOFF_MS") {
            Some(value) => Duration::from_millis(parse("SHEETS_RETRY_BACKOFF_MS", value)?),
            None => defaults.retry.backoff,
        };

        Ok(Self {
            bind_addr,
            export: ExportSettings {
                title: lookup("PORTARIA_TITLE").unwrap_or(defaults.title),
                body: lookup("PORTARIA_BODY").unwrap_or(defaults.body),
                document_prefix: lookup("PORTARIA_DOCUMENT_PREFIX")
                    .unwrap_or(defaults.document_prefix),
                retry: RetryPolicy {
                    attempts: attempts.max(1),
                    backoff,
                },
            },
            drive_folder_id: lookup("DRIVE_FOLDER_ID").filter(|id| !id.trim().is_empty()),
        })
    }
}

fn parse<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError { var, value })
}
