use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::AppError;

pub const DEFAULT_LOCAL_DB: &str = "sqlite://igazolas-local.db";
pub const DEFAULT_SYNC_DELAY_MS: u64 = 1500;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub local_db_url: String,
    pub auto_sync: bool,
    pub sync_delay: Duration,
    pub require_registration: bool,
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_token: None,
            local_db_url: DEFAULT_LOCAL_DB.to_string(),
            auto_sync: true,
            sync_delay: Duration::from_millis(DEFAULT_SYNC_DELAY_MS),
            require_registration: true,
            request_timeout: None,
        }
    }

    pub fn new_from_env() -> Result<Self, AppError> {
        let api_url = env::var("IGAZOLAS_API_URL")
            .map_err(|_| AppError::Config("IGAZOLAS_API_URL is not set".to_string()))?;
        let api_token = env::var("IGAZOLAS_TOKEN").ok().filter(|t| !t.trim().is_empty());
        let local_db_url =
            env::var("IGAZOLAS_LOCAL_DB").unwrap_or_else(|_| DEFAULT_LOCAL_DB.to_string());

        let auto_sync = try_load("IGAZOLAS_AUTO_SYNC", true)?;
        let sync_delay_ms = try_load("IGAZOLAS_SYNC_DELAY_MS", DEFAULT_SYNC_DELAY_MS)?;
        let require_registration = try_load("IGAZOLAS_REQUIRE_REGISTRATION", true)?;
        let request_timeout = match env::var("IGAZOLAS_TIMEOUT_SECS") {
            Ok(raw) => Some(Duration::from_secs(parse_value("IGAZOLAS_TIMEOUT_SECS", &raw)?)),
            Err(_) => None,
        };

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token,
            local_db_url,
            auto_sync,
            sync_delay: Duration::from_millis(sync_delay_ms),
            require_registration,
            request_timeout,
        })
    }
}

fn try_load<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid {key} value {raw:?}: {e}")))
}
