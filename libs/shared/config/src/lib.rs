use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_SLOT_REFRESH_INTERVAL_SECONDS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout_seconds: u64,
    pub slot_refresh_interval_seconds: u64,
    #[serde(skip)]
    base_url_from_env: bool,
}

impl AppConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
            slot_refresh_interval_seconds: DEFAULT_SLOT_REFRESH_INTERVAL_SECONDS,
            base_url_from_env: true,
        }
    }

    pub fn from_env() -> Self {
        let (api_base_url, base_url_from_env) = match env::var("API_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => (url.trim_end_matches('/').to_string(), true),
            _ => {
                warn!("API_BASE_URL not set, using default {}", DEFAULT_API_BASE_URL);
                (DEFAULT_API_BASE_URL.to_string(), false)
            }
        };

        let config = Self {
            api_base_url,
            request_timeout_seconds: seconds_from_env(
                "API_REQUEST_TIMEOUT_SECONDS",
                DEFAULT_REQUEST_TIMEOUT_SECONDS,
            ),
            slot_refresh_interval_seconds: seconds_from_env(
                "SLOT_REFRESH_INTERVAL_SECONDS",
                DEFAULT_SLOT_REFRESH_INTERVAL_SECONDS,
            ),
            base_url_from_env,
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        self.base_url_from_env && !self.api_base_url.is_empty()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn slot_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.slot_refresh_interval_seconds)
    }
}

fn seconds_from_env(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(0) => {
                warn!("{} must be positive, using default {}", key, default);
                default
            }
            Ok(value) => value,
            Err(_) => {
                warn!("{} is not a number ({}), using default {}", key, raw, default);
                default
            }
        },
        Err(_) => {
            warn!("{} not set, using default {}", key, default);
            default
        }
    }
}
