use std::env;
use std::time::Duration;

/// Runtime configuration, read once at startup.
pub struct Config {
    pub database_url: String,
    /// Period of the full sweep over active items.
    pub check_interval: Duration,
    /// Politeness delay between two item fetches within a sweep.
    pub item_delay: Duration,
    pub fetch_timeout: Duration,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            check_interval: Duration::from_secs(
                env::var("CHECK_INTERVAL_SECS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()?,
            ),
            item_delay: Duration::from_millis(
                env::var("ITEM_DELAY_MS")
                    .unwrap_or_else(|_| "2000".to_string())
                    .parse()?,
            ),
            fetch_timeout: Duration::from_secs(
                env::var("FETCH_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()?,
            ),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
