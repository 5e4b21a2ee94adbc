use crate::error::{BallotError, Result};
use std::env;

const DEFAULT_DATABASE_URL: &str = "sqlite:trusty_ballot.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    /// When set, global references must name this app (`gid://<app>/...`).
    pub global_id_app: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            global_id_app: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let max_connections = match env::var("BALLOT_MAX_CONNECTIONS") {
            Ok(raw) => parse_connections(&raw)?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        let global_id_app = env::var("BALLOT_GLOBAL_ID_APP")
            .ok()
            .filter(|app| !app.trim().is_empty());

        Ok(Self {
            database_url,
            max_connections,
            global_id_app,
        })
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }
}

fn parse_connections(raw: &str) -> Result<u32> {
    match raw.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(BallotError::Config(format!(
            "BALLOT_MAX_CONNECTIONS must be a positive integer, got {:?}",
            raw
        ))),
        Ok(n) => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_and_garbage_connection_counts() {
        assert!(parse_connections("0").is_err());
        assert!(parse_connections("lots").is_err());
        assert_eq!(parse_connections(" 8 ").unwrap(), 8);
    }

    #[test]
    fn detects_memory_urls() {
        let mut config = Config::default();
        assert!(!config.is_in_memory());
        config.database_url = "sqlite::memory:".to_string();
        assert!(config.is_in_memory());
    }
}
