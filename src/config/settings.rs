use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub push_endpoint: Option<String>,
    pub push_api_key: Option<String>,
    pub push_timeout: u64,
    pub deduplicate_deliveries: bool,
    pub log_level: String,
}

impl Settings {
    pub fn new() -> Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "teamledger.db".to_string());

        let push_endpoint = env::var("PUSH_ENDPOINT")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let push_api_key = env::var("PUSH_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let push_timeout = match env::var("PUSH_TIMEOUT") {
            Ok(v) => v
                .parse::<u64>()
                .map_err(|_| anyhow!("PUSH_TIMEOUT must be a number of seconds, got {v}"))?,
            Err(_) => 10,
        };

        let deduplicate_deliveries = match env::var("DEDUPLICATE_DELIVERIES") {
            Ok(v) => match v.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(anyhow!("DEDUPLICATE_DELIVERIES must be a boolean, got {v}")),
            },
            Err(_) => true,
        };

        let log_level = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Ok(Settings {
            database_url,
            push_endpoint,
            push_api_key,
            push_timeout,
            deduplicate_deliveries,
            log_level,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_url.is_empty() {
            return Err(anyhow!("Database URL cannot be empty"));
        }

        if self.push_timeout == 0 {
            return Err(anyhow!("Push timeout must be greater than 0"));
        }

        if self.push_api_key.is_some() && self.push_endpoint.is_none() {
            return Err(anyhow!("PUSH_API_KEY is set but PUSH_ENDPOINT is missing"));
        }

        Ok(())
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_secs(self.push_timeout)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: "teamledger.db".to_string(),
            push_endpoint: None,
            push_api_key: None,
            push_timeout: 10,
            deduplicate_deliveries: true,
            log_level: "info".to_string(),
        }
    }
}
