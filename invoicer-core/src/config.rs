use anyhow::{anyhow, Context};

use crate::models::{BankDetail, Sender};

/// Runtime configuration read from the environment (after `.env` is loaded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// PostgreSQL DSN. `None` runs the server on the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    /// Page size used when `limit` is not given.
    pub default_page_limit: i64,
    /// Selects the forward-only status transition policy.
    pub strict_status_transitions: bool,
    pub sender: Sender,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let database_url = get("DATABASE_URL").or_else(|| get("POSTGRES_DSN"));

        let port = or("SERVER_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| anyhow!("Invalid SERVER_PORT"))?;

        let database_max_connections = or("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .context("Invalid DATABASE_MAX_CONNECTIONS")?;

        let default_page_limit = or("DEFAULT_PAGE_LIMIT", "10")
            .parse::<i64>()
            .ok()
            .filter(|limit| *limit > 0)
            .ok_or_else(|| anyhow!("Invalid DEFAULT_PAGE_LIMIT"))?;

        let strict_status_transitions = match or("STRICT_STATUS_TRANSITIONS", "false")
            .to_ascii_lowercase()
            .as_str()
        {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            other => return Err(anyhow!("Invalid STRICT_STATUS_TRANSITIONS: {}", other)),
        };

        let sender = Sender {
            id: 1,
            name: or("SENDER_NAME", "Invoicer Placeholder"),
            email: or("SENDER_EMAIL", "billing@invoicer.local"),
            bank_detail: BankDetail {
                account_number: or("SENDER_ACCOUNT_NUMBER", "014563892"),
                bank_code: or("SENDER_BANK_CODE", "bc_placeholder"),
                bank_name: or("SENDER_BANK_NAME", "Placeholder Bank"),
            },
        };

        Ok(Config {
            database_url,
            database_max_connections,
            host: or("SERVER_HOST", "0.0.0.0"),
            port,
            default_page_limit,
            strict_status_transitions,
            sender,
        })
    }
}
