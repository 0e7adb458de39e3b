use std::env;
use std::str::FromStr;

use anyhow::Context;
use dotenvy::dotenv;

use crate::domain::RetryPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub rail: RailConfig,
    pub processor: ProcessorConfig,
}

#[derive(Debug, Clone)]
pub struct RailConfig {
    /// Base URL of the external debit-execution endpoint. When unset the
    /// service runs against the simulated rail.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub retry: RetryPolicy,
    pub poll_interval_secs: u64,
    pub suspend_mandate_on_exhausted_retries: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        let rail_base_url = env::var("PAYMENT_RAIL_URL").ok();
        if let Some(raw) = &rail_base_url {
            url::Url::parse(raw).context("PAYMENT_RAIL_URL is not a valid URL")?;
        }

        Ok(Config {
            server_port: env_or("SERVER_PORT", 3000)?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            rail: RailConfig {
                base_url: rail_base_url,
                timeout_secs: env_or("PAYMENT_RAIL_TIMEOUT_SECS", 30)?,
            },
            processor: ProcessorConfig {
                retry: RetryPolicy {
                    max_retries: env_or("DEBIT_MAX_RETRIES", RetryPolicy::default().max_retries)?,
                    backoff_days: env_or(
                        "DEBIT_RETRY_BACKOFF_DAYS",
                        RetryPolicy::default().backoff_days,
                    )?,
                },
                poll_interval_secs: env_or("PROCESSOR_POLL_INTERVAL_SECS", 300)?,
                suspend_mandate_on_exhausted_retries: env_or(
                    "SUSPEND_MANDATE_ON_EXHAUSTED_RETRIES",
                    false,
                )?,
            },
        })
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value", key)),
        Err(_) => Ok(default),
    }
}
