use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::layout::DEFAULT_MAX_VISIBLE;
use crate::payment::{check_session_ttl, DEFAULT_SESSION_TTL_SECS};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub layout: LayoutConfig,
    pub payment: PaymentConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Without a URL the service runs without the agent datastore
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub agents_table: String,
    pub fetch_limit: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    pub max_visible: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    pub session_ttl_secs: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: parse_var("PORT", 3000)?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:5173,http://localhost:3000".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
                max_connections: parse_var("DB_MAX_CONNECTIONS", 10)?,
                min_connections: parse_var("DB_MIN_CONNECTIONS", 1)?,
                agents_table: env::var("AGENTS_TABLE")
                    .unwrap_or_else(|_| "deployed_objects".to_string()),
                fetch_limit: parse_var("AGENTS_FETCH_LIMIT", 500)?,
            },
            layout: LayoutConfig {
                max_visible: parse_var("MAX_VISIBLE_MARKERS", DEFAULT_MAX_VISIBLE)?,
            },
            payment: PaymentConfig {
                session_ttl_secs: session_ttl_from_env()?,
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 3000,
                host: "0.0.0.0".to_string(),
                cors_allowed_origins: vec![
                    "http://localhost:5173".to_string(),
                    "http://localhost:3000".to_string(),
                ],
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                min_connections: 1,
                agents_table: "deployed_objects".to_string(),
                fetch_limit: 500,
            },
            layout: LayoutConfig {
                max_visible: DEFAULT_MAX_VISIBLE,
            },
            payment: PaymentConfig {
                session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            },
        }
    }
}

fn session_ttl_from_env() -> Result<i64> {
    let ttl = parse_var("PAYMENT_SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
    check_session_ttl(ttl).context("PAYMENT_SESSION_TTL_SECS is out of range")
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_default_and_errors() {
        let missing: u16 = parse_var("AR_AGENT_MARKET_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(missing, 42);

        env::set_var("AR_AGENT_MARKET_TEST_BAD_PORT", "not-a-port");
        let bad: Result<u16> = parse_var("AR_AGENT_MARKET_TEST_BAD_PORT", 3000);
        assert!(bad.is_err());

        env::set_var("AR_AGENT_MARKET_TEST_GOOD", " 25 ");
        let good: usize = parse_var("AR_AGENT_MARKET_TEST_GOOD", 15).unwrap();
        assert_eq!(good, 25);
    }

    #[test]
    fn test_session_ttl_range_is_enforced() {
        env::set_var("PAYMENT_SESSION_TTL_SECS", i64::MAX.to_string());
        assert!(session_ttl_from_env().is_err());

        env::set_var("PAYMENT_SESSION_TTL_SECS", "-5");
        assert!(session_ttl_from_env().is_err());

        env::set_var("PAYMENT_SESSION_TTL_SECS", "600");
        assert_eq!(session_ttl_from_env().unwrap(), 600);

        env::remove_var("PAYMENT_SESSION_TTL_SECS");
        assert_eq!(session_ttl_from_env().unwrap(), DEFAULT_SESSION_TTL_SECS);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.layout.max_visible, 15);
        assert_eq!(config.payment.session_ttl_secs, 900);
        assert!(config.database.url.is_none());
    }
}
