//! Configuration for the API server
//!
//! Loaded from environment variables (and a `.env` file when present).
//!
//! # Environment Variables
//!
//! - `API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `API_PORT`: Port to bind to (default: 8080)
//! - `CORS_ALLOWED_ORIGINS`: Comma-separated origins, `*` allows any
//!   (default: local front-end dev servers)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
//! - `RUN_MIGRATIONS`: Apply embedded migrations at startup (default: false)
//! - `JWT_SECRET`: Secret of CMS-issued tokens; tokens are ignored when unset
//! - `BILLING_BATCH_SIZE`: Rows per insert batch (default: 100)
//! - `OCCUPANT_ROLE_TYPE`: Role type billed by default (default: penghuni)
//! - `MONTHLY_CADENCE`: Setting cadence generated monthly (default: bulanan)
//! - `BILLING_MIN_YEAR` / `BILLING_MAX_YEAR`: Billable years (default: 2020-2100)
//! - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
//! - `RUST_LOG`: Log filter

use ipl_shared::billing::policy::{
    BillingPolicy, DEFAULT_BATCH_SIZE, MAX_YEAR, MIN_YEAR, MONTHLY_CADENCE, OCCUPANT_ROLE_TYPE,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:3000,http://localhost:3001,http://127.0.0.1:3000,http://127.0.0.1:3001";

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,

    pub database: DatabaseConfig,

    pub jwt: JwtConfig,

    pub billing: BillingPolicy,

    pub logging: LoggingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` enables permissive CORS
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Apply embedded migrations before serving
    pub run_migrations: bool,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret shared with the CMS that issues user tokens
    pub secret: Option<String>,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", key, value, e)),
        Err(_) => Ok(default),
    }
}

/// Splits a comma-separated origin list, dropping blanks
pub fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing or any variable has an
    /// invalid value
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|secret| !secret.trim().is_empty());

        let config = Self {
            api: ApiConfig {
                host: var_or("API_HOST", "0.0.0.0"),
                port: parse_var("API_PORT", 8080u16)?,
                cors_origins: parse_origins(&var_or("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ORIGINS)),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10u32)?,
                run_migrations: parse_var("RUN_MIGRATIONS", false)?,
            },
            jwt: JwtConfig { secret: jwt_secret },
            billing: BillingPolicy {
                occupant_role_type: var_or("OCCUPANT_ROLE_TYPE", OCCUPANT_ROLE_TYPE),
                monthly_cadence: var_or("MONTHLY_CADENCE", MONTHLY_CADENCE),
                batch_size: parse_var("BILLING_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
                min_year: parse_var("BILLING_MIN_YEAR", MIN_YEAR)?,
                max_year: parse_var("BILLING_MAX_YEAR", MAX_YEAR)?,
            },
            logging: LoggingConfig {
                format: parse_var("LOG_FORMAT", LogFormat::Pretty)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.billing.batch_size == 0 {
            anyhow::bail!("BILLING_BATCH_SIZE must be at least 1");
        }

        if self.billing.min_year > self.billing.max_year {
            anyhow::bail!(
                "BILLING_MIN_YEAR ({}) must not exceed BILLING_MAX_YEAR ({})",
                self.billing.min_year,
                self.billing.max_year
            );
        }

        if self.billing.occupant_role_type.trim().is_empty() {
            anyhow::bail!("OCCUPANT_ROLE_TYPE must not be empty");
        }

        if self.billing.monthly_cadence.trim().is_empty() {
            anyhow::bail!("MONTHLY_CADENCE must not be empty");
        }

        Ok(())
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// True when CORS should allow any origin
    pub fn cors_is_permissive(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: parse_origins(DEFAULT_CORS_ORIGINS),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/ipl_test".to_string(),
                max_connections: 10,
                run_migrations: false,
            },
            jwt: JwtConfig { secret: None },
            billing: BillingPolicy::default(),
            logging: LoggingConfig {
                format: LogFormat::Pretty,
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" http://a.test , ,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert_eq!(parse_origins(DEFAULT_CORS_ORIGINS).len(), 4);
    }

    #[test]
    fn test_cors_permissive() {
        let mut config = test_config();
        assert!(!config.cors_is_permissive());

        config.api.cors_origins = vec!["*".to_string()];
        assert!(config.cors_is_permissive());
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_billing_settings() {
        let mut config = test_config();
        assert!(config.validate().is_ok());

        config.billing.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = test_config();
        config.billing.min_year = 2030;
        config.billing.max_year = 2025;
        assert!(config.validate().is_err());
    }
}
