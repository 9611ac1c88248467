//! # API Configuration Module
//!
//! Loads server and studio settings from environment variables.
//!
//! ## Environment Variables
//!
//! - `API_HOST`: host address to bind to (default: "0.0.0.0")
//! - `API_PORT`: port to listen on (default: 3000)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
//! - `LOG_LEVEL`: logging level (default: "info")
//! - `API_CORS_ORIGINS`: comma-separated list of allowed CORS origins
//! - `API_REQUEST_TIMEOUT_SECONDS`: request timeout (default: 30)
//! - `PACKAGE_VALIDITY_MONTHS`: how long an assigned package lasts (default: 1)
//! - `STUDIO_TIMEZONE`: IANA zone slot times are expressed in (default: "Asia/Jakarta")
//! - `CANCELLATION_NOTICE_HOURS`: how early a student must cancel (default: 24)
//! - `ROOM_LIMIT_REGULAR`: lessons sharing one start time outside the drum room (default: 8)
//! - `ROOM_LIMIT_DRUM`: drum lessons sharing one start time (default: 3)

use chrono_tz::Tz;
use eyre::{Result, WrapErr, eyre};
use lessonbook_core::policy::{
    DEFAULT_CANCELLATION_NOTICE_HOURS, DEFAULT_TIMEZONE, DEFAULT_VALIDITY_MONTHS, DRUM_ROOM_LIMIT,
    LedgerPolicy, REGULAR_ROOM_LIMIT, RoomLimits,
};
use std::env;
use tracing::Level;

/// Configuration for the API server and the studio policy it enforces.
///
/// # Example
///
/// ```no_run
/// use lessonbook_api::config::ApiConfig;
///
/// fn example() -> eyre::Result<()> {
///     let config = ApiConfig::from_env()?;
///     println!("Starting server on {}", config.server_addr());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub log_level: Level,
    pub cors_origins: Option<Vec<String>>,

    /// Request timeout in seconds
    pub request_timeout: u64,

    pub policy: LedgerPolicy,
}

fn parse_log_level(value: &str) -> Level {
    match value.trim().to_ascii_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn parse_count<F>(lookup: &F, key: &str, default: u32) -> Result<u32>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .wrap_err_with(|| format!("Invalid {} value", key)),
        None => Ok(default),
    }
}

impl ApiConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Fails if `DATABASE_URL` is unset or a numeric or timezone value does
    /// not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("API_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .wrap_err("Invalid API_PORT value")?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| eyre!("DATABASE_URL environment variable must be set"))?;
        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .parse()
            .wrap_err("Invalid DATABASE_MAX_CONNECTIONS value")?;

        let log_level = parse_log_level(&lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()));

        let cors_origins = lookup("API_CORS_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let request_timeout = lookup("API_REQUEST_TIMEOUT_SECONDS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let package_validity_months = match lookup("PACKAGE_VALIDITY_MONTHS") {
            Some(raw) => {
                let months: u32 = raw
                    .parse()
                    .wrap_err("Invalid PACKAGE_VALIDITY_MONTHS value")?;
                if months == 0 {
                    return Err(eyre!("PACKAGE_VALIDITY_MONTHS must be at least 1"));
                }
                months
            }
            None => DEFAULT_VALIDITY_MONTHS,
        };
        let timezone = match lookup("STUDIO_TIMEZONE") {
            Some(raw) => raw
                .trim()
                .parse::<Tz>()
                .map_err(|e| eyre!("Invalid STUDIO_TIMEZONE '{}': {}", raw, e))?,
            None => DEFAULT_TIMEZONE,
        };
        let cancellation_notice_hours = parse_count(
            &lookup,
            "CANCELLATION_NOTICE_HOURS",
            DEFAULT_CANCELLATION_NOTICE_HOURS,
        )?;
        let room_limits = RoomLimits {
            regular: parse_count(&lookup, "ROOM_LIMIT_REGULAR", REGULAR_ROOM_LIMIT)?,
            drum: parse_count(&lookup, "ROOM_LIMIT_DRUM", DRUM_ROOM_LIMIT)?,
        };
        if room_limits.regular == 0 || room_limits.drum == 0 {
            return Err(eyre!("Room limits must be at least 1"));
        }

        Ok(Self {
            host,
            port,
            database_url,
            database_max_connections,
            log_level,
            cors_origins,
            request_timeout,
            policy: LedgerPolicy {
                package_validity_months,
                timezone,
                cancellation_notice_hours,
                room_limits,
            },
        })
    }

    /// Returns the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ApiConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/lessonbook")]).unwrap();

        assert_eq!(config.server_addr(), "0.0.0.0:3000");
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.cors_origins, None);
        assert_eq!(config.request_timeout, 30);
        assert_eq!(config.policy, LedgerPolicy::default());
    }

    #[test]
    fn test_database_url_is_required() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://db/lessons"),
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "8080"),
            ("LOG_LEVEL", "DEBUG"),
            ("API_CORS_ORIGINS", "http://a.test, http://b.test,"),
            ("API_REQUEST_TIMEOUT_SECONDS", "5"),
            ("DATABASE_MAX_CONNECTIONS", "20"),
            ("PACKAGE_VALIDITY_MONTHS", "3"),
            ("STUDIO_TIMEZONE", "Asia/Makassar"),
            ("CANCELLATION_NOTICE_HOURS", "48"),
            ("ROOM_LIMIT_REGULAR", "6"),
            ("ROOM_LIMIT_DRUM", " 2 "),
        ])
        .unwrap();

        assert_eq!(config.server_addr(), "127.0.0.1:8080");
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(
            config.cors_origins,
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );
        assert_eq!(config.request_timeout, 5);
        assert_eq!(config.database_max_connections, 20);
        assert_eq!(config.policy.package_validity_months, 3);
        assert_eq!(config.policy.timezone, chrono_tz::Asia::Makassar);
        assert_eq!(config.policy.cancellation_notice_hours, 48);
        assert_eq!(config.policy.room_limits, RoomLimits { regular: 6, drum: 2 });
    }

    #[test]
    fn test_invalid_values() {
        let base = ("DATABASE_URL", "postgres://db/lessons");
        assert!(config_from(&[base, ("API_PORT", "http")]).is_err());
        assert!(config_from(&[base, ("PACKAGE_VALIDITY_MONTHS", "0")]).is_err());
        assert!(config_from(&[base, ("STUDIO_TIMEZONE", "Mars/Olympus")]).is_err());
        assert!(config_from(&[base, ("CANCELLATION_NOTICE_HOURS", "-1")]).is_err());
        assert!(config_from(&[base, ("ROOM_LIMIT_REGULAR", "many")]).is_err());
        assert!(config_from(&[base, ("ROOM_LIMIT_DRUM", "0")]).is_err());

        // unparsable timeouts fall back to the default
        let config = config_from(&[base, ("API_REQUEST_TIMEOUT_SECONDS", "soon")]).unwrap();
        assert_eq!(config.request_timeout, 30);
    }
}
