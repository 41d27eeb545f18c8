//! Server configuration read from the environment.

use std::time::Duration;

use crate::error::AppError;

/// Settings read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Endpoint of the structured-output reasoning service.
    pub reasoning_url: String,
    /// Bearer token for the reasoning service, if it needs one.
    pub reasoning_api_key: Option<String>,
    pub reasoning_timeout: Duration,
    /// YAML character roster; without one every session plays the default
    /// adventurer.
    pub roster_path: Option<String>,
    /// A turn running longer than this is cancelled.
    pub turn_timeout: Duration,
    /// How many log entries the turn context includes.
    pub recent_event_window: usize,
    /// OTLP endpoint; spans are exported only when set.
    pub otlp_endpoint: Option<String>,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `getter`.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_env_with<F>(mut getter: F) -> Result<Self, AppError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut optional = |key: &str| getter(key).filter(|value| !value.trim().is_empty());

        let database_url = optional("DATABASE_URL")
            .ok_or_else(|| AppError::Config("DATABASE_URL environment variable must be set".into()))?;
        let reasoning_url = optional("REASONING_URL")
            .ok_or_else(|| AppError::Config("REASONING_URL environment variable must be set".into()))?;
        let host = optional("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(optional("PORT"), "PORT", 3000_u16)?;
        let reasoning_timeout = Duration::from_secs(positive_or(
            optional("REASONING_TIMEOUT_SECS"),
            "REASONING_TIMEOUT_SECS",
            30,
        )?);
        let turn_timeout = Duration::from_secs(positive_or(
            optional("TURN_TIMEOUT_SECS"),
            "TURN_TIMEOUT_SECS",
            120,
        )?);
        let recent_event_window =
            parse_or(optional("RECENT_EVENT_WINDOW"), "RECENT_EVENT_WINDOW", 10_usize)?;

        Ok(Self {
            database_url,
            host,
            port,
            reasoning_url,
            reasoning_api_key: optional("REASONING_API_KEY"),
            reasoning_timeout,
            roster_path: optional("ROSTER_PATH"),
            turn_timeout,
            recent_event_window,
            otlp_endpoint: optional("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid ({value}): {e}"))),
        None => Ok(default),
    }
}

fn positive_or(value: Option<String>, key: &str, default: u64) -> Result<u64, AppError> {
    match parse_or(value, key, default)? {
        0 => Err(AppError::Config(format!("{key} must be greater than zero"))),
        secs => Ok(secs),
    }
}
