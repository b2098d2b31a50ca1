use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::application::debounce::DEFAULT_WINDOW;
use crate::application::session::DEFAULT_IDLE_TIMEOUT;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} must be a valid number, got '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Base URL of the REST backend, e.g. `http://localhost:3000/api`.
    pub backend_url: String,
    pub backend_timeout: Duration,
    pub debounce: Duration,
    pub session_idle: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_url = lookup("BACKEND_URL").ok_or(ConfigError::Missing("BACKEND_URL"))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 8080)?;
        let debounce_ms = parse_or(&lookup, "QUOTE_DEBOUNCE_MS", DEFAULT_WINDOW.as_millis() as u64)?;
        let timeout_ms = parse_or(&lookup, "BACKEND_TIMEOUT_MS", 10_000)?;
        let idle_ms = parse_or(
            &lookup,
            "SESSION_IDLE_MS",
            DEFAULT_IDLE_TIMEOUT.as_millis() as u64,
        )?;
        Ok(Config {
            host,
            port,
            backend_url,
            backend_timeout: Duration::from_millis(timeout_ms),
            debounce: Duration::from_millis(debounce_ms),
            session_idle: Duration::from_millis(idle_ms),
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
