//! Process configuration read from environment variables.

use std::str::FromStr;

use accounts_core::retry::DEFAULT_MAX_RETRIES;
use accounts_identity::domain::password::PasswordHashingParams;

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Settings for the API process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub database_max_connections: u32,
    /// Retry budget handed to every command handler.
    pub max_retries: u32,
    pub password_hashing: PasswordHashingParams,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| AppError::Config("DATABASE_URL must be set".into()))?;

        let password_hashing = PasswordHashingParams::build(
            parse_or(
                &lookup,
                "ARGON2_MEMORY_KIB",
                PasswordHashingParams::DEFAULT_MEMORY_KIB,
            )?,
            parse_or(
                &lookup,
                "ARGON2_ITERATIONS",
                PasswordHashingParams::DEFAULT_ITERATIONS,
            )?,
            parse_or(
                &lookup,
                "ARGON2_PARALLELISM",
                PasswordHashingParams::DEFAULT_PARALLELISM,
            )?,
        )
        .map_err(|e| AppError::Config(e.to_string()))?;

        let max_retries = parse_or(
            &lookup,
            "MAX_RETRIES_ON_CONCURRENCY_CONFLICT",
            DEFAULT_MAX_RETRIES,
        )?;
        if max_retries == 0 {
            return Err(AppError::Config(
                "MAX_RETRIES_ON_CONCURRENCY_CONFLICT must be at least 1".into(),
            ));
        }

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            database_max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_DATABASE_MAX_CONNECTIONS,
            )?,
            max_retries,
            password_hashing,
        })
    }

    /// The `host:port` pair to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("invalid {key} {raw:?}: {e}"))),
    }
}
