use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Clinic Desk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Port the clinic frontend has always talked to.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_MAX_ADMINS: i64 = 3;
pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 600_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Get the application data directory.
/// Falls back to the working directory when the platform has no data dir.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("clinic-desk"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default location of the SQLite store.
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("clinic.db")
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,clinic_desk=debug"
}

/// Runtime configuration, read from `CLINIC_*` environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub log_filter: String,
    pub max_admins: i64,
    pub password_iterations: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup("CLINIC_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::InvalidValue {
            var: "CLINIC_BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let database_path = lookup("CLINIC_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let log_filter = lookup("CLINIC_LOG").unwrap_or_else(|| default_log_filter().into());

        let max_admins = match lookup("CLINIC_MAX_ADMINS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    var: "CLINIC_MAX_ADMINS",
                    value: raw,
                })?,
            None => DEFAULT_MAX_ADMINS,
        };

        let password_iterations = match lookup("CLINIC_PASSWORD_ITERATIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    var: "CLINIC_PASSWORD_ITERATIONS",
                    value: raw,
                })?,
            None => DEFAULT_PASSWORD_ITERATIONS,
        };

        Ok(Self {
            bind_addr,
            database_path,
            log_filter,
            max_admins,
            password_iterations,
        })
    }

    /// Configuration for tests: in-memory friendly, cheap hashing.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            database_path: PathBuf::from(":memory:"),
            log_filter: default_log_filter().into(),
            max_admins: DEFAULT_MAX_ADMINS,
            password_iterations: 1_000,
        }
    }
}
