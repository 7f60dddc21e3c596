// src/config.rs

use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use dotenvy::dotenv;
use thiserror::Error;

/// Free (non-premium) users may complete this many exams.
pub const FREE_TEST_LIMIT: i32 = 1;

/// Results shown on the dashboard and returned by default from `/api/results`.
pub const DEFAULT_RESULTS_LIMIT: i64 = 10;
pub const MAX_RESULTS_LIMIT: i64 = 100;

/// Interface languages a profile may select.
pub const SUPPORTED_LANGUAGES: [&str; 2] = ["en", "uz"];

/// Countdown resolution.
pub const TIMER_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub cors_origins: Vec<String>,
    /// Optional JSON question bank replacing the built-in fixtures.
    pub question_bank_path: Option<PathBuf>,
    /// How long a submitted session stays readable.
    pub session_retention_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        let jwt_expiration = parsed("JWT_EXPIRATION", 86_400)?;
        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let bind_addr = parsed("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173,http://127.0.0.1:5173".to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        let question_bank_path = env::var("QUESTION_BANK_PATH").ok().map(PathBuf::from);
        let session_retention_secs = parsed("SESSION_RETENTION_SECS", 900)?;

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            cors_origins,
            question_bank_path,
            session_retention_secs,
        })
    }

    pub fn session_retention(&self) -> Duration {
        Duration::from_secs(self.session_retention_secs)
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
