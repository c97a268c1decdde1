//! Process configuration
//!
//! Configuration comes only from the environment: two required
//! credentials and a handful of optional overrides. A missing
//! credential is fatal at startup, never retried.

use std::time::Duration;

/// Environment variable holding the completion provider credential
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Environment variable holding the sandbox provider credential
pub const SANDBOX_API_KEY: &str = "SANDBOX_API_KEY";

/// Optional override for the completion model
pub const TUTOR_MODEL: &str = "TUTOR_MODEL";

/// Optional override for the watch poll interval, in milliseconds
pub const TUTOR_POLL_INTERVAL_MS: &str = "TUTOR_POLL_INTERVAL_MS";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Configuration errors, all fatal at startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is absent
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    /// An optional environment variable holds an unparseable value
    #[error("invalid value for {var}: {value}")]
    Invalid {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Completion provider credential
    pub openai_api_key: String,
    /// Sandbox provider credential
    pub sandbox_api_key: String,
    /// Completion model override, provider default when `None`
    pub model: Option<String>,
    /// Watch poll interval
    pub poll_interval: Duration,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// # Errors
    /// - `ConfigError::MissingVar` if either required credential is
    ///   absent; startup fails fast
    /// - `ConfigError::Invalid` if the poll interval override does not
    ///   parse as milliseconds
    pub fn from_env() -> Result<Self, ConfigError> {
        let openai_api_key = required(OPENAI_API_KEY)?;
        let sandbox_api_key = required(SANDBOX_API_KEY)?;
        let model = std::env::var(TUTOR_MODEL).ok().filter(|m| !m.is_empty());

        let poll_interval = match std::env::var(TUTOR_POLL_INTERVAL_MS) {
            Ok(raw) => {
                let ms: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
                    var: TUTOR_POLL_INTERVAL_MS,
                    value: raw,
                })?;
                Duration::from_millis(ms)
            }
            Err(_) => DEFAULT_POLL_INTERVAL,
        };

        Ok(Self {
            openai_api_key,
            sandbox_api_key,
            model,
            poll_interval,
        })
    }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(var))
}
