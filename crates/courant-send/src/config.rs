//! Runtime configuration for send orchestration.
//!
//! These settings make orchestration limits explicit and reproducible for
//! operators. All values are environment-supplied with strict validation:
//! a value must be a positive integer when provided, otherwise configuration
//! loading fails rather than limping along with a surprise default.

use std::time::Duration;

use crate::error::{Error, Result};

const ENV_BATCH_SIZE: &str = "COURANT_SEND_BATCH_SIZE";
const ENV_MAX_ATTEMPTS: &str = "COURANT_SEND_MAX_ATTEMPTS";
const ENV_RETRY_BACKOFF_SECS: &str = "COURANT_SEND_RETRY_BACKOFF_SECS";
const ENV_RATE_PER_SEC: &str = "COURANT_SEND_RATE_PER_SEC";
const ENV_POLL_INTERVAL_SECS: &str = "COURANT_SEND_POLL_INTERVAL_SECS";

const DEFAULT_BATCH_SIZE: u64 = 100;
const DEFAULT_MAX_ATTEMPTS: u64 = 3;
const DEFAULT_RETRY_BACKOFF_SECS: u64 = 90;
const DEFAULT_RATE_PER_SEC: u64 = 14;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Limits and pacing for the send pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendConfig {
    /// Recipients per batch envelope.
    pub batch_size: usize,
    /// Maximum orchestration attempts per campaign before giving up.
    pub max_attempts: u32,
    /// Fixed delay between orchestration attempts.
    pub retry_backoff: Duration,
    /// Provider cap on outbound attempts, per second, per dispatcher run.
    pub send_rate_per_sec: u32,
    /// How often the external trigger polls for due campaigns. Recognized
    /// here so one config struct describes the whole pipeline; the trigger
    /// itself lives outside this core.
    pub poll_interval: Duration,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE as usize,
            max_attempts: DEFAULT_MAX_ATTEMPTS as u32,
            retry_backoff: Duration::from_secs(DEFAULT_RETRY_BACKOFF_SECS),
            send_rate_per_sec: DEFAULT_RATE_PER_SEC as u32,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

impl SendConfig {
    /// Loads config from the process environment with strict validation.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when an environment value is not a
    /// positive integer or exceeds the supported range.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Loads config with a custom environment source.
    ///
    /// This entry point is test-friendly and accepts a key lookup function.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when an environment value is not a
    /// positive integer or exceeds the supported range.
    pub fn from_env_with<F>(get_env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let batch_size = parse_positive_u64_env(&get_env, ENV_BATCH_SIZE, DEFAULT_BATCH_SIZE)?;
        let max_attempts =
            parse_positive_u64_env(&get_env, ENV_MAX_ATTEMPTS, DEFAULT_MAX_ATTEMPTS)?;
        let retry_backoff_secs =
            parse_positive_u64_env(&get_env, ENV_RETRY_BACKOFF_SECS, DEFAULT_RETRY_BACKOFF_SECS)?;
        let rate_per_sec = parse_positive_u64_env(&get_env, ENV_RATE_PER_SEC, DEFAULT_RATE_PER_SEC)?;
        let poll_interval_secs =
            parse_positive_u64_env(&get_env, ENV_POLL_INTERVAL_SECS, DEFAULT_POLL_INTERVAL_SECS)?;

        Ok(Self {
            batch_size: usize::try_from(batch_size).map_err(|_| {
                Error::configuration(format!(
                    "{ENV_BATCH_SIZE} value {batch_size} exceeds supported range"
                ))
            })?,
            max_attempts: u32::try_from(max_attempts).map_err(|_| {
                Error::configuration(format!(
                    "{ENV_MAX_ATTEMPTS} value {max_attempts} exceeds supported range"
                ))
            })?,
            retry_backoff: Duration::from_secs(retry_backoff_secs),
            send_rate_per_sec: u32::try_from(rate_per_sec).map_err(|_| {
                Error::configuration(format!(
                    "{ENV_RATE_PER_SEC} value {rate_per_sec} exceeds supported range"
                ))
            })?,
            poll_interval: Duration::from_secs(poll_interval_secs),
        })
    }
}

fn parse_positive_u64_env<F>(get_env: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match get_env(key) {
        None => Ok(default),
        Some(raw) => {
            let trimmed = raw.trim();
            let value: u64 = trimmed.parse().map_err(|_| {
                Error::configuration(format!("{key} value '{trimmed}' is not a positive integer"))
            })?;
            if value == 0 {
                return Err(Error::configuration(format!("{key} must be positive")));
            }
            Ok(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_recognized_options() {
        let config = SendConfig::default();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_backoff, Duration::from_secs(90));
        assert_eq!(config.send_rate_per_sec, 14);
        assert_eq!(config.poll_interval, Duration::from_secs(60));
    }

    #[test]
    fn from_env_with_overrides() -> Result<()> {
        let config = SendConfig::from_env_with(|key| match key {
            ENV_BATCH_SIZE => Some("50".into()),
            ENV_RATE_PER_SEC => Some("7".into()),
            _ => None,
        })?;
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.send_rate_per_sec, 7);
        assert_eq!(config.max_attempts, 3);
        Ok(())
    }

    #[test]
    fn zero_is_rejected() {
        let result = SendConfig::from_env_with(|key| {
            (key == ENV_BATCH_SIZE).then(|| "0".to_string())
        });
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn non_numeric_is_rejected() {
        let result = SendConfig::from_env_with(|key| {
            (key == ENV_MAX_ATTEMPTS).then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn whitespace_is_tolerated() -> Result<()> {
        let config = SendConfig::from_env_with(|key| {
            (key == ENV_RETRY_BACKOFF_SECS).then(|| " 120 ".to_string())
        })?;
        assert_eq!(config.retry_backoff, Duration::from_secs(120));
        Ok(())
    }
}
