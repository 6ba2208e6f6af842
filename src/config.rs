//! Immutable configuration for a single download run.

use chrono::NaiveDate;
use std::path::PathBuf;

use crate::error::{PullError, Result};
use crate::pull::RetryPolicy;

pub const DEFAULT_LOGGING_HOST: &str = "https://logging.bunnycdn.com";
pub const DEFAULT_BATCH_SIZE: u64 = 2_000;

/// Everything the batch loop needs to know about one (zone, day) download.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub token: String,
    pub zone_id: u64,
    pub day: NaiveDate,
    /// Batch index to start from, not an entry offset.
    pub start_offset: u64,
    /// Log entries requested per batch.
    pub batch_size: u64,
    pub logging_host: String,
    /// Directory under which `{zone_id}/{day}.log` is written.
    pub output_root: PathBuf,
    pub retry: RetryPolicy,
}

impl DownloadConfig {
    pub fn new(token: impl Into<String>, zone_id: u64, day: NaiveDate) -> Self {
        Self {
            token: token.into(),
            zone_id,
            day,
            start_offset: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            logging_host: DEFAULT_LOGGING_HOST.to_string(),
            output_root: PathBuf::from("."),
            retry: RetryPolicy::default(),
        }
    }

    /// Check the preconditions of a run before touching disk or network.
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(PullError::Config("API token must not be empty".into()));
        }
        if self.batch_size == 0 {
            return Err(PullError::Config("batch size must be greater than zero".into()));
        }
        if self.logging_host.trim().is_empty() {
            return Err(PullError::Config("logging host must not be empty".into()));
        }
        if self.start_offset.checked_mul(self.batch_size).is_none() {
            return Err(PullError::Config(format!(
                "start offset {} overflows with batch size {}",
                self.start_offset, self.batch_size
            )));
        }
        Ok(())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_root.join(self.zone_id.to_string())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir().join(format!("{}.log", self.day.format("%Y-%m-%d")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    #[test]
    fn defaults_match_cli_defaults() {
        let config = DownloadConfig::new("secret", 1234, day());
        assert_eq!(config.start_offset, 0);
        assert_eq!(config.batch_size, 2_000);
        assert_eq!(config.logging_host, DEFAULT_LOGGING_HOST);
        assert_eq!(config.retry.max_retries, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn output_path_is_zone_dir_and_iso_date() {
        let mut config = DownloadConfig::new("secret", 1234, day());
        config.output_root = PathBuf::from("/var/logs");
        assert_eq!(config.output_path(), PathBuf::from("/var/logs/1234/2024-03-07.log"));
    }

    #[test]
    fn rejects_empty_token() {
        let config = DownloadConfig::new("  ", 1, day());
        assert!(matches!(config.validate(), Err(PullError::Config(_))));
    }

    #[test]
    fn rejects_zero_batch_size() {
        let mut config = DownloadConfig::new("secret", 1, day());
        config.batch_size = 0;
        assert!(matches!(config.validate(), Err(PullError::Config(_))));
    }

    #[test]
    fn rejects_overflowing_start_offset() {
        let mut config = DownloadConfig::new("secret", 1, day());
        config.start_offset = u64::MAX;
        assert!(matches!(config.validate(), Err(PullError::Config(_))));
    }
}
