//! # bunny-logpull
//!
//! Download a day of BunnyCDN pull zone logs into a single local file.
//!
//! The logging API serves a day's log in ranges of entries. This crate asks
//! for one range after another, inflates each gzip body straight into
//! `{zone}/{YYYY-MM-DD}.log` and stops as soon as the server has nothing more
//! to give (HTTP 204, or a body that inflates to zero bytes).
//!
//! ## Example
//!
//! ```no_run
//! use bunny_logpull::{DownloadConfig, HttpLogSource, LogProgress, pull};
//! use chrono::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let day = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
//!     let config = DownloadConfig::new("api-key", 12345, day);
//!     let source = HttpLogSource::new(config.logging_host.clone(), config.token.clone())?;
//!
//!     let summary = pull::run(&config, &source, &mut LogProgress).await?;
//!     println!("{} bytes in {} batches", summary.bytes_written, summary.batches);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod decode;
pub mod error;
pub mod logging;
pub mod output;
pub mod pull;
pub mod source;

pub use cli::Cli;
pub use config::DownloadConfig;
pub use error::PullError;
pub use logging::init_logging;
pub use output::OutputTarget;
pub use pull::{Exhaustion, LogProgress, Progress, RetryPolicy, RunSummary};
pub use source::{BodyStream, FetchRequest, HttpLogSource, LogSource, Reply};
