//! The batch fetch loop.
//!
//! A run walks the day's log forward one batch at a time:
//!
//! 1. The output file is created (or truncated) before any request is made.
//! 2. Batch `n` asks the source for entries `[n * batch_size, n * batch_size + batch_size)`.
//! 3. A gzip body is inflated straight into the file; a 204 or a body that
//!    inflates to nothing means the log is exhausted and the run succeeds.
//! 4. Any other failure stops the run. Bytes appended by the failing batch are
//!    cut off again so the file only ever holds whole batches.

mod retry;

pub use retry::RetryPolicy;

use tracing::{debug, error, info, warn};

use crate::config::DownloadConfig;
use crate::decode::append_gzip_body;
use crate::error::{PullError, Result};
use crate::output::OutputTarget;
use crate::source::{FetchRequest, LogSource, Reply};

/// Progress is reported for every batch whose index is a multiple of this.
pub const PROGRESS_INTERVAL: u64 = 10;

/// Why the source was considered exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhaustion {
    /// The server answered 204.
    NoContent,
    /// The server answered with a body that inflated to zero bytes.
    EmptyBody,
}

/// Result of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Decompressed bytes appended to the output file.
    pub bytes_written: u64,
    /// Batches that contributed data.
    pub batches: u64,
    /// Batch index at which the source ran dry.
    pub end_offset: u64,
    pub ended_by: Exhaustion,
}

/// Observer for batch-level progress.
pub trait Progress {
    /// Called after batch `offset` was appended, for offsets that are a
    /// multiple of [`PROGRESS_INTERVAL`].
    fn batch_downloaded(&mut self, offset: u64, bytes: u64);
}

/// Progress observer used by the CLI.
#[derive(Debug, Default)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn batch_downloaded(&mut self, offset: u64, bytes: u64) {
        debug!(offset, bytes, "progress reported");
        println!("Downloaded batch {}", offset);
    }
}

/// Silently drops progress notifications.
impl Progress for () {
    fn batch_downloaded(&mut self, _offset: u64, _bytes: u64) {}
}

/// Position of the loop within the day's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopState {
    /// Absolute batch index of the next request.
    pub current_offset: u64,
    /// Batches completed during this run.
    pub batch_index: u64,
}

impl LoopState {
    pub fn new(start_offset: u64) -> Self {
        Self {
            current_offset: start_offset,
            batch_index: 0,
        }
    }

    pub fn request(&self, config: &DownloadConfig) -> Result<FetchRequest> {
        let range_start = self
            .current_offset
            .checked_mul(config.batch_size)
            .ok_or_else(|| {
                PullError::Config(format!(
                    "batch {} exceeds the addressable entry range",
                    self.current_offset
                ))
            })?;

        Ok(FetchRequest {
            zone_id: config.zone_id,
            day: config.day,
            range_start,
            range_size: config.batch_size,
        })
    }

    pub fn advance(&mut self) {
        self.current_offset += 1;
        self.batch_index += 1;
    }

    pub fn reports_progress(&self) -> bool {
        self.current_offset % PROGRESS_INTERVAL == 0
    }
}

enum Batch {
    Appended(u64),
    Exhausted(Exhaustion),
}

/// Download every batch of `config.day` for `config.zone_id` from `source`.
///
/// Returns once the source reports no more content. The output file is
/// created before the first request, so a failed run still leaves the
/// batches that completed.
pub async fn run<S, P>(config: &DownloadConfig, source: &S, progress: &mut P) -> Result<RunSummary>
where
    S: LogSource + ?Sized,
    P: Progress + ?Sized,
{
    config.validate()?;

    let target = OutputTarget::create(config.output_path())?;
    info!(
        zone = config.zone_id,
        day = %config.day,
        path = %target.path().display(),
        start_offset = config.start_offset,
        batch_size = config.batch_size,
        "downloading logs"
    );

    let mut state = LoopState::new(config.start_offset);
    let mut bytes_written = 0u64;

    loop {
        let request = state.request(config)?;
        let batch = fetch_with_retry(source, &request, &target, &config.retry)
            .await
            .inspect_err(|e| {
                error!(
                    offset = state.current_offset,
                    error = %e,
                    "batch failed, rerun with --start-offset {} to resume",
                    state.current_offset
                );
            })?;

        match batch {
            Batch::Exhausted(ended_by) => {
                let summary = RunSummary {
                    bytes_written,
                    batches: state.batch_index,
                    end_offset: state.current_offset,
                    ended_by,
                };
                info!(?summary, "log source exhausted");
                return Ok(summary);
            }
            Batch::Appended(bytes) => {
                bytes_written += bytes;
                debug!(offset = state.current_offset, bytes, "batch appended");
                if state.reports_progress() {
                    progress.batch_downloaded(state.current_offset, bytes);
                }
                state.advance();
            }
        }
    }
}

async fn fetch_with_retry<S>(
    source: &S,
    request: &FetchRequest,
    target: &OutputTarget,
    policy: &RetryPolicy,
) -> Result<Batch>
where
    S: LogSource + ?Sized,
{
    let mut retry = 0;
    loop {
        match fetch_batch(source, request, target).await {
            Err(e) if e.is_transient() => {
                retry += 1;
                let Some(delay) = policy.delay_for(retry) else {
                    return Err(e);
                };
                warn!(
                    range_start = request.range_start,
                    error = %e,
                    "transient error, retry {}/{} in {:?}",
                    retry,
                    policy.max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}

async fn fetch_batch<S>(source: &S, request: &FetchRequest, target: &OutputTarget) -> Result<Batch>
where
    S: LogSource + ?Sized,
{
    let mut body = match source.fetch_range(request).await? {
        Reply::NoContent => return Ok(Batch::Exhausted(Exhaustion::NoContent)),
        Reply::Body(body) => body,
    };

    let before = target.current_len()?;
    let file = target.open_append()?;

    match append_gzip_body(body.as_mut(), file, target.path()).await {
        Ok(0) => Ok(Batch::Exhausted(Exhaustion::EmptyBody)),
        Ok(n) => Ok(Batch::Appended(n)),
        Err(e) => {
            if let Err(rollback) = target.truncate(before) {
                warn!(error = %rollback, "could not discard partial batch");
            }
            Err(e)
        }
    }
}
