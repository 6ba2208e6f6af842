mod http;

pub use http::HttpLogSource;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;

use crate::error::Result;

/// Date layout the logging API expects in the request path.
pub const URL_DATE_FORMAT: &str = "%m-%d-%y";

/// One range-style request against the logging API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub zone_id: u64,
    pub day: NaiveDate,
    /// First log entry of the range.
    pub range_start: u64,
    pub range_size: u64,
}

impl FetchRequest {
    pub fn range_end(&self) -> u64 {
        self.range_start.saturating_add(self.range_size)
    }

    /// Build the request URL relative to `host` (scheme included).
    pub fn url(&self, host: &str) -> String {
        format!(
            "{}/{}/{}.log?sort=desc&start={}&end={}",
            host.trim_end_matches('/'),
            self.day.format(URL_DATE_FORMAT),
            self.zone_id,
            self.range_start,
            self.range_end()
        )
    }
}

/// What the server answered for one range.
pub enum Reply {
    /// HTTP 204: nothing left to fetch.
    NoContent,
    /// A gzip-encoded body, possibly empty.
    Body(Box<dyn BodyStream>),
}

/// Incremental access to a response body.
#[async_trait]
pub trait BodyStream: Send {
    /// Next raw chunk of the body, `None` once the body is exhausted.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>>;
}

/// Trait for anything that can serve log ranges
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn fetch_range(&self, request: &FetchRequest) -> Result<Reply>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(range_start: u64) -> FetchRequest {
        FetchRequest {
            zone_id: 98765,
            day: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            range_start,
            range_size: 2_000,
        }
    }

    #[test]
    fn url_uses_short_us_date_and_entry_range() {
        assert_eq!(
            request(4_000).url("https://logging.bunnycdn.com"),
            "https://logging.bunnycdn.com/01-05-24/98765.log?sort=desc&start=4000&end=6000"
        );
    }

    #[test]
    fn url_tolerates_trailing_slash_on_host() {
        assert_eq!(
            request(0).url("http://127.0.0.1:8080/"),
            "http://127.0.0.1:8080/01-05-24/98765.log?sort=desc&start=0&end=2000"
        );
    }
}
