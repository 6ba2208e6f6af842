use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

use super::{BodyStream, FetchRequest, LogSource, Reply};
use crate::error::{PullError, Result};

/// Log source backed by the BunnyCDN logging HTTP API
pub struct HttpLogSource {
    client: Client,
    host: String,
    token: String,
}

impl HttpLogSource {
    /// Create a new source for `host`, authenticating with `token`.
    ///
    /// Only the connect phase is bounded; a batch body may take as long as
    /// the server needs to stream it.
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            host: host.into(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl LogSource for HttpLogSource {
    async fn fetch_range(&self, request: &FetchRequest) -> Result<Reply> {
        let url = request.url(&self.host);
        debug!(%url, "requesting log range");

        let resp = self
            .client
            .get(&url)
            .header("AccessKey", &self.token)
            .header("Accept-Encoding", "gzip")
            .send()
            .await?;

        if !expects_body(resp.status())? {
            return Ok(Reply::NoContent);
        }
        Ok(Reply::Body(Box::new(HttpBody(resp))))
    }
}

/// `Ok(false)` for 204, `Ok(true)` when a gzip body follows.
fn expects_body(status: StatusCode) -> Result<bool> {
    if status == StatusCode::NO_CONTENT {
        return Ok(false);
    }
    if !status.is_success() {
        return Err(PullError::Status(status.as_u16()));
    }
    Ok(true)
}

struct HttpBody(Response);

#[async_trait]
impl BodyStream for HttpBody {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.0.chunk().await?)
    }
}
