use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a log download run.
///
/// HTTP 204 and empty bodies are not represented here; they end the run
/// successfully.
#[derive(Debug, Error)]
pub enum PullError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{op} {}: {source}", path.display())]
    Filesystem {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("perform request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP request failed with status: {0}")]
    Status(u16),

    #[error("decode gzip body: {0}")]
    Decode(#[source] io::Error),
}

impl PullError {
    pub(crate) fn fs(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        PullError::Filesystem {
            op,
            path: path.into(),
            source,
        }
    }

    /// Whether a retry of the same batch could succeed.
    ///
    /// Only network-level failures and throttling/server statuses qualify.
    pub fn is_transient(&self) -> bool {
        match self {
            PullError::Transport(e) => {
                e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
            }
            PullError::Status(code) => *code == 429 || (500..=599).contains(code),
            PullError::Config(_) | PullError::Filesystem { .. } | PullError::Decode(_) => false,
        }
    }
}

pub type Result<T, E = PullError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttling_and_server_statuses_are_transient() {
        assert!(PullError::Status(429).is_transient());
        assert!(PullError::Status(503).is_transient());
        assert!(!PullError::Status(401).is_transient());
        assert!(!PullError::Status(404).is_transient());
    }

    #[test]
    fn local_failures_are_not_transient() {
        let decode = PullError::Decode(io::Error::new(io::ErrorKind::InvalidData, "bad header"));
        assert!(!decode.is_transient());
        assert!(!PullError::Config("token".into()).is_transient());
        let fs = PullError::fs(
            "open output file",
            "1/2024-01-01.log",
            io::ErrorKind::NotFound.into(),
        );
        assert!(!fs.is_transient());
    }

    #[test]
    fn filesystem_error_names_operation_and_path() {
        let err = PullError::fs(
            "create output folder",
            "42",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "create output folder 42: denied");
    }
}
