use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Bridge unreachable, connection reset, timeout.
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Token rejected by the bridge.
    #[error("bridge rejected token for {url} (HTTP {status})")]
    Unauthorized { url: String, status: u16 },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Body was not the JSON shape we expect.
    #[error("malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("invalid mapping config at `{key}`: {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("unable to read mapping config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to build addon archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("unable to serialize addon: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(url: &str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}
