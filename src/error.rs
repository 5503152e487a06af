use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("stream interrupted: {0}")]
    Stream(String),
}

/// Errors raised while fetching, inspecting or writing a page.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("The page could not be fetched ({url})")]
    Fetch { url: String },

    #[error("The page has not yet been fetched ({url})")]
    NotFetched { url: String },

    #[error("The page has not yet been parsed ({url})")]
    NotParsed { url: String },

    #[error("The page could not be parsed ({url}): {source}")]
    Parse {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode metadata: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A single asset failed to download. Never fatal to the page being mirrored.
#[derive(Debug, Error)]
#[error("The asset could not be downloaded ({url}): {cause}")]
pub struct AssetDownloadError {
    pub url: String,
    #[source]
    pub cause: AssetFailure,
}

#[derive(Debug, Error)]
pub enum AssetFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
