//! Errors raised while talking to a mirror.

use url::Url;

/// Why a release could not be fetched.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl FetchError {
    /// Short label for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::Parse(_) => "parse",
        }
    }
}

/// The mirror could not be reached or refused the request.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} timed out")]
    Timeout { url: Url },

    #[error("request to {url} failed: {source}")]
    Request {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: Url, status: u16 },

    #[error("no package index found for release '{release}'")]
    NoIndex { release: String },

    #[error("cannot build a URL for '{path}': {source}")]
    InvalidUrl {
        path: String,
        #[source]
        source: url::ParseError,
    },
}

impl NetworkError {
    /// Classify a reqwest failure for `url`.
    pub fn from_reqwest(url: &Url, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout { url: url.clone() }
        } else {
            NetworkError::Request {
                url: url.clone(),
                source: err,
            }
        }
    }
}

/// The mirror answered with something that is not a valid index.
#[derive(Debug, thiserror::Error)]
#[error("malformed index at {url}: {source}")]
pub struct ParseError {
    pub url: Url,
    #[source]
    pub source: apt_index::AptIndexError,
}
