use thiserror::Error;

/// Rejected run parameters. Raised before the engine starts; the engine itself
/// assumes a validated [`RunConfig`](crate::RunConfig).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("target URL must not be empty")]
    EmptyUrl,

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("request count must be at least 1")]
    ZeroRequests,

    #[error("request timeout must be at least 1 second")]
    ZeroTimeout,
}

/// Why a single request could not be completed end-to-end.
///
/// Carries the rendered cause rather than the client error so that outcomes
/// stay plain, cloneable data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to build request: {0}")]
    Build(String),

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for RequestError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RequestError::Timeout
        } else if e.is_builder() {
            RequestError::Build(e.to_string())
        } else if e.is_connect() {
            RequestError::Connect(e.to_string())
        } else {
            RequestError::Transport(e.to_string())
        }
    }
}
