use thiserror::Error;

/// Failures retrieving a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("giving up on {url} after {attempts} attempts")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl FetchError {
    /// Whether retrying the same request could succeed
    pub fn is_transient(&self, retry_statuses: &[u16]) -> bool {
        match self {
            FetchError::Status { status, .. } => retry_statuses.contains(status),
            FetchError::Transport { source, .. } => source.is_timeout() || source.is_connect(),
            FetchError::RetriesExhausted { .. } | FetchError::Client(_) => false,
        }
    }
}

/// Failures at episode or dataset granularity
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no transcript content block found at {0}")]
    MissingContent(String),

    #[error("invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("invalid lexicon: {0}")]
    InvalidLexicon(String),

    #[error("dataset validation failed with {} error(s)", .0.len())]
    Validation(Vec<String>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
