use thiserror::Error;

/// Everything the pipeline and the sinks can fail with.
#[derive(Debug, Error)]
pub enum TrackError {
    /// The event was rejected before any I/O took place.
    #[error("{0}")]
    IllegalData(String),

    /// Transport failure, timeout or a non-2xx answer on the batch endpoint.
    #[error("network error: {0}")]
    Network(String),

    /// The debug endpoint refused the event (status >= 300).
    #[error("debug endpoint rejected event: status {status}, body {body}")]
    Debug { status: u16, body: String },

    #[error("sink is closed")]
    SinkClosed,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for TrackError {
    fn from(e: reqwest::Error) -> Self {
        TrackError::Network(e.to_string())
    }
}

impl TrackError {
    pub(crate) fn illegal(reason: impl Into<String>) -> Self {
        TrackError::IllegalData(reason.into())
    }

    pub fn is_illegal_data(&self) -> bool {
        matches!(self, TrackError::IllegalData(_))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, TrackError::Network(_))
    }
}

pub type TrackResult<T> = Result<T, TrackError>;
