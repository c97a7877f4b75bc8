use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// Why a send did not go through. On [`SendError::Failed`] the typed text is
/// back in the input buffer.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("message is empty")]
    Empty,

    #[error("a message is already being sent")]
    InFlight,

    #[error("message not sent: {source}")]
    Failed {
        text: String,
        #[source]
        source: ClientError,
    },
}
