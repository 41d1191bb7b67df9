use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// The server answered with an error body `{"error", "message"}`.
    #[error("{status} {error}: {message}")]
    Api { status: StatusCode, error: String, message: String },

    #[error("invalid base url: {0}")]
    InvalidUrl(String),

    /// The id is not in the board's current snapshot.
    #[error("task {0} is not on the board")]
    UnknownTask(uuid::Uuid),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Reqwest(e) => e.status(),
            ClientError::InvalidUrl(_) | ClientError::UnknownTask(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(StatusCode::CONFLICT)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::UnknownTask(_)) || self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_validation(&self) -> bool {
        self.status() == Some(StatusCode::BAD_REQUEST)
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
}
