use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection failure, timeout or unreadable body
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a failure envelope
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Response carried no data")]
    MissingData,

    #[error("Not signed in")]
    NotAuthenticated,

    /// Rejected locally before any request was made
    #[error("{0}")]
    Invalid(String),
}

impl ClientError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        ClientError::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status of a server-side rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::NotAuthenticated) || self.status() == Some(401)
    }
}
