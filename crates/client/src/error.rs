/// Crate-wide result type for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network failure (`status` is `None`) or a non-2xx answer from the backend.
    #[error("{endpoint} failed{}: {body}", with_status(.status))]
    Transport {
        endpoint: &'static str,
        status: Option<u16>,
        body: String,
    },

    /// The backend answered 2xx but the payload did not match the expected shape.
    #[error("{endpoint} returned an unexpected payload: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn with_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" with HTTP {s}")).unwrap_or_default()
}

impl Error {
    #[must_use]
    pub fn transport(
        endpoint: &'static str,
        status: Option<u16>,
        body: impl std::fmt::Display,
    ) -> Self {
        Self::Transport {
            endpoint,
            status,
            body: body.to_string(),
        }
    }

    /// Upstream HTTP status, when the backend answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}
