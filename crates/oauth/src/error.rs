use std::time::Duration;

/// Crate-wide result type for handshake operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid callback url {url}: {reason}")]
    InvalidCallbackUrl { url: String, reason: String },

    #[error("failed to listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("authorization callback timed out after {} seconds", .0.as_secs())]
    TimedOut(Duration),

    #[error("callback server exited before a redirect arrived")]
    ServerExited,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_callback_url(url: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Self::InvalidCallbackUrl {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}
