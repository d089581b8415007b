/// Crate-wide result type for channel lifecycle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Local precondition failures. None of these ever reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("page {page_id} has no linked messaging account")]
    MissingMessagingAccount { page_id: String },

    #[error("auto-reply text must not be empty")]
    EmptyAutoReply,

    #[error("an operation is already in progress for {entity}")]
    OperationInFlight { entity: String },

    #[error("an authorization is already pending")]
    AuthorizationPending,

    #[error("unknown page: {page_id}")]
    UnknownPage { page_id: String },

    #[error("unknown channel: {channel_id}")]
    UnknownChannel { channel_id: i64 },
}

impl ValidationError {
    /// Short label used for logs and metrics.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingMessagingAccount { .. } => "missing_messaging_account",
            Self::EmptyAutoReply => "empty_auto_reply",
            Self::OperationInFlight { .. } => "in_flight",
            Self::AuthorizationPending => "authorization_pending",
            Self::UnknownPage { .. } => "unknown_page",
            Self::UnknownChannel { .. } => "unknown_channel",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Non-2xx or network failure from the gateway.
    #[error("gateway request failed: {0}")]
    Transport(#[from] pagelink_client::Error),

    /// The provider reported a failed handshake through return parameters.
    #[error("authorization failed: {message}")]
    Authorization { message: String },

    /// The backend answered but declined the request.
    #[error("request rejected by backend: {message}")]
    Rejected { message: String },

    #[error("navigation failed: {message}")]
    Navigation { message: String },

    /// The view was torn down while the call was in flight.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    #[must_use]
    pub fn authorization(message: impl std::fmt::Display) -> Self {
        Self::Authorization {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn rejected(message: impl std::fmt::Display) -> Self {
        Self::Rejected {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn navigation(message: impl std::fmt::Display) -> Self {
        Self::Navigation {
            message: message.to_string(),
        }
    }

    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(v) => Some(v),
            _ => None,
        }
    }
}
