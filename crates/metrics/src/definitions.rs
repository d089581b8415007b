//! Metric name and label definitions.

/// Backend gateway client metrics
pub mod gateway {
    /// Requests issued to the backend, by endpoint
    pub const REQUESTS_TOTAL: &str = "pagelink_gateway_requests_total";
    /// Requests that failed in transport or returned non-2xx, by endpoint
    pub const ERRORS_TOTAL: &str = "pagelink_gateway_errors_total";
    /// Request duration in seconds, by endpoint
    pub const REQUEST_DURATION_SECONDS: &str = "pagelink_gateway_request_duration_seconds";
}

/// Channel lifecycle metrics
pub mod channels {
    /// Successful page connects
    pub const CONNECTS_TOTAL: &str = "pagelink_channel_connects_total";
    /// Successful page disconnects
    pub const DISCONNECTS_TOTAL: &str = "pagelink_channel_disconnects_total";
    /// Successful auto-reply saves
    pub const AUTO_REPLY_SAVES_TOTAL: &str = "pagelink_channel_auto_reply_saves_total";
    /// Operations rejected locally before reaching the network, by reason
    pub const REJECTED_TOTAL: &str = "pagelink_channel_rejected_total";
    /// Number of channels in the last loaded snapshot
    pub const ACTIVE: &str = "pagelink_channels_active";
}

/// Authorization handshake metrics
pub mod handshake {
    /// Handshakes started (login URL fetched and opened)
    pub const STARTS_TOTAL: &str = "pagelink_handshake_starts_total";
    /// Handshake outcomes observed through return parameters, by outcome
    pub const OUTCOMES_TOTAL: &str = "pagelink_handshake_outcomes_total";
}

/// Common label keys
pub mod labels {
    pub const ENDPOINT: &str = "endpoint";
    pub const OUTCOME: &str = "outcome";
    pub const REASON: &str = "reason";
}
