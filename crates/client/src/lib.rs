//! Typed client for the channel backend.
//!
//! One async function per remote capability, no retries, no state beyond the
//! tenant qualifier attached to every request. Failures surface verbatim as
//! [`Error::Transport`] carrying the upstream status and body.

pub mod error;
pub mod gateway;
pub mod http;
pub mod tenant;
pub mod types;

pub use {
    error::{Error, Result},
    gateway::Gateway,
    http::HttpGateway,
    tenant::TenantStore,
    types::{AuthResult, Channel, ChannelKind, MessagingAccount, Page},
};
