//! Handshake return handling.
//!
//! After the operator authorizes with the provider, the browser lands on the
//! configured callback location with return parameters in the query string.
//! This crate classifies those parameters and, for terminal use, runs a
//! one-shot local listener that captures the landing URL.

pub mod callback_server;
pub mod error;
pub mod return_params;

pub use {
    callback_server::CallbackServer,
    error::{Error, Result},
    return_params::{ReturnParams, strip_return_params, tenant_hint},
};
