//! Channel connection lifecycle.
//!
//! [`ChannelController`] drives the backend gateway and owns the
//! [`ConnectionStore`]; [`CallbackReconciler`] folds the authorization
//! handshake's return parameters back in. The single [`StatusMessage`] slot
//! carries user-facing outcomes and dismisses itself.

pub mod controller;
pub mod error;
pub mod navigator;
pub mod reconciler;
pub mod status;
pub mod store;

#[cfg(test)]
mod testing;

pub use {
    controller::{ChannelController, DisconnectOutcome, ViewState},
    error::{Error, Result, ValidationError},
    navigator::{AutoConfirm, Confirm, MemoryNavigator, Navigator},
    reconciler::{CallbackReconciler, Reconciliation},
    status::{StatusKind, StatusMessage, StatusSlot, StatusTtl},
    store::{ConnectionStore, OperationFlags},
};
