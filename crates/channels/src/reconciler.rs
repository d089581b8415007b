use {
    pagelink_client::AuthResult,
    pagelink_oauth::{ReturnParams, strip_return_params, tenant_hint},
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use pagelink_metrics::{counter, handshake, labels};

use crate::{ChannelController, Error, Result};

const AUTHORIZED: &str = "Account authorized. Your pages are up to date.";
const EXCHANGE_FAILED: &str = "Could not complete authorization. Please try again.";

/// What the reconciler found at the current location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// A successful handshake was folded in and a reload issued.
    Authorized,
    /// No return parameters were present.
    NoReturnParams,
}

/// Folds handshake return parameters into the controller's store, once per
/// navigation.
///
/// The location is rewritten without the return parameters before anything
/// else happens, so observing it a second time is a no-op.
pub struct CallbackReconciler<'a> {
    controller: &'a ChannelController,
}

impl<'a> CallbackReconciler<'a> {
    pub fn new(controller: &'a ChannelController) -> Self {
        Self { controller }
    }

    /// Handle a navigation: reconcile return parameters if present, otherwise
    /// run the normal load.
    pub async fn on_navigation(&self) -> Result<Reconciliation> {
        let outcome = self.reconcile().await?;
        if outcome == Reconciliation::NoReturnParams {
            self.controller.load_all().await?;
        }
        Ok(outcome)
    }

    /// Interpret the return parameters at the current location.
    ///
    /// Success posts a success status and reloads pages and channels exactly
    /// once. Failure posts the provider's message and does not reload.
    pub async fn reconcile(&self) -> Result<Reconciliation> {
        self.controller.ensure_live()?;
        let navigator = self.controller.navigator();
        let location = navigator.current();

        if let Some(company_uuid) = tenant_hint(&location) {
            match self.controller.gateway().set_company_uuid(&company_uuid) {
                Ok(()) => debug!(company_uuid = %company_uuid, "tenant taken from return location"),
                Err(e) => warn!(error = %e, "failed to store tenant from return location"),
            }
        }

        let params = ReturnParams::from_url(&location);
        let stripped = strip_return_params(&location);
        if stripped != location {
            navigator.replace(stripped);
        }

        match params {
            ReturnParams::Absent => Ok(Reconciliation::NoReturnParams),
            ReturnParams::Success => self.authorized().await,
            ReturnParams::Failure { message } => Err(self.failed(message)),
            ReturnParams::Code { code, state } => {
                debug!("exchanging authorization code");
                let result = self
                    .controller
                    .until_torn_down(self.controller.gateway().submit_oauth_callback(&code, &state))
                    .await;
                match result {
                    Ok(AuthResult::Ok { .. }) => self.authorized().await,
                    Ok(AuthResult::Failed { message }) => Err(self.failed(message)),
                    Err(Error::Cancelled) => Err(Error::Cancelled),
                    Err(e) => {
                        warn!(error = %e, "authorization code exchange failed");
                        self.finish_handshake();
                        self.controller.status_slot().error(EXCHANGE_FAILED);
                        record_outcome("failure");
                        Err(e)
                    },
                }
            },
        }
    }

    async fn authorized(&self) -> Result<Reconciliation> {
        info!("authorization completed");
        record_outcome("success");
        self.finish_handshake();
        self.controller.status_slot().success(AUTHORIZED);
        // A failed reload replaces the success status with its own error.
        self.controller.load_all().await?;
        Ok(Reconciliation::Authorized)
    }

    fn failed(&self, message: String) -> Error {
        warn!(reason = %message, "authorization failed");
        record_outcome("failure");
        self.controller.write(|s| {
            let flags = s.flags_mut();
            flags.authorizing = false;
            flags.loading_pages = false;
            flags.loading_channels = false;
        });
        self.controller
            .status_slot()
            .error(format!("Authorization failed: {message}"));
        Error::authorization(message)
    }

    fn finish_handshake(&self) {
        self.controller
            .write(|s| s.flags_mut().authorizing = false);
    }
}

#[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
fn record_outcome(outcome: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(handshake::OUTCOMES_TOTAL, labels::OUTCOME => outcome).increment(1);
}
