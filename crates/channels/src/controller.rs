use std::{
    future::Future,
    sync::{Arc, RwLock},
};

use {
    pagelink_client::{AuthResult, Channel, Gateway, Page},
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use pagelink_metrics::{channels as channel_metrics, counter, gauge, handshake, labels};

use crate::{
    Error, Result, ValidationError,
    navigator::{Confirm, Navigator},
    status::{StatusMessage, StatusSlot, StatusTtl},
    store::{ConnectionStore, OperationFlags},
};

const LOAD_PAGES_FAILED: &str = "Could not load your pages. Please try again.";
const LOAD_CHANNELS_FAILED: &str = "Could not load connected channels. Please try again.";
const START_AUTH_FAILED: &str = "Could not start authorization. Please try again.";
const CONNECT_FAILED: &str = "Could not connect the page. Please try again.";
const DISCONNECT_FAILED: &str = "Could not disconnect the page. Please try again.";
const SAVE_FAILED: &str = "Could not save the auto-reply. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    Disconnected,
    /// The operator did not confirm; nothing was sent.
    Declined,
}

/// Immutable read model handed to observers.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub pages: Vec<Page>,
    pub channels: Vec<Channel>,
    pub flags: OperationFlags,
    pub status: Option<StatusMessage>,
}

impl ViewState {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.flags.is_loading()
    }
}

/// Sequences gateway calls and folds their outcomes into the
/// [`ConnectionStore`] and the status slot.
///
/// The controller is the store's only writer. Locks are never held across an
/// await; per-entity flags taken before a call keep a second call for the same
/// page or channel from reaching the network.
pub struct ChannelController {
    gateway: Arc<dyn Gateway>,
    navigator: Arc<dyn Navigator>,
    store: RwLock<ConnectionStore>,
    status: StatusSlot,
    teardown: CancellationToken,
}

impl ChannelController {
    pub fn new(gateway: Arc<dyn Gateway>, navigator: Arc<dyn Navigator>) -> Self {
        Self::with_status_ttl(gateway, navigator, StatusTtl::default())
    }

    pub fn with_status_ttl(
        gateway: Arc<dyn Gateway>,
        navigator: Arc<dyn Navigator>,
        ttl: StatusTtl,
    ) -> Self {
        Self {
            gateway,
            navigator,
            store: RwLock::new(ConnectionStore::new()),
            status: StatusSlot::new(ttl),
            teardown: CancellationToken::new(),
        }
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub fn status(&self) -> Option<StatusMessage> {
        self.status.current()
    }

    pub(crate) fn status_slot(&self) -> &StatusSlot {
        &self.status
    }

    pub fn snapshot(&self) -> ViewState {
        self.read(|store| ViewState {
            pages: store.pages().to_vec(),
            channels: store.channels().to_vec(),
            flags: store.flags().clone(),
            status: self.status.current(),
        })
    }

    pub fn read<R>(&self, f: impl FnOnce(&ConnectionStore) -> R) -> R {
        f(&self.store.read().unwrap_or_else(|e| e.into_inner()))
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut ConnectionStore) -> R) -> R {
        f(&mut self.store.write().unwrap_or_else(|e| e.into_inner()))
    }

    /// Release the view. Calls still in flight resolve to
    /// [`Error::Cancelled`]: their guard flags are released but pages,
    /// channels and status are left as they were.
    pub fn teardown(&self) {
        self.teardown.cancel();
        self.status.clear();
        debug!("channel view torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.teardown.is_cancelled()
    }

    pub(crate) fn ensure_live(&self) -> Result<()> {
        if self.is_torn_down() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    pub(crate) async fn until_torn_down<T>(
        &self,
        call: impl Future<Output = pagelink_client::Result<T>>,
    ) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.teardown.cancelled() => Err(Error::Cancelled),
            result = call => result.map_err(Error::from),
        }
    }

    /// Surface a local precondition failure without touching the network.
    pub(crate) fn reject(&self, err: ValidationError) -> Error {
        warn!(reason = err.reason(), error = %err, "operation rejected");
        #[cfg(feature = "metrics")]
        counter!(channel_metrics::REJECTED_TOTAL, labels::REASON => err.reason()).increment(1);
        self.status.error(capitalize(&err.to_string()));
        Error::Validation(err)
    }

    pub async fn load_pages(&self) -> Result<()> {
        self.ensure_live()?;
        self.write(|s| s.flags_mut().loading_pages = true);

        match self
            .until_torn_down(self.gateway.fetch_available_pages())
            .await
        {
            Ok(pages) => {
                debug!(count = pages.len(), "pages loaded");
                self.write(|s| {
                    s.apply_pages(pages);
                    s.flags_mut().loading_pages = false;
                });
                Ok(())
            },
            Err(Error::Cancelled) => {
                self.write(|s| s.flags_mut().loading_pages = false);
                Err(Error::Cancelled)
            },
            Err(e) => {
                warn!(error = %e, "loading pages failed");
                self.write(|s| s.flags_mut().loading_pages = false);
                self.status.error(LOAD_PAGES_FAILED);
                Err(e)
            },
        }
    }

    pub async fn load_channels(&self) -> Result<()> {
        self.ensure_live()?;
        self.write(|s| s.flags_mut().loading_channels = true);

        match self
            .until_torn_down(self.gateway.fetch_connected_channels())
            .await
        {
            Ok(channels) => {
                debug!(count = channels.len(), "channels loaded");
                #[cfg(feature = "metrics")]
                gauge!(channel_metrics::ACTIVE).set(channels.len() as f64);
                self.write(|s| {
                    s.apply_channels(channels);
                    s.flags_mut().loading_channels = false;
                });
                Ok(())
            },
            Err(Error::Cancelled) => {
                self.write(|s| s.flags_mut().loading_channels = false);
                Err(Error::Cancelled)
            },
            Err(e) => {
                warn!(error = %e, "loading channels failed");
                self.write(|s| s.flags_mut().loading_channels = false);
                self.status.error(LOAD_CHANNELS_FAILED);
                Err(e)
            },
        }
    }

    /// Load pages and channels concurrently. Both run to completion; the
    /// first failure is returned.
    pub async fn load_all(&self) -> Result<()> {
        let (pages, channels) = tokio::join!(self.load_pages(), self.load_channels());
        pages.and(channels)
    }

    /// Fetch the provider login URL and hand control to it.
    ///
    /// Fails fast while a previous authorization is still pending. The
    /// pending marker is cleared by the callback reconciler, or here when the
    /// URL cannot be obtained or opened.
    pub async fn start_authorization(&self) -> Result<()> {
        self.ensure_live()?;
        let already_pending = self.write(|s| {
            let flags = s.flags_mut();
            std::mem::replace(&mut flags.authorizing, true)
        });
        if already_pending {
            return Err(self.reject(ValidationError::AuthorizationPending));
        }

        let url = match self.until_torn_down(self.gateway.fetch_login_url()).await {
            Ok(url) => url,
            Err(Error::Cancelled) => {
                self.write(|s| s.flags_mut().authorizing = false);
                return Err(Error::Cancelled);
            },
            Err(e) => {
                warn!(error = %e, "fetching login url failed");
                self.write(|s| s.flags_mut().authorizing = false);
                self.status.error(START_AUTH_FAILED);
                return Err(e);
            },
        };

        if let Err(e) = self.navigator.redirect(&url) {
            warn!(error = %e, "redirect to provider failed");
            self.write(|s| s.flags_mut().authorizing = false);
            self.status.error(START_AUTH_FAILED);
            return Err(e);
        }

        #[cfg(feature = "metrics")]
        counter!(handshake::STARTS_TOTAL).increment(1);
        info!(host = url.host_str().unwrap_or_default(), "authorization started");
        Ok(())
    }

    pub async fn connect(&self, page_id: &str) -> Result<()> {
        self.ensure_live()?;
        let page = self
            .write(|s| reserve_page(s, page_id, true))
            .map_err(|e| self.reject(e))?;

        let outcome = self.until_torn_down(self.gateway.connect_page(&page)).await;
        self.write(|s| s.flags_mut().connecting.remove(page_id));
        if matches!(outcome, Err(Error::Cancelled)) {
            return Err(Error::Cancelled);
        }

        match outcome {
            Ok(AuthResult::Ok { .. }) => {
                self.write(|s| s.mark_connected(page_id));
                info!(page_id, "page connected");
                #[cfg(feature = "metrics")]
                counter!(channel_metrics::CONNECTS_TOTAL).increment(1);
                self.status.success(format!("{} connected.", page.name));
                Ok(())
            },
            Ok(AuthResult::Failed { message }) => {
                self.status
                    .error(format!("Could not connect {}: {message}", page.name));
                Err(Error::rejected(message))
            },
            Err(e) => {
                warn!(page_id, error = %e, "connect failed");
                self.status.error(CONNECT_FAILED);
                Err(e)
            },
        }
    }

    /// Remove a page's channel after the operator confirms.
    pub async fn disconnect(
        &self,
        page_id: &str,
        confirm: &dyn Confirm,
    ) -> Result<DisconnectOutcome> {
        self.ensure_live()?;
        let page = self
            .write(|s| reserve_page(s, page_id, false))
            .map_err(|e| self.reject(e))?;

        let prompt = format!("Disconnect {} from messaging?", page.name);
        if !confirm.confirm(&prompt).await {
            self.write(|s| s.flags_mut().connecting.remove(page_id));
            debug!(page_id, "disconnect declined");
            return Ok(DisconnectOutcome::Declined);
        }

        let outcome = self
            .until_torn_down(self.gateway.disconnect_page(page_id))
            .await;
        self.write(|s| s.flags_mut().connecting.remove(page_id));
        if matches!(outcome, Err(Error::Cancelled)) {
            return Err(Error::Cancelled);
        }

        match outcome {
            Ok(AuthResult::Ok { .. }) => {
                self.write(|s| s.mark_disconnected(page_id));
                info!(page_id, "page disconnected");
                #[cfg(feature = "metrics")]
                counter!(channel_metrics::DISCONNECTS_TOTAL).increment(1);
                self.status.success(format!("{} disconnected.", page.name));
                Ok(DisconnectOutcome::Disconnected)
            },
            Ok(AuthResult::Failed { message }) => {
                self.status
                    .error(format!("Could not disconnect {}: {message}", page.name));
                Err(Error::rejected(message))
            },
            Err(e) => {
                warn!(page_id, error = %e, "disconnect failed");
                self.status.error(DISCONNECT_FAILED);
                Err(e)
            },
        }
    }

    /// Persist the automated reply for a channel. Surrounding whitespace is
    /// trimmed; blank text never reaches the backend.
    pub async fn save_auto_reply(&self, channel_id: i64, text: &str) -> Result<()> {
        self.ensure_live()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(self.reject(ValidationError::EmptyAutoReply));
        }
        let channel = self
            .write(|s| reserve_channel(s, channel_id))
            .map_err(|e| self.reject(e))?;

        let outcome = self
            .until_torn_down(
                self.gateway
                    .save_auto_reply(&channel.page_id, channel.kind, text),
            )
            .await;
        self.write(|s| s.flags_mut().saving.remove(&channel_id));
        if matches!(outcome, Err(Error::Cancelled)) {
            return Err(Error::Cancelled);
        }

        match outcome {
            Ok(AuthResult::Ok { .. }) => {
                self.write(|s| s.set_auto_reply(channel_id, text));
                info!(channel_id, "auto-reply saved");
                #[cfg(feature = "metrics")]
                counter!(channel_metrics::AUTO_REPLY_SAVES_TOTAL).increment(1);
                self.status.success("Auto-reply saved.");
                Ok(())
            },
            Ok(AuthResult::Failed { message }) => {
                self.status
                    .error(format!("Could not save the auto-reply: {message}"));
                Err(Error::rejected(message))
            },
            Err(e) => {
                warn!(channel_id, error = %e, "saving auto-reply failed");
                self.status.error(SAVE_FAILED);
                Err(e)
            },
        }
    }
}

/// Look up a page and take its connect/disconnect guard.
fn reserve_page(
    store: &mut ConnectionStore,
    page_id: &str,
    needs_account: bool,
) -> std::result::Result<Page, ValidationError> {
    let page = store
        .page(page_id)
        .cloned()
        .ok_or_else(|| ValidationError::UnknownPage {
            page_id: page_id.to_string(),
        })?;
    if needs_account && page.messaging_account.is_none() {
        return Err(ValidationError::MissingMessagingAccount {
            page_id: page_id.to_string(),
        });
    }
    if !store.flags_mut().connecting.insert(page_id.to_string()) {
        return Err(ValidationError::OperationInFlight {
            entity: format!("page {page_id}"),
        });
    }
    Ok(page)
}

fn reserve_channel(
    store: &mut ConnectionStore,
    channel_id: i64,
) -> std::result::Result<Channel, ValidationError> {
    let channel = store
        .channel(channel_id)
        .cloned()
        .ok_or(ValidationError::UnknownChannel { channel_id })?;
    if !store.flags_mut().saving.insert(channel_id) {
        return Err(ValidationError::OperationInFlight {
            entity: format!("channel {channel_id}"),
        });
    }
    Ok(channel)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            navigator::{AutoConfirm, MemoryNavigator},
            status::StatusKind,
            testing::{FakeGateway, channel, page},
        },
        async_trait::async_trait,
        tokio::sync::Notify,
        url::Url,
    };

    struct Decline;

    #[async_trait]
    impl Confirm for Decline {
        async fn confirm(&self, _prompt: &str) -> bool {
            false
        }
    }

    fn navigator() -> Arc<MemoryNavigator> {
        Arc::new(MemoryNavigator::new(
            Url::parse("http://localhost:4200/channels").unwrap(),
        ))
    }

    fn new_controller(gateway: Arc<FakeGateway>) -> ChannelController {
        ChannelController::new(gateway, navigator())
    }

    async fn loaded(gateway: Arc<FakeGateway>) -> ChannelController {
        let controller = new_controller(gateway);
        controller.load_all().await.unwrap();
        controller
    }

    #[tokio::test]
    async fn load_replaces_collections_and_clears_flags() {
        let gateway = Arc::new(FakeGateway::with_pages(vec![page("1", true), page("2", true)]));
        gateway.channels.lock().unwrap().push(channel(5, "2"));
        let controller = loaded(gateway).await;

        let view = controller.snapshot();
        assert_eq!(view.pages.len(), 2);
        assert_eq!(view.channels.len(), 1);
        assert!(!view.is_loading());
        assert!(!view.pages[0].connected);
        assert!(view.pages[1].connected);
        assert!(view.status.is_none());
    }

    #[tokio::test]
    async fn load_failure_posts_generic_error_and_keeps_last_state() {
        let gateway = Arc::new(FakeGateway::with_pages(vec![page("1", true)]));
        let controller = loaded(Arc::clone(&gateway)).await;

        gateway.fail("available-pages");
        let err = controller.load_pages().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));

        let view = controller.snapshot();
        assert_eq!(view.pages.len(), 1);
        assert!(!view.flags.loading_pages);
        let status = view.status.unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.text, LOAD_PAGES_FAILED);
        assert!(!status.text.contains("internal error"));
    }

    #[tokio::test]
    async fn connect_marks_page_and_replaces_prior_error() {
        let gateway = Arc::new(FakeGateway::with_pages(vec![page("1", true)]));
        let controller = loaded(Arc::clone(&gateway)).await;
        controller.status_slot().error("earlier failure");

        controller.connect("1").await.unwrap();

        let view = controller.snapshot();
        assert!(view.pages[0].connected);
        assert!(!view.flags.is_connecting("1"));
        let status = view.status.unwrap();
        assert_eq!(status.kind, StatusKind::Success);
        assert!(status.text.contains("Page 1"));
        assert_eq!(gateway.calls("connect"), 1);
    }

    #[tokio::test]
    async fn connect_without_account_never_reaches_gateway() {
        let gateway = Arc::new(FakeGateway::with_pages(vec![page("1", false)]));
        let controller = loaded(Arc::clone(&gateway)).await;

        let err = controller.connect("1").await.unwrap_err();
        assert!(matches!(
            err.as_validation(),
            Some(ValidationError::MissingMessagingAccount { .. })
        ));
        assert_eq!(gateway.calls("connect"), 0);
        assert!(controller.status().unwrap().is_error());
        assert!(!controller.snapshot().flags.is_connecting("1"));
    }

    #[tokio::test]
    async fn duplicate_connect_issues_one_call() {
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(
            FakeGateway::with_pages(vec![page("1", true)]).gated(Arc::clone(&gate)),
        );
        let controller = loaded(Arc::clone(&gateway)).await;

        let (first, second) = tokio::join!(controller.connect("1"), async {
            let second = controller.connect("1").await;
            assert!(controller.snapshot().flags.is_connecting("1"));
            gate.notify_one();
            second
        });

        first.unwrap();
        assert!(matches!(
            second.unwrap_err().as_validation(),
            Some(ValidationError::OperationInFlight { .. })
        ));
        assert_eq!(gateway.calls("connect"), 1);
        assert!(!controller.snapshot().flags.is_connecting("1"));
        assert!(controller.snapshot().pages[0].connected);
    }

    #[tokio::test]
    async fn connect_transport_failure_clears_flag() {
        let gateway = Arc::new(FakeGateway::with_pages(vec![page("1", true)]));
        let controller = loaded(Arc::clone(&gateway)).await;
        gateway.fail("connect");

        assert!(matches!(
            controller.connect("1").await.unwrap_err(),
            Error::Transport(_)
        ));
        let view = controller.snapshot();
        assert!(!view.pages[0].connected);
        assert!(!view.flags.is_connecting("1"));
        assert_eq!(view.status.unwrap().text, CONNECT_FAILED);

        // Retry is user-driven and allowed.
        gateway.failing.lock().unwrap().clear();
        controller.connect("1").await.unwrap();
        assert_eq!(gateway.calls("connect"), 2);
    }

    #[tokio::test]
    async fn declined_connect_surfaces_backend_message() {
        let gateway = Arc::new(FakeGateway::with_pages(vec![page("1", true)]));
        *gateway.decline.lock().unwrap() = Some("webhook subscription failed".into());
        let controller = loaded(Arc::clone(&gateway)).await;

        let err = controller.connect("1").await.unwrap_err();
        assert!(matches!(err, Error::Rejected { .. }));
        assert!(
            controller
                .status()
                .unwrap()
                .text
                .contains("webhook subscription failed")
        );
        assert!(!controller.snapshot().pages[0].connected);
    }

    #[tokio::test]
    async fn unknown_page_is_validation_error() {
        let gateway = Arc::new(FakeGateway::with_pages(vec![]));
        let controller = loaded(Arc::clone(&gateway)).await;
        let err = controller.connect("nope").await.unwrap_err();
        assert!(matches!(
            err.as_validation(),
            Some(ValidationError::UnknownPage { .. })
        ));
        assert_eq!(gateway.calls("connect"), 0);
    }

    #[tokio::test]
    async fn disconnect_requires_confirmation() {
        let gateway = Arc::new(FakeGateway::with_pages(vec![page("1", true)]));
        gateway.channels.lock().unwrap().push(channel(5, "1"));
        let controller = loaded(Arc::clone(&gateway)).await;
        assert!(controller.snapshot().pages[0].can_disconnect());

        let outcome = controller.disconnect("1", &Decline).await.unwrap();
        assert_eq!(outcome, DisconnectOutcome::Declined);
        assert_eq!(gateway.calls("disconnect"), 0);
        assert!(!controller.snapshot().flags.is_connecting("1"));

        let outcome = controller.disconnect("1", &AutoConfirm).await.unwrap();
        assert_eq!(outcome, DisconnectOutcome::Disconnected);
        let view = controller.snapshot();
        assert!(!view.pages[0].connected);
        assert!(view.channels.is_empty());
        assert_eq!(view.status.unwrap().kind, StatusKind::Success);
    }

    #[tokio::test]
    async fn disconnect_while_connecting_is_rejected() {
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(
            FakeGateway::with_pages(vec![page("1", true)]).gated(Arc::clone(&gate)),
        );
        let controller = loaded(Arc::clone(&gateway)).await;

        let (connect, disconnect) = tokio::join!(controller.connect("1"), async {
            let result = controller.disconnect("1", &AutoConfirm).await;
            gate.notify_one();
            result
        });
        connect.unwrap();
        assert!(matches!(
            disconnect.unwrap_err().as_validation(),
            Some(ValidationError::OperationInFlight { .. })
        ));
        assert_eq!(gateway.calls("disconnect"), 0);
    }

    #[tokio::test]
    async fn whitespace_auto_reply_never_calls_gateway() {
        let gateway = Arc::new(FakeGateway::with_pages(vec![page("1", true)]));
        gateway.channels.lock().unwrap().push(channel(5, "1"));
        let controller = loaded(Arc::clone(&gateway)).await;

        let err = controller.save_auto_reply(5, "   ").await.unwrap_err();
        assert_eq!(err.as_validation(), Some(&ValidationError::EmptyAutoReply));
        assert_eq!(gateway.calls("save-auto-reply"), 0);
        let status = controller.status().unwrap();
        assert!(status.is_error());
        assert!(!controller.snapshot().flags.is_saving(5));
    }

    #[tokio::test]
    async fn saved_auto_reply_survives_reload() {
        let gateway = Arc::new(FakeGateway::with_pages(vec![page("1", true)]));
        gateway.channels.lock().unwrap().push(channel(5, "1"));
        let controller = loaded(Arc::clone(&gateway)).await;

        controller.save_auto_reply(5, "Hello!").await.unwrap();
        assert_eq!(
            controller.read(|s| s.channel(5).unwrap().auto_reply.clone()),
            Some("Hello!".into())
        );
        assert!(!controller.snapshot().flags.is_saving(5));

        let fresh = new_controller(Arc::clone(&gateway));
        fresh.load_channels().await.unwrap();
        assert_eq!(
            fresh.read(|s| s.channel(5).unwrap().auto_reply.clone()),
            Some("Hello!".into())
        );
    }

    #[tokio::test]
    async fn failed_save_keeps_previous_text() {
        let gateway = Arc::new(FakeGateway::with_pages(vec![]));
        gateway.channels.lock().unwrap().push(channel(5, "1"));
        let controller = loaded(Arc::clone(&gateway)).await;
        controller.save_auto_reply(5, "first").await.unwrap();

        gateway.fail("save-auto-reply");
        assert!(controller.save_auto_reply(5, "second").await.is_err());
        assert_eq!(
            controller.read(|s| s.channel(5).unwrap().auto_reply.clone()),
            Some("first".into())
        );
        assert_eq!(controller.status().unwrap().text, SAVE_FAILED);
        assert!(!controller.snapshot().flags.is_saving(5));
    }

    #[tokio::test]
    async fn start_authorization_redirects_once() {
        let gateway = Arc::new(FakeGateway::with_pages(vec![]));
        let nav = navigator();
        let controller = ChannelController::new(gateway.clone(), nav.clone());

        controller.start_authorization().await.unwrap();
        assert_eq!(nav.redirects().len(), 1);
        assert!(controller.snapshot().flags.authorizing);

        let err = controller.start_authorization().await.unwrap_err();
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::AuthorizationPending)
        );
        assert_eq!(gateway.calls("login-url"), 1);
        assert_eq!(nav.redirects().len(), 1);
    }

    #[tokio::test]
    async fn start_authorization_failure_allows_retry() {
        let gateway = Arc::new(FakeGateway::with_pages(vec![]));
        let nav = navigator();
        let controller = ChannelController::new(gateway.clone(), nav.clone());
        gateway.fail("login-url");

        assert!(controller.start_authorization().await.is_err());
        assert!(!controller.snapshot().flags.authorizing);
        assert_eq!(controller.status().unwrap().text, START_AUTH_FAILED);
        assert!(nav.redirects().is_empty());

        gateway.failing.lock().unwrap().clear();
        controller.start_authorization().await.unwrap();
        assert_eq!(nav.redirects().len(), 1);
    }

    #[tokio::test]
    async fn teardown_cancels_in_flight_calls() {
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(
            FakeGateway::with_pages(vec![page("1", true)]).gated(Arc::clone(&gate)),
        );
        let controller = loaded(Arc::clone(&gateway)).await;

        let (connect, ()) = tokio::join!(controller.connect("1"), async {
            controller.teardown();
        });
        assert!(matches!(connect.unwrap_err(), Error::Cancelled));
        assert!(!controller.read(|s| s.page("1").unwrap().connected));
        assert!(!controller.snapshot().flags.is_connecting("1"));
        assert!(controller.status().is_none());

        assert!(matches!(
            controller.load_all().await.unwrap_err(),
            Error::Cancelled
        ));
        assert_eq!(gateway.calls("available-pages"), 1);
    }

    #[test]
    fn capitalize_first_letter() {
        assert_eq!(capitalize("auto-reply text"), "Auto-reply text");
        assert_eq!(capitalize(""), "");
    }
}
