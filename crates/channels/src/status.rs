use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    tokio::time::Instant,
    tokio_util::sync::CancellationToken,
    tracing::debug,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

/// The single user-facing banner. It carries its own expiry so readers can
/// tell whether it is still live without relying on the dismiss task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
    pub expires_at: Instant,
}

impl StatusMessage {
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }

    #[must_use]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// How long each kind of message stays up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTtl {
    pub success: Duration,
    pub error: Duration,
}

impl StatusTtl {
    #[must_use]
    pub fn from_millis(success_ms: u64, error_ms: u64) -> Self {
        Self {
            success: Duration::from_millis(success_ms),
            error: Duration::from_millis(error_ms),
        }
    }

    fn for_kind(&self, kind: StatusKind) -> Duration {
        match kind {
            StatusKind::Success => self.success,
            StatusKind::Error => self.error,
        }
    }
}

impl Default for StatusTtl {
    fn default() -> Self {
        Self::from_millis(5_000, 8_000)
    }
}

#[derive(Default)]
struct SlotState {
    current: Option<StatusMessage>,
    dismiss: Option<CancellationToken>,
}

/// Holder for the active [`StatusMessage`].
///
/// Posting replaces the previous message of either kind and cancels its
/// pending dismissal. Dismissal runs on tokio time, so paused-clock tests can
/// drive it with `tokio::time::advance`.
#[derive(Clone)]
pub struct StatusSlot {
    state: Arc<Mutex<SlotState>>,
    ttl: StatusTtl,
}

impl StatusSlot {
    pub fn new(ttl: StatusTtl) -> Self {
        Self {
            state: Arc::new(Mutex::new(SlotState::default())),
            ttl,
        }
    }

    pub fn success(&self, text: impl Into<String>) -> StatusMessage {
        self.post(StatusKind::Success, text.into())
    }

    pub fn error(&self, text: impl Into<String>) -> StatusMessage {
        self.post(StatusKind::Error, text.into())
    }

    pub fn post(&self, kind: StatusKind, text: String) -> StatusMessage {
        // The cause is logged where the failure happened.
        debug!(?kind, status = %text, "status posted");

        let message = StatusMessage {
            kind,
            text,
            expires_at: Instant::now() + self.ttl.for_kind(kind),
        };
        let token = CancellationToken::new();
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(previous) = state.dismiss.replace(token.clone()) {
                previous.cancel();
            }
            state.current = Some(message.clone());
        }

        // Without a runtime the message still lapses through `current()`.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let state = Arc::clone(&self.state);
            let expires_at = message.expires_at;
            handle.spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => {},
                    _ = tokio::time::sleep_until(expires_at) => {
                        let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
                        if !token.is_cancelled() {
                            state.current = None;
                            state.dismiss = None;
                            debug!("status dismissed");
                        }
                    },
                }
            });
        }

        message
    }

    /// The live message, if any.
    pub fn current(&self) -> Option<StatusMessage> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .current
            .as_ref()
            .filter(|m| !m.is_expired_at(Instant::now()))
            .cloned()
    }

    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(token) = state.dismiss.take() {
            token.cancel();
        }
        state.current = None;
    }
}

impl std::fmt::Debug for StatusSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusSlot")
            .field("current", &self.current())
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn slot() -> StatusSlot {
        StatusSlot::new(StatusTtl::from_millis(1_000, 3_000))
    }

    #[tokio::test(start_paused = true)]
    async fn success_expires_after_ttl() {
        let slot = slot();
        slot.success("saved");
        assert_eq!(slot.current().unwrap().text, "saved");

        tokio::time::advance(Duration::from_millis(999)).await;
        assert!(slot.current().is_some());

        tokio::time::advance(Duration::from_millis(2)).await;
        assert!(slot.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn new_message_replaces_previous_and_its_timer() {
        let slot = slot();
        slot.error("failed");
        tokio::time::advance(Duration::from_millis(2_500)).await;

        slot.success("connected");
        let current = slot.current().unwrap();
        assert_eq!(current.kind, StatusKind::Success);
        assert_eq!(current.text, "connected");

        // The error's dismissal would have fired here; the success must survive it.
        tokio::time::advance(Duration::from_millis(600)).await;
        tokio::task::yield_now().await;
        assert_eq!(slot.current().unwrap().text, "connected");

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(slot.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn errors_live_longer_than_successes() {
        let slot = slot();
        let message = slot.error("boom");
        assert!(message.is_error());
        tokio::time::advance(Duration::from_millis(2_000)).await;
        assert!(slot.current().is_some());
        tokio::time::advance(Duration::from_millis(1_000)).await;
        assert!(slot.current().is_none());
    }

    /// Records the level of every event it sees.
    #[derive(Clone, Default)]
    struct LevelRecorder(Arc<Mutex<Vec<tracing::Level>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LevelRecorder {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            self.0.lock().unwrap().push(*event.metadata().level());
        }
    }

    #[test]
    fn posting_an_error_stays_below_warn() {
        use tracing_subscriber::layer::SubscriberExt;

        let recorder = LevelRecorder::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());
        tracing::subscriber::with_default(subscriber, || {
            let slot = StatusSlot::new(StatusTtl::default());
            slot.error("Could not connect the page.");
            slot.success("Page connected.");
        });

        let levels = recorder.0.lock().unwrap();
        assert!(!levels.is_empty());
        assert!(levels.iter().all(|level| *level == tracing::Level::DEBUG));
    }

    #[test]
    fn works_without_runtime() {
        let slot = StatusSlot::new(StatusTtl::default());
        slot.success("ok");
        assert!(slot.current().is_some());
        slot.clear();
        assert!(slot.current().is_none());
    }
}
