use std::collections::{BTreeSet, HashSet};

use {
    pagelink_client::{Channel, Page},
    tracing::warn,
};

/// Transient per-entity markers. Never persisted; each one is cleared on
/// the terminal outcome of the operation it guards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationFlags {
    pub loading_pages: bool,
    pub loading_channels: bool,
    /// Set between a successful login-URL redirect and the observed callback.
    pub authorizing: bool,
    /// Page ids with a connect or disconnect call in flight.
    pub connecting: BTreeSet<String>,
    /// Channel ids with an auto-reply save in flight.
    pub saving: BTreeSet<i64>,
}

impl OperationFlags {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading_pages || self.loading_channels
    }

    #[must_use]
    pub fn is_connecting(&self, page_id: &str) -> bool {
        self.connecting.contains(page_id)
    }

    #[must_use]
    pub fn is_saving(&self, channel_id: i64) -> bool {
        self.saving.contains(&channel_id)
    }
}

/// In-memory pages, channels and operation flags.
///
/// The `connected` bit of each page is derived: the backend's own flag (as
/// last reported or as changed by a successful connect/disconnect) or the
/// presence of a channel for that page id. A page without a messaging
/// account is never connected.
#[derive(Debug, Default)]
pub struct ConnectionStore {
    pages: Vec<Page>,
    channels: Vec<Channel>,
    server_linked: HashSet<String>,
    flags: OperationFlags,
}

impl ConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn flags(&self) -> &OperationFlags {
        &self.flags
    }

    pub(crate) fn flags_mut(&mut self) -> &mut OperationFlags {
        &mut self.flags
    }

    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == page_id)
    }

    pub fn channel(&self, channel_id: i64) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == channel_id)
    }

    pub fn channel_for_page(&self, page_id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.page_id == page_id)
    }

    /// Replace the page collection.
    pub fn apply_pages(&mut self, pages: Vec<Page>) {
        self.server_linked = pages
            .iter()
            .filter(|p| p.connected)
            .map(|p| p.id.clone())
            .collect();
        self.pages = pages;
        self.reconcile();
    }

    /// Replace the channel collection.
    pub fn apply_channels(&mut self, channels: Vec<Channel>) {
        self.channels = channels;
        self.reconcile();
    }

    /// Returns `false` when the page is not known.
    pub fn mark_connected(&mut self, page_id: &str) -> bool {
        let Some(page) = self.pages.iter_mut().find(|p| p.id == page_id) else {
            return false;
        };
        if page.messaging_account.is_none() {
            warn!(page_id, "refusing to mark page without messaging account as connected");
            return false;
        }
        page.connected = true;
        self.server_linked.insert(page_id.to_string());
        true
    }

    /// Marks the page disconnected and drops any channel linked to it.
    /// Returns `false` when the page is not known.
    pub fn mark_disconnected(&mut self, page_id: &str) -> bool {
        self.server_linked.remove(page_id);
        self.channels.retain(|c| c.page_id != page_id);
        match self.pages.iter_mut().find(|p| p.id == page_id) {
            Some(page) => {
                page.connected = false;
                true
            },
            None => false,
        }
    }

    /// Returns `false` when the channel is not known.
    pub fn set_auto_reply(&mut self, channel_id: i64, text: &str) -> bool {
        match self.channels.iter_mut().find(|c| c.id == channel_id) {
            Some(channel) => {
                channel.auto_reply = Some(text.to_string());
                true
            },
            None => false,
        }
    }

    fn reconcile(&mut self) {
        let linked: HashSet<&str> = self.channels.iter().map(|c| c.page_id.as_str()).collect();
        for page in &mut self.pages {
            let connected =
                self.server_linked.contains(&page.id) || linked.contains(page.id.as_str());
            if connected && page.messaging_account.is_none() {
                warn!(page_id = %page.id, "page reported linked without a messaging account");
                page.connected = false;
            } else {
                page.connected = connected;
            }
        }
    }
}
