use {async_trait::async_trait, url::Url};

use crate::{
    Result,
    types::{AuthResult, Channel, ChannelKind, Page},
};

/// Remote capabilities of the channel backend.
///
/// Implementations never retry; every failure reaches the caller unchanged.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Provider-hosted authorization URL to send the operator to.
    async fn fetch_login_url(&self) -> Result<Url>;

    /// Candidate pages with their linkage state as known server-side.
    async fn fetch_available_pages(&self) -> Result<Vec<Page>>;

    /// Channels already established.
    async fn fetch_connected_channels(&self) -> Result<Vec<Channel>>;

    /// Ask the backend to establish a channel for `page`.
    async fn connect_page(&self, page: &Page) -> Result<AuthResult>;

    /// Remove the channel linked to `page_id`.
    async fn disconnect_page(&self, page_id: &str) -> Result<AuthResult>;

    /// Persist the automated-reply text. The backend keys reply settings by
    /// the page id of the channel.
    async fn save_auto_reply(
        &self,
        page_id: &str,
        kind: ChannelKind,
        text: &str,
    ) -> Result<AuthResult>;

    /// Exchange an authorization code when the provider redirected to this
    /// client instead of the backend.
    async fn submit_oauth_callback(&self, code: &str, state: &str) -> Result<AuthResult>;

    /// Replace the tenant qualifier attached to later requests.
    fn set_company_uuid(&self, _company_uuid: &str) -> Result<()> {
        Ok(())
    }
}
