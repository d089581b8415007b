//! In-memory gateway for controller and reconciler tests.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use {
    async_trait::async_trait,
    pagelink_client::{AuthResult, Channel, ChannelKind, Error, Gateway, Page, Result},
    serde_json::json,
    tokio::sync::Notify,
    url::Url,
};

pub(crate) fn page(id: &str, with_account: bool) -> Page {
    let mut value = json!({ "id": id, "name": format!("Page {id}"), "access_token": "tok" });
    if with_account {
        value["instagram_business_account"] = json!({ "id": format!("ig{id}"), "username": "shop" });
    }
    serde_json::from_value(value).unwrap()
}

pub(crate) fn channel(id: i64, page_id: &str) -> Channel {
    serde_json::from_value(json!({
        "id": id,
        "facebookPageId": page_id,
        "facebookPageName": format!("Page {page_id}"),
        "instagramUsername": "shop",
        "connectedAt": "2026-01-01T00:00:00Z"
    }))
    .unwrap()
}

/// Behaves like a small backend: connect creates a channel, disconnect
/// removes it, saves are visible on the next channel fetch.
#[derive(Default)]
pub(crate) struct FakeGateway {
    pub pages: Mutex<Vec<Page>>,
    pub channels: Mutex<Vec<Channel>>,
    pub login_url: Mutex<Option<Url>>,
    /// Endpoints answering with a 500.
    pub failing: Mutex<HashSet<&'static str>>,
    /// When set, mutating calls answer with this declined result.
    pub decline: Mutex<Option<String>>,
    pub callback_result: Mutex<Option<AuthResult>>,
    pub tenant: Mutex<String>,
    /// When present, connect and disconnect wait for a notification.
    pub gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeGateway {
    pub fn with_pages(pages: Vec<Page>) -> Self {
        Self {
            pages: Mutex::new(pages),
            login_url: Mutex::new(Some(
                Url::parse("https://www.facebook.com/dialog/oauth?client_id=1").unwrap(),
            )),
            ..Self::default()
        }
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn fail(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().insert(endpoint);
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == endpoint)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn enter(&self, endpoint: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(endpoint);
        if self.failing.lock().unwrap().contains(endpoint) {
            return Err(Error::transport(endpoint, Some(500), "internal error"));
        }
        Ok(())
    }

    fn declined(&self) -> Option<AuthResult> {
        self.decline
            .lock()
            .unwrap()
            .clone()
            .map(|message| AuthResult::Failed { message })
    }

    async fn wait_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn fetch_login_url(&self) -> Result<Url> {
        self.enter("login-url")?;
        self.login_url
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::transport("login-url", Some(404), "not configured"))
    }

    async fn fetch_available_pages(&self) -> Result<Vec<Page>> {
        self.enter("available-pages")?;
        Ok(self.pages.lock().unwrap().clone())
    }

    async fn fetch_connected_channels(&self) -> Result<Vec<Channel>> {
        self.enter("channels")?;
        Ok(self.channels.lock().unwrap().clone())
    }

    async fn connect_page(&self, page: &Page) -> Result<AuthResult> {
        self.enter("connect")?;
        self.wait_gate().await;
        if let Some(declined) = self.declined() {
            return Ok(declined);
        }
        let mut channels = self.channels.lock().unwrap();
        let id = channels.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        channels.push(channel(id, &page.id));
        Ok(AuthResult::Ok { message: None })
    }

    async fn disconnect_page(&self, page_id: &str) -> Result<AuthResult> {
        self.enter("disconnect")?;
        self.wait_gate().await;
        if let Some(declined) = self.declined() {
            return Ok(declined);
        }
        self.channels.lock().unwrap().retain(|c| c.page_id != page_id);
        Ok(AuthResult::Ok { message: None })
    }

    async fn save_auto_reply(
        &self,
        page_id: &str,
        kind: ChannelKind,
        text: &str,
    ) -> Result<AuthResult> {
        self.enter("save-auto-reply")?;
        if let Some(declined) = self.declined() {
            return Ok(declined);
        }
        for c in self.channels.lock().unwrap().iter_mut() {
            if c.page_id == page_id && c.kind == kind {
                c.auto_reply = Some(text.to_string());
            }
        }
        Ok(AuthResult::Ok { message: None })
    }

    async fn submit_oauth_callback(&self, _code: &str, _state: &str) -> Result<AuthResult> {
        self.enter("oauth-callback")?;
        Ok(self
            .callback_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(AuthResult::Ok { message: None }))
    }

    fn set_company_uuid(&self, company_uuid: &str) -> Result<()> {
        *self.tenant.lock().unwrap() = company_uuid.to_string();
        Ok(())
    }
}
