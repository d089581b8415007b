use std::sync::{Arc, RwLock};

use {
    async_trait::async_trait,
    reqwest::{Client, Method},
    secrecy::ExposeSecret,
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    tracing::{debug, warn},
    url::Url,
};

#[cfg(feature = "metrics")]
use pagelink_metrics::{counter, gateway as gw_metrics, histogram, labels};

use crate::{
    Error, Result,
    gateway::Gateway,
    tenant::TenantStore,
    types::{AuthResult, Channel, ChannelKind, Page},
};

/// [`Gateway`] backed by the channel backend's HTTP API.
///
/// The tenant qualifier is explicit state: it is fixed at construction and
/// only changes through [`HttpGateway::set_company_uuid`].
pub struct HttpGateway {
    client: Client,
    base_url: String,
    company_uuid: Arc<RwLock<String>>,
    tenant_store: Option<TenantStore>,
}

#[derive(Deserialize)]
struct LoginUrlResponse {
    #[serde(rename = "loginUrl")]
    login_url: String,
}

/// `/channels/available` answers either a bare list or `{ "pages": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum PagesPayload {
    List(Vec<Page>),
    Wrapped { pages: Vec<Page> },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectRequest<'a> {
    page_id: &'a str,
    name: &'a str,
    instagram_id: Option<&'a str>,
    access_token: Option<&'a str>,
}

#[derive(Serialize)]
struct AutoReplyRequest<'a> {
    #[serde(rename = "PageID")]
    page_id: &'a str,
    #[serde(rename = "PageType")]
    page_type: ChannelKind,
    #[serde(rename = "WelcomeMessage")]
    welcome_message: &'a str,
}

#[derive(Serialize)]
struct CallbackRequest<'a> {
    code: &'a str,
    state: &'a str,
}

impl HttpGateway {
    pub fn new(base_url: &str, company_uuid: impl Into<String>) -> Result<Self> {
        Self::with_client(Client::new(), base_url, company_uuid)
    }

    pub fn with_client(
        client: Client,
        base_url: &str,
        company_uuid: impl Into<String>,
    ) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|source| Error::InvalidUrl {
            url: base_url.clone(),
            source,
        })?;
        Ok(Self {
            client,
            base_url,
            company_uuid: Arc::new(RwLock::new(company_uuid.into())),
            tenant_store: None,
        })
    }

    /// Persist tenant changes made through [`HttpGateway::set_company_uuid`].
    #[must_use]
    pub fn with_tenant_store(mut self, store: TenantStore) -> Self {
        self.tenant_store = Some(store);
        self
    }

    pub fn company_uuid(&self) -> String {
        self.company_uuid
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The single update entry point for the tenant qualifier.
    pub fn set_company_uuid(&self, company_uuid: &str) -> Result<()> {
        let company_uuid = company_uuid.trim();
        *self
            .company_uuid
            .write()
            .unwrap_or_else(|e| e.into_inner()) = company_uuid.to_string();
        if let Some(store) = &self.tenant_store {
            store.save(company_uuid)?;
        }
        debug!(company_uuid, "tenant updated");
        Ok(())
    }

    fn url(&self, path: &str) -> Result<Url> {
        let raw = format!("{}{path}", self.base_url);
        let mut url = Url::parse(&raw).map_err(|source| Error::InvalidUrl { url: raw, source })?;
        let company_uuid = self.company_uuid();
        if !company_uuid.is_empty() {
            url.query_pairs_mut()
                .append_pair("company_uuid", &company_uuid);
        }
        Ok(url)
    }

    async fn request<B: Serialize + ?Sized>(
        &self,
        endpoint: &'static str,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<String> {
        let url = self.url(path)?;
        let mut req = self
            .client
            .request(method.clone(), url)
            .header("Accept", "application/json");
        if let Some(body) = body {
            req = req.json(body);
        }

        #[cfg(feature = "metrics")]
        let started = std::time::Instant::now();
        #[cfg(feature = "metrics")]
        counter!(gw_metrics::REQUESTS_TOTAL, labels::ENDPOINT => endpoint).increment(1);

        let result = match req.send().await {
            Ok(resp) => {
                let status = resp.status();
                match resp.text().await {
                    Err(e) => {
                        warn!(endpoint, %method, status = status.as_u16(), error = %e, "reading gateway response failed");
                        Err(Error::transport(endpoint, Some(status.as_u16()), e))
                    },
                    Ok(text) if status.is_success() => {
                        debug!(endpoint, %method, status = status.as_u16(), "gateway request ok");
                        Ok(text)
                    },
                    Ok(text) => {
                        warn!(endpoint, %method, status = status.as_u16(), body = %text, "gateway request rejected");
                        Err(Error::transport(endpoint, Some(status.as_u16()), text))
                    },
                }
            },
            Err(e) => {
                warn!(endpoint, %method, error = %e, "gateway request failed");
                Err(Error::transport(endpoint, None, e))
            },
        };

        #[cfg(feature = "metrics")]
        {
            histogram!(gw_metrics::REQUEST_DURATION_SECONDS, labels::ENDPOINT => endpoint)
                .record(started.elapsed().as_secs_f64());
            if result.is_err() {
                counter!(gw_metrics::ERRORS_TOTAL, labels::ENDPOINT => endpoint).increment(1);
            }
        }

        result
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str, path: &str) -> Result<T> {
        let body = self
            .request::<()>(endpoint, Method::GET, path, None)
            .await?;
        serde_json::from_str(&body).map_err(|source| Error::Decode { endpoint, source })
    }

    async fn auth_call<B: Serialize + ?Sized>(
        &self,
        endpoint: &'static str,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<AuthResult> {
        let body = self.request(endpoint, method, path, body).await?;
        let result = AuthResult::from_body(&body);
        if let AuthResult::Failed { message } = &result {
            warn!(endpoint, reason = %message, "backend declined request");
        }
        Ok(result)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn fetch_login_url(&self) -> Result<Url> {
        let resp: LoginUrlResponse = self.get_json("login-url", "/auth/meta/login-url").await?;
        Url::parse(&resp.login_url).map_err(|source| Error::InvalidUrl {
            url: resp.login_url,
            source,
        })
    }

    async fn fetch_available_pages(&self) -> Result<Vec<Page>> {
        let payload: PagesPayload = self.get_json("available-pages", "/channels/available").await?;
        Ok(match payload {
            PagesPayload::List(pages) | PagesPayload::Wrapped { pages } => pages,
        })
    }

    async fn fetch_connected_channels(&self) -> Result<Vec<Channel>> {
        self.get_json("channels", "/channels").await
    }

    async fn connect_page(&self, page: &Page) -> Result<AuthResult> {
        let body = ConnectRequest {
            page_id: &page.id,
            name: &page.name,
            instagram_id: page.messaging_account.as_ref().map(|a| a.id.as_str()),
            access_token: page
                .access_token
                .as_ref()
                .map(|t| t.expose_secret().as_str()),
        };
        self.auth_call("connect", Method::POST, "/channels/connect", Some(&body))
            .await
    }

    async fn disconnect_page(&self, page_id: &str) -> Result<AuthResult> {
        let path = format!("/channels/disconnect/{}", urlencoding::encode(page_id));
        self.auth_call::<()>("disconnect", Method::DELETE, &path, None)
            .await
    }

    async fn save_auto_reply(
        &self,
        page_id: &str,
        kind: ChannelKind,
        text: &str,
    ) -> Result<AuthResult> {
        let body = AutoReplyRequest {
            page_id,
            page_type: kind,
            welcome_message: text,
        };
        self.auth_call(
            "save-auto-reply",
            Method::POST,
            "/channels/save_auto_reply",
            Some(&body),
        )
        .await
    }

    async fn submit_oauth_callback(&self, code: &str, state: &str) -> Result<AuthResult> {
        let body = CallbackRequest { code, state };
        self.auth_call("oauth-callback", Method::POST, "/auth/meta/callback", Some(&body))
            .await
    }

    fn set_company_uuid(&self, company_uuid: &str) -> Result<()> {
        HttpGateway::set_company_uuid(self, company_uuid)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_base_url() {
        let err = HttpGateway::new("not a url", "").err().unwrap();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn url_appends_tenant_only_when_set() {
        let gw = HttpGateway::new("https://api.example.com/", "").unwrap();
        assert_eq!(
            gw.url("/channels").unwrap().as_str(),
            "https://api.example.com/channels"
        );

        gw.set_company_uuid("acme-42").unwrap();
        assert_eq!(
            gw.url("/channels").unwrap().as_str(),
            "https://api.example.com/channels?company_uuid=acme-42"
        );
    }

    #[test]
    fn url_keeps_base_path_prefix() {
        let gw = HttpGateway::new("https://example.com/api", "").unwrap();
        assert_eq!(
            gw.url("/channels/available").unwrap().path(),
            "/api/channels/available"
        );
    }

    #[test]
    fn set_company_uuid_persists_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = TenantStore::with_path(dir.path().join("tenant.json"));
        let gw = HttpGateway::new("https://api.example.com", "")
            .unwrap()
            .with_tenant_store(store.clone());

        gw.set_company_uuid(" acme ").unwrap();
        assert_eq!(gw.company_uuid(), "acme");
        assert_eq!(store.load().as_deref(), Some("acme"));
    }

    #[test]
    fn auto_reply_body_uses_backend_field_names() {
        let body = AutoReplyRequest {
            page_id: "1",
            page_type: ChannelKind::Instagram,
            welcome_message: "Hello!",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "PageID": "1", "PageType": "instagram", "WelcomeMessage": "Hello!" })
        );
    }
}
