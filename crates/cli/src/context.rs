use std::sync::Arc;

use {
    anyhow::{Context as _, Result},
    pagelink_channels::{ChannelController, Navigator, StatusTtl},
    pagelink_client::{HttpGateway, TenantStore},
    pagelink_config::PagelinkConfig,
    tracing::debug,
    url::Url,
};

/// Where the effective tenant id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantSource {
    Flag,
    Config,
    Stored,
    Unset,
}

/// Everything a command needs: loaded configuration and a gateway carrying
/// the resolved tenant.
pub struct Context {
    pub config: PagelinkConfig,
    pub gateway: Arc<HttpGateway>,
    pub tenant_source: TenantSource,
}

impl Context {
    pub fn load(company_uuid: Option<String>) -> Result<Self> {
        Self::build(
            pagelink_config::discover_and_load(),
            company_uuid,
            TenantStore::new(),
        )
    }

    fn build(config: PagelinkConfig, flag: Option<String>, store: TenantStore) -> Result<Self> {
        let (company_uuid, tenant_source) = resolve_company_uuid(
            flag.as_deref(),
            config.tenant.company_uuid.as_deref(),
            || store.load(),
        );
        let gateway = HttpGateway::new(&config.api.base_url, company_uuid)
            .with_context(|| format!("invalid api.base_url {:?}", config.api.base_url))?
            .with_tenant_store(store);
        debug!(base_url = %config.api.base_url, ?tenant_source, "gateway configured");

        Ok(Self {
            config,
            gateway: Arc::new(gateway),
            tenant_source,
        })
    }

    pub fn callback_url(&self) -> Result<Url> {
        Url::parse(&self.config.meta.callback_url)
            .with_context(|| format!("invalid meta.callback_url {:?}", self.config.meta.callback_url))
    }

    pub fn status_ttl(&self) -> StatusTtl {
        StatusTtl::from_millis(
            self.config.status.success_ttl_ms,
            self.config.status.error_ttl_ms,
        )
    }

    pub fn controller(&self, navigator: Arc<dyn Navigator>) -> ChannelController {
        ChannelController::with_status_ttl(self.gateway.clone(), navigator, self.status_ttl())
    }
}

/// Tenant precedence: command-line flag, then env/config, then the stored
/// value, else empty.
pub fn resolve_company_uuid(
    flag: Option<&str>,
    configured: Option<&str>,
    stored: impl FnOnce() -> Option<String>,
) -> (String, TenantSource) {
    let non_empty = |v: &&str| !v.trim().is_empty();
    if let Some(v) = flag.filter(non_empty) {
        return (v.trim().to_string(), TenantSource::Flag);
    }
    if let Some(v) = configured.filter(non_empty) {
        return (v.trim().to_string(), TenantSource::Config);
    }
    match stored() {
        Some(v) => (v, TenantSource::Stored),
        None => (String::new(), TenantSource::Unset),
    }
}
