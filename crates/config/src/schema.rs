//! Config schema types.
//!
//! Every section is `#[serde(default)]` so a partial file only overrides what
//! it names.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PagelinkConfig {
    pub api: ApiConfig,
    pub meta: MetaConfig,
    pub status: StatusConfig,
    pub tenant: TenantConfig,
}

/// Remote backend the gateway client talks to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined onto (no trailing slash needed).
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
        }
    }
}

/// Authorization provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaConfig {
    /// Provider application identifier.
    pub app_id: String,
    /// Location the provider redirects back to once the handshake completes.
    pub callback_url: String,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            callback_url: "http://localhost:4200/channels".into(),
        }
    }
}

/// Lifetime of the status banner, per kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub success_ttl_ms: u64,
    pub error_ttl_ms: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            success_ttl_ms: 5_000,
            error_ttl_ms: 8_000,
        }
    }
}

/// Multi-tenant qualifier attached to backend requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantConfig {
    pub company_uuid: Option<String>,
}
