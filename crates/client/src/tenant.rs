use std::path::PathBuf;

use {
    serde::{Deserialize, Serialize},
    tracing::{debug, info, warn},
};

use crate::Result;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TenantFile {
    #[serde(default)]
    company_uuid: String,
}

/// File-based storage for the multi-tenant identifier, at
/// `~/.config/pagelink/tenant.json`.
#[derive(Debug, Clone)]
pub struct TenantStore {
    path: PathBuf,
}

impl TenantStore {
    pub fn new() -> Self {
        let dir = pagelink_config::config_dir().unwrap_or_else(|| PathBuf::from(".config/pagelink"));
        Self {
            path: dir.join("tenant.json"),
        }
    }

    /// Create a tenant store at a specific path (useful for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Stored identifier, or `None` when nothing (or an empty value) was saved.
    pub fn load(&self) -> Option<String> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "tenant file not found");
                return None;
            },
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "tenant file read failed");
                return None;
            },
        };

        match serde_json::from_str::<TenantFile>(&data) {
            Ok(file) if !file.company_uuid.trim().is_empty() => Some(file.company_uuid),
            Ok(_) => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "tenant file parse failed");
                None
            },
        }
    }

    pub fn save(&self, company_uuid: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_string_pretty(&TenantFile {
            company_uuid: company_uuid.to_string(),
        })?;
        std::fs::write(&self.path, data)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        info!(path = %self.path.display(), "tenant saved");
        Ok(())
    }
}

impl Default for TenantStore {
    fn default() -> Self {
        Self::new()
    }
}
