use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, warn};

use crate::{Error, Result, env_subst::substitute_env, schema::PagelinkConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "pagelink.toml",
    "pagelink.yaml",
    "pagelink.yml",
    "pagelink.json",
];

/// Override for the config directory, set via `set_config_dir()`.
static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Set a custom config directory. When set, discovery only looks there and
/// the tenant store lives there too. Each call replaces the previous override.
pub fn set_config_dir(path: PathBuf) {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner()) = Some(path);
}

/// Clear the config directory override, restoring default discovery.
pub fn clear_config_dir() {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner()) = None;
}

fn config_dir_override() -> Option<PathBuf> {
    CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}

/// Returns the config directory: the override if set, else `~/.config/pagelink/`.
pub fn config_dir() -> Option<PathBuf> {
    config_dir_override().or_else(|| {
        directories::ProjectDirs::from("", "", "pagelink").map(|d| d.config_dir().to_path_buf())
    })
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<PagelinkConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations, then apply env overrides.
///
/// Search order:
/// 1. the override directory, exclusively, when one is set
/// 2. `./pagelink.{toml,yaml,yml,json}` (project-local)
/// 3. `~/.config/pagelink/pagelink.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `PagelinkConfig::default()` if no file is found or it fails
/// to parse.
pub fn discover_and_load() -> PagelinkConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                PagelinkConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            PagelinkConfig::default()
        },
    };
    apply_env_overrides(&mut config);
    config
}

/// Override individual fields from `PAGELINK_*` environment variables.
pub fn apply_env_overrides(config: &mut PagelinkConfig) {
    apply_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_overrides_with(config: &mut PagelinkConfig, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = lookup("PAGELINK_API_URL") {
        config.api.base_url = v;
    }
    if let Some(v) = lookup("PAGELINK_META_APP_ID") {
        config.meta.app_id = v;
    }
    if let Some(v) = lookup("PAGELINK_CALLBACK_URL") {
        config.meta.callback_url = v;
    }
    if let Some(v) = lookup("PAGELINK_COMPANY_UUID") {
        config.tenant.company_uuid = Some(v);
    }
}

fn find_config_file() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        return first_existing(&dir);
    }
    first_existing(Path::new(".")).or_else(|| config_dir().and_then(|dir| first_existing(&dir)))
}

fn first_existing(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

fn parse_config(raw: &str, path: &Path) -> Result<PagelinkConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}
