//! Configuration loading and env substitution.
//!
//! Config files: `pagelink.toml`, `pagelink.yaml`, or `pagelink.json`
//! Searched in `./` then `~/.config/pagelink/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw
//! file before parsing.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, clear_config_dir, config_dir, discover_and_load, load_config,
        set_config_dir,
    },
    schema::{ApiConfig, MetaConfig, PagelinkConfig, StatusConfig, TenantConfig},
};
