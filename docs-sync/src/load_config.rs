//! `load_config`: loads the static YAML config and injects environment secrets.
//!
//! This module is the only place where user-supplied YAML is parsed and mapped
//! to the strongly-typed core [`SyncConfig`].
//!
//! # Responsibilities
//! - Parse the YAML file into intermediate (file-side) structs
//! - Map them onto core types (`SyncConfig`, `RetryPolicy`, `TableTarget`)
//! - Read `README_API_KEY` (required) and `README_API_BASE_URL` (optional)
//! - Validate the result before any remote call is made
//!
//! # Errors
//! All errors are `anyhow::Error` with enough context to be printed at the CLI boundary.

use anyhow::{Context, Result};
use docs_sync_core::config::{CategoryLayout, RetryPolicy, SyncConfig, TableTarget};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

use crate::client::{ApiSettings, DEFAULT_BASE_URL};
use crate::rdme::RdmeSettings;

pub const API_KEY_VAR: &str = "README_API_KEY";
pub const BASE_URL_VAR: &str = "README_API_BASE_URL";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CategorySection {
    guides: Vec<String>,
    reference: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RetrySection {
    max_attempts: u32,
    delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            delay_ms: policy.delay.as_millis() as u64,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TableSection {
    name: String,
    source_dir: PathBuf,
    index_file: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    base_version: String,
    openapi_path: PathBuf,
    guides_dir: PathBuf,
    reference_dir: PathBuf,
    #[serde(default)]
    categories: CategorySection,
    #[serde(default)]
    retry: RetrySection,
    #[serde(default)]
    tables: Vec<TableSection>,
    #[serde(default)]
    rdme: RdmeSettings,
}

/// Everything the CLI needs to build a synchroniser.
#[derive(Debug)]
pub struct CliConfig {
    pub sync: SyncConfig,
    pub api: ApiSettings,
    pub rdme: RdmeSettings,
}

/// Loads a static YAML config file (no secrets) and injects required env vars for secrets.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let api_key = match std::env::var(API_KEY_VAR) {
        Ok(key) if !key.trim().is_empty() => {
            info!("{API_KEY_VAR} found in env");
            key
        }
        Ok(_) => {
            error!("{API_KEY_VAR} is set but empty");
            anyhow::bail!("{API_KEY_VAR} environment variable is empty");
        }
        Err(e) => {
            error!(error = ?e, "{API_KEY_VAR} environment variable not set");
            return Err(anyhow::anyhow!(
                "{API_KEY_VAR} environment variable not set: {e}"
            ));
        }
    };
    let base_url = std::env::var(BASE_URL_VAR).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

    let sync = SyncConfig {
        base_version: raw.base_version,
        categories: CategoryLayout {
            guides: raw.categories.guides,
            reference: raw.categories.reference,
        },
        openapi_path: raw.openapi_path,
        guides_dir: raw.guides_dir,
        reference_dir: raw.reference_dir,
        retry: RetryPolicy {
            max_attempts: raw.retry.max_attempts,
            delay: Duration::from_millis(raw.retry.delay_ms),
        },
        tables: raw
            .tables
            .into_iter()
            .map(|t| TableTarget {
                name: t.name,
                source_dir: t.source_dir,
                index_file: t.index_file,
            })
            .collect(),
    };
    sync.validate()
        .with_context(|| format!("Invalid config in {}", path_ref.display()))?;
    sync.trace_loaded();

    info!(base_url = %base_url, rdme_command = %raw.rdme.command, "Config loaded and merged successfully");

    Ok(CliConfig {
        sync,
        api: ApiSettings { base_url, api_key },
        rdme: raw.rdme,
    })
}
