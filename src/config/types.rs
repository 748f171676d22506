use super::defaults::*;
use crate::bootstrap::BackendMount;
use serde::{Deserialize, Serialize};

// ============================================================================
// Vault
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultConfig {
    /// Server address, e.g. `http://127.0.0.1:8200`.
    #[serde(default = "default_vault_address")]
    pub address: String,
    pub token: Option<String>,
    /// Vault Enterprise namespace sent with every request.
    pub namespace: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: default_vault_address(),
            token: None,
            namespace: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ============================================================================
// Sync
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Users read per call when paging the userpass listing.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

// ============================================================================
// Logging
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Silent,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    /// Filter directive for this crate's targets.
    pub fn directive(&self) -> String {
        let level = match self {
            LoggingLevel::Silent => "off",
            LoggingLevel::Error => "error",
            LoggingLevel::Warn => "warn",
            LoggingLevel::Info => "info",
            LoggingLevel::Debug => "debug",
            LoggingLevel::Trace => "trace",
        };
        format!("{LOG_TARGET}={level}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LoggingLevel,
    /// Emit one JSON object per event instead of human-readable lines.
    #[serde(default)]
    pub json: bool,
}

// ============================================================================
// Backends
// ============================================================================

pub(super) fn default_backends() -> Vec<BackendMount> {
    BackendMount::defaults()
}

fn default_vault_address() -> String {
    DEFAULT_VAULT_ADDRESS.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
