//! Default configuration constants used across the connector.

/// Address of a local development server.
pub const DEFAULT_VAULT_ADDRESS: &str = "http://127.0.0.1:8200";

/// Per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Users read per paging call.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Config file name used by `config init`.
pub const DEFAULT_CONFIG_FILE: &str = "vault-connector.json";

/// Tracing target of this crate.
pub const LOG_TARGET: &str = "vault_connector";
