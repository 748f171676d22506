mod defaults;
mod io;
mod types;
mod validation;

pub use defaults::*;
pub use io::*;
pub use types::*;
pub use validation::*;

use crate::bootstrap::BackendMount;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level connector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    /// Backends mounted by the bootstrap before the first sync.
    #[serde(default = "default_backends")]
    pub backends: Vec<BackendMount>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file, environment, and defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        Self::load_from(Self::locate(path).as_deref())
    }

    /// The file configuration is read from: `path` when given, otherwise the
    /// first standard location that exists. `None` means built-in defaults.
    pub fn locate(path: Option<&str>) -> Option<PathBuf> {
        path.map(PathBuf::from).or_else(find_config_file)
    }

    /// Read `source` (or defaults when `None`) and apply environment
    /// overrides. Nothing is logged here; the subscriber is not up yet when
    /// the binary calls this.
    pub fn load_from(source: Option<&Path>) -> Result<Self> {
        let mut config = match source {
            Some(p) if p.exists() => read_config_file(p)?,
            Some(p) => {
                anyhow::bail!("Config file '{}' does not exist", p.display());
            }
            None => Config::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Write default configuration to a file.
    pub fn write_default(path: &str) -> Result<()> {
        write_config_file(Path::new(path), &Config::default())
    }

    /// Overrides from command-line flags; these win over file and environment.
    pub fn apply_cli_overrides(&mut self, vault_host: Option<&str>, vault_token: Option<&str>) {
        if let Some(host) = vault_host {
            self.vault.address = host.to_string();
        }
        if let Some(token) = vault_token {
            self.vault.token = Some(token.to_string());
        }
    }

    /// Copy of the configuration safe to print.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.vault.token.is_some() {
            config.vault.token = Some(REDACTED.to_string());
        }
        config
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, var: impl Fn(&str) -> Option<String>) {
        // The BATON_* names are applied last so they win over the Vault CLI ones.
        if let Some(addr) = var("VAULT_ADDR") {
            self.vault.address = addr;
        }
        if let Some(token) = var("VAULT_TOKEN") {
            self.vault.token = Some(token);
        }
        if let Some(namespace) = var("VAULT_NAMESPACE") {
            self.vault.namespace = Some(namespace);
        }
        if let Some(host) = var("BATON_VAULT_HOST") {
            self.vault.address = host;
        }
        if let Some(token) = var("BATON_VAULT_TOKEN") {
            self.vault.token = Some(token);
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vault: VaultConfig::default(),
            sync: SyncConfig::default(),
            backends: default_backends(),
            logging: LoggingConfig::default(),
        }
    }
}

const REDACTED: &str = "********";

/// Find the configuration file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("vault-connector.json"),
        PathBuf::from("vault-connector.yaml"),
        PathBuf::from("vault-connector.yml"),
        PathBuf::from("vault-connector.toml"),
    ];

    for path in &candidates {
        if path.exists() {
            return Some(path.clone());
        }
    }

    // Check home directory
    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".vault-connector").join("config.json");
        if home_config.exists() {
            return Some(home_config);
        }
    }

    None
}
