use super::Config;
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Maximum size for a config file (1 MB).
pub const MAX_CONFIG_FILE_BYTES: u64 = 1024 * 1024;

/// Parse a JSON5 configuration string, falling back to strict JSON for a
/// better error message.
pub fn parse_config_json5(content: &str) -> Result<Config> {
    match json5::from_str(content) {
        Ok(config) => Ok(config),
        Err(json5_err) => serde_json::from_str(content)
            .with_context(|| format!("invalid JSON5 config: {json5_err}")),
    }
}

/// Read and parse a config file, choosing the format by extension.
pub fn read_config_file(path: &Path) -> Result<Config> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Cannot stat config file '{}'", path.display()))?;
    if metadata.len() > MAX_CONFIG_FILE_BYTES {
        bail!(
            "Config file '{}' is {} bytes, exceeds limit of {} bytes",
            path.display(),
            metadata.len(),
            MAX_CONFIG_FILE_BYTES,
        );
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML in '{}'", path.display()))?,
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("invalid TOML in '{}'", path.display()))?,
        _ => parse_config_json5(&content)?,
    };
    Ok(config)
}

/// Serialize `config` in the format matching the path's extension.
pub fn write_config_file(path: &Path, config: &Config) -> Result<()> {
    let content = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::to_string(config)?,
        Some("toml") => toml::to_string_pretty(config)?,
        _ => serde_json::to_string_pretty(config)?,
    };
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file '{}'", path.display()))?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn read_json5_config() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("vault-connector.json");
        fs::write(
            &file,
            "{ // local dev\n vault: { address: 'http://vault:8200', token: 'root' }, sync: { pageSize: 50 } }",
        )
        .unwrap();

        let config = read_config_file(&file).unwrap();
        assert_eq!(config.vault.address, "http://vault:8200");
        assert_eq!(config.vault.token.as_deref(), Some("root"));
        assert_eq!(config.sync.page_size, 50);
    }

    #[test]
    fn read_yaml_config() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("vault-connector.yaml");
        fs::write(&file, "vault:\n  namespace: team-a\nlogging:\n  level: debug\n").unwrap();

        let config = read_config_file(&file).unwrap();
        assert_eq!(config.vault.namespace.as_deref(), Some("team-a"));
        assert_eq!(config.vault.address, "http://127.0.0.1:8200");
        assert_eq!(config.backends.len(), 3);
    }

    #[test]
    fn toml_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("vault-connector.toml");
        let mut config = Config::default();
        config.sync.page_size = 7;
        write_config_file(&file, &config).unwrap();

        let back = read_config_file(&file).unwrap();
        assert_eq!(back.sync.page_size, 7);
        assert_eq!(back.backends, config.backends);
    }

    #[test]
    fn reject_oversized_config() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("huge.json");
        let content = "x".repeat((MAX_CONFIG_FILE_BYTES + 1) as usize);
        fs::write(&file, content).unwrap();

        let result = read_config_file(&file);
        assert!(result.unwrap_err().to_string().contains("exceeds limit"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("broken.json");
        fs::write(&file, "{ vault: ").unwrap();
        assert!(read_config_file(&file).is_err());
    }
}
