use super::Config;
use anyhow::Result;
use url::Url;

/// Validation errors for configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn error(path: impl Into<String>, message: impl Into<String>) -> ConfigValidationError {
    ConfigValidationError {
        path: path.into(),
        message: message.into(),
    }
}

/// Validate a configuration object.
pub fn validate_config(config: &Config) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    match Url::parse(&config.vault.address) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {}
        Ok(_) => errors.push(error(
            "vault.address",
            "Address must be an absolute http(s) URL",
        )),
        Err(e) => errors.push(error("vault.address", format!("Invalid URL: {e}"))),
    }

    if config
        .vault
        .token
        .as_deref()
        .map_or(true, |t| t.trim().is_empty())
    {
        errors.push(error("vault.token", "A Vault token is required"));
    }

    if config.vault.timeout_secs == 0 {
        errors.push(error(
            "vault.timeoutSecs",
            "Timeout must be greater than 0",
        ));
    }

    if config.sync.page_size == 0 {
        errors.push(error("sync.pageSize", "Page size must be greater than 0"));
    }

    for (i, mount) in config.backends.iter().enumerate() {
        if mount.path.trim_matches('/').is_empty() {
            errors.push(error(
                format!("backends[{i}].path"),
                "Mount path is required",
            ));
        }
        if mount.backend_type.trim().is_empty() {
            errors.push(error(
                format!("backends[{i}].type"),
                "Backend type is required",
            ));
        }
    }

    errors
}

/// Validate configuration and return Result.
pub fn validate_config_object(config: &Config) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Configuration validation failed:\n{}", messages.join("\n"));
    }
}
