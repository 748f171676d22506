//! Ensures the auth and secret backends the connector relies on are mounted.
//!
//! Enabling a backend whose path is already taken is answered by Vault with a
//! 400 "path is already in use"; that answer counts as success, which keeps
//! the bootstrap idempotent even when two instances race on the same mount.

use crate::error::{ConnectorError, Result};
use crate::gateway::GatewayResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

const ALREADY_IN_USE: &str = "path is already in use";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Auth,
    Secrets,
}

/// A backend to mount at `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendMount {
    pub path: String,
    pub kind: BackendKind,
    /// Backend type as Vault names it (`approle`, `userpass`, `kv`, ...).
    #[serde(rename = "type")]
    pub backend_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl BackendMount {
    pub fn auth(path: &str, backend_type: &str) -> Self {
        Self {
            path: path.to_string(),
            kind: BackendKind::Auth,
            backend_type: backend_type.to_string(),
            description: None,
            options: BTreeMap::new(),
        }
    }

    pub fn secrets(path: &str, backend_type: &str) -> Self {
        Self {
            kind: BackendKind::Secrets,
            ..Self::auth(path, backend_type)
        }
    }

    pub fn with_option(mut self, key: &str, value: &str) -> Self {
        self.options.insert(key.to_string(), value.to_string());
        self
    }

    /// approle and userpass auth, plus KV v2 at `secret/`.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::auth("approle", "approle"),
            Self::auth("userpass", "userpass"),
            Self::secrets("secret", "kv").with_option("version", "2"),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableOutcome {
    Enabled,
    AlreadyEnabled,
}

/// Capability to mount an auth method or secrets engine.
#[async_trait]
pub trait BackendAdmin: Send + Sync {
    async fn enable_backend(&self, mount: &BackendMount) -> Result<GatewayResponse>;
}

/// Classify the answer to an enable call.
pub fn classify_enable(mount: &BackendMount, resp: GatewayResponse) -> Result<EnableOutcome> {
    if resp.is_success() {
        return Ok(EnableOutcome::Enabled);
    }
    if resp.status == 400
        && resp
            .error_messages()
            .iter()
            .any(|m| m.contains(ALREADY_IN_USE))
    {
        return Ok(EnableOutcome::AlreadyEnabled);
    }
    let source = resp
        .error_for_status()
        .err()
        .unwrap_or_else(|| ConnectorError::transport(None, "unexpected response"));
    Err(ConnectorError::Bootstrap {
        path: mount.path.clone(),
        source: Box::new(source),
    })
}

/// Enable one backend, accepting "already enabled".
pub async fn ensure_backend(admin: &dyn BackendAdmin, mount: &BackendMount) -> Result<EnableOutcome> {
    let resp = admin
        .enable_backend(mount)
        .await
        .map_err(|source| ConnectorError::Bootstrap {
            path: mount.path.clone(),
            source: Box::new(source),
        })?;

    let outcome = classify_enable(mount, resp);
    match &outcome {
        Ok(EnableOutcome::Enabled) => {
            info!("Enabled {} backend at {}", mount.backend_type, mount.path)
        }
        Ok(EnableOutcome::AlreadyEnabled) => {
            debug!("Backend already mounted at {}", mount.path)
        }
        Err(e) => warn!("Failed to enable backend at {}: {}", mount.path, e),
    }
    outcome
}

/// Enable every backend in order; the first hard failure aborts.
pub async fn ensure_backends(
    admin: &dyn BackendAdmin,
    mounts: &[BackendMount],
) -> Result<Vec<EnableOutcome>> {
    let mut outcomes = Vec::with_capacity(mounts.len());
    for mount in mounts {
        outcomes.push(ensure_backend(admin, mount).await?);
    }
    Ok(outcomes)
}

/// Once-per-connector bootstrap shared by every syncer.
///
/// The first successful [`ensure_backends`] pass is remembered; a failed pass
/// leaves nothing behind and the next caller tries again.
pub struct Bootstrap {
    admin: Arc<dyn BackendAdmin>,
    mounts: Vec<BackendMount>,
    outcomes: OnceCell<Vec<EnableOutcome>>,
}

impl Bootstrap {
    pub fn new(admin: Arc<dyn BackendAdmin>, mounts: Vec<BackendMount>) -> Self {
        Self {
            admin,
            mounts,
            outcomes: OnceCell::new(),
        }
    }

    pub async fn ensure(&self) -> Result<&[EnableOutcome]> {
        let outcomes = self
            .outcomes
            .get_or_try_init(|| async move {
                info!("Bootstrapping {} backend(s)", self.mounts.len());
                ensure_backends(self.admin.as_ref(), &self.mounts).await
            })
            .await?;
        Ok(outcomes.as_slice())
    }

    pub fn is_done(&self) -> bool {
        self.outcomes.initialized()
    }
}
