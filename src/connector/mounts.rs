use super::ResourceSyncer;
use crate::client::VaultClient;
use crate::error::Result;
use crate::resources::mappers::{auth_method_resource, secret_resource};
use crate::resources::{Resource, ResourceId, ResourceKind};
use crate::sync_loop::{list_page, Fetched, Page};
use async_trait::async_trait;

/// Secrets engines from the mount table.
pub struct SecretSyncer {
    client: VaultClient,
}

impl SecretSyncer {
    pub fn new(client: VaultClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceSyncer for SecretSyncer {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Secret
    }

    async fn list(&self, parent: Option<&ResourceId>, cursor: &str) -> Result<Page<Resource>> {
        list_page(
            cursor,
            self.kind(),
            |_| async move { Ok(Fetched::all(self.client.list_secret_mounts().await?)) },
            |mount| secret_resource(&mount, parent),
        )
        .await
    }
}

/// Enabled auth methods.
pub struct AuthMethodSyncer {
    client: VaultClient,
}

impl AuthMethodSyncer {
    pub fn new(client: VaultClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceSyncer for AuthMethodSyncer {
    fn kind(&self) -> ResourceKind {
        ResourceKind::AuthMethod
    }

    async fn list(&self, parent: Option<&ResourceId>, cursor: &str) -> Result<Page<Resource>> {
        list_page(
            cursor,
            self.kind(),
            |_| async move { Ok(Fetched::all(self.client.list_auth_methods().await?)) },
            |mount| auth_method_resource(&mount, parent),
        )
        .await
    }
}
