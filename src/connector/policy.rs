use super::ResourceSyncer;
use crate::client::VaultClient;
use crate::error::Result;
use crate::membership::PolicyMembership;
use crate::resources::mappers::policy_resource;
use crate::resources::{Entitlement, Grant, Resource, ResourceId, ResourceKind};
use crate::sync_loop::{list_page, Fetched, Page};
use async_trait::async_trait;
use std::sync::Arc;

/// ACL policies; membership is delegated to [`PolicyMembership`].
pub struct PolicySyncer {
    client: VaultClient,
    membership: Arc<PolicyMembership>,
}

impl PolicySyncer {
    pub fn new(client: VaultClient, membership: Arc<PolicyMembership>) -> Self {
        Self { client, membership }
    }
}

#[async_trait]
impl ResourceSyncer for PolicySyncer {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Policy
    }

    async fn list(&self, parent: Option<&ResourceId>, cursor: &str) -> Result<Page<Resource>> {
        list_page(
            cursor,
            self.kind(),
            |_| async move { Ok(Fetched::all(self.client.list_policies().await?)) },
            |policy| policy_resource(&policy, parent),
        )
        .await
    }

    async fn entitlements(&self, resource: &Resource, _cursor: &str) -> Result<Page<Entitlement>> {
        Ok(Page::single(PolicyMembership::entitlements(resource)))
    }

    async fn grants(&self, resource: &Resource, cursor: &str) -> Result<Page<Grant>> {
        self.membership.grants(resource, cursor).await
    }

    async fn grant(&self, principal: &ResourceId, entitlement: &Entitlement) -> Result<()> {
        self.membership.grant(principal, entitlement).await
    }

    async fn revoke(&self, grant: &Grant) -> Result<()> {
        self.membership.revoke(grant).await
    }
}
