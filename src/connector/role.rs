use super::ResourceSyncer;
use crate::client::model::RoleSource;
use crate::client::VaultClient;
use crate::error::Result;
use crate::resources::mappers::role_resource;
use crate::resources::{Entitlement, Resource, ResourceId, ResourceKind};
use crate::sync_loop::{list_page, next_phase, phase_index, Fetched, Page};
use async_trait::async_trait;

/// Role listings, one per call in this order.
const PHASES: [RoleSource; 2] = [RoleSource::Approle, RoleSource::Token];

/// AppRole roles followed by token roles.
///
/// Roles expose an "assigned" entitlement but no membership is tracked for
/// them, so grants are always empty and grant/revoke are unsupported.
pub struct RoleSyncer {
    client: VaultClient,
}

impl RoleSyncer {
    pub fn new(client: VaultClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceSyncer for RoleSyncer {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Role
    }

    async fn list(&self, parent: Option<&ResourceId>, cursor: &str) -> Result<Page<Resource>> {
        list_page(
            cursor,
            self.kind(),
            |marker| async move {
                let index = phase_index(marker.as_deref(), &PHASES)?;
                Ok(Fetched {
                    records: self.client.list_roles(PHASES[index]).await?,
                    next_marker: next_phase(index, &PHASES),
                })
            },
            |role| role_resource(&role, parent),
        )
        .await
    }

    async fn entitlements(&self, resource: &Resource, _cursor: &str) -> Result<Page<Entitlement>> {
        Ok(Page::single(vec![Entitlement::assigned(resource)]))
    }
}
