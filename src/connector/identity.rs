use super::ResourceSyncer;
use crate::client::VaultClient;
use crate::error::Result;
use crate::resources::mappers::{entity_resource, group_resource};
use crate::resources::{Resource, ResourceId, ResourceKind};
use crate::sync_loop::{list_page, Fetched, Page};
use async_trait::async_trait;

pub struct GroupSyncer {
    client: VaultClient,
}

impl GroupSyncer {
    pub fn new(client: VaultClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceSyncer for GroupSyncer {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Group
    }

    async fn list(&self, parent: Option<&ResourceId>, cursor: &str) -> Result<Page<Resource>> {
        list_page(
            cursor,
            self.kind(),
            |_| async move { Ok(Fetched::all(self.client.list_groups().await?)) },
            |group| group_resource(&group, parent),
        )
        .await
    }
}

pub struct EntitySyncer {
    client: VaultClient,
}

impl EntitySyncer {
    pub fn new(client: VaultClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceSyncer for EntitySyncer {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Entity
    }

    async fn list(&self, parent: Option<&ResourceId>, cursor: &str) -> Result<Page<Resource>> {
        list_page(
            cursor,
            self.kind(),
            |_| async move { Ok(Fetched::all(self.client.list_entities().await?)) },
            |entity| entity_resource(&entity, parent),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::ScriptedGateway;
    use crate::gateway::Method;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn groups_use_key_info_names() {
        let gateway = ScriptedGateway::new().respond(
            Method::List,
            "v1/identity/group/id",
            200,
            json!({"data": {
                "keys": ["g-2", "g-1"],
                "key_info": {"g-1": {"name": "admins", "type": "internal", "policies": ["ops"]}}
            }}),
        );
        let syncer = GroupSyncer::new(VaultClient::new(Arc::new(gateway)));
        let page = syncer.list(None, "").await.unwrap();

        assert_eq!(page.items[0].display_name, "g-2");
        assert_eq!(page.items[1].display_name, "admins");
        assert_eq!(page.items[1].traits.profile()["policies"], json!(["ops"]));
        assert!(page.is_last());
    }

    #[tokio::test]
    async fn missing_entities_are_an_empty_page() {
        let syncer = EntitySyncer::new(VaultClient::new(Arc::new(ScriptedGateway::new())));
        let page = syncer.list(None, "").await.unwrap();
        assert!(page.items.is_empty());
        assert!(page.is_last());
    }
}
