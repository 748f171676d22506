use super::ResourceSyncer;
use crate::client::VaultClient;
use crate::error::Result;
use crate::resources::mappers::user_resource;
use crate::resources::{Resource, ResourceId, ResourceKind};
use crate::sync_loop::{list_page, offset_window, Fetched, Page};
use async_trait::async_trait;

/// Userpass users, paged in offset windows over the full key listing.
pub struct UserSyncer {
    client: VaultClient,
    page_size: usize,
}

impl UserSyncer {
    pub fn new(client: VaultClient, page_size: usize) -> Self {
        Self { client, page_size }
    }
}

#[async_trait]
impl ResourceSyncer for UserSyncer {
    fn kind(&self) -> ResourceKind {
        ResourceKind::User
    }

    async fn list(&self, parent: Option<&ResourceId>, cursor: &str) -> Result<Page<Resource>> {
        list_page(
            cursor,
            self.kind(),
            |marker| async move {
                let names = self.client.list_users().await?;
                let window = offset_window(names, marker.as_deref(), self.page_size)?;

                let mut users = Vec::with_capacity(window.records.len());
                for name in &window.records {
                    users.push(self.client.get_user(name).await?);
                }
                Ok(Fetched {
                    records: users,
                    next_marker: window.next_marker,
                })
            },
            |user| user_resource(&user, parent),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::ScriptedGateway;
    use crate::gateway::Method;
    use crate::resources::Traits;
    use serde_json::json;
    use std::sync::Arc;

    fn syncer(page_size: usize) -> (UserSyncer, Arc<ScriptedGateway>) {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .respond(
                    Method::List,
                    "v1/auth/userpass/users",
                    200,
                    json!({"data": {"keys": ["alice", "bob", "carol"]}}),
                )
                .respond(
                    Method::Get,
                    "v1/auth/userpass/users/alice",
                    200,
                    json!({"mount_type": "userpass", "data": {"token_policies": ["default"], "token_ttl": 3600}}),
                )
                .respond(Method::Get, "v1/auth/userpass/users/bob", 200, json!({"data": {}}))
                .respond(Method::Get, "v1/auth/userpass/users/carol", 200, json!({"data": {}})),
        );
        (UserSyncer::new(VaultClient::new(gateway.clone()), page_size), gateway)
    }

    #[tokio::test]
    async fn users_are_paged_in_windows() {
        let (syncer, gateway) = syncer(2);

        let first = syncer.list(None, "").await.unwrap();
        let names: Vec<_> = first.items.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
        assert!(!first.is_last());
        assert_eq!(gateway.count(Method::Get, "v1/auth/userpass/users/carol"), 0);

        let second = syncer.list(None, &first.next_cursor).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].id, ResourceId::new(ResourceKind::User, "carol"));
        assert!(second.is_last());
    }

    #[tokio::test]
    async fn user_detail_lands_in_profile() {
        let (syncer, _) = syncer(10);
        let page = syncer.list(None, "").await.unwrap();
        let Traits::User { profile, .. } = &page.items[0].traits else {
            panic!("expected user traits");
        };
        assert_eq!(profile["mount_type"], json!("userpass"));
        assert_eq!(profile["token_policies"], json!(["default"]));
        assert_eq!(profile["token_ttl"], json!(3600));
    }

    #[tokio::test]
    async fn no_users_is_one_empty_page() {
        let gateway = Arc::new(ScriptedGateway::new());
        let syncer = UserSyncer::new(VaultClient::new(gateway), 10);
        let page = syncer.list(None, "").await.unwrap();
        assert!(page.items.is_empty());
        assert!(page.is_last());
    }
}
