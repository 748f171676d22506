mod identity;
mod mounts;
mod policy;
mod role;
mod user;

pub use identity::{EntitySyncer, GroupSyncer};
pub use mounts::{AuthMethodSyncer, SecretSyncer};
pub use policy::PolicySyncer;
pub use role::RoleSyncer;
pub use user::UserSyncer;

use crate::bootstrap::{Bootstrap, EnableOutcome};
use crate::client::VaultClient;
use crate::config::Config;
use crate::error::{ConnectorError, Result};
use crate::gateway::{Gateway, HttpGateway};
use crate::membership::PolicyMembership;
use crate::resources::{Entitlement, Grant, Resource, ResourceId, ResourceKind};
use crate::sync_loop::Page;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

// ============================================================================
// Syncer capability
// ============================================================================

/// Per-kind capability set driven by the orchestrator.
///
/// Every listing call takes the cursor returned by the previous call (empty
/// to start) and returns one page; the kind is exhausted when the returned
/// cursor is empty.
#[async_trait]
pub trait ResourceSyncer: Send + Sync {
    fn kind(&self) -> ResourceKind;

    async fn list(&self, parent: Option<&ResourceId>, cursor: &str) -> Result<Page<Resource>>;

    async fn entitlements(&self, _resource: &Resource, _cursor: &str) -> Result<Page<Entitlement>> {
        Ok(Page::empty())
    }

    async fn grants(&self, _resource: &Resource, _cursor: &str) -> Result<Page<Grant>> {
        Ok(Page::empty())
    }

    async fn grant(&self, _principal: &ResourceId, _entitlement: &Entitlement) -> Result<()> {
        Err(ConnectorError::UnsupportedOperation {
            kind: self.kind(),
            operation: "grant",
        })
    }

    async fn revoke(&self, _grant: &Grant) -> Result<()> {
        Err(ConnectorError::UnsupportedOperation {
            kind: self.kind(),
            operation: "revoke",
        })
    }
}

/// Runs the connector bootstrap ahead of every call of the wrapped syncer, so
/// no listing or mutation reaches Vault before the backends are mounted.
struct Bootstrapped {
    inner: Arc<dyn ResourceSyncer>,
    bootstrap: Arc<Bootstrap>,
}

#[async_trait]
impl ResourceSyncer for Bootstrapped {
    fn kind(&self) -> ResourceKind {
        self.inner.kind()
    }

    async fn list(&self, parent: Option<&ResourceId>, cursor: &str) -> Result<Page<Resource>> {
        self.bootstrap.ensure().await?;
        self.inner.list(parent, cursor).await
    }

    async fn entitlements(&self, resource: &Resource, cursor: &str) -> Result<Page<Entitlement>> {
        self.bootstrap.ensure().await?;
        self.inner.entitlements(resource, cursor).await
    }

    async fn grants(&self, resource: &Resource, cursor: &str) -> Result<Page<Grant>> {
        self.bootstrap.ensure().await?;
        self.inner.grants(resource, cursor).await
    }

    async fn grant(&self, principal: &ResourceId, entitlement: &Entitlement) -> Result<()> {
        self.bootstrap.ensure().await?;
        self.inner.grant(principal, entitlement).await
    }

    async fn revoke(&self, grant: &Grant) -> Result<()> {
        self.bootstrap.ensure().await?;
        self.inner.revoke(grant).await
    }
}

// ============================================================================
// Metadata
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTypeInfo {
    pub id: ResourceKind,
    pub display_name: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorMetadata {
    pub display_name: String,
    pub description: String,
    pub resource_types: Vec<ResourceTypeInfo>,
}

// ============================================================================
// Connector
// ============================================================================

pub struct Connector {
    client: VaultClient,
    membership: Arc<PolicyMembership>,
    bootstrap: Arc<Bootstrap>,
    page_size: usize,
}

impl Connector {
    /// Connect over HTTP using the `vault` section of `config`.
    pub fn new(config: &Config) -> Result<Self> {
        let gateway = HttpGateway::new(&config.vault)?;
        Ok(Self::from_gateway(Arc::new(gateway), config))
    }

    pub fn from_gateway(gateway: Arc<dyn Gateway>, config: &Config) -> Self {
        let client = VaultClient::new(gateway);
        let page_size = config.sync.page_size.max(1);
        Self {
            membership: Arc::new(PolicyMembership::new(client.clone(), page_size)),
            bootstrap: Arc::new(Bootstrap::new(
                Arc::new(client.clone()),
                config.backends.clone(),
            )),
            client,
            page_size,
        }
    }

    /// Mount the configured backends. Runs at most once per connector; a
    /// failed attempt leaves nothing behind and the next call tries again.
    /// Syncers handed out by this connector call it themselves.
    pub async fn bootstrap(&self) -> Result<&[EnableOutcome]> {
        self.bootstrap.ensure().await
    }

    pub fn metadata(&self) -> ConnectorMetadata {
        ConnectorMetadata {
            display_name: "HashiCorp Vault".to_string(),
            description: "Connector syncing users, roles, policies and secrets from HashiCorp Vault."
                .to_string(),
            resource_types: ResourceKind::ALL
                .into_iter()
                .map(|id| ResourceTypeInfo {
                    id,
                    display_name: id.display_name(),
                })
                .collect(),
        }
    }

    /// Check that the configured token is accepted by the server.
    pub async fn validate(&self) -> Result<()> {
        match self.client.lookup_self().await {
            Ok(_) => {
                info!("Vault token is valid");
                Ok(())
            }
            Err(e) => {
                warn!("Vault token validation failed: {}", e);
                Err(e)
            }
        }
    }

    /// One syncer per resource kind, in [`ResourceKind::ALL`] order.
    pub fn resource_syncers(&self) -> Vec<Arc<dyn ResourceSyncer>> {
        ResourceKind::ALL
            .into_iter()
            .map(|kind| self.syncer(kind))
            .collect()
    }

    /// The syncer for `kind`, bootstrapping the connector before its first call.
    pub fn syncer(&self, kind: ResourceKind) -> Arc<dyn ResourceSyncer> {
        Arc::new(Bootstrapped {
            inner: self.bare_syncer(kind),
            bootstrap: self.bootstrap.clone(),
        })
    }

    fn bare_syncer(&self, kind: ResourceKind) -> Arc<dyn ResourceSyncer> {
        let client = self.client.clone();
        match kind {
            ResourceKind::User => Arc::new(UserSyncer::new(client, self.page_size)),
            ResourceKind::Role => Arc::new(RoleSyncer::new(client)),
            ResourceKind::Policy => Arc::new(PolicySyncer::new(client, self.membership.clone())),
            ResourceKind::Secret => Arc::new(SecretSyncer::new(client)),
            ResourceKind::AuthMethod => Arc::new(AuthMethodSyncer::new(client)),
            ResourceKind::Group => Arc::new(GroupSyncer::new(client)),
            ResourceKind::Entity => Arc::new(EntitySyncer::new(client)),
        }
    }

    /// Grant `entitlement` to `principal` through the syncer owning the
    /// entitled resource.
    pub async fn grant(&self, principal: &ResourceId, entitlement: &Entitlement) -> Result<()> {
        self.syncer(entitlement.resource.kind)
            .grant(principal, entitlement)
            .await
    }

    pub async fn revoke(&self, grant: &Grant) -> Result<()> {
        self.syncer(grant.entitlement.kind).revoke(grant).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::ScriptedGateway;
    use crate::gateway::Method;
    use crate::resources::ASSIGNED_ENTITLEMENT;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn connector(gateway: ScriptedGateway, page_size: usize) -> (Connector, Arc<ScriptedGateway>) {
        let gateway = Arc::new(gateway);
        let mut config = Config::default();
        config.sync.page_size = page_size;
        (Connector::from_gateway(gateway.clone(), &config), gateway)
    }

    fn mounted() -> ScriptedGateway {
        ScriptedGateway::new()
            .respond(Method::Post, "v1/sys/auth/approle", 204, Value::Null)
            .respond(Method::Post, "v1/sys/auth/userpass", 204, Value::Null)
            .respond(Method::Post, "v1/sys/mounts/secret", 204, Value::Null)
    }

    #[tokio::test]
    async fn bootstrap_runs_once() {
        let (connector, gateway) = connector(mounted(), 10);
        connector.bootstrap().await.unwrap();
        let outcomes = connector.bootstrap().await.unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(gateway.count(Method::Post, "v1/sys/auth/approle"), 1);
    }

    #[tokio::test]
    async fn failed_bootstrap_is_retried() {
        let gateway = ScriptedGateway::new()
            .fail(
                Method::Post,
                "v1/sys/auth/approle",
                ConnectorError::transport(None, "connection refused"),
            )
            .respond(Method::Post, "v1/sys/auth/approle", 204, Value::Null)
            .respond(Method::Post, "v1/sys/auth/userpass", 204, Value::Null)
            .respond(Method::Post, "v1/sys/mounts/secret", 204, Value::Null);
        let (connector, gateway) = connector(gateway, 10);

        assert!(connector.bootstrap().await.is_err());
        connector.bootstrap().await.unwrap();
        assert_eq!(gateway.count(Method::Post, "v1/sys/auth/approle"), 2);
        assert_eq!(gateway.count(Method::Post, "v1/sys/auth/userpass"), 1);
    }

    #[tokio::test]
    async fn syncers_cover_every_kind() {
        let (connector, _) = connector(ScriptedGateway::new(), 10);
        let kinds: Vec<ResourceKind> = connector
            .resource_syncers()
            .iter()
            .map(|s| s.kind())
            .collect();
        assert_eq!(kinds, ResourceKind::ALL.to_vec());
        assert_eq!(connector.metadata().resource_types.len(), 7);
    }

    #[tokio::test]
    async fn listing_mounts_backends_first() {
        let gateway = mounted().respond(
            Method::List,
            "v1/auth/userpass/users",
            200,
            json!({"data": {"keys": []}}),
        );
        let (connector, gateway) = connector(gateway, 10);

        let page = connector
            .syncer(ResourceKind::User)
            .list(None, "")
            .await
            .unwrap();
        assert!(page.is_last());

        let order: Vec<String> = gateway
            .calls()
            .into_iter()
            .map(|(m, p, _)| format!("{m} {p}"))
            .collect();
        assert_eq!(
            order,
            vec![
                "POST v1/sys/auth/approle",
                "POST v1/sys/auth/userpass",
                "POST v1/sys/mounts/secret",
                "LIST v1/auth/userpass/users",
            ]
        );

        // Later calls on any syncer reuse the finished bootstrap.
        connector
            .syncer(ResourceKind::Group)
            .list(None, "")
            .await
            .unwrap();
        assert_eq!(gateway.count(Method::Post, "v1/sys/auth/approle"), 1);
    }

    #[tokio::test]
    async fn listing_fails_while_bootstrap_fails() {
        let gateway = ScriptedGateway::new().respond(
            Method::Post,
            "v1/sys/auth/approle",
            403,
            json!({"errors": ["permission denied"]}),
        );
        let (connector, gateway) = connector(gateway, 10);
        let err = connector
            .syncer(ResourceKind::Policy)
            .list(None, "")
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::Bootstrap { .. }));
        assert_eq!(gateway.count(Method::Get, "v1/sys/policy"), 0);
    }

    #[tokio::test]
    async fn validate_surfaces_rejected_token() {
        let (connector, _) = connector(
            ScriptedGateway::new().respond(
                Method::Get,
                "v1/auth/token/lookup-self",
                403,
                json!({"errors": ["permission denied"]}),
            ),
            10,
        );
        let err = connector.validate().await.unwrap_err();
        assert!(matches!(err, ConnectorError::Transport { status: Some(403), .. }));
    }

    #[tokio::test]
    async fn grant_dispatches_to_policy_membership() {
        let gateway = mounted()
            .respond(
                Method::Get,
                "v1/auth/userpass/users/alice",
                200,
                json!({"data": {"token_policies": ["default"]}}),
            )
            .respond(
                Method::Post,
                "v1/auth/userpass/users/alice/policies",
                204,
                Value::Null,
            );
        let (connector, gateway) = connector(gateway, 10);
        let entitlement = Entitlement::from_id("policy:ops:assigned").unwrap();
        connector
            .grant(&ResourceId::new(ResourceKind::User, "alice"), &entitlement)
            .await
            .unwrap();

        let writes: Vec<_> = gateway
            .calls()
            .into_iter()
            .filter(|(_, p, _)| p == "v1/auth/userpass/users/alice/policies")
            .collect();
        assert_eq!(
            writes[0].2,
            Some(json!({"token_policies": ["default", "ops"]}))
        );
    }

    #[tokio::test]
    async fn role_mutations_are_unsupported() {
        let (connector, gateway) = connector(mounted(), 10);
        let grant = Grant::new(
            &ResourceId::new(ResourceKind::Role, "ci"),
            ASSIGNED_ENTITLEMENT,
            ResourceId::new(ResourceKind::User, "alice"),
        );
        let err = connector.revoke(&grant).await.unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::UnsupportedOperation {
                kind: ResourceKind::Role,
                operation: "revoke"
            }
        ));
        assert_eq!(gateway.count(Method::Get, "v1/auth/userpass/users/alice"), 0);
    }
}
