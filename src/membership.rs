//! Policy membership of userpass users.
//!
//! Vault stores a user's policies as one flat `token_policies` list and only
//! offers whole-list replacement, so grant and revoke are read-modify-write
//! cycles without a remote compare-and-swap. Inside one connector instance the
//! cycles for a given user are serialized by a per-user lock; writers in other
//! processes can still race, and the last write wins.
//!
//! Membership is not indexed server-side: reconstructing the grants of one
//! policy reads every user.

use crate::client::VaultClient;
use crate::error::{ConnectorError, Result};
use crate::resources::{Entitlement, Grant, Resource, ResourceId, ResourceKind, ASSIGNED_ENTITLEMENT};
use crate::sync_loop::{list_page, offset_window, Fetched, Page};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct PolicyMembership {
    client: VaultClient,
    page_size: usize,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl PolicyMembership {
    pub fn new(client: VaultClient, page_size: usize) -> Self {
        Self {
            client,
            page_size,
            locks: DashMap::new(),
        }
    }

    /// The single "assigned" entitlement of a policy. No remote call.
    pub fn entitlements(resource: &Resource) -> Vec<Entitlement> {
        vec![Entitlement::assigned(resource)]
    }

    /// One page of users holding `policy`.
    pub async fn grants(&self, policy: &Resource, cursor: &str) -> Result<Page<Grant>> {
        let policy_id = policy.id.resource.clone();
        let client = &self.client;
        let page_size = self.page_size;

        list_page(
            cursor,
            ResourceKind::User,
            |marker| async move {
                let users = client.list_users().await?;
                let window = offset_window(users, marker.as_deref(), page_size)?;

                let mut holders = Vec::new();
                for user in window.records {
                    let policies = client.user_policies(&user).await?;
                    if policies.iter().any(|p| *p == policy_id) {
                        holders.push(user);
                    }
                }
                Ok(Fetched {
                    records: holders,
                    next_marker: window.next_marker,
                })
            },
            |user| {
                Grant::new(
                    &policy.id,
                    ASSIGNED_ENTITLEMENT,
                    ResourceId::new(ResourceKind::User, user),
                )
            },
        )
        .await
    }

    /// Append the entitlement's policy to the principal's policy list.
    ///
    /// Duplicates are not filtered; a policy listed twice is harmless.
    pub async fn grant(&self, principal: &ResourceId, entitlement: &Entitlement) -> Result<()> {
        if principal.kind != ResourceKind::User {
            warn!(
                principal_type = %principal.kind,
                principal_id = %principal.resource,
                "only users can be granted policy membership"
            );
            return Err(ConnectorError::UnsupportedPrincipalKind(principal.kind));
        }
        let policy = policy_of(&entitlement.resource, "grant")?;
        let user = principal.resource.as_str();

        self.with_user_lock(user, || async move {
            let mut policies = self.client.user_policies(user).await?;
            policies.push(policy.to_string());
            self.client.update_user_policies(user, &policies).await?;
            info!("Granted policy {} to user {}", policy, user);
            Ok(())
        })
        .await
    }

    /// Remove the grant's policy from the principal's policy list.
    ///
    /// Fails with [`ConnectorError::PolicyNotAssigned`] without writing when
    /// the user does not hold the policy.
    pub async fn revoke(&self, grant: &Grant) -> Result<()> {
        let principal = &grant.principal;
        if principal.kind != ResourceKind::User {
            warn!(
                principal_type = %principal.kind,
                principal_id = %principal.resource,
                "only users can have policy membership revoked"
            );
            return Err(ConnectorError::UnsupportedPrincipalKind(principal.kind));
        }
        let policy = policy_of(&grant.entitlement, "revoke")?;
        let user = principal.resource.as_str();

        self.with_user_lock(user, || async move {
            let mut policies = self.client.user_policies(user).await?;
            let Some(pos) = policies.iter().position(|p| p == policy) else {
                warn!("User {} does not have policy {}", user, policy);
                return Err(ConnectorError::PolicyNotAssigned {
                    user: user.to_string(),
                    policy: policy.to_string(),
                });
            };
            policies.remove(pos);
            self.client.update_user_policies(user, &policies).await?;
            info!("Revoked policy {} from user {}", policy, user);
            Ok(())
        })
        .await
    }

    async fn with_user_lock<F, Fut>(&self, user: &str, op: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<()>>,
    {
        let lock = self
            .locks
            .entry(user.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = lock.lock().await;
            debug!("Holding membership lock for user {}", user);
            op().await
        };

        drop(lock);
        self.locks.remove_if(user, |_, l| Arc::strong_count(l) == 1);
        result
    }

    #[cfg(test)]
    fn tracked_users(&self) -> usize {
        self.locks.len()
    }
}

fn policy_of<'a>(resource: &'a ResourceId, operation: &'static str) -> Result<&'a str> {
    if resource.kind != ResourceKind::Policy {
        return Err(ConnectorError::UnsupportedOperation {
            kind: resource.kind,
            operation,
        });
    }
    Ok(&resource.resource)
}
