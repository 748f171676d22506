//! Typed Vault API over a [`Gateway`].
//!
//! Endpoints:
//! - userpass users: <https://developer.hashicorp.com/vault/api-docs/auth/userpass>
//! - approle roles: <https://developer.hashicorp.com/vault/api-docs/auth/approle>
//! - policies, mounts, auth methods: <https://developer.hashicorp.com/vault/api-docs/system>
//! - identity groups and entities: <https://developer.hashicorp.com/vault/api-docs/secret/identity>

pub mod model;

use crate::bootstrap::{BackendAdmin, BackendKind, BackendMount};
use crate::error::{ConnectorError, Result};
use crate::gateway::{Gateway, GatewayResponse, Method};
use async_trait::async_trait;
use model::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

const USERS_ENDPOINT: &str = "v1/auth/userpass/users";
const APPROLE_ROLES_ENDPOINT: &str = "v1/auth/approle/role";
const TOKEN_ROLES_ENDPOINT: &str = "v1/auth/token/roles";
const POLICIES_ENDPOINT: &str = "v1/sys/policy";
const MOUNTS_ENDPOINT: &str = "v1/sys/mounts";
const AUTH_ENDPOINT: &str = "v1/sys/auth";
const GROUPS_ENDPOINT: &str = "v1/identity/group/id";
const ENTITIES_ENDPOINT: &str = "v1/identity/entity/id";
const LOOKUP_SELF_ENDPOINT: &str = "v1/auth/token/lookup-self";

#[derive(Clone)]
pub struct VaultClient {
    gateway: Arc<dyn Gateway>,
}

impl VaultClient {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    /// `LIST` a path. Vault answers 404 when there is nothing to list.
    async fn list(&self, path: &str) -> Result<ListResponse> {
        let resp = self.gateway.request(Method::List, path, &[], None).await?;
        if resp.status == 404 {
            debug!("LIST {} returned no keys", path);
            return Ok(ListResponse::default());
        }
        resp.json()
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.gateway
            .request(Method::Get, path, &[], None)
            .await?
            .json()
    }

    async fn post(&self, path: &str, body: Value) -> Result<GatewayResponse> {
        self.gateway.request(Method::Post, path, &[], Some(body)).await
    }

    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    /// Names of all userpass users, in server order.
    pub async fn list_users(&self) -> Result<Vec<String>> {
        Ok(self.list(USERS_ENDPOINT).await?.data.keys)
    }

    pub async fn get_user(&self, name: &str) -> Result<UserRecord> {
        let resp: UserResponse = self.get(&user_path(name, "")?).await?;
        Ok(UserRecord::from_response(name, resp))
    }

    /// The user's current policy list, as stored on the server.
    pub async fn user_policies(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.get_user(name).await?.token_policies)
    }

    /// Replace the user's whole policy list.
    pub async fn update_user_policies(&self, name: &str, policies: &[String]) -> Result<()> {
        let body = serde_json::to_value(UserPoliciesUpdate {
            token_policies: policies,
        })?;
        self.post(&user_path(name, "/policies")?, body)
            .await?
            .error_for_status()?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Roles and policies
    // ------------------------------------------------------------------------

    pub async fn list_roles(&self, source: RoleSource) -> Result<Vec<RoleRecord>> {
        let path = match source {
            RoleSource::Approle => APPROLE_ROLES_ENDPOINT,
            RoleSource::Token => TOKEN_ROLES_ENDPOINT,
        };
        let resp = self.list(path).await?;
        let mount_type = resp.mount_type;
        Ok(resp
            .data
            .keys
            .into_iter()
            .map(|name| RoleRecord {
                name,
                source,
                mount_type: mount_type.clone(),
            })
            .collect())
    }

    pub async fn list_policies(&self) -> Result<Vec<PolicyRecord>> {
        let resp: PolicyListResponse = self.get(POLICIES_ENDPOINT).await?;
        let mount_type = resp.mount_type.clone();
        Ok(resp
            .names()
            .into_iter()
            .map(|name| PolicyRecord {
                name,
                mount_type: mount_type.clone(),
            })
            .collect())
    }

    // ------------------------------------------------------------------------
    // Mounts
    // ------------------------------------------------------------------------

    pub async fn list_secret_mounts(&self) -> Result<Vec<MountRecord>> {
        let table: MountTableResponse = self.get(MOUNTS_ENDPOINT).await?;
        Ok(MountRecord::from_table(table))
    }

    pub async fn list_auth_methods(&self) -> Result<Vec<MountRecord>> {
        let table: MountTableResponse = self.get(AUTH_ENDPOINT).await?;
        Ok(MountRecord::from_table(table))
    }

    // ------------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------------

    pub async fn list_groups(&self) -> Result<Vec<IdentityRecord>> {
        Ok(IdentityRecord::from_list(self.list(GROUPS_ENDPOINT).await?.data))
    }

    pub async fn list_entities(&self) -> Result<Vec<IdentityRecord>> {
        Ok(IdentityRecord::from_list(
            self.list(ENTITIES_ENDPOINT).await?.data,
        ))
    }

    /// Look up the connector's own token; fails if the credential is unusable.
    pub async fn lookup_self(&self) -> Result<Value> {
        self.get(LOOKUP_SELF_ENDPOINT).await
    }
}

/// Path of one userpass user. The name is percent-encoded so it stays a single
/// segment under the users endpoint.
fn user_path(name: &str, suffix: &str) -> Result<String> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(ConnectorError::InvalidName(name.to_string()));
    }
    Ok(format!(
        "{USERS_ENDPOINT}/{}{suffix}",
        urlencoding::encode(name)
    ))
}

#[async_trait]
impl BackendAdmin for VaultClient {
    async fn enable_backend(&self, mount: &BackendMount) -> Result<GatewayResponse> {
        let base = match mount.kind {
            BackendKind::Auth => AUTH_ENDPOINT,
            BackendKind::Secrets => MOUNTS_ENDPOINT,
        };
        let mut body = json!({ "type": mount.backend_type });
        if let Some(ref description) = mount.description {
            body["description"] = json!(description);
        }
        if !mount.options.is_empty() {
            body["options"] = json!(mount.options);
        }
        self.post(
            &format!("{base}/{}", mount.path.trim_matches('/')),
            body,
        )
        .await
    }
}
