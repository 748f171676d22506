//! Wire shapes returned by the Vault HTTP API and the raw records the
//! connector projects into canonical resources.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// Response envelopes
// ============================================================================

/// Body of a `LIST` call: `{"data": {"keys": [...], "key_info": {...}}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub data: KeyList,
    #[serde(default)]
    pub mount_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyList {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub key_info: HashMap<String, KeyInfo>,
}

/// Per-key detail attached to identity listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub group_type: Option<String>,
    #[serde(default)]
    pub policies: Option<Vec<String>>,
    #[serde(default)]
    pub disabled: Option<bool>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Body of `GET sys/policy`. Older servers only fill `policies`, newer ones
/// also fill `keys`; both are mirrored under `data`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyListResponse {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default)]
    pub data: Option<PolicyListData>,
    #[serde(default)]
    pub mount_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyListData {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub policies: Vec<String>,
}

impl PolicyListResponse {
    /// Policy names in server order, preferring the `data` envelope.
    pub fn names(self) -> Vec<String> {
        if let Some(data) = self.data {
            if !data.policies.is_empty() {
                return data.policies;
            }
            if !data.keys.is_empty() {
                return data.keys;
            }
        }
        if !self.policies.is_empty() {
            self.policies
        } else {
            self.keys
        }
    }
}

/// Body of `GET sys/mounts` and `GET sys/auth`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MountTableResponse {
    #[serde(default)]
    pub data: BTreeMap<String, MountInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MountInfo {
    #[serde(default, rename = "type")]
    pub mount_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub accessor: Option<String>,
    #[serde(default)]
    pub options: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub local: Option<bool>,
}

/// Body of `GET auth/userpass/users/<name>`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserResponse {
    #[serde(default)]
    pub data: UserData,
    #[serde(default)]
    pub mount_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub token_policies: Option<Vec<String>>,
    /// Legacy alias of `token_policies` still returned by some servers.
    #[serde(default)]
    pub policies: Option<Vec<String>>,
    #[serde(default)]
    pub token_bound_cidrs: Option<Vec<String>>,
    #[serde(default)]
    pub token_ttl: Option<u64>,
}

impl UserData {
    pub fn policy_list(&self) -> Vec<String> {
        self.token_policies
            .clone()
            .or_else(|| self.policies.clone())
            .unwrap_or_default()
    }
}

/// Payload replacing the whole policy list of a userpass user.
#[derive(Debug, Clone, Serialize)]
pub struct UserPoliciesUpdate<'a> {
    pub token_policies: &'a [String],
}

/// Vault error body: `{"errors": ["..."]}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}

// ============================================================================
// Raw records
// ============================================================================

/// A userpass user with the detail needed for its traits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRecord {
    pub name: String,
    pub mount_type: Option<String>,
    pub token_policies: Vec<String>,
    pub token_bound_cidrs: Vec<String>,
    pub token_ttl: u64,
}

impl UserRecord {
    pub fn from_response(name: &str, resp: UserResponse) -> Self {
        Self {
            name: name.to_string(),
            token_policies: resp.data.policy_list(),
            token_bound_cidrs: resp.data.token_bound_cidrs.unwrap_or_default(),
            token_ttl: resp.data.token_ttl.unwrap_or_default(),
            mount_type: resp.mount_type,
        }
    }
}

/// Where a role is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleSource {
    Approle,
    Token,
}

impl RoleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleSource::Approle => "approle",
            RoleSource::Token => "token",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleRecord {
    pub name: String,
    pub source: RoleSource,
    pub mount_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyRecord {
    pub name: String,
    pub mount_type: Option<String>,
}

/// An entry of a mount table (secret engine or auth method).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MountRecord {
    pub path: String,
    pub mount_type: Option<String>,
    pub description: Option<String>,
    pub accessor: Option<String>,
    pub options: BTreeMap<String, String>,
}

impl MountRecord {
    pub fn from_table(table: MountTableResponse) -> Vec<Self> {
        table
            .data
            .into_iter()
            .map(|(path, info)| MountRecord {
                path,
                mount_type: info.mount_type,
                description: info.description,
                accessor: info.accessor,
                options: info.options.unwrap_or_default(),
            })
            .collect()
    }
}

/// An identity group or entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityRecord {
    pub id: String,
    pub name: Option<String>,
    pub group_type: Option<String>,
    pub policies: Vec<String>,
    pub disabled: bool,
    pub metadata: BTreeMap<String, String>,
}

impl IdentityRecord {
    /// Records in the order of `keys`; `key_info` fills in detail when present.
    pub fn from_list(mut list: KeyList) -> Vec<Self> {
        list.keys
            .into_iter()
            .map(|id| {
                let info = list.key_info.remove(&id).unwrap_or_default();
                IdentityRecord {
                    name: info.name,
                    group_type: info.group_type,
                    policies: info.policies.unwrap_or_default(),
                    disabled: info.disabled.unwrap_or(false),
                    metadata: info.metadata.unwrap_or_default(),
                    id,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn policy_names_prefer_data_envelope() {
        let resp: PolicyListResponse = serde_json::from_value(json!({
            "keys": ["stale"],
            "data": {"keys": ["default", "root"], "policies": ["default", "root"]}
        }))
        .unwrap();
        assert_eq!(resp.names(), vec!["default", "root"]);

        let legacy: PolicyListResponse =
            serde_json::from_value(json!({"policies": ["default"]})).unwrap();
        assert_eq!(legacy.names(), vec!["default"]);
    }

    #[test]
    fn user_record_tolerates_null_fields() {
        let resp: UserResponse = serde_json::from_value(json!({
            "data": {"token_policies": null, "policies": ["default"], "token_bound_cidrs": null}
        }))
        .unwrap();
        let record = UserRecord::from_response("alice", resp);
        assert_eq!(record.token_policies, vec!["default"]);
        assert!(record.token_bound_cidrs.is_empty());
        assert_eq!(record.token_ttl, 0);
        assert_eq!(record.mount_type, None);
    }

    #[test]
    fn identity_records_follow_key_order() {
        let list: KeyList = serde_json::from_value(json!({
            "keys": ["b-id", "a-id"],
            "key_info": {"a-id": {"name": "admins", "type": "internal"}, "b-id": {"metadata": null}}
        }))
        .unwrap();
        let records = IdentityRecord::from_list(list);
        assert_eq!(records[0].id, "b-id");
        assert_eq!(records[0].name, None);
        assert_eq!(records[1].name.as_deref(), Some("admins"));
        assert_eq!(records[1].group_type.as_deref(), Some("internal"));
    }
}
