//! Projection of raw Vault records into canonical resources.
//!
//! Every mapper is total: absent optional fields become empty strings, empty
//! lists or zero, never an error.

use super::{Profile, Resource, ResourceId, ResourceKind, Traits, UserStatus};
use crate::client::model::{IdentityRecord, MountRecord, PolicyRecord, RoleRecord, UserRecord};
use serde_json::{json, Value};

fn profile(value: Value) -> Profile {
    match value {
        Value::Object(map) => map,
        _ => Profile::new(),
    }
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

/// Mount tables key entries by path with a trailing slash (`secret/`).
pub fn mount_name(path: &str) -> &str {
    path.trim_end_matches('/')
}

pub fn user_resource(user: &UserRecord, parent: Option<&ResourceId>) -> Resource {
    Resource {
        id: ResourceId::new(ResourceKind::User, &user.name),
        display_name: user.name.clone(),
        parent_id: parent.cloned(),
        traits: Traits::User {
            status: UserStatus::Enabled,
            profile: profile(json!({
                "user_id": user.name,
                "user_name": user.name,
                "mount_type": text(&user.mount_type),
                "token_policies": user.token_policies,
                "token_bound_cidrs": user.token_bound_cidrs,
                "token_ttl": user.token_ttl,
            })),
        },
    }
}

pub fn role_resource(role: &RoleRecord, parent: Option<&ResourceId>) -> Resource {
    let mount_type = role
        .mount_type
        .clone()
        .unwrap_or_else(|| role.source.as_str().to_string());
    Resource {
        id: ResourceId::new(ResourceKind::Role, &role.name),
        display_name: role.name.clone(),
        parent_id: parent.cloned(),
        traits: Traits::Role {
            profile: profile(json!({
                "id": role.name,
                "name": role.name,
                "mount_type": mount_type,
            })),
        },
    }
}

pub fn policy_resource(policy: &PolicyRecord, parent: Option<&ResourceId>) -> Resource {
    Resource {
        id: ResourceId::new(ResourceKind::Policy, &policy.name),
        display_name: policy.name.clone(),
        parent_id: parent.cloned(),
        traits: Traits::App {
            profile: profile(json!({
                "id": policy.name,
                "name": policy.name,
                "mount_type": text(&policy.mount_type),
            })),
        },
    }
}

pub fn secret_resource(mount: &MountRecord, parent: Option<&ResourceId>) -> Resource {
    let name = mount_name(&mount.path);
    Resource {
        id: ResourceId::new(ResourceKind::Secret, name),
        display_name: name.to_string(),
        parent_id: parent.cloned(),
        traits: Traits::App {
            profile: profile(json!({
                "id": name,
                "name": name,
                "mount_type": text(&mount.mount_type),
                "description": text(&mount.description),
                "accessor": text(&mount.accessor),
                "options": mount.options,
            })),
        },
    }
}

pub fn auth_method_resource(mount: &MountRecord, parent: Option<&ResourceId>) -> Resource {
    let name = mount_name(&mount.path);
    Resource {
        id: ResourceId::new(ResourceKind::AuthMethod, name),
        display_name: name.to_string(),
        parent_id: parent.cloned(),
        traits: Traits::App {
            profile: profile(json!({
                "id": name,
                "name": name,
                "mount_type": text(&mount.mount_type),
                "description": text(&mount.description),
                "accessor": text(&mount.accessor),
            })),
        },
    }
}

pub fn group_resource(group: &IdentityRecord, parent: Option<&ResourceId>) -> Resource {
    let name = group.name.clone().unwrap_or_else(|| group.id.clone());
    Resource {
        id: ResourceId::new(ResourceKind::Group, &group.id),
        display_name: name.clone(),
        parent_id: parent.cloned(),
        traits: Traits::Group {
            profile: profile(json!({
                "group_id": group.id,
                "group_name": name,
                "group_type": text(&group.group_type),
                "policies": group.policies,
            })),
        },
    }
}

pub fn entity_resource(entity: &IdentityRecord, parent: Option<&ResourceId>) -> Resource {
    let name = entity.name.clone().unwrap_or_else(|| entity.id.clone());
    Resource {
        id: ResourceId::new(ResourceKind::Entity, &entity.id),
        display_name: name.clone(),
        parent_id: parent.cloned(),
        traits: Traits::App {
            profile: profile(json!({
                "id": entity.id,
                "name": name,
                "disabled": entity.disabled,
                "policies": entity.policies,
                "metadata": entity.metadata,
            })),
        },
    }
}
