//! Canonical resource graph produced by every sync pass.

pub mod mappers;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Slug of the only entitlement the connector exposes.
pub const ASSIGNED_ENTITLEMENT: &str = "assigned";

// ============================================================================
// Resource kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    User,
    Role,
    Policy,
    Secret,
    AuthMethod,
    Group,
    Entity,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::User,
        ResourceKind::Role,
        ResourceKind::Policy,
        ResourceKind::Secret,
        ResourceKind::AuthMethod,
        ResourceKind::Group,
        ResourceKind::Entity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Role => "role",
            ResourceKind::Policy => "policy",
            ResourceKind::Secret => "secret",
            ResourceKind::AuthMethod => "auth_method",
            ResourceKind::Group => "group",
            ResourceKind::Entity => "entity",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::User => "User",
            ResourceKind::Role => "Role",
            ResourceKind::Policy => "Policy",
            ResourceKind::Secret => "Secret",
            ResourceKind::AuthMethod => "Auth Method",
            ResourceKind::Group => "Group",
            ResourceKind::Entity => "Entity",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown resource kind '{s}'"))
    }
}

// ============================================================================
// Resources
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    pub kind: ResourceKind,
    pub resource: String,
}

impl ResourceId {
    pub fn new(kind: ResourceKind, resource: impl Into<String>) -> Self {
        Self {
            kind,
            resource: resource.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.resource)
    }
}

/// Free-form profile attached to a trait.
pub type Profile = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "trait", rename_all = "snake_case")]
pub enum Traits {
    User { status: UserStatus, profile: Profile },
    Role { profile: Profile },
    App { profile: Profile },
    Group { profile: Profile },
}

impl Traits {
    pub fn profile(&self) -> &Profile {
        match self {
            Traits::User { profile, .. }
            | Traits::Role { profile }
            | Traits::App { profile }
            | Traits::Group { profile } => profile,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: ResourceId,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ResourceId>,
    pub traits: Traits,
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        self.id.kind
    }
}

// ============================================================================
// Entitlements and grants
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub resource: ResourceId,
    pub slug: String,
    pub display_name: String,
    pub description: String,
    pub grantable_to: Vec<ResourceKind>,
}

impl Entitlement {
    /// The "assigned" entitlement of a policy or role, grantable to users.
    pub fn assigned(resource: &Resource) -> Self {
        let noun = resource.kind().as_str();
        Self {
            resource: resource.id.clone(),
            slug: ASSIGNED_ENTITLEMENT.to_string(),
            display_name: format!(
                "{} {} {}",
                resource.display_name, noun, ASSIGNED_ENTITLEMENT
            ),
            description: format!("Assigned to {} {}", resource.display_name, noun),
            grantable_to: vec![ResourceKind::User],
        }
    }

    /// Rebuild an entitlement from its id alone, as handed in by an operator.
    pub fn from_id(id: &str) -> Result<Self, String> {
        let (resource, slug) = Self::parse_id(id)?;
        Ok(Self {
            display_name: format!("{} {} {}", resource.resource, resource.kind, slug),
            description: format!("Assigned to {} {}", resource.resource, resource.kind),
            resource,
            slug,
            grantable_to: vec![ResourceKind::User],
        })
    }

    /// `<kind>:<resource>:<slug>`, with the resource name escaped.
    pub fn id(&self) -> String {
        format!("{}:{}", id_segment(&self.resource), self.slug)
    }

    /// Parse an entitlement id of the form `<kind>:<resource>:<slug>`.
    pub fn parse_id(id: &str) -> Result<(ResourceId, String), String> {
        let parts: Vec<&str> = id.split(':').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(format!(
                "invalid entitlement id '{id}', expected <kind>:<resource>:<slug>"
            ));
        }
        let resource = parse_segment(parts[0], parts[1])?;
        Ok((resource, parts[2].to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    pub entitlement: ResourceId,
    pub entitlement_slug: String,
    pub principal: ResourceId,
}

impl Grant {
    pub fn new(resource: &ResourceId, slug: &str, principal: ResourceId) -> Self {
        Self {
            entitlement: resource.clone(),
            entitlement_slug: slug.to_string(),
            principal,
        }
    }

    /// `<kind>:<resource>:<slug>:<principal kind>:<principal>`, with both
    /// names escaped.
    pub fn id(&self) -> String {
        format!(
            "{}:{}:{}",
            id_segment(&self.entitlement),
            self.entitlement_slug,
            id_segment(&self.principal)
        )
    }

    pub fn parse_id(id: &str) -> Result<Self, String> {
        let parts: Vec<&str> = id.split(':').collect();
        if parts.len() != 5 || parts.iter().any(|p| p.is_empty()) {
            return Err(format!(
                "invalid grant id '{id}', expected <kind>:<resource>:<slug>:<principal kind>:<principal>"
            ));
        }
        let resource = parse_segment(parts[0], parts[1])?;
        let principal = parse_segment(parts[3], parts[4])?;
        Ok(Grant::new(&resource, parts[2], principal))
    }
}

/// `<kind>:<name>` with the name percent-encoded, so a `:` inside a name
/// cannot be mistaken for a separator.
fn id_segment(id: &ResourceId) -> String {
    format!("{}:{}", id.kind, urlencoding::encode(&id.resource))
}

fn parse_segment(kind: &str, name: &str) -> Result<ResourceId, String> {
    let kind: ResourceKind = kind.parse()?;
    let name = urlencoding::decode(name)
        .map_err(|e| format!("invalid escaped name '{name}': {e}"))?;
    Ok(ResourceId::new(kind, name.into_owned()))
}
