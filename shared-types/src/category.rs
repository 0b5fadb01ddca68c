use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

/// Which record kind may reference a category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum EntityType {
    #[default]
    Contact,
    Email,
    Both,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Contact => "contact",
            EntityType::Email => "email",
            EntityType::Both => "both",
        }
    }

    /// Contacts may only be filed under `contact` or `both` categories.
    pub fn allows_contacts(&self) -> bool {
        matches!(self, EntityType::Contact | EntityType::Both)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown entity type: {0}")]
pub struct UnknownEntityType(pub String);

impl FromStr for EntityType {
    type Err = UnknownEntityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contact" => Ok(EntityType::Contact),
            "email" => Ok(EntityType::Email),
            "both" => Ok(EntityType::Both),
            other => Err(UnknownEntityType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub entity_type: EntityType,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub entity_type: Option<EntityType>,
}

#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub entity_type: Option<EntityType>,
    pub is_active: Option<bool>,
}
