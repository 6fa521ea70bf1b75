//! Domain model types for the persistence abstraction layer
//!
//! These types are shared by both storage backends. Their serde
//! representation is the document-store shape (`_id`, camelCase keys); the
//! relational shape lives in [`crate::entity`].

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Storage backend selected for the running process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    /// Schema-less document store (RocksDB column families holding JSON)
    DocumentStore,
    /// Relational store (SQLite/MySQL/PostgreSQL via SeaORM)
    RelationalStore,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::DocumentStore, Backend::RelationalStore];

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::DocumentStore => "document-store",
            Backend::RelationalStore => "relational-store",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document-store" | "document" | "mongodb" => Ok(Backend::DocumentStore),
            "relational-store" | "relational" | "sqlite" | "mysql" | "postgresql" | "pgsql" => {
                Ok(Backend::RelationalStore)
            }
            _ => Err(format!("Invalid datasource type: {}", s)),
        }
    }
}

/// Entity types managed by the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    Role,
    Tag,
    AccessToken,
    DirectLink,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::User,
        EntityKind::Role,
        EntityKind::Tag,
        EntityKind::AccessToken,
        EntityKind::DirectLink,
    ];

    /// Document-store collection (column family) name
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Role => "role",
            EntityKind::Tag => "tag",
            EntityKind::AccessToken => "access_token",
            EntityKind::DirectLink => "direct_link",
        }
    }

    /// Relational table name
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Role => "roles",
            EntityKind::Tag => "tags",
            EntityKind::AccessToken => "access_tokens",
            EntityKind::DirectLink => "direct_links",
        }
    }

    /// Human-readable name used in logs and migration results
    pub fn display_name(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Role => "role",
            EntityKind::Tag => "tag",
            EntityKind::AccessToken => "access token",
            EntityKind::DirectLink => "direct link",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A record type stored by the persistence layer.
///
/// Implemented for the closed set of records below. Each one also has a
/// handler slot in [`crate::handler::HandlerRegistry`].
pub trait Entity: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;
}

/// Generic paginated result
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total_count: u64,
    pub page_number: u64,
    pub pages_available: u64,
    pub page_items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(total_count: u64, page_number: u64, page_size: u64, page_items: Vec<T>) -> Self {
        Self {
            total_count,
            page_number,
            pages_available: if page_size > 0 {
                total_count.div_ceil(page_size)
            } else {
                0
            },
            page_items,
        }
    }

    pub fn empty() -> Self {
        Self {
            total_count: 0,
            page_number: 0,
            pages_available: 0,
            page_items: Vec::new(),
        }
    }
}

/// Cloud disk user account
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub show_name: Option<String>,
    pub avatar: Option<String>,
    /// Role ids granted to the user
    #[serde(default)]
    pub roles: Vec<String>,
    /// Quota in GiB
    pub quota: Option<i32>,
    pub take_up_space: Option<i64>,
    pub creator: Option<bool>,
    pub mfa_enabled: Option<bool>,
    pub created_time: Option<i64>,
}

impl Entity for UserRecord {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Role with the menu ids it unlocks
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub code: String,
    pub remarks: Option<String>,
    #[serde(default)]
    pub menu_ids: Vec<String>,
    pub created_time: Option<i64>,
}

impl Entity for RoleRecord {
    const KIND: EntityKind = EntityKind::Role;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Article tag
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub slug: Option<String>,
    /// Hex color, e.g. `#00000000`
    pub color: Option<String>,
    pub tag_background: Option<String>,
    pub sort: Option<i32>,
}

impl Entity for TagRecord {
    const KIND: EntityKind = EntityKind::Tag;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Personal access token issued to a user
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub username: String,
    pub access_token: String,
    pub create_time: Option<i64>,
    pub last_active_time: Option<i64>,
}

impl Entity for AccessTokenRecord {
    const KIND: EntityKind = EntityKind::AccessToken;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Public direct-download link for a file
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectLinkRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub mark: String,
    pub file_id: String,
    pub user_id: Option<String>,
    pub update_date: Option<i64>,
}

impl Entity for DirectLinkRecord {
    const KIND: EntityKind = EntityKind::DirectLink;

    fn id(&self) -> &str {
        &self.id
    }
}
