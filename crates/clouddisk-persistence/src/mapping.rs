//! Logical to physical field name mapping
//!
//! Business code names fields once (`created_time`); each backend stores the
//! field under its own physical name (`createdTime` in documents,
//! `gmt_create` in tables). Lookups never fail: a name with no entry is used
//! verbatim.

use std::collections::HashSet;

use crate::error::ConfigurationError;
use crate::model::{Backend, EntityKind};

/// One logical field and its physical name in each backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub logical: &'static str,
    pub document: &'static str,
    pub relational: &'static str,
}

impl FieldMapping {
    pub const fn new(
        logical: &'static str,
        document: &'static str,
        relational: &'static str,
    ) -> Self {
        Self {
            logical,
            document,
            relational,
        }
    }

    pub fn physical(&self, backend: Backend) -> &'static str {
        match backend {
            Backend::DocumentStore => self.document,
            Backend::RelationalStore => self.relational,
        }
    }
}

/// Identity field shared by every entity
pub const ID_FIELD: FieldMapping = FieldMapping::new("id", "_id", "id");

pub const USER_FIELDS: &[FieldMapping] = &[
    ID_FIELD,
    FieldMapping::new("username", "username", "username"),
    FieldMapping::new("show_name", "showName", "show_name"),
    FieldMapping::new("avatar", "avatar", "avatar"),
    FieldMapping::new("roles", "roles", "roles"),
    FieldMapping::new("quota", "quota", "quota"),
    FieldMapping::new("take_up_space", "takeUpSpace", "take_up_space"),
    FieldMapping::new("creator", "creator", "creator"),
    FieldMapping::new("mfa_enabled", "mfaEnabled", "mfa_enabled"),
    FieldMapping::new("created_time", "createdTime", "gmt_create"),
];

pub const ROLE_FIELDS: &[FieldMapping] = &[
    ID_FIELD,
    FieldMapping::new("name", "name", "name"),
    FieldMapping::new("code", "code", "code"),
    FieldMapping::new("remarks", "remarks", "remarks"),
    FieldMapping::new("menu_ids", "menuIds", "menu_ids"),
    FieldMapping::new("created_time", "createdTime", "gmt_create"),
];

pub const TAG_FIELDS: &[FieldMapping] = &[
    ID_FIELD,
    FieldMapping::new("user_id", "userId", "user_id"),
    FieldMapping::new("name", "name", "name"),
    FieldMapping::new("slug", "slug", "slug"),
    FieldMapping::new("color", "color", "color"),
    FieldMapping::new("tag_background", "tagBackground", "tag_background"),
    FieldMapping::new("sort", "sort", "sort_order"),
];

pub const ACCESS_TOKEN_FIELDS: &[FieldMapping] = &[
    ID_FIELD,
    FieldMapping::new("name", "name", "name"),
    FieldMapping::new("username", "username", "username"),
    FieldMapping::new("access_token", "accessToken", "access_token"),
    FieldMapping::new("create_time", "createTime", "gmt_create"),
    FieldMapping::new("last_active_time", "lastActiveTime", "last_active_time"),
];

pub const DIRECT_LINK_FIELDS: &[FieldMapping] = &[
    ID_FIELD,
    FieldMapping::new("mark", "mark", "mark"),
    FieldMapping::new("file_id", "fileId", "file_id"),
    FieldMapping::new("user_id", "userId", "user_id"),
    FieldMapping::new("update_date", "updateDate", "gmt_modified"),
];

/// Per-entity field tables, fixed at construction
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    tables: Vec<(EntityKind, &'static [FieldMapping])>,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl FieldRegistry {
    /// The built-in tables for every known entity
    pub fn standard() -> Self {
        Self::from_tables(vec![
            (EntityKind::User, USER_FIELDS),
            (EntityKind::Role, ROLE_FIELDS),
            (EntityKind::Tag, TAG_FIELDS),
            (EntityKind::AccessToken, ACCESS_TOKEN_FIELDS),
            (EntityKind::DirectLink, DIRECT_LINK_FIELDS),
        ])
    }

    pub fn from_tables(tables: Vec<(EntityKind, &'static [FieldMapping])>) -> Self {
        Self { tables }
    }

    pub fn fields(&self, entity: EntityKind) -> &'static [FieldMapping] {
        self.tables
            .iter()
            .find(|(kind, _)| *kind == entity)
            .map(|(_, fields)| *fields)
            .unwrap_or(&[])
    }

    /// Physical name of `logical` in `backend`, or `logical` itself when the
    /// entity has no entry for it.
    pub fn resolve<'a>(&self, entity: EntityKind, logical: &'a str, backend: Backend) -> &'a str {
        self.fields(entity)
            .iter()
            .find(|m| m.logical == logical)
            .map(|m| m.physical(backend))
            .unwrap_or(logical)
    }

    /// Reverse of [`resolve`](Self::resolve)
    pub fn logical_name<'a>(
        &self,
        entity: EntityKind,
        physical: &'a str,
        backend: Backend,
    ) -> &'a str {
        self.fields(entity)
            .iter()
            .find(|m| m.physical(backend) == physical)
            .map(|m| m.logical)
            .unwrap_or(physical)
    }

    /// Whether `logical` has an explicit entry
    pub fn is_mapped(&self, entity: EntityKind, logical: &str) -> bool {
        self.fields(entity).iter().any(|m| m.logical == logical)
    }

    /// Reject tables where a logical or physical name repeats, which would
    /// make the reverse lookup ambiguous.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (entity, fields) in &self.tables {
            let mut logical = HashSet::new();
            let mut document = HashSet::new();
            let mut relational = HashSet::new();
            for m in fields.iter() {
                let duplicate = if !logical.insert(m.logical) {
                    Some(m.logical)
                } else if !document.insert(m.document) {
                    Some(m.document)
                } else if !relational.insert(m.relational) {
                    Some(m.relational)
                } else {
                    None
                };
                if let Some(name) = duplicate {
                    return Err(ConfigurationError::DuplicateField {
                        entity: *entity,
                        name: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
