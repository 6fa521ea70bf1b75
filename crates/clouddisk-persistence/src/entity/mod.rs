//! SeaORM entity definitions for the relational store
//!
//! Each table also carries the conversion between its row model and the
//! backend-neutral record in [`crate::model`].

pub mod access_tokens;
pub mod direct_links;
pub mod roles;
pub mod tags;
pub mod users;

pub mod prelude {
    pub use super::access_tokens::Entity as AccessTokens;
    pub use super::direct_links::Entity as DirectLinks;
    pub use super::roles::Entity as Roles;
    pub use super::tags::Entity as Tags;
    pub use super::users::Entity as Users;
}

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, EntityTrait, FromQueryResult, IntoActiveModel,
    ModelTrait,
};

use crate::model::Entity;

/// Binds a record to its SeaORM table
pub trait RelationalEntity: Entity {
    type Table: EntityTrait<Model = Self::Row> + Default;
    type Row: ModelTrait<Entity = Self::Table>
        + FromQueryResult
        + IntoActiveModel<Self::Active>
        + Send
        + Sync
        + 'static;
    type Active: ActiveModelTrait<Entity = Self::Table> + ActiveModelBehavior + Send + 'static;

    fn from_row(row: Self::Row) -> Self;

    fn into_active(self) -> Self::Active;
}

/// Decode a JSON list column, treating a missing or malformed value as empty
pub(crate) fn json_list(value: Option<serde_json::Value>) -> Vec<String> {
    value
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

pub(crate) fn to_json_list(items: &[String]) -> Option<serde_json::Value> {
    Some(serde_json::Value::from(items.to_vec()))
}


#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use sea_orm::{IdenStatic, Iterable};

    use super::*;
    use crate::mapping::FieldRegistry;
    use crate::model::{
        AccessTokenRecord, Backend, DirectLinkRecord, EntityKind, RoleRecord, TagRecord,
        UserRecord,
    };

    fn columns<C: Iterable + IdenStatic>() -> BTreeSet<&'static str> {
        C::iter().map(|c| c.as_str()).collect()
    }

    fn document_keys<T: serde::Serialize>(record: &T) -> BTreeSet<String> {
        match serde_json::to_value(record).unwrap() {
            serde_json::Value::Object(map) => map.keys().cloned().collect(),
            other => panic!("record serialized to {}", other),
        }
    }

    fn assert_complete(
        kind: EntityKind,
        table_columns: BTreeSet<&'static str>,
        doc_keys: BTreeSet<String>,
    ) {
        let fields = FieldRegistry::standard();
        let mapped_relational: BTreeSet<_> =
            fields.fields(kind).iter().map(|m| m.relational).collect();
        let mapped_document: BTreeSet<_> = fields
            .fields(kind)
            .iter()
            .map(|m| m.document.to_string())
            .collect();

        assert_eq!(table_columns, mapped_relational, "{} columns", kind);
        assert_eq!(doc_keys, mapped_document, "{} document keys", kind);

        for m in fields.fields(kind) {
            assert_eq!(fields.resolve(kind, m.logical, Backend::RelationalStore), m.relational);
            assert_eq!(fields.resolve(kind, m.logical, Backend::DocumentStore), m.document);
        }
    }

    #[test]
    fn test_user_mapping_complete() {
        assert_complete(
            EntityKind::User,
            columns::<users::Column>(),
            document_keys(&UserRecord::default()),
        );
    }

    #[test]
    fn test_role_mapping_complete() {
        assert_complete(
            EntityKind::Role,
            columns::<roles::Column>(),
            document_keys(&RoleRecord::default()),
        );
    }

    #[test]
    fn test_tag_mapping_complete() {
        assert_complete(
            EntityKind::Tag,
            columns::<tags::Column>(),
            document_keys(&TagRecord::default()),
        );
    }

    #[test]
    fn test_access_token_mapping_complete() {
        assert_complete(
            EntityKind::AccessToken,
            columns::<access_tokens::Column>(),
            document_keys(&AccessTokenRecord::default()),
        );
    }

    #[test]
    fn test_direct_link_mapping_complete() {
        assert_complete(
            EntityKind::DirectLink,
            columns::<direct_links::Column>(),
            document_keys(&DirectLinkRecord::default()),
        );
    }

    #[test]
    fn test_table_names_match_kinds() {
        use sea_orm::EntityName;
        assert_eq!(users::Entity.table_name(), EntityKind::User.table());
        assert_eq!(roles::Entity.table_name(), EntityKind::Role.table());
        assert_eq!(tags::Entity.table_name(), EntityKind::Tag.table());
        assert_eq!(access_tokens::Entity.table_name(), EntityKind::AccessToken.table());
        assert_eq!(direct_links::Entity.table_name(), EntityKind::DirectLink.table());
    }

    #[test]
    fn test_user_row_round_trip() {
        let user = UserRecord {
            id: "u1".to_string(),
            username: "jmal".to_string(),
            roles: vec!["r1".to_string(), "r2".to_string()],
            quota: Some(10),
            created_time: Some(1_700_000_000_000),
            ..Default::default()
        };
        let active = user.clone().into_active();
        let row = users::Model {
            id: active.id.clone().unwrap(),
            username: active.username.clone().unwrap(),
            show_name: active.show_name.clone().unwrap(),
            avatar: active.avatar.clone().unwrap(),
            roles: active.roles.clone().unwrap(),
            quota: active.quota.clone().unwrap(),
            take_up_space: active.take_up_space.clone().unwrap(),
            creator: active.creator.clone().unwrap(),
            mfa_enabled: active.mfa_enabled.clone().unwrap(),
            gmt_create: active.gmt_create.clone().unwrap(),
        };
        assert_eq!(UserRecord::from_row(row), user);
    }
}
