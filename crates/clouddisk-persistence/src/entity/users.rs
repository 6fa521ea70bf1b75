//! User accounts

use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{RelationalEntity, json_list, to_json_list};
use crate::model::UserRecord;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub username: String,
    pub show_name: Option<String>,
    pub avatar: Option<String>,
    /// Role ids as a JSON array
    #[sea_orm(column_type = "Json", nullable)]
    pub roles: Option<Json>,
    pub quota: Option<i32>,
    pub take_up_space: Option<i64>,
    pub creator: Option<bool>,
    pub mfa_enabled: Option<bool>,
    /// Epoch millis
    pub gmt_create: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl RelationalEntity for UserRecord {
    type Table = Entity;
    type Row = Model;
    type Active = ActiveModel;

    fn from_row(row: Model) -> Self {
        Self {
            id: row.id,
            username: row.username,
            show_name: row.show_name,
            avatar: row.avatar,
            roles: json_list(row.roles),
            quota: row.quota,
            take_up_space: row.take_up_space,
            creator: row.creator,
            mfa_enabled: row.mfa_enabled,
            created_time: row.gmt_create,
        }
    }

    fn into_active(self) -> ActiveModel {
        ActiveModel {
            roles: Set(to_json_list(&self.roles)),
            id: Set(self.id),
            username: Set(self.username),
            show_name: Set(self.show_name),
            avatar: Set(self.avatar),
            quota: Set(self.quota),
            take_up_space: Set(self.take_up_space),
            creator: Set(self.creator),
            mfa_enabled: Set(self.mfa_enabled),
            gmt_create: Set(self.created_time),
        }
    }
}
