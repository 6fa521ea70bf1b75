//! Personal access tokens

use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::RelationalEntity;
use crate::model::AccessTokenRecord;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "access_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub username: String,
    #[sea_orm(unique)]
    pub access_token: String,
    pub gmt_create: Option<i64>,
    pub last_active_time: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl RelationalEntity for AccessTokenRecord {
    type Table = Entity;
    type Row = Model;
    type Active = ActiveModel;

    fn from_row(row: Model) -> Self {
        Self {
            id: row.id,
            name: row.name,
            username: row.username,
            access_token: row.access_token,
            create_time: row.gmt_create,
            last_active_time: row.last_active_time,
        }
    }

    fn into_active(self) -> ActiveModel {
        ActiveModel {
            id: Set(self.id),
            name: Set(self.name),
            username: Set(self.username),
            access_token: Set(self.access_token),
            gmt_create: Set(self.create_time),
            last_active_time: Set(self.last_active_time),
        }
    }
}
