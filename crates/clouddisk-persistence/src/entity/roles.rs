use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{RelationalEntity, json_list, to_json_list};
use crate::model::RoleRecord;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub remarks: Option<String>,
    #[sea_orm(column_type = "Json", nullable)]
    pub menu_ids: Option<Json>,
    pub gmt_create: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl RelationalEntity for RoleRecord {
    type Table = Entity;
    type Row = Model;
    type Active = ActiveModel;

    fn from_row(row: Model) -> Self {
        Self {
            id: row.id,
            name: row.name,
            code: row.code,
            remarks: row.remarks,
            menu_ids: json_list(row.menu_ids),
            created_time: row.gmt_create,
        }
    }

    fn into_active(self) -> ActiveModel {
        ActiveModel {
            menu_ids: Set(to_json_list(&self.menu_ids)),
            id: Set(self.id),
            name: Set(self.name),
            code: Set(self.code),
            remarks: Set(self.remarks),
            gmt_create: Set(self.created_time),
        }
    }
}
