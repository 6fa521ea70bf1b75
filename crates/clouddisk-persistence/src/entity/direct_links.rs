use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::RelationalEntity;
use crate::model::DirectLinkRecord;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "direct_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub mark: String,
    pub file_id: String,
    pub user_id: Option<String>,
    pub gmt_modified: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl RelationalEntity for DirectLinkRecord {
    type Table = Entity;
    type Row = Model;
    type Active = ActiveModel;

    fn from_row(row: Model) -> Self {
        Self {
            id: row.id,
            mark: row.mark,
            file_id: row.file_id,
            user_id: row.user_id,
            update_date: row.gmt_modified,
        }
    }

    fn into_active(self) -> ActiveModel {
        ActiveModel {
            id: Set(self.id),
            mark: Set(self.mark),
            file_id: Set(self.file_id),
            user_id: Set(self.user_id),
            gmt_modified: Set(self.update_date),
        }
    }
}
