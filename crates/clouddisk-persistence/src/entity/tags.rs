//! Article tags

use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::RelationalEntity;
use crate::model::TagRecord;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub slug: Option<String>,
    pub color: Option<String>,
    pub tag_background: Option<String>,
    /// `sort` is reserved in several dialects
    pub sort_order: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl RelationalEntity for TagRecord {
    type Table = Entity;
    type Row = Model;
    type Active = ActiveModel;

    fn from_row(row: Model) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            slug: row.slug,
            color: row.color,
            tag_background: row.tag_background,
            sort: row.sort_order,
        }
    }

    fn into_active(self) -> ActiveModel {
        ActiveModel {
            id: Set(self.id),
            user_id: Set(self.user_id),
            name: Set(self.name),
            slug: Set(self.slug),
            color: Set(self.color),
            tag_background: Set(self.tag_background),
            sort_order: Set(self.sort),
        }
    }
}
