use std::sync::Arc;

use sea_orm::sea_query::{Alias, Expr, Keyword, SimpleExpr};
use sea_orm::{Condition, EntityTrait, UpdateMany};
use serde_json::Value as Json;

use crate::mapping::FieldRegistry;
use crate::model::{Backend, EntityKind};
use crate::query::{LogicalQuery, LogicalUpdate, UpdateValue};

use super::QueryTranslator;

/// Column assignments for an `UPDATE ... SET`
#[derive(Debug, Clone, Default)]
pub struct RelationalUpdate {
    assignments: Vec<(String, SimpleExpr)>,
}

impl RelationalUpdate {
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.assignments.iter().map(|(c, _)| c.as_str())
    }

    pub fn apply_to<E: EntityTrait>(self, mut update: UpdateMany<E>) -> UpdateMany<E> {
        for (column, expr) in self.assignments {
            update = update.col_expr(Alias::new(column), expr);
        }
        update
    }
}

/// Convert a JSON scalar to a bindable value. Arrays and objects bind as JSON.
/// Null binds untyped so it fits any column.
pub fn json_to_value(value: &Json) -> sea_orm::Value {
    match value {
        Json::Null => sea_orm::Value::String(None),
        Json::Bool(b) => sea_orm::Value::Bool(Some(*b)),
        Json::Number(n) => match n.as_i64() {
            Some(i) => sea_orm::Value::BigInt(Some(i)),
            None => sea_orm::Value::Double(n.as_f64()),
        },
        Json::String(s) => sea_orm::Value::String(Some(Box::new(s.clone()))),
        Json::Array(_) | Json::Object(_) => sea_orm::Value::Json(Some(Box::new(value.clone()))),
    }
}

#[derive(Debug, Clone)]
pub struct RelationalTranslator {
    fields: Arc<FieldRegistry>,
}

impl RelationalTranslator {
    pub fn new(fields: Arc<FieldRegistry>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    pub fn column(&self, entity: EntityKind, logical: &str) -> Alias {
        Alias::new(self.fields.resolve(entity, logical, Backend::RelationalStore))
    }
}

impl QueryTranslator for RelationalTranslator {
    type Filter = Condition;
    type Update = RelationalUpdate;

    fn backend(&self) -> Backend {
        Backend::RelationalStore
    }

    fn translate_query(&self, entity: EntityKind, query: &LogicalQuery) -> Condition {
        query
            .predicates()
            .fold(Condition::all(), |condition, (field, value)| {
                let column = Expr::col(self.column(entity, field));
                let predicate = match value {
                    Json::Null => column.is_null(),
                    other => column.eq(json_to_value(other)),
                };
                condition.add(predicate)
            })
    }

    fn translate_update(&self, entity: EntityKind, update: &LogicalUpdate) -> RelationalUpdate {
        let assignments = update
            .assignments()
            .map(|(field, instruction)| {
                let column = self
                    .fields
                    .resolve(entity, field, Backend::RelationalStore)
                    .to_string();
                let expr = match instruction {
                    UpdateValue::Set(Json::Null) | UpdateValue::Unset => {
                        SimpleExpr::Keyword(Keyword::Null)
                    }
                    UpdateValue::Set(value) => SimpleExpr::Value(json_to_value(value)),
                };
                (column, expr)
            })
            .collect();
        RelationalUpdate { assignments }
    }
}
