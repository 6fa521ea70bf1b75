use std::sync::Arc;

use serde_json::Value;

use crate::mapping::FieldRegistry;
use crate::model::{Backend, EntityKind};
use crate::query::{LogicalQuery, LogicalUpdate, UpdateValue};

use super::QueryTranslator;

/// Conjunction of `key == value` clauses over JSON documents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    clauses: Vec<(String, Value)>,
}

impl DocumentFilter {
    /// Filter matching every document
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    /// A missing key compares equal to `null`.
    pub fn matches(&self, doc: &Value) -> bool {
        self.clauses.iter().all(|(key, expected)| {
            let actual = doc.get(key).unwrap_or(&Value::Null);
            json_eq(actual, expected)
        })
    }
}

/// `$set`/`$unset` style document mutation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMutation {
    pub set: Vec<(String, Value)>,
    pub unset: Vec<String>,
}

impl DocumentMutation {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }

    pub fn apply(&self, doc: &mut Value) {
        if let Value::Object(map) = doc {
            for (key, value) in &self.set {
                map.insert(key.clone(), value.clone());
            }
            for key in &self.unset {
                map.remove(key);
            }
        }
    }
}

/// Numbers compare by value so `1` matches `1.0`
pub(crate) fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => a == b,
    }
}

#[derive(Debug, Clone)]
pub struct DocumentTranslator {
    fields: Arc<FieldRegistry>,
}

impl DocumentTranslator {
    pub fn new(fields: Arc<FieldRegistry>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }
}

impl QueryTranslator for DocumentTranslator {
    type Filter = DocumentFilter;
    type Update = DocumentMutation;

    fn backend(&self) -> Backend {
        Backend::DocumentStore
    }

    fn translate_query(&self, entity: EntityKind, query: &LogicalQuery) -> DocumentFilter {
        let clauses = query
            .predicates()
            .map(|(field, value)| {
                let key = self.fields.resolve(entity, field, Backend::DocumentStore);
                (key.to_string(), value.clone())
            })
            .collect();
        DocumentFilter { clauses }
    }

    fn translate_update(&self, entity: EntityKind, update: &LogicalUpdate) -> DocumentMutation {
        let mut mutation = DocumentMutation::default();
        for (field, instruction) in update.assignments() {
            let key = self
                .fields
                .resolve(entity, field, Backend::DocumentStore)
                .to_string();
            match instruction {
                UpdateValue::Set(value) => mutation.set.push((key, value.clone())),
                UpdateValue::Unset => mutation.unset.push(key),
            }
        }
        mutation
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn translator() -> DocumentTranslator {
        DocumentTranslator::new(Arc::new(FieldRegistry::standard()))
    }

    #[test]
    fn test_translate_query_resolves_names() {
        let filter = translator().translate_query(
            EntityKind::User,
            &LogicalQuery::new().eq("id", "u1").eq("show_name", "Bob"),
        );
        assert_eq!(
            filter.clauses(),
            &[
                ("_id".to_string(), json!("u1")),
                ("showName".to_string(), json!("Bob"))
            ]
        );
    }

    #[test]
    fn test_unmapped_field_used_verbatim() {
        let filter = translator().translate_query(
            EntityKind::Tag,
            &LogicalQuery::new().eq("legacyFlag", true),
        );
        assert_eq!(filter.clauses()[0].0, "legacyFlag");
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let filter = translator().translate_query(EntityKind::Role, &LogicalQuery::new());
        assert!(filter.is_empty());
        assert!(filter.matches(&json!({})));
        assert!(filter.matches(&json!({"_id": "r1", "name": "x"})));
    }

    #[test]
    fn test_matches_null_and_numbers() {
        let filter = translator().translate_query(
            EntityKind::User,
            &LogicalQuery::new().eq("avatar", Value::Null).eq("quota", 10),
        );
        assert!(filter.matches(&json!({"quota": 10.0})));
        assert!(filter.matches(&json!({"avatar": null, "quota": 10})));
        assert!(!filter.matches(&json!({"avatar": "a.png", "quota": 10})));
        assert!(!filter.matches(&json!({"quota": 11})));
    }

    #[test]
    fn test_translate_update_and_apply() {
        let mutation = translator().translate_update(
            EntityKind::User,
            &LogicalUpdate::new()
                .set("show_name", "New")
                .set("avatar", "x")
                .unset("avatar"),
        );
        assert_eq!(mutation.set, vec![("showName".to_string(), json!("New"))]);
        assert_eq!(mutation.unset, vec!["avatar".to_string()]);

        let mut doc = json!({"_id": "u1", "showName": "Old", "avatar": "a.png"});
        mutation.apply(&mut doc);
        assert_eq!(doc, json!({"_id": "u1", "showName": "New"}));
    }
}
