// Document store backed by RocksDB
// One column family per collection, JSON documents keyed by `_id`

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde_json::Value;
use tracing::debug;

use crate::error::{PersistenceError, Result};
use crate::model::EntityKind;
use crate::paging::{DocumentPage, SortDirection};
use crate::translate::{DocumentFilter, DocumentMutation};

/// JSON document store over RocksDB column families
#[derive(Clone)]
pub struct DocumentStore {
    db: Arc<DB>,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("path", &self.db.path())
            .finish()
    }
}

impl DocumentStore {
    /// Open (or create) a store with a column family for every entity
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let mut cf_opts = Options::default();
        cf_opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let cfs = EntityKind::ALL
            .iter()
            .map(|kind| ColumnFamilyDescriptor::new(kind.collection(), cf_opts.clone()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cfs)?;
        debug!(path = %path.as_ref().display(), "Document store opened");
        Ok(Self { db: Arc::new(db) })
    }

    pub fn from_db(db: Arc<DB>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> Arc<DB> {
        self.db.clone()
    }

    fn cf(&self, collection: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(collection)
            .ok_or_else(|| PersistenceError::MissingCollection(collection.to_string()))
    }

    /// Insert or replace a document
    pub fn put(&self, collection: &str, id: &str, doc: &Value) -> Result<()> {
        let cf = self.cf(collection)?;
        self.db.put_cf(cf, id.as_bytes(), serde_json::to_vec(doc)?)?;
        Ok(())
    }

    /// Insert or replace documents in one atomic batch
    pub fn put_many(&self, collection: &str, docs: &[(String, Value)]) -> Result<()> {
        let cf = self.cf(collection)?;
        let mut batch = WriteBatch::default();
        for (id, doc) in docs {
            batch.put_cf(cf, id.as_bytes(), serde_json::to_vec(doc)?);
        }
        self.db.write(batch)?;
        Ok(())
    }

    pub fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let cf = self.cf(collection)?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Returns whether a document was removed
    pub fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let cf = self.cf(collection)?;
        if self.db.get_pinned_cf(cf, id.as_bytes())?.is_none() {
            return Ok(false);
        }
        self.db.delete_cf(cf, id.as_bytes())?;
        Ok(true)
    }

    /// Visit documents in key order, stopping when `visit` returns false
    fn scan<F>(&self, collection: &str, mut visit: F) -> Result<()>
    where
        F: FnMut(&[u8], Value) -> bool,
    {
        let cf = self.cf(collection)?;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = item?;
            let doc: Value = serde_json::from_slice(&value)?;
            if !visit(&key, doc) {
                break;
            }
        }
        Ok(())
    }

    fn matching(&self, collection: &str, filter: &DocumentFilter) -> Result<Vec<(Vec<u8>, Value)>> {
        let mut out = Vec::new();
        self.scan(collection, |key, doc| {
            if filter.matches(&doc) {
                out.push((key.to_vec(), doc));
            }
            true
        })?;
        Ok(out)
    }

    /// Filtered, sorted and paged documents. Ties keep key order.
    pub fn find(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        page: &DocumentPage,
    ) -> Result<Vec<Value>> {
        let mut docs: Vec<Value> = self
            .matching(collection, filter)?
            .into_iter()
            .map(|(_, doc)| doc)
            .collect();

        if !page.sort.is_empty() {
            docs.sort_by(|a, b| {
                for (key, direction) in &page.sort {
                    let ord = compare_json(
                        a.get(key).unwrap_or(&Value::Null),
                        b.get(key).unwrap_or(&Value::Null),
                    );
                    let ord = match direction {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        let skip = usize::try_from(page.skip).unwrap_or(usize::MAX);
        let iter = docs.into_iter().skip(skip);
        Ok(match page.limit {
            Some(limit) => iter.take(usize::try_from(limit).unwrap_or(usize::MAX)).collect(),
            None => iter.collect(),
        })
    }

    pub fn count(&self, collection: &str, filter: &DocumentFilter) -> Result<u64> {
        let mut count = 0u64;
        self.scan(collection, |_, doc| {
            if filter.matches(&doc) {
                count += 1;
            }
            true
        })?;
        Ok(count)
    }

    /// `limit` documents after skipping `skip`, in key order
    pub fn find_batch(&self, collection: &str, skip: u64, limit: u64) -> Result<Vec<Value>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut seen = 0u64;
        let mut out = Vec::new();
        self.scan(collection, |_, doc| {
            if seen >= skip {
                out.push(doc);
            }
            seen += 1;
            (out.len() as u64) < limit
        })?;
        Ok(out)
    }

    /// Apply `mutation` to every matching document, returning the count
    pub fn update(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        mutation: &DocumentMutation,
    ) -> Result<u64> {
        let matched = self.matching(collection, filter)?;
        if matched.is_empty() || mutation.is_empty() {
            return Ok(matched.len() as u64);
        }
        let cf = self.cf(collection)?;
        let mut batch = WriteBatch::default();
        for (key, mut doc) in matched.iter().cloned() {
            mutation.apply(&mut doc);
            batch.put_cf(cf, key, serde_json::to_vec(&doc)?);
        }
        self.db.write(batch)?;
        Ok(matched.len() as u64)
    }

    /// Remove every matching document, returning the count
    pub fn delete_where(&self, collection: &str, filter: &DocumentFilter) -> Result<u64> {
        let matched = self.matching(collection, filter)?;
        if matched.is_empty() {
            return Ok(0);
        }
        let cf = self.cf(collection)?;
        let mut batch = WriteBatch::default();
        for (key, _) in &matched {
            batch.delete_cf(cf, key);
        }
        self.db.write(batch)?;
        Ok(matched.len() as u64)
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: by type first, then by value
fn compare_json(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::mapping::FieldRegistry;
    use crate::paging::{PageRequest, Pageable};
    use crate::query::{LogicalQuery, LogicalUpdate};
    use crate::translate::{DocumentTranslator, QueryTranslator};

    fn create_test_store() -> (DocumentStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::open(temp_dir.path()).unwrap();
        (store, temp_dir)
    }

    fn seed_tags(store: &DocumentStore) {
        let docs: Vec<(String, Value)> = (0..5)
            .map(|i| {
                (
                    format!("t{}", i),
                    json!({ "_id": format!("t{}", i), "name": format!("tag-{}", i), "sort": 4 - i, "userId": if i % 2 == 0 { "u1" } else { "u2" } }),
                )
            })
            .collect();
        store.put_many("tag", &docs).unwrap();
    }

    #[test]
    fn test_put_get_delete() {
        let (store, _dir) = create_test_store();
        store.put("user", "u1", &json!({"_id": "u1", "username": "a"})).unwrap();
        assert_eq!(store.get("user", "u1").unwrap().unwrap()["username"], "a");
        assert!(store.delete("user", "u1").unwrap());
        assert!(!store.delete("user", "u1").unwrap());
        assert!(store.get("user", "u1").unwrap().is_none());
    }

    #[test]
    fn test_missing_collection() {
        let (store, _dir) = create_test_store();
        let err = store.get("nope", "x").unwrap_err();
        assert!(matches!(err, PersistenceError::MissingCollection(ref c) if c == "nope"));
    }

    #[test]
    fn test_find_batch_walks_key_order() {
        let (store, _dir) = create_test_store();
        seed_tags(&store);
        let first = store.find_batch("tag", 0, 2).unwrap();
        let second = store.find_batch("tag", 2, 2).unwrap();
        let third = store.find_batch("tag", 4, 2).unwrap();
        let rest = store.find_batch("tag", 6, 2).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(third.len(), 1);
        assert!(rest.is_empty());
        assert_eq!(first[0]["_id"], "t0");
        assert_eq!(third[0]["_id"], "t4");
    }

    #[test]
    fn test_filtered_sorted_page() {
        let (store, _dir) = create_test_store();
        seed_tags(&store);
        let fields = FieldRegistry::standard();
        let translator = DocumentTranslator::new(std::sync::Arc::new(fields.clone()));

        let filter =
            translator.translate_query(EntityKind::Tag, &LogicalQuery::new().eq("user_id", "u1"));
        let pageable = Pageable::from_request(
            &PageRequest::new(1, 2).sorted_by("sort", "ascending"),
            None,
        );
        let page = DocumentPage::from_pageable(&pageable, EntityKind::Tag, &fields);
        let docs = store.find("tag", &filter, &page).unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d["_id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["t4", "t2"]);
        assert_eq!(store.count("tag", &filter).unwrap(), 3);
        assert_eq!(store.count("tag", &DocumentFilter::all()).unwrap(), 5);
    }

    #[test]
    fn test_update_and_delete_where() {
        let (store, _dir) = create_test_store();
        seed_tags(&store);
        let translator = DocumentTranslator::new(std::sync::Arc::new(FieldRegistry::standard()));
        let filter =
            translator.translate_query(EntityKind::Tag, &LogicalQuery::new().eq("user_id", "u2"));
        let mutation = translator.translate_update(
            EntityKind::Tag,
            &LogicalUpdate::new().set("color", "#fff").unset("sort"),
        );
        assert_eq!(store.update("tag", &filter, &mutation).unwrap(), 2);
        let t1 = store.get("tag", "t1").unwrap().unwrap();
        assert_eq!(t1["color"], "#fff");
        assert!(t1.get("sort").is_none());

        assert_eq!(store.delete_where("tag", &filter).unwrap(), 2);
        assert_eq!(store.count("tag", &DocumentFilter::all()).unwrap(), 3);
    }

    #[test]
    fn test_compare_json() {
        assert_eq!(compare_json(&json!(1), &json!(2.5)), Ordering::Less);
        assert_eq!(compare_json(&json!(null), &json!(0)), Ordering::Less);
        assert_eq!(compare_json(&json!("b"), &json!("a")), Ordering::Greater);
    }
}
