// Document-store handlers

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::document::DocumentStore;
use crate::error::Result;
use crate::mapping::ID_FIELD;
use crate::model::{
    AccessTokenRecord, Backend, DirectLinkRecord, Entity, Page, RoleRecord, TagRecord, UserRecord,
};
use crate::operation::{
    Count, Create, CreateAll, DeleteAllByIds, DeleteById, DeleteWhere, FindById, FindPage,
    Operation, UpdateField, UpdateWhere,
};
use crate::paging::{DocumentPage, Pageable};
use crate::query::LogicalQuery;
use crate::translate::{DocumentTranslator, QueryTranslator};

use super::{EntityHandlers, Handler, HandlerRegistryBuilder, RegistrySlot};

/// Serves every operation of `E` from its document collection
pub struct DocumentHandler<E> {
    store: DocumentStore,
    translator: DocumentTranslator,
    entity: PhantomData<fn() -> E>,
}

impl<E: Entity> DocumentHandler<E> {
    pub fn new(store: DocumentStore, translator: DocumentTranslator) -> Self {
        Self {
            store,
            translator,
            entity: PhantomData,
        }
    }

    fn collection(&self) -> &'static str {
        E::KIND.collection()
    }

    fn decode(doc: serde_json::Value) -> Result<E> {
        Ok(serde_json::from_value(doc)?)
    }

    fn by_id(id: &str) -> LogicalQuery {
        LogicalQuery::new().eq(ID_FIELD.logical, id)
    }
}

#[async_trait]
impl<E: RegistrySlot> Handler<Create<E>> for DocumentHandler<E> {
    fn backend(&self) -> Backend {
        Backend::DocumentStore
    }

    async fn handle(&self, op: Create<E>) -> Result<E> {
        let doc = serde_json::to_value(&op.record)?;
        self.store.put(self.collection(), op.record.id(), &doc)?;
        Ok(op.record)
    }
}

#[async_trait]
impl<E: RegistrySlot> Handler<CreateAll<E>> for DocumentHandler<E> {
    fn backend(&self) -> Backend {
        Backend::DocumentStore
    }

    async fn handle(&self, op: CreateAll<E>) -> Result<u64> {
        let docs = op
            .records
            .iter()
            .map(|r| -> Result<(String, serde_json::Value)> {
                Ok((r.id().to_string(), serde_json::to_value(r)?))
            })
            .collect::<Result<Vec<_>>>()?;
        self.store.put_many(self.collection(), &docs)?;
        Ok(docs.len() as u64)
    }
}

#[async_trait]
impl<E: RegistrySlot> Handler<FindById<E>> for DocumentHandler<E> {
    fn backend(&self) -> Backend {
        Backend::DocumentStore
    }

    async fn handle(&self, op: FindById<E>) -> Result<Option<E>> {
        self.store
            .get(self.collection(), &op.id)?
            .map(Self::decode)
            .transpose()
    }
}

#[async_trait]
impl<E: RegistrySlot> Handler<FindPage<E>> for DocumentHandler<E> {
    fn backend(&self) -> Backend {
        Backend::DocumentStore
    }

    async fn handle(&self, op: FindPage<E>) -> Result<Page<E>> {
        let filter = self.translator.translate_query(E::KIND, &op.query);
        let pageable = Pageable::from_request(&op.page, None);
        let page = DocumentPage::from_pageable(&pageable, E::KIND, self.translator.fields());

        let total = self.store.count(self.collection(), &filter)?;
        let items = self
            .store
            .find(self.collection(), &filter, &page)?
            .into_iter()
            .map(Self::decode)
            .collect::<Result<Vec<_>>>()?;

        debug!(
            collection = self.collection(),
            total,
            returned = items.len(),
            "Document page query"
        );
        Ok(Page::new(
            total,
            pageable.page_number(),
            pageable.limit().unwrap_or(total),
            items,
        ))
    }
}

#[async_trait]
impl<E: RegistrySlot> Handler<Count<E>> for DocumentHandler<E> {
    fn backend(&self) -> Backend {
        Backend::DocumentStore
    }

    async fn handle(&self, op: Count<E>) -> Result<u64> {
        let filter = self.translator.translate_query(E::KIND, &op.query);
        self.store.count(self.collection(), &filter)
    }
}

#[async_trait]
impl<E: RegistrySlot> Handler<UpdateField<E>> for DocumentHandler<E> {
    fn backend(&self) -> Backend {
        Backend::DocumentStore
    }

    async fn handle(&self, op: UpdateField<E>) -> Result<u64> {
        let filter = self.translator.translate_query(E::KIND, &Self::by_id(&op.id));
        let mutation = self.translator.translate_update(E::KIND, &op.update);
        self.store.update(self.collection(), &filter, &mutation)
    }
}

#[async_trait]
impl<E: RegistrySlot> Handler<UpdateWhere<E>> for DocumentHandler<E> {
    fn backend(&self) -> Backend {
        Backend::DocumentStore
    }

    async fn handle(&self, op: UpdateWhere<E>) -> Result<u64> {
        let filter = self.translator.translate_query(E::KIND, &op.query);
        let mutation = self.translator.translate_update(E::KIND, &op.update);
        self.store.update(self.collection(), &filter, &mutation)
    }
}

#[async_trait]
impl<E: RegistrySlot> Handler<DeleteById<E>> for DocumentHandler<E> {
    fn backend(&self) -> Backend {
        Backend::DocumentStore
    }

    async fn handle(&self, op: DeleteById<E>) -> Result<u64> {
        Ok(u64::from(self.store.delete(self.collection(), &op.id)?))
    }
}

#[async_trait]
impl<E: RegistrySlot> Handler<DeleteAllByIds<E>> for DocumentHandler<E> {
    fn backend(&self) -> Backend {
        Backend::DocumentStore
    }

    async fn handle(&self, op: DeleteAllByIds<E>) -> Result<u64> {
        let mut removed = 0;
        for id in &op.ids {
            removed += u64::from(self.store.delete(self.collection(), id)?);
        }
        Ok(removed)
    }
}

#[async_trait]
impl<E: RegistrySlot> Handler<DeleteWhere<E>> for DocumentHandler<E> {
    fn backend(&self) -> Backend {
        Backend::DocumentStore
    }

    async fn handle(&self, op: DeleteWhere<E>) -> Result<u64> {
        let filter = self.translator.translate_query(E::KIND, &op.query);
        let removed = self.store.delete_where(self.collection(), &filter)?;
        debug!(kind = %<DeleteWhere<E>>::kind(), removed, "Documents deleted");
        Ok(removed)
    }
}

fn entity_handlers<E: RegistrySlot>(
    store: &DocumentStore,
    translator: &DocumentTranslator,
) -> EntityHandlers<E> {
    EntityHandlers::with_all(Arc::new(DocumentHandler::<E>::new(
        store.clone(),
        translator.clone(),
    )))
}

/// Register document-store handlers for every entity
pub fn register_document_handlers(
    builder: HandlerRegistryBuilder,
    store: &DocumentStore,
    translator: &DocumentTranslator,
) -> HandlerRegistryBuilder {
    builder
        .register(entity_handlers::<UserRecord>(store, translator))
        .register(entity_handlers::<RoleRecord>(store, translator))
        .register(entity_handlers::<TagRecord>(store, translator))
        .register(entity_handlers::<AccessTokenRecord>(store, translator))
        .register(entity_handlers::<DirectLinkRecord>(store, translator))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;
    use crate::handler::HandlerRegistry;
    use crate::mapping::FieldRegistry;
    use crate::paging::PageRequest;
    use crate::query::LogicalUpdate;

    fn create_test_handler() -> (DocumentHandler<UserRecord>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::open(temp_dir.path()).unwrap();
        let translator = DocumentTranslator::new(Arc::new(FieldRegistry::standard()));
        (DocumentHandler::new(store, translator), temp_dir)
    }

    fn user(i: usize) -> UserRecord {
        UserRecord {
            id: format!("u{:03}", i),
            username: format!("user{}", i),
            quota: Some((i % 3) as i32),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (handler, _dir) = create_test_handler();
        let created = Handler::<Create<UserRecord>>::handle(&handler, Create::new(user(1)))
            .await
            .unwrap();
        assert_eq!(created.id, "u001");

        let found = Handler::<FindById<UserRecord>>::handle(&handler, FindById::new("u001"))
            .await
            .unwrap();
        assert_eq!(found, Some(user(1)));

        let missing = Handler::<FindById<UserRecord>>::handle(&handler, FindById::new("nope"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_page_count_and_updates() {
        let (handler, _dir) = create_test_handler();
        let users: Vec<_> = (0..9).map(user).collect();
        let inserted = handler.handle(CreateAll::new(users)).await.unwrap();
        assert_eq!(inserted, 9);

        let page = handler
            .handle(FindPage::new(
                LogicalQuery::new().eq("quota", 0),
                PageRequest::new(1, 2).sorted_by("username", "descending"),
            ))
            .await
            .unwrap();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.pages_available, 2);
        let names: Vec<_> = page.page_items.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["user6", "user3"]);

        let all = handler.handle(Count::all()).await.unwrap();
        assert_eq!(all, 9);

        let updated = handler
            .handle(UpdateField::new(
                "u001",
                LogicalUpdate::new().set("show_name", "One").set("quota", 5),
            ))
            .await
            .unwrap();
        assert_eq!(updated, 1);
        let one = handler.handle(FindById::new("u001")).await.unwrap().unwrap();
        assert_eq!(one.show_name.as_deref(), Some("One"));
        assert_eq!(one.quota, Some(5));

        let cleared = handler
            .handle(UpdateWhere::new(
                LogicalQuery::new().eq("quota", 1),
                LogicalUpdate::new().unset("quota"),
            ))
            .await
            .unwrap();
        assert_eq!(cleared, 2);
        let nulls = handler
            .handle(Count::new(LogicalQuery::new().eq("quota", serde_json::Value::Null)))
            .await
            .unwrap();
        assert_eq!(nulls, 2);
    }

    #[tokio::test]
    async fn test_deletes() {
        let (handler, _dir) = create_test_handler();
        handler
            .handle(CreateAll::new((0..6).map(user).collect()))
            .await
            .unwrap();

        assert_eq!(handler.handle(DeleteById::new("u000")).await.unwrap(), 1);
        assert_eq!(handler.handle(DeleteById::new("u000")).await.unwrap(), 0);
        assert_eq!(
            handler
                .handle(DeleteAllByIds::new(vec!["u001".into(), "u002".into(), "zz".into()]))
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            handler
                .handle(DeleteWhere::new(LogicalQuery::new().eq("quota", 0)))
                .await
                .unwrap(),
            1
        );
        assert_eq!(handler.handle(Count::all()).await.unwrap(), 2);
    }

    #[test]
    fn test_registers_complete_document_set() {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::open(temp_dir.path()).unwrap();
        let translator = DocumentTranslator::new(Arc::new(FieldRegistry::standard()));
        let registry = register_document_handlers(
            HandlerRegistry::builder(Backend::DocumentStore),
            &store,
            &translator,
        )
        .build()
        .unwrap();
        assert_eq!(registry.backend(), Backend::DocumentStore);

        let wrong = register_document_handlers(
            HandlerRegistry::builder(Backend::RelationalStore),
            &store,
            &translator,
        )
        .build();
        assert!(wrong.is_err());
    }
}
