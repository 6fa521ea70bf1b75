// Relational-store handlers over SeaORM

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use tracing::debug;

use crate::entity::RelationalEntity;
use crate::error::Result;
use crate::mapping::ID_FIELD;
use crate::model::{
    AccessTokenRecord, Backend, DirectLinkRecord, Page, RoleRecord, TagRecord, UserRecord,
};
use crate::operation::{
    Count, Create, CreateAll, DeleteAllByIds, DeleteById, DeleteWhere, FindById, FindPage,
    Operation, UpdateField, UpdateWhere,
};
use crate::paging::{Pageable, RelationalPage};
use crate::query::{LogicalQuery, LogicalUpdate};
use crate::translate::{QueryTranslator, RelationalTranslator};

use super::{EntityHandlers, Handler, HandlerRegistryBuilder, RegistrySlot};

/// Serves every operation of `E` from its SeaORM table
pub struct RelationalHandler<E> {
    db: DatabaseConnection,
    translator: RelationalTranslator,
    entity: PhantomData<fn() -> E>,
}

impl<E: RegistrySlot + RelationalEntity> RelationalHandler<E> {
    pub fn new(db: DatabaseConnection, translator: RelationalTranslator) -> Self {
        Self {
            db,
            translator,
            entity: PhantomData,
        }
    }

    fn by_id(id: &str) -> LogicalQuery {
        LogicalQuery::new().eq(ID_FIELD.logical, id)
    }

    async fn count_where(&self, query: &LogicalQuery) -> Result<u64> {
        let condition = self.translator.translate_query(E::KIND, query);
        Ok(E::Table::find().filter(condition).count(&self.db).await?)
    }

    async fn update_where(&self, query: &LogicalQuery, update: &LogicalUpdate) -> Result<u64> {
        // An empty SET clause is not valid SQL
        if update.is_empty() {
            return self.count_where(query).await;
        }
        let condition = self.translator.translate_query(E::KIND, query);
        let assignments = self.translator.translate_update(E::KIND, update);
        let result = assignments
            .apply_to(E::Table::update_many())
            .filter(condition)
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn delete_where(&self, query: &LogicalQuery) -> Result<u64> {
        let condition = self.translator.translate_query(E::KIND, query);
        let result = E::Table::delete_many()
            .filter(condition)
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[async_trait]
impl<E: RegistrySlot + RelationalEntity> Handler<Create<E>> for RelationalHandler<E> {
    fn backend(&self) -> Backend {
        Backend::RelationalStore
    }

    async fn handle(&self, op: Create<E>) -> Result<E> {
        E::Table::insert(op.record.clone().into_active())
            .exec_without_returning(&self.db)
            .await?;
        Ok(op.record)
    }
}

#[async_trait]
impl<E: RegistrySlot + RelationalEntity> Handler<CreateAll<E>> for RelationalHandler<E> {
    fn backend(&self) -> Backend {
        Backend::RelationalStore
    }

    async fn handle(&self, op: CreateAll<E>) -> Result<u64> {
        if op.records.is_empty() {
            return Ok(0);
        }
        let inserted = E::Table::insert_many(op.records.into_iter().map(E::into_active))
            .exec_without_returning(&self.db)
            .await?;
        Ok(inserted)
    }
}

#[async_trait]
impl<E: RegistrySlot + RelationalEntity> Handler<FindById<E>> for RelationalHandler<E> {
    fn backend(&self) -> Backend {
        Backend::RelationalStore
    }

    async fn handle(&self, op: FindById<E>) -> Result<Option<E>> {
        let condition = self.translator.translate_query(E::KIND, &Self::by_id(&op.id));
        let row = E::Table::find().filter(condition).one(&self.db).await?;
        Ok(row.map(E::from_row))
    }
}

#[async_trait]
impl<E: RegistrySlot + RelationalEntity> Handler<FindPage<E>> for RelationalHandler<E> {
    fn backend(&self) -> Backend {
        Backend::RelationalStore
    }

    async fn handle(&self, op: FindPage<E>) -> Result<Page<E>> {
        let condition = self.translator.translate_query(E::KIND, &op.query);
        let pageable = Pageable::from_request(&op.page, None);
        let page = RelationalPage::from_pageable(&pageable, E::KIND, self.translator.fields());

        let total = E::Table::find()
            .filter(condition.clone())
            .count(&self.db)
            .await?;
        let rows = page
            .apply(E::Table::find().filter(condition))
            .all(&self.db)
            .await?;

        debug!(
            table = E::KIND.table(),
            total,
            returned = rows.len(),
            "Relational page query"
        );
        Ok(Page::new(
            total,
            pageable.page_number(),
            pageable.limit().unwrap_or(total),
            rows.into_iter().map(E::from_row).collect(),
        ))
    }
}

#[async_trait]
impl<E: RegistrySlot + RelationalEntity> Handler<Count<E>> for RelationalHandler<E> {
    fn backend(&self) -> Backend {
        Backend::RelationalStore
    }

    async fn handle(&self, op: Count<E>) -> Result<u64> {
        self.count_where(&op.query).await
    }
}

#[async_trait]
impl<E: RegistrySlot + RelationalEntity> Handler<UpdateField<E>> for RelationalHandler<E> {
    fn backend(&self) -> Backend {
        Backend::RelationalStore
    }

    async fn handle(&self, op: UpdateField<E>) -> Result<u64> {
        self.update_where(&Self::by_id(&op.id), &op.update).await
    }
}

#[async_trait]
impl<E: RegistrySlot + RelationalEntity> Handler<UpdateWhere<E>> for RelationalHandler<E> {
    fn backend(&self) -> Backend {
        Backend::RelationalStore
    }

    async fn handle(&self, op: UpdateWhere<E>) -> Result<u64> {
        self.update_where(&op.query, &op.update).await
    }
}

#[async_trait]
impl<E: RegistrySlot + RelationalEntity> Handler<DeleteById<E>> for RelationalHandler<E> {
    fn backend(&self) -> Backend {
        Backend::RelationalStore
    }

    async fn handle(&self, op: DeleteById<E>) -> Result<u64> {
        self.delete_where(&Self::by_id(&op.id)).await
    }
}

#[async_trait]
impl<E: RegistrySlot + RelationalEntity> Handler<DeleteAllByIds<E>> for RelationalHandler<E> {
    fn backend(&self) -> Backend {
        Backend::RelationalStore
    }

    async fn handle(&self, op: DeleteAllByIds<E>) -> Result<u64> {
        if op.ids.is_empty() {
            return Ok(0);
        }
        let id = self.translator.column(E::KIND, ID_FIELD.logical);
        let result = E::Table::delete_many()
            .filter(Expr::col(id).is_in(op.ids))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[async_trait]
impl<E: RegistrySlot + RelationalEntity> Handler<DeleteWhere<E>> for RelationalHandler<E> {
    fn backend(&self) -> Backend {
        Backend::RelationalStore
    }

    async fn handle(&self, op: DeleteWhere<E>) -> Result<u64> {
        let removed = self.delete_where(&op.query).await?;
        debug!(kind = %<DeleteWhere<E>>::kind(), removed, "Rows deleted");
        Ok(removed)
    }
}

fn entity_handlers<E: RegistrySlot + RelationalEntity>(
    db: &DatabaseConnection,
    translator: &RelationalTranslator,
) -> EntityHandlers<E> {
    EntityHandlers::with_all(Arc::new(RelationalHandler::<E>::new(
        db.clone(),
        translator.clone(),
    )))
}

/// Register relational-store handlers for every entity
pub fn register_relational_handlers(
    builder: HandlerRegistryBuilder,
    db: &DatabaseConnection,
    translator: &RelationalTranslator,
) -> HandlerRegistryBuilder {
    builder
        .register(entity_handlers::<UserRecord>(db, translator))
        .register(entity_handlers::<RoleRecord>(db, translator))
        .register(entity_handlers::<TagRecord>(db, translator))
        .register(entity_handlers::<AccessTokenRecord>(db, translator))
        .register(entity_handlers::<DirectLinkRecord>(db, translator))
}
