// Operation handlers and their per-entity grouping
// Each backend provides one generic handler implementing every operation

pub mod document;
pub mod registry;
pub mod relational;

use std::sync::Arc;

use async_trait::async_trait;

pub use document::{DocumentHandler, register_document_handlers};
pub use registry::{HandlerRegistry, HandlerRegistryBuilder, RegistrySlot};
pub use relational::{RelationalHandler, register_relational_handlers};

use crate::error::{ConfigurationError, Result};
use crate::model::Backend;
use crate::operation::{
    Count, Create, CreateAll, DeleteAllByIds, DeleteById, DeleteWhere, FindById, FindPage,
    Operation, OperationKind, OperationVariant, UpdateField, UpdateWhere,
};

/// Executes one operation variant against one backend
#[async_trait]
pub trait Handler<O: Operation>: Send + Sync {
    fn backend(&self) -> Backend;

    async fn handle(&self, op: O) -> Result<O::Output>;
}

/// A handler for every operation variant of one entity
pub struct EntityHandlers<E: RegistrySlot> {
    pub(crate) create: Arc<dyn Handler<Create<E>>>,
    pub(crate) create_all: Arc<dyn Handler<CreateAll<E>>>,
    pub(crate) find_by_id: Arc<dyn Handler<FindById<E>>>,
    pub(crate) find_page: Arc<dyn Handler<FindPage<E>>>,
    pub(crate) count: Arc<dyn Handler<Count<E>>>,
    pub(crate) update_field: Arc<dyn Handler<UpdateField<E>>>,
    pub(crate) update_where: Arc<dyn Handler<UpdateWhere<E>>>,
    pub(crate) delete_by_id: Arc<dyn Handler<DeleteById<E>>>,
    pub(crate) delete_all_by_ids: Arc<dyn Handler<DeleteAllByIds<E>>>,
    pub(crate) delete_where: Arc<dyn Handler<DeleteWhere<E>>>,
}

impl<E: RegistrySlot> Clone for EntityHandlers<E> {
    fn clone(&self) -> Self {
        Self {
            create: self.create.clone(),
            create_all: self.create_all.clone(),
            find_by_id: self.find_by_id.clone(),
            find_page: self.find_page.clone(),
            count: self.count.clone(),
            update_field: self.update_field.clone(),
            update_where: self.update_where.clone(),
            delete_by_id: self.delete_by_id.clone(),
            delete_all_by_ids: self.delete_all_by_ids.clone(),
            delete_where: self.delete_where.clone(),
        }
    }
}

impl<E: RegistrySlot> EntityHandlers<E> {
    /// Use one handler for every variant
    pub fn with_all<H>(handler: Arc<H>) -> Self
    where
        H: Handler<Create<E>>
            + Handler<CreateAll<E>>
            + Handler<FindById<E>>
            + Handler<FindPage<E>>
            + Handler<Count<E>>
            + Handler<UpdateField<E>>
            + Handler<UpdateWhere<E>>
            + Handler<DeleteById<E>>
            + Handler<DeleteAllByIds<E>>
            + Handler<DeleteWhere<E>>
            + 'static,
    {
        Self {
            create: handler.clone(),
            create_all: handler.clone(),
            find_by_id: handler.clone(),
            find_page: handler.clone(),
            count: handler.clone(),
            update_field: handler.clone(),
            update_where: handler.clone(),
            delete_by_id: handler.clone(),
            delete_all_by_ids: handler.clone(),
            delete_where: handler,
        }
    }

    pub fn builder() -> EntityHandlersBuilder<E> {
        EntityHandlersBuilder::default()
    }

    /// Backend of the handler serving `variant`
    pub fn backend_of(&self, variant: OperationVariant) -> Backend {
        match variant {
            OperationVariant::Create => self.create.backend(),
            OperationVariant::CreateAll => self.create_all.backend(),
            OperationVariant::FindById => self.find_by_id.backend(),
            OperationVariant::FindPage => self.find_page.backend(),
            OperationVariant::Count => self.count.backend(),
            OperationVariant::UpdateField => self.update_field.backend(),
            OperationVariant::UpdateWhere => self.update_where.backend(),
            OperationVariant::DeleteById => self.delete_by_id.backend(),
            OperationVariant::DeleteAllByIds => self.delete_all_by_ids.backend(),
            OperationVariant::DeleteWhere => self.delete_where.backend(),
        }
    }
}

/// Assembles [`EntityHandlers`] slot by slot. Building fails on the first
/// empty slot.
pub struct EntityHandlersBuilder<E: RegistrySlot> {
    create: Option<Arc<dyn Handler<Create<E>>>>,
    create_all: Option<Arc<dyn Handler<CreateAll<E>>>>,
    find_by_id: Option<Arc<dyn Handler<FindById<E>>>>,
    find_page: Option<Arc<dyn Handler<FindPage<E>>>>,
    count: Option<Arc<dyn Handler<Count<E>>>>,
    update_field: Option<Arc<dyn Handler<UpdateField<E>>>>,
    update_where: Option<Arc<dyn Handler<UpdateWhere<E>>>>,
    delete_by_id: Option<Arc<dyn Handler<DeleteById<E>>>>,
    delete_all_by_ids: Option<Arc<dyn Handler<DeleteAllByIds<E>>>>,
    delete_where: Option<Arc<dyn Handler<DeleteWhere<E>>>>,
}

impl<E: RegistrySlot> Default for EntityHandlersBuilder<E> {
    fn default() -> Self {
        Self {
            create: None,
            create_all: None,
            find_by_id: None,
            find_page: None,
            count: None,
            update_field: None,
            update_where: None,
            delete_by_id: None,
            delete_all_by_ids: None,
            delete_where: None,
        }
    }
}

fn required<O: Operation>(
    slot: Option<Arc<dyn Handler<O>>>,
) -> std::result::Result<Arc<dyn Handler<O>>, ConfigurationError> {
    slot.ok_or(ConfigurationError::MissingHandler { kind: O::kind() })
}

impl<E: RegistrySlot> EntityHandlersBuilder<E> {
    pub fn create(mut self, h: Arc<dyn Handler<Create<E>>>) -> Self {
        self.create = Some(h);
        self
    }

    pub fn create_all(mut self, h: Arc<dyn Handler<CreateAll<E>>>) -> Self {
        self.create_all = Some(h);
        self
    }

    pub fn find_by_id(mut self, h: Arc<dyn Handler<FindById<E>>>) -> Self {
        self.find_by_id = Some(h);
        self
    }

    pub fn find_page(mut self, h: Arc<dyn Handler<FindPage<E>>>) -> Self {
        self.find_page = Some(h);
        self
    }

    pub fn count(mut self, h: Arc<dyn Handler<Count<E>>>) -> Self {
        self.count = Some(h);
        self
    }

    pub fn update_field(mut self, h: Arc<dyn Handler<UpdateField<E>>>) -> Self {
        self.update_field = Some(h);
        self
    }

    pub fn update_where(mut self, h: Arc<dyn Handler<UpdateWhere<E>>>) -> Self {
        self.update_where = Some(h);
        self
    }

    pub fn delete_by_id(mut self, h: Arc<dyn Handler<DeleteById<E>>>) -> Self {
        self.delete_by_id = Some(h);
        self
    }

    pub fn delete_all_by_ids(mut self, h: Arc<dyn Handler<DeleteAllByIds<E>>>) -> Self {
        self.delete_all_by_ids = Some(h);
        self
    }

    pub fn delete_where(mut self, h: Arc<dyn Handler<DeleteWhere<E>>>) -> Self {
        self.delete_where = Some(h);
        self
    }

    pub fn build(self) -> std::result::Result<EntityHandlers<E>, ConfigurationError> {
        Ok(EntityHandlers {
            create: required(self.create)?,
            create_all: required(self.create_all)?,
            find_by_id: required(self.find_by_id)?,
            find_page: required(self.find_page)?,
            count: required(self.count)?,
            update_field: required(self.update_field)?,
            update_where: required(self.update_where)?,
            delete_by_id: required(self.delete_by_id)?,
            delete_all_by_ids: required(self.delete_all_by_ids)?,
            delete_where: required(self.delete_where)?,
        })
    }
}

/// First variant whose handler does not belong to `backend`
pub(crate) fn find_mismatch<E: RegistrySlot>(
    handlers: &EntityHandlers<E>,
    backend: Backend,
) -> Option<(OperationKind, Backend)> {
    OperationVariant::ALL.into_iter().find_map(|variant| {
        let found = handlers.backend_of(variant);
        (found != backend).then(|| (OperationKind::new(E::KIND, variant), found))
    })
}
