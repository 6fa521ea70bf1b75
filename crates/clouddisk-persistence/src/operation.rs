//! Typed persistence operations
//!
//! Every operation is a value of one of ten generic structs, one per
//! [`OperationVariant`]. Each declares its output type and knows which slot
//! of [`EntityHandlers`] serves it, so dispatch needs no runtime type tests.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::handler::registry::RegistrySlot;
use crate::handler::{EntityHandlers, Handler};
use crate::model::{EntityKind, Page};
use crate::paging::PageRequest;
use crate::query::{LogicalQuery, LogicalUpdate};

/// The closed set of operation variants every entity supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperationVariant {
    Create,
    CreateAll,
    FindById,
    FindPage,
    Count,
    UpdateField,
    UpdateWhere,
    DeleteById,
    DeleteAllByIds,
    DeleteWhere,
}

impl OperationVariant {
    pub const ALL: [OperationVariant; 10] = [
        OperationVariant::Create,
        OperationVariant::CreateAll,
        OperationVariant::FindById,
        OperationVariant::FindPage,
        OperationVariant::Count,
        OperationVariant::UpdateField,
        OperationVariant::UpdateWhere,
        OperationVariant::DeleteById,
        OperationVariant::DeleteAllByIds,
        OperationVariant::DeleteWhere,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationVariant::Create => "create",
            OperationVariant::CreateAll => "create_all",
            OperationVariant::FindById => "find_by_id",
            OperationVariant::FindPage => "find_page",
            OperationVariant::Count => "count",
            OperationVariant::UpdateField => "update_field",
            OperationVariant::UpdateWhere => "update_where",
            OperationVariant::DeleteById => "delete_by_id",
            OperationVariant::DeleteAllByIds => "delete_all_by_ids",
            OperationVariant::DeleteWhere => "delete_where",
        }
    }

    /// Whether the variant mutates the store
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            OperationVariant::FindById | OperationVariant::FindPage | OperationVariant::Count
        )
    }
}

impl fmt::Display for OperationVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One variant applied to one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationKind {
    pub entity: EntityKind,
    pub variant: OperationVariant,
}

impl OperationKind {
    pub const fn new(entity: EntityKind, variant: OperationVariant) -> Self {
        Self { entity, variant }
    }

    /// Every kind, entity-major
    pub fn all() -> impl Iterator<Item = OperationKind> {
        EntityKind::ALL.into_iter().flat_map(|entity| {
            OperationVariant::ALL
                .into_iter()
                .map(move |variant| OperationKind::new(entity, variant))
        })
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity.collection(), self.variant)
    }
}

/// A typed persistence intent with a declared output
pub trait Operation: fmt::Debug + Send + Sync + Sized + 'static {
    type Entity: RegistrySlot;
    type Output: Send + 'static;

    const VARIANT: OperationVariant;

    fn kind() -> OperationKind {
        OperationKind::new(<Self::Entity as crate::model::Entity>::KIND, Self::VARIANT)
    }

    /// The handler slot serving this operation
    fn route(handlers: &EntityHandlers<Self::Entity>) -> &Arc<dyn Handler<Self>>;
}

type Marker<E> = PhantomData<fn() -> E>;

/// Insert one record
#[derive(Debug, Clone)]
pub struct Create<E> {
    pub record: E,
}

impl<E> Create<E> {
    pub fn new(record: E) -> Self {
        Self { record }
    }
}

/// Bulk insert, all or nothing
#[derive(Debug, Clone)]
pub struct CreateAll<E> {
    pub records: Vec<E>,
}

impl<E> CreateAll<E> {
    pub fn new(records: Vec<E>) -> Self {
        Self { records }
    }
}

#[derive(Debug, Clone)]
pub struct FindById<E> {
    pub id: String,
    entity: Marker<E>,
}

impl<E> FindById<E> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity: PhantomData,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FindPage<E> {
    pub query: LogicalQuery,
    pub page: PageRequest,
    entity: Marker<E>,
}

impl<E> FindPage<E> {
    pub fn new(query: LogicalQuery, page: PageRequest) -> Self {
        Self {
            query,
            page,
            entity: PhantomData,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Count<E> {
    pub query: LogicalQuery,
    entity: Marker<E>,
}

impl<E> Count<E> {
    pub fn new(query: LogicalQuery) -> Self {
        Self {
            query,
            entity: PhantomData,
        }
    }

    pub fn all() -> Self {
        Self::new(LogicalQuery::new())
    }
}

/// Update fields of the record with `id`
#[derive(Debug, Clone)]
pub struct UpdateField<E> {
    pub id: String,
    pub update: LogicalUpdate,
    entity: Marker<E>,
}

impl<E> UpdateField<E> {
    pub fn new(id: impl Into<String>, update: LogicalUpdate) -> Self {
        Self {
            id: id.into(),
            update,
            entity: PhantomData,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpdateWhere<E> {
    pub query: LogicalQuery,
    pub update: LogicalUpdate,
    entity: Marker<E>,
}

impl<E> UpdateWhere<E> {
    pub fn new(query: LogicalQuery, update: LogicalUpdate) -> Self {
        Self {
            query,
            update,
            entity: PhantomData,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeleteById<E> {
    pub id: String,
    entity: Marker<E>,
}

impl<E> DeleteById<E> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity: PhantomData,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeleteAllByIds<E> {
    pub ids: Vec<String>,
    entity: Marker<E>,
}

impl<E> DeleteAllByIds<E> {
    pub fn new(ids: Vec<String>) -> Self {
        Self {
            ids,
            entity: PhantomData,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeleteWhere<E> {
    pub query: LogicalQuery,
    entity: Marker<E>,
}

impl<E> DeleteWhere<E> {
    pub fn new(query: LogicalQuery) -> Self {
        Self {
            query,
            entity: PhantomData,
        }
    }
}

macro_rules! impl_operation {
    ($op:ident, $variant:ident, $slot:ident, $output:ty) => {
        impl<E: RegistrySlot> Operation for $op<E> {
            type Entity = E;
            type Output = $output;

            const VARIANT: OperationVariant = OperationVariant::$variant;

            fn route(handlers: &EntityHandlers<E>) -> &Arc<dyn Handler<Self>> {
                &handlers.$slot
            }
        }
    };
}

impl_operation!(Create, Create, create, E);
impl_operation!(CreateAll, CreateAll, create_all, u64);
impl_operation!(FindById, FindById, find_by_id, Option<E>);
impl_operation!(FindPage, FindPage, find_page, Page<E>);
impl_operation!(Count, Count, count, u64);
impl_operation!(UpdateField, UpdateField, update_field, u64);
impl_operation!(UpdateWhere, UpdateWhere, update_where, u64);
impl_operation!(DeleteById, DeleteById, delete_by_id, u64);
impl_operation!(DeleteAllByIds, DeleteAllByIds, delete_all_by_ids, u64);
impl_operation!(DeleteWhere, DeleteWhere, delete_where, u64);
