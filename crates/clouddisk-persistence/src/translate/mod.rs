//! Translation of logical queries and updates into backend-native forms

pub mod document;
pub mod relational;

use std::sync::Arc;

pub use document::{DocumentFilter, DocumentMutation, DocumentTranslator};
pub use relational::{RelationalTranslator, RelationalUpdate};

use crate::mapping::FieldRegistry;
use crate::model::{Backend, EntityKind};
use crate::query::{LogicalQuery, LogicalUpdate};

/// Converts logical queries and updates for one backend
pub trait QueryTranslator: Send + Sync {
    type Filter;
    type Update;

    fn backend(&self) -> Backend;

    fn translate_query(&self, entity: EntityKind, query: &LogicalQuery) -> Self::Filter;

    fn translate_update(&self, entity: EntityKind, update: &LogicalUpdate) -> Self::Update;
}

/// Native filter of whichever backend is active
#[derive(Debug, Clone)]
pub enum NativeFilter {
    Document(DocumentFilter),
    Relational(sea_orm::Condition),
}

/// Native update of whichever backend is active
#[derive(Debug, Clone)]
pub enum NativeUpdate {
    Document(DocumentMutation),
    Relational(RelationalUpdate),
}

/// The translator selected at startup. Only the active backend's variant is
/// ever constructed.
#[derive(Debug, Clone)]
pub enum ActiveTranslator {
    Document(DocumentTranslator),
    Relational(RelationalTranslator),
}

impl ActiveTranslator {
    pub fn for_backend(backend: Backend, fields: Arc<FieldRegistry>) -> Self {
        match backend {
            Backend::DocumentStore => ActiveTranslator::Document(DocumentTranslator::new(fields)),
            Backend::RelationalStore => {
                ActiveTranslator::Relational(RelationalTranslator::new(fields))
            }
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            ActiveTranslator::Document(t) => t.backend(),
            ActiveTranslator::Relational(t) => t.backend(),
        }
    }

    pub fn translate_query(&self, entity: EntityKind, query: &LogicalQuery) -> NativeFilter {
        match self {
            ActiveTranslator::Document(t) => NativeFilter::Document(t.translate_query(entity, query)),
            ActiveTranslator::Relational(t) => {
                NativeFilter::Relational(t.translate_query(entity, query))
            }
        }
    }

    pub fn translate_update(&self, entity: EntityKind, update: &LogicalUpdate) -> NativeUpdate {
        match self {
            ActiveTranslator::Document(t) => {
                NativeUpdate::Document(t.translate_update(entity, update))
            }
            ActiveTranslator::Relational(t) => {
                NativeUpdate::Relational(t.translate_update(entity, update))
            }
        }
    }
}
