//! Persistence layer for the clouddisk server
//!
//! Business code builds typed operations ([`operation`]) over backend-neutral
//! records ([`model`]) and runs them through a [`Dispatcher`]. Exactly one
//! backend is active per process: the embedded document store
//! ([`document`]) or a SeaORM relational database ([`entity`]). Logical field
//! names are translated per backend by [`translate`] using the tables in
//! [`mapping`].
//!
//! [`migrate`] copies every document collection into the relational tables
//! when switching backends.

pub mod authority;
pub mod dispatch;
pub mod document;
pub mod entity;
pub mod error;
pub mod handler;
pub mod mapping;
pub mod migrate;
pub mod model;
pub mod operation;
pub mod paging;
pub mod query;
pub mod queue;
pub mod translate;

pub use authority::{AuthorityCatalog, authority_for};
pub use dispatch::Dispatcher;
pub use document::DocumentStore;
pub use error::{ConfigurationError, PersistenceError, Result};
pub use handler::{HandlerRegistry, register_document_handlers, register_relational_handlers};
pub use mapping::FieldRegistry;
pub use model::{
    AccessTokenRecord, Backend, DirectLinkRecord, Entity, EntityKind, Page, RoleRecord, TagRecord,
    UserRecord,
};
pub use paging::PageRequest;
pub use query::{LogicalQuery, LogicalUpdate};
pub use queue::{DEFAULT_QUEUE_CAPACITY, WriteQueue, Writer};
pub use translate::{ActiveTranslator, DocumentTranslator, RelationalTranslator};

pub use sea_orm;
