//! Error types for the persistence layer

use crate::model::{Backend, EntityKind};
use crate::operation::OperationKind;

/// Startup-time wiring errors. Any of these prevents the process from
/// serving traffic.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("datasource type is not configured (clouddisk.datasource.type)")]
    MissingBackend,

    #[error("unknown datasource type: {0}")]
    UnknownBackend(String),

    #[error("no handler registered for {kind}")]
    MissingHandler { kind: OperationKind },

    #[error("handlers for {entity} registered more than once")]
    DuplicateHandler { entity: EntityKind },

    #[error("handler for {kind} belongs to {found}, active backend is {expected}")]
    BackendMismatch {
        kind: OperationKind,
        expected: Backend,
        found: Backend,
    },

    #[error("duplicate field mapping '{name}' for {entity}")]
    DuplicateField { entity: EntityKind, name: String },

    #[error("relational datasource url is not configured (clouddisk.datasource.url)")]
    MissingDatabaseUrl,
}

/// Runtime persistence errors. Store errors are wrapped unchanged.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("document store error: {0}")]
    Document(#[from] rocksdb::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("column family '{0}' not found")]
    MissingCollection(String),

    #[error("write queue is full, rejected {0}")]
    Rejected(OperationKind),

    #[error("write queue shut down before {0} completed")]
    Cancelled(OperationKind),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;
