//! Document-store to relational-store migration
//!
//! One [`MigrationJob`] per entity reads the document collection in
//! fixed-size batches and writes them through the relational handlers,
//! degrading to per-record writes when a bulk write fails.

mod job;
mod result;
mod runner;

use std::marker::PhantomData;

use async_trait::async_trait;

pub use job::{DEFAULT_BATCH_SIZE, MigrationJob};
pub use result::{JobState, MigrationResult};
pub use runner::{DEFAULT_PARALLELISM, MigrationRunner};

use crate::document::DocumentStore;
use crate::error::{PersistenceError, Result};
use crate::handler::RegistrySlot;
use crate::model::Entity;
use crate::operation::{Count, Create, CreateAll};
use crate::queue::Writer;

/// Batched reader over the records to migrate
#[async_trait]
pub trait MigrationSource<E: Entity>: Send + Sync {
    /// Up to `limit` records after the first `skip`, in a stable order
    async fn read_batch(&self, skip: u64, limit: u64) -> Result<Vec<E>>;
}

/// Destination of migrated records
#[async_trait]
pub trait MigrationTarget<E: Entity>: Send + Sync {
    async fn count(&self) -> Result<u64>;

    /// Write the whole batch or nothing
    async fn write_all(&self, records: Vec<E>) -> Result<u64>;

    async fn write_one(&self, record: E) -> Result<()>;
}

/// Reads a document collection in key order
pub struct DocumentSource<E> {
    store: DocumentStore,
    entity: PhantomData<fn() -> E>,
}

impl<E: Entity> DocumentSource<E> {
    pub fn new(store: DocumentStore) -> Self {
        Self {
            store,
            entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E: Entity> MigrationSource<E> for DocumentSource<E> {
    async fn read_batch(&self, skip: u64, limit: u64) -> Result<Vec<E>> {
        self.store
            .find_batch(E::KIND.collection(), skip, limit)?
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(PersistenceError::from))
            .collect()
    }
}

/// Writes through the active relational handlers
pub struct WriterTarget<E> {
    writer: Writer,
    entity: PhantomData<fn() -> E>,
}

impl<E: RegistrySlot> WriterTarget<E> {
    pub fn new(writer: Writer) -> Self {
        Self {
            writer,
            entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E: RegistrySlot> MigrationTarget<E> for WriterTarget<E> {
    async fn count(&self) -> Result<u64> {
        self.writer.submit(Count::<E>::all()).await
    }

    async fn write_all(&self, records: Vec<E>) -> Result<u64> {
        self.writer.submit(CreateAll::new(records)).await
    }

    async fn write_one(&self, record: E) -> Result<()> {
        self.writer.submit(Create::new(record)).await.map(|_| ())
    }
}
