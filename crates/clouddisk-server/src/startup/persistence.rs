//! Datasource composition
//!
//! Opens the one store named by `clouddisk.datasource.type`, builds its
//! handler registry and hands business code a [`PersistenceContext`].

use std::sync::Arc;

use anyhow::Context;
use clouddisk_migration::{Migrator, MigratorTrait};
use clouddisk_persistence::{
    ActiveTranslator, AuthorityCatalog, Backend, Dispatcher, DocumentStore, DocumentTranslator,
    FieldRegistry, HandlerRegistry, RelationalTranslator, WriteQueue, Writer,
    register_document_handlers, register_relational_handlers,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::ShutdownSignal;
use crate::model::Configuration;

/// Everything business code needs to reach the active backend
pub struct PersistenceContext {
    backend: Backend,
    dispatcher: Dispatcher,
    writer: Writer,
    translator: ActiveTranslator,
    authorities: AuthorityCatalog,
    fields: Arc<FieldRegistry>,
    database: Option<DatabaseConnection>,
    document_store: Option<DocumentStore>,
    queue_worker: Option<JoinHandle<()>>,
}

impl PersistenceContext {
    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn writer(&self) -> &Writer {
        &self.writer
    }

    pub fn translator(&self) -> &ActiveTranslator {
        &self.translator
    }

    pub fn authorities(&self) -> &AuthorityCatalog {
        &self.authorities
    }

    pub fn fields(&self) -> &Arc<FieldRegistry> {
        &self.fields
    }

    pub fn database(&self) -> Option<&DatabaseConnection> {
        self.database.as_ref()
    }

    pub fn document_store(&self) -> Option<&DocumentStore> {
        self.document_store.as_ref()
    }

    /// Stop the write queue and release the store
    pub async fn close(self) -> anyhow::Result<()> {
        let PersistenceContext {
            writer,
            dispatcher,
            database,
            document_store,
            queue_worker,
            ..
        } = self;
        drop(writer);
        drop(dispatcher);

        if let Some(worker) = queue_worker
            && let Err(e) = worker.await
        {
            warn!(error = %e, "Write queue consumer ended abnormally");
        }
        drop(document_store);
        if let Some(db) = database {
            db.close().await.context("failed to close database connection")?;
        }
        info!("Persistence closed");
        Ok(())
    }
}

pub async fn init_persistence(
    configuration: &Configuration,
    shutdown: &ShutdownSignal,
) -> anyhow::Result<PersistenceContext> {
    let backend = configuration.backend()?;
    let fields = Arc::new(FieldRegistry::standard());
    fields.validate()?;
    let authorities = AuthorityCatalog::build();

    info!(backend = %backend, "Initializing persistence");

    match backend {
        Backend::DocumentStore => {
            let path = configuration.document_path();
            let store = DocumentStore::open(&path).with_context(|| {
                format!("failed to open document store at {}", path.display())
            })?;
            let translator = DocumentTranslator::new(fields.clone());
            let registry =
                register_document_handlers(HandlerRegistry::builder(backend), &store, &translator)
                    .build()?;
            let dispatcher = Dispatcher::new(registry);

            info!(path = %path.display(), "Document store ready");

            Ok(PersistenceContext {
                backend,
                writer: Writer::direct(dispatcher.clone()),
                dispatcher,
                translator: ActiveTranslator::Document(translator),
                authorities,
                fields,
                database: None,
                document_store: Some(store),
                queue_worker: None,
            })
        }
        Backend::RelationalStore => {
            let db = configuration.database_connection().await?;
            Migrator::up(&db, None)
                .await
                .context("failed to apply relational schema")?;

            let translator = RelationalTranslator::new(fields.clone());
            let registry =
                register_relational_handlers(HandlerRegistry::builder(backend), &db, &translator)
                    .build()?;
            let dispatcher = Dispatcher::new(registry);

            // SQLite takes one writer at a time
            let (writer, queue_worker) = if db.get_database_backend() == DbBackend::Sqlite {
                let (queue, worker) = WriteQueue::start(
                    dispatcher.clone(),
                    configuration.write_queue_capacity(),
                    shutdown.subscribe(),
                );
                (Writer::queued(queue, dispatcher.clone()), Some(worker))
            } else {
                (Writer::direct(dispatcher.clone()), None)
            };

            info!(
                db_backend = ?db.get_database_backend(),
                queued_writes = writer.is_queued(),
                "Relational store ready"
            );

            Ok(PersistenceContext {
                backend,
                dispatcher,
                writer,
                translator: ActiveTranslator::Relational(translator),
                authorities,
                fields,
                database: Some(db),
                document_store: None,
                queue_worker,
            })
        }
    }
}
