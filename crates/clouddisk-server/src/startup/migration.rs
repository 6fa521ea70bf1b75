//! One-shot copy of document-store data into the relational store

use clouddisk_persistence::migrate::{MigrationResult, MigrationRunner};
use clouddisk_persistence::{Backend, DocumentStore};
use tracing::{debug, info, warn};

use super::PersistenceContext;
use crate::model::Configuration;

/// Migrate when the relational store is active, migration is enabled and
/// the document store path exists. Returns `None` when the run was not due.
pub async fn run_startup_migration(
    configuration: &Configuration,
    context: &PersistenceContext,
) -> anyhow::Result<Option<Vec<MigrationResult>>> {
    if context.backend() != Backend::RelationalStore {
        debug!(backend = %context.backend(), "Migration only targets the relational store");
        return Ok(None);
    }
    if !configuration.migration_enabled() {
        debug!("Migration disabled");
        return Ok(None);
    }

    let path = configuration.document_path();
    if !path.exists() {
        warn!(path = %path.display(), "Document store not found, skipping migration");
        return Ok(None);
    }

    let store = DocumentStore::open(&path)?;
    let batch_size = configuration.migration_batch_size();
    let parallelism = configuration.migration_parallelism();
    info!(
        path = %path.display(),
        batch_size,
        parallelism,
        "Starting document store migration"
    );

    let results =
        MigrationRunner::document_to_relational(&store, context.writer(), batch_size, parallelism)
            .run()
            .await;

    let migrated: u64 = results.iter().map(|r| r.success_count).sum();
    let failed: u64 = results.iter().map(|r| r.error_count).sum();
    let aborted = results.iter().filter(|r| r.fatal_error.is_some()).count();
    info!(jobs = results.len(), migrated, failed, aborted, "Document store migration finished");

    Ok(Some(results))
}
