use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::document::DocumentStore;
use crate::handler::RegistrySlot;
use crate::model::{AccessTokenRecord, DirectLinkRecord, RoleRecord, TagRecord, UserRecord};
use crate::queue::Writer;

use super::{DocumentSource, MigrationJob, MigrationResult, WriterTarget};

pub const DEFAULT_PARALLELISM: usize = 4;

/// Runs migration jobs concurrently, at most `parallelism` at a time
pub struct MigrationRunner {
    parallelism: usize,
    jobs: Vec<(&'static str, BoxFuture<'static, MigrationResult>)>,
}

impl MigrationRunner {
    pub fn new(parallelism: usize) -> Self {
        Self {
            parallelism: parallelism.max(1),
            jobs: Vec::new(),
        }
    }

    /// One document-to-relational job per entity
    pub fn document_to_relational(
        store: &DocumentStore,
        writer: &Writer,
        batch_size: u64,
        parallelism: usize,
    ) -> Self {
        fn job<E: RegistrySlot>(
            store: &DocumentStore,
            writer: &Writer,
            batch_size: u64,
        ) -> MigrationJob<E> {
            MigrationJob::new(
                Arc::new(DocumentSource::<E>::new(store.clone())),
                Arc::new(WriterTarget::<E>::new(writer.clone())),
                batch_size,
            )
        }

        Self::new(parallelism)
            .add(job::<UserRecord>(store, writer, batch_size))
            .add(job::<RoleRecord>(store, writer, batch_size))
            .add(job::<TagRecord>(store, writer, batch_size))
            .add(job::<AccessTokenRecord>(store, writer, batch_size))
            .add(job::<DirectLinkRecord>(store, writer, batch_size))
    }

    pub fn add<E: RegistrySlot>(mut self, job: MigrationJob<E>) -> Self {
        self.jobs.push((job.name(), Box::pin(job.run())));
        self
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Run every job and wait for all of them. Results keep the order the
    /// jobs were added in, one per job. A job whose task fails is reported
    /// as aborted.
    pub async fn run(self) -> Vec<MigrationResult> {
        let semaphore = Arc::new(Semaphore::new(self.parallelism));

        let handles: Vec<_> = self
            .jobs
            .into_iter()
            .map(|(name, job)| {
                let semaphore = semaphore.clone();
                let handle = tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    job.await
                });
                (name, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    error!(entity = name, error = %e, "Migration task failed");
                    let mut result = MigrationResult::new(name);
                    result.abort(format!("migration task failed: {}", e));
                    result
                }
            };
            log_summary(&result);
            results.push(result);
        }
        results
    }
}

/// Log one job's outcome: nothing for empty runs, an error listing the
/// failures when anything was lost, otherwise the total and elapsed time.
pub fn log_summary(result: &MigrationResult) {
    if result.total_processed == 0 && result.fatal_error.is_none() {
        info!(entity = %result.name, state = ?result.state, "Nothing migrated");
        return;
    }

    if result.total_processed != result.success_count || result.fatal_error.is_some() {
        if let Some(fatal) = &result.fatal_error {
            error!(entity = %result.name, error = %fatal, "{}", result);
        } else {
            error!(entity = %result.name, "{}", result);
            for (id, message) in &result.errors {
                error!(entity = %result.name, id = %id, error = %message, "Record not migrated");
            }
        }
        return;
    }

    info!(
        entity = %result.name,
        migrated = result.success_count,
        seconds = result.duration().num_milliseconds() as f64 / 1000.0,
        "Migration finished"
    );
}
