use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::model::Entity;

use super::{MigrationResult, MigrationSource, MigrationTarget};

pub const DEFAULT_BATCH_SIZE: u64 = 1000;

/// Moves every record of one entity from a source to a target
pub struct MigrationJob<E: Entity> {
    source: Arc<dyn MigrationSource<E>>,
    target: Arc<dyn MigrationTarget<E>>,
    batch_size: u64,
}

impl<E: Entity> MigrationJob<E> {
    pub fn new(
        source: Arc<dyn MigrationSource<E>>,
        target: Arc<dyn MigrationTarget<E>>,
        batch_size: u64,
    ) -> Self {
        Self {
            source,
            target,
            batch_size: batch_size.max(1),
        }
    }

    pub fn name(&self) -> &'static str {
        E::KIND.display_name()
    }

    pub async fn run(self) -> MigrationResult {
        let name = self.name();
        let mut result = MigrationResult::new(name);

        match self.target.count().await {
            Ok(0) => {}
            Ok(existing) => {
                info!(entity = name, existing, "Target already has data, skipping migration");
                result.skip();
                return result;
            }
            Err(e) => {
                error!(entity = name, error = %e, "Failed to count target rows");
                result.abort(format!("failed to count target rows: {}", e));
                return result;
            }
        }

        result.start();
        info!(entity = name, batch_size = self.batch_size, "Migration started");

        let mut skip = 0u64;
        loop {
            let batch = match self.source.read_batch(skip, self.batch_size).await {
                Ok(batch) => batch,
                Err(e) => {
                    error!(entity = name, skip, error = %e, "Failed to read source batch");
                    result.abort(format!("failed to read batch at offset {}: {}", skip, e));
                    return result;
                }
            };
            if batch.is_empty() {
                break;
            }

            let size = batch.len() as u64;
            match self.target.write_all(batch.clone()).await {
                Ok(_) => result.add_success(size),
                Err(e) => {
                    warn!(
                        entity = name,
                        skip,
                        size,
                        error = %e,
                        "Bulk write failed, retrying records one by one"
                    );
                    for record in batch {
                        let id = record.id().to_string();
                        match self.target.write_one(record).await {
                            Ok(()) => result.add_success(1),
                            Err(e) => result.add_error(id, e.to_string()),
                        }
                    }
                }
            }

            skip += size;
            debug!(
                entity = name,
                processed = result.total_processed,
                succeeded = result.success_count,
                failed = result.error_count,
                "Batch migrated"
            );
        }

        result.complete();
        result
    }
}
