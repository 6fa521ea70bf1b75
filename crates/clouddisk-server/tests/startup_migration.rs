use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use clouddisk_persistence::migrate::{
    DocumentSource, JobState, MigrationJob, MigrationRunner, MigrationSource, WriterTarget,
};
use clouddisk_persistence::operation::{Count, Create, FindById, FindPage};
use clouddisk_persistence::{
    Backend, ConfigurationError, DocumentStore, EntityKind, LogicalQuery, PageRequest, TagRecord,
    UserRecord,
};
use clouddisk_server::model::Configuration;
use clouddisk_server::startup::{ShutdownSignal, init_persistence, run_startup_migration};
use config::Config;
use tempfile::TempDir;

fn configuration(pairs: &[(&str, String)]) -> Configuration {
    let mut builder = Config::builder();
    for (key, value) in pairs {
        builder = builder.set_override(*key, value.clone()).unwrap();
    }
    Configuration::from_config(builder.build().unwrap())
}

fn seed_users(path: &std::path::Path, n: usize) {
    let store = DocumentStore::open(path).unwrap();
    let docs: Vec<(String, serde_json::Value)> = (0..n)
        .map(|i| {
            let user = UserRecord {
                id: format!("u{:05}", i),
                username: format!("user{}", i),
                show_name: Some(format!("User {}", i)),
                roles: vec!["r1".to_string()],
                created_time: Some(1_700_000_000_000 + i as i64),
                ..Default::default()
            };
            (user.id.clone(), serde_json::to_value(&user).unwrap())
        })
        .collect();
    store
        .put_many(EntityKind::User.collection(), &docs)
        .unwrap();
}

fn relational_config(dir: &TempDir) -> Configuration {
    configuration(&[
        ("clouddisk.datasource.type", "sqlite".to_string()),
        (
            "clouddisk.datasource.url",
            format!("sqlite://{}/clouddisk.db?mode=rwc", dir.path().display()),
        ),
        (
            "clouddisk.datasource.document-path",
            dir.path().join("document").display().to_string(),
        ),
        ("clouddisk.datasource.migration", "true".to_string()),
        ("clouddisk.datasource.migration-batch-size", "1000".to_string()),
    ])
}

#[tokio::test]
async fn test_migrates_users_then_skips_second_run() {
    let dir = TempDir::new().unwrap();
    seed_users(&dir.path().join("document"), 1250);

    let configuration = relational_config(&dir);
    let shutdown = ShutdownSignal::new();
    let context = init_persistence(&configuration, &shutdown).await.unwrap();
    assert_eq!(context.backend(), Backend::RelationalStore);
    assert!(context.writer().is_queued());

    let results = run_startup_migration(&configuration, &context)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(results.len(), 5);

    let users = &results[0];
    assert_eq!(users.name, "user");
    assert_eq!(users.state, JobState::Completed);
    assert_eq!(users.total_processed, 1250);
    assert_eq!(users.success_count, 1250);
    assert_eq!(users.error_count, 0);
    assert!(users.fatal_error.is_none());
    assert!(results[1..].iter().all(|r| r.state == JobState::Completed && r.total_processed == 0));

    let count = context
        .dispatcher()
        .execute(Count::<UserRecord>::all())
        .await
        .unwrap();
    assert_eq!(count, 1250);

    let user = context
        .dispatcher()
        .execute(FindById::<UserRecord>::new("u00042"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.show_name.as_deref(), Some("User 42"));
    assert_eq!(user.roles, vec!["r1".to_string()]);

    let second = run_startup_migration(&configuration, &context)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second[0].state, JobState::Skipped);
    assert_eq!(second[0].total_processed, 0);

    shutdown.shutdown();
    context.close().await.unwrap();
}

/// Passes reads through and remembers how many records each one returned
struct BatchLog<S> {
    inner: S,
    sizes: Arc<Mutex<Vec<usize>>>,
}

#[async_trait]
impl<S: MigrationSource<UserRecord>> MigrationSource<UserRecord> for BatchLog<S> {
    async fn read_batch(
        &self,
        skip: u64,
        limit: u64,
    ) -> clouddisk_persistence::Result<Vec<UserRecord>> {
        let batch = self.inner.read_batch(skip, limit).await?;
        self.sizes.lock().unwrap().push(batch.len());
        Ok(batch)
    }
}

#[tokio::test]
async fn test_users_migrate_in_configured_batches() {
    let dir = TempDir::new().unwrap();
    let document_path = dir.path().join("document");
    seed_users(&document_path, 1250);

    let configuration = relational_config(&dir);
    let shutdown = ShutdownSignal::new();
    let context = init_persistence(&configuration, &shutdown).await.unwrap();
    let store = DocumentStore::open(&document_path).unwrap();

    let sizes = Arc::new(Mutex::new(Vec::new()));
    let job = MigrationJob::<UserRecord>::new(
        Arc::new(BatchLog {
            inner: DocumentSource::<UserRecord>::new(store.clone()),
            sizes: sizes.clone(),
        }),
        Arc::new(WriterTarget::<UserRecord>::new(context.writer().clone())),
        configuration.migration_batch_size(),
    );
    let results = MigrationRunner::new(1).add(job).run().await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].state, JobState::Completed);
    assert_eq!(results[0].success_count, 1250);
    assert_eq!(*sizes.lock().unwrap(), vec![1000, 250, 0]);

    let count = context
        .dispatcher()
        .execute(Count::<UserRecord>::all())
        .await
        .unwrap();
    assert_eq!(count, 1250);

    drop(store);
    shutdown.shutdown();
    context.close().await.unwrap();
}

#[tokio::test]
async fn test_migration_not_due_without_document_path() {
    let dir = TempDir::new().unwrap();
    let configuration = relational_config(&dir);
    let shutdown = ShutdownSignal::new();
    let context = init_persistence(&configuration, &shutdown).await.unwrap();

    let results = run_startup_migration(&configuration, &context).await.unwrap();
    assert!(results.is_none());
    context.close().await.unwrap();
}

#[tokio::test]
async fn test_document_backend_serves_operations() {
    let dir = TempDir::new().unwrap();
    let configuration = configuration(&[
        ("clouddisk.datasource.type", "document-store".to_string()),
        (
            "clouddisk.datasource.document-path",
            dir.path().join("document").display().to_string(),
        ),
        ("clouddisk.datasource.migration", "true".to_string()),
    ]);
    let shutdown = ShutdownSignal::new();
    let context = init_persistence(&configuration, &shutdown).await.unwrap();
    assert_eq!(context.backend(), Backend::DocumentStore);
    assert!(!context.writer().is_queued());
    assert!(context.database().is_none());

    for i in 0..3 {
        let tag = TagRecord {
            id: format!("t{}", i),
            user_id: Some("u1".to_string()),
            name: format!("tag {}", i),
            sort: Some(2 - i),
            ..Default::default()
        };
        context.writer().submit(Create::new(tag)).await.unwrap();
    }

    let page = context
        .dispatcher()
        .execute(FindPage::<TagRecord>::new(
            LogicalQuery::new().eq("user_id", "u1"),
            PageRequest::new(1, 2).sorted_by("sort", "ascending"),
        ))
        .await
        .unwrap();
    assert_eq!(page.total_count, 3);
    assert_eq!(page.page_items.len(), 2);
    assert_eq!(page.page_items[0].id, "t2");

    // Migration only runs into the relational store
    assert!(run_startup_migration(&configuration, &context).await.unwrap().is_none());
    context.close().await.unwrap();
}

#[tokio::test]
async fn test_startup_configuration_errors() {
    let shutdown = ShutdownSignal::new();

    let err = init_persistence(&configuration(&[]), &shutdown)
        .await
        .err()
        .unwrap();
    assert!(matches!(
        err.downcast_ref::<ConfigurationError>(),
        Some(ConfigurationError::MissingBackend)
    ));

    let err = init_persistence(
        &configuration(&[("clouddisk.datasource.type", "redis".to_string())]),
        &shutdown,
    )
    .await
    .err()
    .unwrap();
    assert!(matches!(
        err.downcast_ref::<ConfigurationError>(),
        Some(ConfigurationError::UnknownBackend(_))
    ));

    let err = init_persistence(
        &configuration(&[("clouddisk.datasource.type", "mysql".to_string())]),
        &shutdown,
    )
    .await
    .err()
    .unwrap();
    assert!(matches!(
        err.downcast_ref::<ConfigurationError>(),
        Some(ConfigurationError::MissingDatabaseUrl)
    ));
}
