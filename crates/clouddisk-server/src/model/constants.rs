// Configuration keys

pub const DATASOURCE_TYPE: &str = "clouddisk.datasource.type";
pub const DATASOURCE_URL: &str = "clouddisk.datasource.url";
pub const DATASOURCE_DOCUMENT_PATH: &str = "clouddisk.datasource.document-path";
pub const DATASOURCE_MIGRATION: &str = "clouddisk.datasource.migration";
pub const DATASOURCE_MIGRATION_BATCH_SIZE: &str = "clouddisk.datasource.migration-batch-size";
pub const DATASOURCE_MIGRATION_PARALLELISM: &str = "clouddisk.datasource.migration-parallelism";
pub const DATASOURCE_WRITE_QUEUE_CAPACITY: &str = "clouddisk.datasource.write-queue-capacity";

pub const LOGS_PATH: &str = "clouddisk.logs.path";
pub const LOGS_LEVEL: &str = "clouddisk.logs.level";
pub const LOGS_CONSOLE: &str = "clouddisk.logs.console";
pub const LOGS_FILE: &str = "clouddisk.logs.file";

pub const DEFAULT_DOCUMENT_PATH: &str = "data/document";
pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";
pub const ENV_PREFIX: &str = "CLOUDDISK";
