//! Configuration management for the clouddisk server
//!
//! Values come from `conf/application.yml`, then `CLOUDDISK__*` environment
//! variables, then command line flags, each overriding the previous one.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use clouddisk_persistence::migrate::{DEFAULT_BATCH_SIZE, DEFAULT_PARALLELISM};
use clouddisk_persistence::{Backend, ConfigurationError, DEFAULT_QUEUE_CAPACITY};
use config::{Config, Environment};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use super::constants::{
    DATASOURCE_DOCUMENT_PATH, DATASOURCE_MIGRATION, DATASOURCE_MIGRATION_BATCH_SIZE,
    DATASOURCE_MIGRATION_PARALLELISM, DATASOURCE_TYPE, DATASOURCE_URL,
    DATASOURCE_WRITE_QUEUE_CAPACITY, DEFAULT_CONFIG_FILE, DEFAULT_DOCUMENT_PATH, ENV_PREFIX,
    LOGS_CONSOLE, LOGS_FILE, LOGS_LEVEL, LOGS_PATH,
};
use crate::startup::LoggingConfig;

/// Command line arguments for the server
#[derive(Debug, Default, Parser)]
#[command(name = "clouddisk-server", version)]
pub struct Cli {
    /// Configuration file
    #[arg(short = 'c', long = "config")]
    pub config_file: Option<String>,
    /// Active datasource: document-store or relational-store
    #[arg(short = 'b', long = "backend")]
    pub backend: Option<String>,
    #[arg(long = "db-url", env = "DATABASE_URL")]
    pub database_url: Option<String>,
    #[arg(long = "document-path")]
    pub document_path: Option<String>,
    /// Copy document-store data into the relational store at startup
    #[arg(long = "migrate")]
    pub migrate: bool,
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    /// Load using the process arguments
    pub fn new() -> anyhow::Result<Self> {
        Self::load(Cli::parse())
    }

    pub fn load(args: Cli) -> anyhow::Result<Self> {
        let file = args.config_file.as_deref().unwrap_or(DEFAULT_CONFIG_FILE);
        let mut builder = Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .keep_prefix(true)
                    .try_parsing(true),
            );

        if let Some(v) = args.backend {
            builder = builder.set_override(DATASOURCE_TYPE, v)?;
        }
        if let Some(v) = args.database_url {
            builder = builder.set_override(DATASOURCE_URL, v)?;
        }
        if let Some(v) = args.document_path {
            builder = builder.set_override(DATASOURCE_DOCUMENT_PATH, v)?;
        }
        if args.migrate {
            builder = builder.set_override(DATASOURCE_MIGRATION, true)?;
        }

        let config = builder
            .build()
            .with_context(|| format!("failed to build configuration from {}", file))?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: Config) -> Self {
        Configuration { config }
    }

    // ========================================================================
    // Datasource Configuration
    // ========================================================================

    pub fn backend(&self) -> Result<Backend, ConfigurationError> {
        let value = self
            .config
            .get_string(DATASOURCE_TYPE)
            .map_err(|_| ConfigurationError::MissingBackend)?;
        if value.trim().is_empty() {
            return Err(ConfigurationError::MissingBackend);
        }
        value
            .parse()
            .map_err(|_| ConfigurationError::UnknownBackend(value))
    }

    pub fn database_url(&self) -> Result<String, ConfigurationError> {
        self.config
            .get_string(DATASOURCE_URL)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigurationError::MissingDatabaseUrl)
    }

    pub fn document_path(&self) -> PathBuf {
        self.config
            .get_string(DATASOURCE_DOCUMENT_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DOCUMENT_PATH))
    }

    pub fn migration_enabled(&self) -> bool {
        self.config.get_bool(DATASOURCE_MIGRATION).unwrap_or(false)
    }

    pub fn migration_batch_size(&self) -> u64 {
        self.config
            .get_int(DATASOURCE_MIGRATION_BATCH_SIZE)
            .ok()
            .filter(|v| *v > 0)
            .map(|v| v as u64)
            .unwrap_or(DEFAULT_BATCH_SIZE)
    }

    pub fn migration_parallelism(&self) -> usize {
        self.config
            .get_int(DATASOURCE_MIGRATION_PARALLELISM)
            .ok()
            .filter(|v| *v > 0)
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_PARALLELISM)
    }

    pub fn write_queue_capacity(&self) -> usize {
        self.config
            .get_int(DATASOURCE_WRITE_QUEUE_CAPACITY)
            .ok()
            .filter(|v| *v > 0)
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_QUEUE_CAPACITY)
    }

    pub async fn database_connection(&self) -> anyhow::Result<DatabaseConnection> {
        let max_connections = self
            .config
            .get_int("db.pool.config.maximumPoolSize")
            .unwrap_or(100) as u32;
        let min_connections = self
            .config
            .get_int("db.pool.config.minimumPoolSize")
            .unwrap_or(1) as u32;
        let connect_timeout = self
            .config
            .get_int("db.pool.config.connectionTimeout")
            .unwrap_or(30) as u64;
        let acquire_timeout = self
            .config
            .get_int("db.pool.config.initializationFailTimeout")
            .unwrap_or(8) as u64;
        let idle_timeout = self
            .config
            .get_int("db.pool.config.idleTimeout")
            .unwrap_or(10) as u64;
        let max_lifetime = self
            .config
            .get_int("db.pool.config.maxLifetime")
            .unwrap_or(1800) as u64;
        let sqlx_logging = self
            .config
            .get_bool("db.pool.config.sqlxLogging")
            .unwrap_or(false);

        let url = self.database_url()?;

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(connect_timeout))
            .acquire_timeout(Duration::from_secs(acquire_timeout))
            .idle_timeout(Duration::from_secs(idle_timeout))
            .max_lifetime(Duration::from_secs(max_lifetime))
            .sqlx_logging(sqlx_logging);

        tracing::info!(
            max_connections,
            min_connections,
            connect_timeout,
            idle_timeout,
            max_lifetime,
            sqlx_logging,
            "Database connection pool configured"
        );

        let database_connection = Database::connect(opt)
            .await
            .context("failed to connect to the relational datasource")?;

        Ok(database_connection)
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::from_config(
            self.config.get_string(LOGS_PATH).ok(),
            self.config.get_bool(LOGS_CONSOLE).unwrap_or(true),
            self.config.get_bool(LOGS_FILE).unwrap_or(true),
            self.config
                .get_string(LOGS_LEVEL)
                .unwrap_or_else(|_| "info".to_string()),
        )
    }
}
