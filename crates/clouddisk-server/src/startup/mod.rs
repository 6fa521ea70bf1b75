//! Process startup: logging, datasource composition, migration, shutdown

mod logging;
mod migration;
mod persistence;
mod shutdown;

pub use logging::{LogRotation, LoggingConfig, LoggingGuard, init_logging};
pub use migration::run_startup_migration;
pub use persistence::{PersistenceContext, init_persistence};
pub use shutdown::{ShutdownSignal, run_with_shutdown, wait_for_termination};
