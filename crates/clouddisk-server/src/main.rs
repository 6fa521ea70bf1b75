use clouddisk_server::model::Configuration;
use clouddisk_server::startup::{self, ShutdownSignal};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = Configuration::new()?;
    let _logging_guard = startup::init_logging(&configuration.logging_config())?;

    let shutdown = ShutdownSignal::new();
    let mut stopped = shutdown.subscribe();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        startup::wait_for_termination().await;
        signal.shutdown();
    });

    let context = match startup::init_persistence(&configuration, &shutdown).await {
        Ok(context) => context,
        Err(e) => {
            error!(error = %e, "Failed to initialize persistence");
            return Err(e);
        }
    };
    info!(
        backend = %context.backend(),
        authorities = context.authorities().len(),
        "Persistence initialized"
    );

    let migration = startup::run_startup_migration(&configuration, &context);
    match startup::run_with_shutdown(migration, shutdown.subscribe()).await {
        Some(Ok(Some(results))) => {
            let clean = results.iter().filter(|r| r.is_clean()).count();
            info!(jobs = results.len(), clean, "Startup migration complete");
        }
        Some(Ok(None)) => {}
        Some(Err(e)) => error!(error = %e, "Startup migration failed"),
        None => warn!("Shutdown requested during migration"),
    }

    info!("clouddisk server started");
    let _ = stopped.recv().await;

    context.close().await?;
    info!("clouddisk server stopped");
    Ok(())
}
