use openpoc::logging::init_logging;
use openpoc::{Config, PocManager};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    // The guard must stay alive for the whole run to flush file logs.
    let _guard = init_logging(&config);

    info!(
        output_dir = %config.output_dir.display(),
        datasources_dir = %config.datasources_dir.display(),
        workers = config.workers,
        "starting openpoc run"
    );

    PocManager::new(config).run().await?;
    Ok(())
}
