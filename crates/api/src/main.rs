//! Credit Risk Service - Main Entry Point

use api::{init_logging, run_server, ServiceConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::load()?;
    init_logging(&config.logging)?;

    info!("=== Credit Risk Service v{} ===", env!("CARGO_PKG_VERSION"));
    if let Some(service) = &config.bootstrap {
        info!(
            service = %service.name,
            version = %service.version,
            model = %service.model_path.display(),
            "Bootstrapping service"
        );
    }

    run_server(config).await
}
