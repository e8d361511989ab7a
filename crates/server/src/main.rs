//! `cutsyncd` — the CutSync edit server daemon.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cs_server::{EditServer, ServerConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    info!(
        workspace = %config.workspace.display(),
        port = config.port,
        "starting cutsyncd"
    );
    EditServer::new(config)?.run()
}
