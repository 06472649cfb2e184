//! stratum proxy daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request ──▶ http server ──▶ Engine (phase/priority layer)
//!                                            │
//!                             head / normal / tail middleware
//!                                            │
//!                              Manager + Instance (tail)
//!                              scopes ▸ rules ▸ plugins
//!                                            │
//!                                      final handler ──▶ upstream
//!
//!     Admin Request ──▶ admin server ──▶ Manager layer ──▶ REST API
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use stratum::config::{load_config, StratumConfig};
use stratum::http::ServerOptions;
use stratum::{Engine, Manager};

#[derive(Parser)]
#[command(name = "stratum")]
#[command(about = "Extensible HTTP middleware proxy", version)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => StratumConfig::default(),
    };

    stratum::observability::logging::init(&config.logging);
    stratum::observability::metrics::init(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        server = %format!("{}:{}", config.server.host, config.server.port),
        admin_enabled = config.admin.enabled,
        "stratum starting"
    );

    let engine = Engine::new();
    if !config.forward.url.is_empty() {
        engine.forward(&config.forward.url)?;
        tracing::info!(upstream = %config.forward.url, "default forward target configured");
    }

    let manager = Arc::new(Manager::default());
    manager.manage("default", "Primary proxy engine", &engine);

    if config.admin.enabled {
        let admin_opts = ServerOptions {
            host: config.admin.host.clone(),
            port: config.admin.port,
            ..Default::default()
        };
        let manager = manager.clone();
        tokio::spawn(async move {
            if let Err(error) = manager.listen_and_serve(admin_opts).await {
                tracing::error!(%error, "admin server failed");
            }
        });
    }

    let server_opts = ServerOptions {
        host: config.server.host.clone(),
        port: config.server.port,
        timeout: Duration::from_secs(config.server.timeout_secs),
    };
    stratum::http::serve(engine, server_opts).await?;

    tracing::info!("stratum stopped");
    Ok(())
}
