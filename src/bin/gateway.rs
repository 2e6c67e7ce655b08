//! Polyrun HTTP gateway
//!
//! Serves the run/check API over HTTP.

use clap::Parser;
use polyrun::config::{validate_config, Config};
use polyrun::{Engine, VERSION};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "polyrun-gateway", version = VERSION, about = "Polyrun HTTP gateway")]
struct Args {
    /// Bind address (overrides config)
    #[arg(long)]
    bind: Option<String>,

    /// Port (overrides config)
    #[arg(long, short)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    polyrun::logging::init(&config.logging);

    let validation = validate_config(&config);
    for issue in &validation.warnings {
        warn!(path = %issue.path, "{}", issue.message);
    }
    if !validation.valid {
        let messages: Vec<String> = validation
            .errors
            .iter()
            .map(|issue| format!("{}: {}", issue.path, issue.message))
            .collect();
        anyhow::bail!("invalid configuration: {}", messages.join("; "));
    }

    let server = config.server.clone();
    let engine = Engine::new(config);
    info!(version = VERSION, languages = ?engine.registry().ids(), "Starting polyrun gateway");

    polyrun::gateway::serve(engine, &server).await?;
    Ok(())
}
