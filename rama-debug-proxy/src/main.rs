//! entrypoint for rama-debug-proxy

use std::path::PathBuf;

use clap::Parser;
use rama_core::error::BoxError;
use rama_debug_proxy::{Engine, ProxyConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "rama-debug-proxy")]
#[command(bin_name = "rama-debug-proxy")]
#[command(version, about = "An interactive HTTP/HTTPS debugging proxy", long_about = None)]
struct Cli {
    /// Path to a JSON configuration file. Falls back to defaults for any
    /// key it omits, and to an all-defaults configuration if not given.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory the Certificate Authority's root key/cert and leaf cache
    /// are persisted under, created on first run.
    #[arg(long, value_name = "DIR", default_value = "./rama-debug-proxy-certs")]
    certs_dir: PathBuf,

    /// Override the listener port from the config file.
    #[arg(long)]
    port: Option<u16>,
}

fn init_tracing(default_directive: &str) {
    let directive = default_directive
        .parse()
        .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::INFO.into());
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::builder().with_default_directive(directive).from_env_lossy())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ProxyConfig::from_json_file(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(port) = cli.port {
        config.proxy_port = port;
    }
    config.validate()?;

    init_tracing(&config.log_level);
    let port = config.proxy_port;

    let engine = Engine::build(config, cli.certs_dir)?;

    tracing::info!(port, "starting rama-debug-proxy");

    if let Err(err) = engine.proxy.run().await {
        eprintln!("rama-debug-proxy exited with error: {err}");
        std::process::exit(1);
    }

    Ok(())
}
