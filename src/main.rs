//! gandi-ddns - keep Gandi LiveDNS address records on the current public IP.

use clap::Parser;
use gandi_ddns::config::{self, EnvSource, FileConfig};
use gandi_ddns::http::{ReqwestCaller, DEFAULT_TIMEOUT};
use gandi_ddns::reconciler::Reconciler;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gandi-ddns")]
#[command(about = "Keep Gandi LiveDNS A/AAAA records on the current public IP")]
#[command(version)]
struct Cli {
    /// TOML file with fallback values for unset GANDI_DDNS_* variables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a JSON report of each record type to stdout
    #[arg(long)]
    json: bool,
}

fn load_file_config(cli_path: Option<PathBuf>) -> anyhow::Result<FileConfig> {
    let path = match cli_path {
        Some(path) => path,
        None => match FileConfig::default_path() {
            Ok(path) => path,
            Err(_) => return Ok(FileConfig::default()),
        },
    };

    tracing::debug!("Reading fallback configuration from {}", path.display());
    Ok(FileConfig::load_from(&path)?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let source = EnvSource::with_fallback(load_file_config(cli.config)?);
    let timeout = match config::timeout_from(&source) {
        Ok(timeout) => timeout,
        Err(e) => {
            tracing::warn!("{}, using {}s", e, DEFAULT_TIMEOUT.as_secs());
            DEFAULT_TIMEOUT
        }
    };

    let reconciler = Reconciler::new(Arc::new(ReqwestCaller::with_timeout(timeout)));
    let reports = reconciler.run_all(&source).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    Ok(())
}
