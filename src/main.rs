//! zipwatch binary: watch a directory tree and auto-extract zip archives.

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zipwatch::{ArchiveExtractor, BatchWorker, DirWatcher, WatchConfig};

#[derive(Parser, Debug)]
#[command(name = "zipwatch")]
#[command(version)]
#[command(about = "Watch a directory tree and automatically extract zip archives", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipwatch                           watch the current directory\n  \
  zipwatch -d ~/downloads            watch ~/downloads recursively\n  \
  zipwatch -x 'backup' -x '\\.old'    skip paths matching either pattern")]
struct Cli {
    /// Directory tree to watch
    #[arg(short = 'd', long = "target-directory", value_name = "DIR", default_value = ".")]
    path: std::path::PathBuf,

    /// Regex pattern(s); matching paths are ignored
    #[arg(short = 'x', long = "ignore-regex", value_name = "REGEX")]
    ignore_regex: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = WatchConfig {
        root: cli.path,
        exclude: cli.ignore_regex,
        ..Default::default()
    };
    config.validate().context("invalid configuration")?;

    let (tx, rx) = mpsc::unbounded_channel();

    let worker = BatchWorker::new(rx, |path| ArchiveExtractor::extract(path), &config);
    tokio::spawn(worker.run());

    let mut watcher = DirWatcher::new(&config, tx).context("failed to set up watcher")?;
    watcher.start().context("failed to start watching")?;

    tokio::select! {
        _ = watcher.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
