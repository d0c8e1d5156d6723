//! codesync binary.

use anyhow::Result;
use clap::Parser;
use codesync_cli::prompt::TerminalPrompt;
use codesync_cli::{run, Cli};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli, Arc::new(TerminalPrompt)).await
}

/// `RUST_LOG` wins when set; otherwise INFO, or DEBUG with `--verbose`.
fn init_logging(verbose: bool) {
    let builder = FmtSubscriber::builder().with_target(false).compact();
    match EnvFilter::try_from_default_env() {
        Ok(filter) => builder.with_env_filter(filter).init(),
        Err(_) => {
            let level = if verbose { Level::DEBUG } else { Level::INFO };
            builder.with_max_level(level).init()
        }
    }
}
