use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use scribe_agent::{Config, Server};

/// Scribe - voice note-taking agent
#[derive(Parser)]
#[command(name = "scribe", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,scribe_agent=info",
        1 => "info,scribe_agent=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    // Load .env if present; real environment wins
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!(
        bind = %config.bind_addr,
        model = %config.model,
        "starting scribe"
    );

    Server::new(config).run().await?;
    Ok(())
}
