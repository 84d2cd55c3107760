//! `hello-cli` binary
//!
//! Parses the command line, routes tracing output to stderr and hands an
//! interactive stdin/stdout console to [`hello_cli::run`].

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hello_cli::{Cli, StdinConsole};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interleave with prompts
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hello_cli=warn,hello_wallet=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut console = StdinConsole::new();
    hello_cli::run(cli, &mut console).await?;
    Ok(())
}
