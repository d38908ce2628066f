//! Command implementations.

mod example;
mod run;
mod scrape;
mod search;

use tokio::io::{AsyncWriteExt, stdout};

use crate::TRACING_TARGET_COMMAND;
use crate::config::{Cli, Command};

/// Executes the parsed command.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    tracing::debug!(
        target: TRACING_TARGET_COMMAND,
        command = command_name(&cli.command),
        "Executing command"
    );

    match cli.command {
        Command::Run(args) => run::execute(&cli.rig, args).await,
        Command::Search(args) => search::execute(&cli.rig, args).await,
        Command::Scrape(args) => scrape::execute(&cli.rig, args).await,
        Command::Example => example::execute().await,
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Run(_) => "run",
        Command::Search(_) => "search",
        Command::Scrape(_) => "scrape",
        Command::Example => "example",
    }
}

/// Writes `text` and a trailing newline to stdout.
async fn print(text: &str) -> anyhow::Result<()> {
    let mut out = stdout();
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(())
}
