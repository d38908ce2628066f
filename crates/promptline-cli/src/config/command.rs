//! Subcommands and their arguments.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Commands supported by the CLI.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a pipeline definition and stream its output.
    Run(RunArgs),
    /// Search the web and print the results as JSON.
    Search(SearchArgs),
    /// Fetch a page and print its text.
    Scrape(ScrapeArgs),
    /// Print an example pipeline definition.
    Example,
}

/// How `run` writes events to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `### Task N Output:` sections separated by rules.
    #[default]
    Markdown,
    /// One JSON event per line.
    Jsonl,
}

/// Arguments of `run`.
#[derive(Debug, Clone, Args)]
#[command(group = clap::ArgGroup::new("input_source").required(true))]
pub struct RunArgs {
    /// Pipeline definition file (JSON).
    #[arg(long, short = 'p', env = "PROMPTLINE_PIPELINE")]
    pub pipeline: PathBuf,

    /// Run input text.
    #[arg(long, short = 'i', group = "input_source")]
    pub input: Option<String>,

    /// File to read the run input from; `-` reads stdin.
    #[arg(long, group = "input_source")]
    pub input_file: Option<PathBuf>,

    /// Web search to register before the run, available as `{search_ref_N}`.
    #[arg(long, value_name = "QUERY")]
    pub search: Vec<String>,

    /// Page to fetch before the run, available as `{scrape_ref_N}`.
    #[arg(long, value_name = "URL")]
    pub scrape: Vec<String>,

    /// Extra value available to every task, as `KEY=VALUE`.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub values: Vec<(String, String)>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,
}

/// Arguments of `search`.
#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// Search query.
    pub query: String,
}

/// Arguments of `scrape`.
#[derive(Debug, Clone, Args)]
pub struct ScrapeArgs {
    /// Page URL.
    pub url: String,

    /// Print the page as JSON (url, title, text) instead of plain text.
    #[arg(long)]
    pub json: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("key must not be empty".to_string());
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_pairs() {
        assert_eq!(
            parse_key_value("tone = formal=ish"),
            Ok(("tone".to_string(), " formal=ish".to_string()))
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }
}
