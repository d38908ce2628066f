use anyhow::Context;
use promptline_rig::RigConfig;

use crate::TRACING_TARGET_COMMAND;
use crate::config::SearchArgs;

/// Runs one search and prints the results as JSON.
pub async fn execute(rig: &RigConfig, args: SearchArgs) -> anyhow::Result<()> {
    let search = rig
        .search_service()
        .context("failed to create search provider")?
        .context("web search requires a SerpAPI key (SERPAPI_API_KEY)")?;

    let results = search
        .search(&args.query)
        .await
        .with_context(|| format!("search for '{}' failed", args.query))?;

    tracing::info!(
        target: TRACING_TARGET_COMMAND,
        query = %args.query,
        results = results.len(),
        "Search completed"
    );

    let json = serde_json::to_string_pretty(&results)?;
    super::print(&json).await
}
