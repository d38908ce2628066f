use anyhow::Context;
use promptline_rig::RigConfig;

use crate::TRACING_TARGET_COMMAND;
use crate::config::ScrapeArgs;

/// Fetches one page and prints its text.
pub async fn execute(rig: &RigConfig, args: ScrapeArgs) -> anyhow::Result<()> {
    let fetch = rig
        .fetch_service()
        .context("failed to create fetch provider")?;

    let page = fetch
        .fetch(&args.url)
        .await
        .with_context(|| format!("failed to fetch {}", args.url))?;

    tracing::info!(
        target: TRACING_TARGET_COMMAND,
        url = %page.url,
        title = ?page.title,
        text_len = page.text.len(),
        "Page fetched"
    );

    if args.json {
        super::print(&serde_json::to_string_pretty(&page)?).await
    } else {
        super::print(&page.text).await
    }
}
