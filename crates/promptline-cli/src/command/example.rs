use anyhow::Context;
use promptline_runtime::PipelineDefinition;

/// Prints the example pipeline definition.
pub async fn execute() -> anyhow::Result<()> {
    let example = PipelineDefinition::example().context("invalid example pipeline")?;
    let json = serde_json::to_string_pretty(&example)?;
    super::print(&json).await
}
