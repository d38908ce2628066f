use std::collections::BTreeSet;
use std::future::Future;
use std::path::Path;

use anyhow::Context;
use futures::StreamExt;
use promptline_rig::RigConfig;
use promptline_runtime::{PipelineDefinition, PipelineEvent, PipelineRun, PipelineSession, Transcript};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::TRACING_TARGET_COMMAND;
use crate::config::{OutputFormat, RunArgs};

/// Runs a pipeline definition over the given input.
pub async fn execute(rig: &RigConfig, args: RunArgs) -> anyhow::Result<()> {
    let definition = load_definition(&args.pipeline).await?;
    let input = read_input(&args).await?;

    let mut session = build_session(rig, definition)?;
    for (key, value) in &args.values {
        session.set_value(key.clone(), value.clone());
    }
    register_references(&mut session, &args).await?;

    let mut run = session.start_run(input).context("cannot start run")?;
    let mut stdout = tokio::io::stdout();
    stream_run(&mut run, &mut stdout, args.format, tokio::signal::ctrl_c()).await?;
    Ok(())
}

async fn load_definition(path: &Path) -> anyhow::Result<PipelineDefinition> {
    let source = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read pipeline {}", path.display()))?;
    let definition: PipelineDefinition = serde_json::from_str(&source)
        .with_context(|| format!("invalid pipeline definition {}", path.display()))?;

    tracing::debug!(
        target: TRACING_TARGET_COMMAND,
        path = %path.display(),
        tasks = definition.tasks.len(),
        "Pipeline loaded"
    );

    Ok(definition)
}

async fn read_input(args: &RunArgs) -> anyhow::Result<String> {
    match (&args.input, &args.input_file) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) if path.as_os_str() == "-" => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("failed to read input from stdin")?;
            Ok(input)
        }
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read input file {}", path.display())),
        (None, None) => anyhow::bail!("either --input or --input-file is required"),
    }
}

/// Creates a session with the configured capabilities and a generator for
/// every model named by a task.
fn build_session(
    rig: &RigConfig,
    definition: PipelineDefinition,
) -> anyhow::Result<PipelineSession> {
    let models: BTreeSet<String> = definition
        .tasks
        .iter()
        .filter_map(|task| task.model.clone())
        .collect();

    let generator = rig
        .generation_service()
        .context("failed to create generation provider")?;
    let fetch = rig
        .fetch_service()
        .context("failed to create fetch provider")?;

    let mut session = PipelineSession::from_definition(definition, generator).with_fetch(fetch);
    if let Some(search) = rig
        .search_service()
        .context("failed to create search provider")?
    {
        session = session.with_search(search);
    }

    for model in models {
        let generator = rig
            .generation_service_for(&model)
            .with_context(|| format!("failed to create provider for model '{model}'"))?;
        session.register_model(model, generator);
    }

    Ok(session)
}

async fn register_references(
    session: &mut PipelineSession,
    args: &RunArgs,
) -> anyhow::Result<()> {
    for query in &args.search {
        let reference = session
            .search(query)
            .await
            .with_context(|| format!("search for '{query}' failed"))?;
        tracing::info!(
            target: TRACING_TARGET_COMMAND,
            name = %reference.name,
            query = %query,
            "Search reference registered"
        );
    }

    for url in &args.scrape {
        let reference = session
            .scrape(url)
            .await
            .with_context(|| format!("failed to fetch {url}"))?;
        tracing::info!(
            target: TRACING_TARGET_COMMAND,
            name = %reference.name,
            url = %url,
            "Scrape reference registered"
        );
    }

    Ok(())
}

/// Streams the run's events to `out` until the run ends or `cancel`
/// resolves. Cancelling drops the event stream, which stops generation.
async fn stream_run<W, C>(
    run: &mut PipelineRun,
    out: &mut W,
    format: OutputFormat,
    cancel: C,
) -> anyhow::Result<Transcript>
where
    W: AsyncWrite + Unpin,
    C: Future,
{
    let progress = run.progress();
    let mut transcript = Transcript::new();
    let mut events = std::pin::pin!(run.events());
    let mut cancel = std::pin::pin!(cancel);

    loop {
        let event = tokio::select! {
            biased;
            _ = &mut cancel => {
                tracing::warn!(
                    target: TRACING_TARGET_COMMAND,
                    task = ?progress.current_task(),
                    "Run cancelled"
                );
                anyhow::bail!("run cancelled");
            }
            event = events.next() => event,
        };

        let Some(event) = event else {
            break;
        };

        let event = match event {
            Ok(event) => event,
            Err(error) => {
                out.write_all(b"\n").await?;
                out.flush().await?;
                let task = progress.current_task().unwrap_or_default();
                return Err(error).with_context(|| format!("task {task} failed"));
            }
        };

        if let PipelineEvent::TaskBegin { position } = &event {
            tracing::info!(
                target: TRACING_TARGET_COMMAND,
                task = position,
                total = progress.snapshot().total,
                "Task started"
            );
        }

        write_event(out, &mut transcript, &event, format).await?;
    }

    tracing::info!(
        target: TRACING_TARGET_COMMAND,
        completed = transcript.completed(),
        "Run completed"
    );

    Ok(transcript)
}

async fn write_event<W>(
    out: &mut W,
    transcript: &mut Transcript,
    event: &PipelineEvent,
    format: OutputFormat,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    match format {
        OutputFormat::Markdown => {
            let written = transcript.markdown().len();
            transcript.push(event);
            out.write_all(&transcript.markdown().as_bytes()[written..])
                .await?;
        }
        OutputFormat::Jsonl => {
            transcript.push(event);
            let mut line = serde_json::to_vec(event)?;
            line.push(b'\n');
            out.write_all(&line).await?;
        }
    }

    out.flush().await?;
    Ok(())
}
