//! Pipeline tasks.
//!
//! A [`Task`] is a [`TaskDefinition`] bound to its 1-based position in the
//! pipeline, with the wrapper template built once up front.

mod definition;

use async_stream::try_stream;
use futures::{Stream, StreamExt};
pub use definition::TaskDefinition;
use promptline_core::provider::GenerationService;
use promptline_core::{Result, Template, WorkflowData, task_output_key};

use crate::PipelineEvent;

/// Tracing target for task execution.
pub const TRACING_TARGET: &str = "promptline_runtime::task";

/// One step of a pipeline.
#[derive(Debug, Clone)]
pub struct Task {
    position: usize,
    definition: TaskDefinition,
    template: Template,
    generator: Option<GenerationService>,
}

impl Task {
    /// Binds `definition` to `position` (1-based).
    pub fn new(position: usize, definition: TaskDefinition) -> Result<Self> {
        let template = definition.to_template()?;
        Ok(Self {
            position,
            definition,
            template,
            generator: None,
        })
    }

    /// Moves the task to `position`.
    pub(crate) fn at_position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// Uses `generator` for this task instead of the pipeline default.
    pub fn with_generator(mut self, generator: GenerationService) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Returns the 1-based position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the definition this task was built from.
    pub fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    /// Returns the full task template.
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Returns the data key this task writes its output to.
    pub fn output_key(&self) -> String {
        task_output_key(self.position)
    }

    /// Renders the prompt, requiring every placeholder to resolve.
    pub fn render(&self, inputs: &WorkflowData) -> Result<String> {
        self.template.render(inputs, false)
    }

    /// Executes the task.
    ///
    /// Renders the prompt from `inputs`, then yields `TaskBegin`, every
    /// fragment of the generator, and `TaskEnd`. The concatenated output is
    /// written to `data` under [`Task::output_key`] just before `TaskEnd`.
    ///
    /// A render failure is yielded before `TaskBegin`. A generator failure
    /// is yielded after the fragments received so far; in both cases nothing
    /// is written and the stream ends. Dropping the stream drops the
    /// generator stream with it.
    pub fn stream<'a>(
        &'a self,
        inputs: WorkflowData,
        default_generator: &'a GenerationService,
        data: &'a mut WorkflowData,
    ) -> impl Stream<Item = Result<PipelineEvent>> + Send + 'a {
        try_stream! {
            let prompt = self.render(&inputs)?;
            let position = self.position;

            yield PipelineEvent::TaskBegin { position };

            let generator = self.generator.as_ref().unwrap_or(default_generator);
            tracing::debug!(
                target: TRACING_TARGET,
                position,
                provider = generator.name(),
                prompt_len = prompt.len(),
                "Task started"
            );

            let mut fragments = generator.generate(prompt);
            let mut output = String::new();
            while let Some(fragment) = fragments.next().await {
                let fragment = fragment?;
                output.push_str(&fragment);
                yield PipelineEvent::ContentFragment { text: fragment };
            }
            drop(fragments);

            tracing::debug!(
                target: TRACING_TARGET,
                position,
                output_len = output.len(),
                "Task finished"
            );

            data.set(self.output_key(), output);
            yield PipelineEvent::TaskEnd { position };
        }
    }

    /// Executes the task and returns its complete output.
    pub async fn run(
        &self,
        inputs: WorkflowData,
        default_generator: &GenerationService,
        data: &mut WorkflowData,
    ) -> Result<String> {
        let events = self.stream(inputs, default_generator, data);
        let mut events = std::pin::pin!(events);
        let mut output = String::new();
        while let Some(event) = events.next().await {
            if let PipelineEvent::ContentFragment { text } = event? {
                output.push_str(&text);
            }
        }
        Ok(output)
    }
}
