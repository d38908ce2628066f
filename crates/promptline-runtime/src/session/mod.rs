//! Host-facing pipeline session.
//!
//! A [`PipelineSession`] owns everything that outlives a single run: the
//! task definitions being edited, the references registered so far, the
//! capability services and the execution settings. Each run starts from a
//! snapshot of the session data seeded with the run input.

mod definition;
mod run;

use std::collections::HashMap;
use std::sync::Arc;

pub use definition::PipelineDefinition;
use promptline_core::provider::{FetchService, GenerationService, SearchService};
use promptline_core::{Error, Reference, ReferenceKind, ReferenceRegistry, Result, WorkflowData};
pub use run::PipelineRun;
use serde_json::Value;

use crate::{Clock, Pipeline, PipelineConfig, SystemClock, Task, TaskDefinition};

/// Tracing target for session operations.
pub const TRACING_TARGET: &str = "promptline_runtime::session";

/// Editable pipeline plus the state shared by its runs.
pub struct PipelineSession {
    tasks: Vec<TaskDefinition>,
    data: WorkflowData,
    references: ReferenceRegistry,
    generator: GenerationService,
    models: HashMap<String, GenerationService>,
    search: Option<SearchService>,
    fetch: Option<FetchService>,
    config: PipelineConfig,
    clock: Arc<dyn Clock>,
}

impl PipelineSession {
    /// Creates an empty session generating with `generator`.
    pub fn new(generator: GenerationService) -> Self {
        Self {
            tasks: Vec::new(),
            data: WorkflowData::new(),
            references: ReferenceRegistry::new(),
            generator,
            models: HashMap::new(),
            search: None,
            fetch: None,
            config: PipelineConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Creates a session with the tasks and settings of `definition`.
    pub fn from_definition(definition: PipelineDefinition, generator: GenerationService) -> Self {
        let mut session = Self::new(generator).with_config(definition.config);
        session.tasks = definition.tasks;
        session
    }

    /// Enables `search`.
    pub fn with_search(mut self, search: SearchService) -> Self {
        self.search = Some(search);
        self
    }

    /// Enables `scrape`.
    pub fn with_fetch(mut self, fetch: FetchService) -> Self {
        self.fetch = Some(fetch);
        self
    }

    /// Replaces the execution settings.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the default generator.
    pub fn set_default_generator(&mut self, generator: GenerationService) {
        self.generator = generator;
    }

    /// Registers the generator used by tasks whose model is `model`.
    pub fn register_model(&mut self, model: impl Into<String>, generator: GenerationService) {
        self.models.insert(model.into(), generator);
    }

    /// Returns the execution settings.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the current definition.
    pub fn definition(&self) -> PipelineDefinition {
        PipelineDefinition {
            config: self.config.clone(),
            tasks: self.tasks.clone(),
        }
    }

    /// Returns the task definitions in order.
    pub fn tasks(&self) -> &[TaskDefinition] {
        &self.tasks
    }

    /// Returns the definition at `position` (1-based).
    pub fn task(&self, position: usize) -> Option<&TaskDefinition> {
        position.checked_sub(1).and_then(|i| self.tasks.get(i))
    }

    /// Appends a task and returns its position.
    pub fn add_task(&mut self, definition: TaskDefinition) -> usize {
        self.tasks.push(definition);
        tracing::debug!(
            target: TRACING_TARGET,
            position = self.tasks.len(),
            "Task added"
        );
        self.tasks.len()
    }

    /// Replaces the definition at `position`.
    pub fn update_task(&mut self, position: usize, definition: TaskDefinition) -> Result<()> {
        let index = self.index(position)?;
        self.tasks[index] = definition;
        Ok(())
    }

    /// Removes the task at `position`; later tasks shift down by one.
    ///
    /// Placeholders such as `{task_3_output}` in the remaining tasks are not
    /// rewritten.
    pub fn remove_task(&mut self, position: usize) -> Result<TaskDefinition> {
        let index = self.index(position)?;
        Ok(self.tasks.remove(index))
    }

    /// Moves the task at `from` to `to`.
    pub fn move_task(&mut self, from: usize, to: usize) -> Result<()> {
        let from = self.index(from)?;
        let to = self.index(to)?;
        let task = self.tasks.remove(from);
        self.tasks.insert(to, task);
        Ok(())
    }

    /// Removes every task.
    pub fn clear_tasks(&mut self) {
        self.tasks.clear();
    }

    /// Returns the data every run starts from.
    pub fn data(&self) -> &WorkflowData {
        &self.data
    }

    /// Stores a value visible to every later run.
    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.set(key, value);
    }

    /// Returns the references registered so far.
    pub fn references(&self) -> &ReferenceRegistry {
        &self.references
    }

    /// Registers an externally produced payload as a reference.
    pub fn register_reference(
        &mut self,
        kind: ReferenceKind,
        query: impl Into<String>,
        payload: impl Into<Value>,
    ) -> Reference {
        self.references
            .register(kind, query, payload, &mut self.data)
    }

    /// Runs a web search and registers its results as `search_ref_N`.
    ///
    /// Nothing is registered when the search fails.
    pub async fn search(&mut self, query: &str) -> Result<Reference> {
        let search = self
            .search
            .clone()
            .ok_or_else(|| Error::config("no search capability configured"))?;
        let results = search.search(query).await?;
        let payload = serde_json::to_value(results)?;
        Ok(self.register_reference(ReferenceKind::Search, query, payload))
    }

    /// Fetches a page and registers its text as `scrape_ref_N`.
    ///
    /// Nothing is registered when the fetch fails.
    pub async fn scrape(&mut self, url: &str) -> Result<Reference> {
        let fetch = self
            .fetch
            .clone()
            .ok_or_else(|| Error::config("no fetch capability configured"))?;
        let page = fetch.fetch(url).await?;
        Ok(self.register_reference(ReferenceKind::Scrape, url, page.text))
    }

    /// Builds the pipeline for the current tasks.
    pub fn pipeline(&self) -> Result<Pipeline> {
        let tasks = self
            .tasks
            .iter()
            .enumerate()
            .map(|(index, definition)| {
                let task = Task::new(index + 1, definition.clone())?;
                match &definition.model {
                    Some(model) => {
                        let generator = self.models.get(model).ok_or_else(|| {
                            Error::config(format!("no generator registered for model '{model}'"))
                        })?;
                        Ok(task.with_generator(generator.clone()))
                    }
                    None => Ok(task),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Pipeline::new(tasks, self.generator.clone())
            .with_config(self.config.clone())
            .with_clock(self.clock.clone()))
    }

    /// Prepares a run over `input`.
    ///
    /// Fails with [`Error::Config`] when the pipeline has no tasks or the
    /// input is blank.
    pub fn start_run(&self, input: impl Into<String>) -> Result<PipelineRun> {
        let input = input.into();
        if self.tasks.is_empty() {
            return Err(Error::config("add at least one task before running"));
        }
        if input.trim().is_empty() {
            return Err(Error::config("input text must not be empty"));
        }

        let pipeline = self.pipeline()?;
        let mut data = self.data.clone();
        data.set(self.config.input_key.clone(), input);

        tracing::debug!(
            target: TRACING_TARGET,
            tasks = self.tasks.len(),
            references = self.references.len(),
            "Run prepared"
        );

        Ok(PipelineRun::new(pipeline, data))
    }

    fn index(&self, position: usize) -> Result<usize> {
        match position.checked_sub(1) {
            Some(index) if index < self.tasks.len() => Ok(index),
            _ => Err(Error::config(format!(
                "no task at position {position} (pipeline has {})",
                self.tasks.len()
            ))),
        }
    }
}

impl std::fmt::Debug for PipelineSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineSession")
            .field("tasks", &self.tasks.len())
            .field("references", &self.references.len())
            .field("generator", &self.generator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
