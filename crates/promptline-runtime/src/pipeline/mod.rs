//! Sequential pipeline execution.
//!
//! A [`Pipeline`] runs its tasks in position order against one shared
//! [`WorkflowData`] store. Each task sees a render context made of the store
//! plus per-task values (date, time, chat history, its own texts), and its
//! output is written back to the store before the next task starts.

mod config;

use std::sync::Arc;

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use promptline_core::provider::GenerationService;
use promptline_core::{Result, WorkflowData};
use uuid::Uuid;

pub use self::config::{PipelineConfig, PipelineConfigBuilder};
use crate::keys::{CHAT_HISTORY_SECTION, CURRENT_DATE, CURRENT_TIME, SYSTEM_CONTEXT, TASK_PROMPT};
use crate::{Ambient, ChatHistory, Clock, PipelineEvent, RunProgress, SystemClock, Task};

/// Tracing target for pipeline execution.
pub const TRACING_TARGET: &str = "promptline_runtime::pipeline";

/// An ordered list of tasks bound to a default generator.
#[derive(Clone)]
pub struct Pipeline {
    tasks: Vec<Task>,
    generator: GenerationService,
    config: PipelineConfig,
    clock: Arc<dyn Clock>,
    progress: RunProgress,
}

impl Pipeline {
    /// Creates a pipeline using the system clock and default configuration.
    ///
    /// Tasks are numbered by their order in `tasks`, starting at 1, whatever
    /// position they were created with.
    pub fn new(tasks: Vec<Task>, generator: GenerationService) -> Self {
        let tasks = tasks
            .into_iter()
            .enumerate()
            .map(|(index, task)| task.at_position(index + 1))
            .collect();

        Self {
            tasks,
            generator,
            config: PipelineConfig::default(),
            clock: Arc::new(SystemClock),
            progress: RunProgress::new(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the clock used for `current_date` and `current_time`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the tasks in position order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns a handle observing this pipeline's runs.
    pub fn progress(&self) -> RunProgress {
        self.progress.clone()
    }

    /// Runs every task in order, streaming their events.
    ///
    /// Date and time are read once when the stream is first polled. The
    /// first error ends the stream: outputs of tasks that completed before
    /// it remain in `data`, later tasks never start. Dropping the stream
    /// cancels the run at its current await point.
    pub fn run<'a>(
        &'a self,
        data: &'a mut WorkflowData,
    ) -> impl Stream<Item = Result<PipelineEvent>> + Send + 'a {
        try_stream! {
            let run_id = Uuid::now_v7();
            let ambient = Ambient::capture(self.clock.as_ref());
            let total = self.tasks.len();

            tracing::info!(
                target: TRACING_TARGET,
                run_id = %run_id,
                tasks = total,
                date = %ambient.date,
                time = %ambient.time,
                "Pipeline run started"
            );
            self.progress.start(total);

            for (index, task) in self.tasks.iter().enumerate() {
                let inputs = self.task_inputs(&self.tasks[..index], task, &ambient, data);
                self.progress.advance(task.position());

                let events = task.stream(inputs, &self.generator, &mut *data);
                let mut events = std::pin::pin!(events);
                while let Some(event) = events.next().await {
                    match event {
                        Ok(event) => yield event,
                        Err(error) => {
                            tracing::error!(
                                target: TRACING_TARGET,
                                run_id = %run_id,
                                position = task.position(),
                                error = %error,
                                "Pipeline run failed"
                            );
                            self.progress.fail();
                            Err::<(), _>(error)?;
                        }
                    }
                }
            }

            self.progress.complete();
            tracing::info!(
                target: TRACING_TARGET,
                run_id = %run_id,
                tasks = total,
                "Pipeline run completed"
            );
        }
    }

    /// Builds the render context of `task`.
    ///
    /// The store is left untouched; per-task values shadow store entries of
    /// the same name.
    fn task_inputs(
        &self,
        completed: &[Task],
        task: &Task,
        ambient: &Ambient,
        data: &WorkflowData,
    ) -> WorkflowData {
        let history = if self.config.include_chat_history {
            ChatHistory::from_tasks(completed, data)
        } else {
            ChatHistory::default()
        };

        let definition = task.definition();
        let overrides: WorkflowData = [
            (SYSTEM_CONTEXT, definition.system_context.to_string()),
            (TASK_PROMPT, definition.task_prompt.to_string()),
            (CHAT_HISTORY_SECTION, history.section()),
            (CURRENT_DATE, ambient.date.clone()),
            (CURRENT_TIME, ambient.time.clone()),
        ]
        .into_iter()
        .collect();

        data.merge(&overrides)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("tasks", &self.tasks)
            .field("generator", &self.generator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use jiff::civil::date;
    use jiff::tz::TimeZone;
    use promptline_core::mock::MockGeneration;
    use promptline_core::{Error, PromptMessages, Template};

    use super::*;
    use crate::{FixedClock, RunStatus, TaskDefinition};

    fn clock() -> Arc<dyn Clock> {
        let now = date(2024, 3, 5)
            .at(14, 30, 9, 0)
            .to_zoned(TimeZone::UTC)
            .unwrap();
        Arc::new(FixedClock::new(now))
    }

    fn pipeline(prompts: &[&str], mock: &MockGeneration) -> Pipeline {
        let tasks = prompts
            .iter()
            .enumerate()
            .map(|(i, prompt)| {
                Task::new(i + 1, TaskDefinition::new("Be helpful.", prompt).unwrap()).unwrap()
            })
            .collect();
        Pipeline::new(tasks, mock.clone().into_service()).with_clock(clock())
    }

    fn input(text: &str) -> WorkflowData {
        [("input_text", text)].into_iter().collect()
    }

    async fn collect(
        pipeline: &Pipeline,
        data: &mut WorkflowData,
    ) -> (Vec<PipelineEvent>, Option<Error>) {
        let events = pipeline.run(data);
        let mut events = std::pin::pin!(events);
        let mut seen = Vec::new();
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => seen.push(event),
                Err(error) => return (seen, Some(error)),
            }
        }
        (seen, None)
    }

    #[tokio::test]
    async fn emits_nested_begin_end_pairs() {
        let mock = MockGeneration::new()
            .reply(["a", "b"])
            .reply(["c"])
            .reply([] as [&str; 0]);
        let pipeline = pipeline(&["{input_text}", "x", "y"], &mock);
        let mut data = input("hi");

        let (events, error) = collect(&pipeline, &mut data).await;
        assert!(error.is_none());

        let mut open = None;
        let mut expected = 1;
        for event in &events {
            match event {
                PipelineEvent::TaskBegin { position } => {
                    assert_eq!(open, None);
                    assert_eq!(*position, expected);
                    open = Some(*position);
                }
                PipelineEvent::ContentFragment { .. } => assert!(open.is_some()),
                PipelineEvent::TaskEnd { position } => {
                    assert_eq!(open, Some(*position));
                    open = None;
                    expected += 1;
                }
            }
        }
        assert_eq!(expected, 4);
        assert_eq!(data.get_text("task_1_output").as_deref(), Some("ab"));
        assert_eq!(data.get_text("task_3_output").as_deref(), Some(""));
        assert_eq!(pipeline.progress().status(), RunStatus::Completed);
    }

    #[tokio::test]
    async fn earlier_output_feeds_later_prompt() {
        let mock = MockGeneration::new().reply(["Hail, friend!"]).reply(["Act I"]);
        let pipeline = pipeline(&["{input_text}", "Continue: {task_1_output}"], &mock);
        let mut data = input("hello");

        let (_, error) = collect(&pipeline, &mut data).await;
        assert!(error.is_none());

        let prompts = mock.prompts();
        assert_eq!(
            PromptMessages::parse(&prompts[1]).user,
            "Continue: Hail, friend!"
        );
        assert_eq!(data.get_text("task_2_output").as_deref(), Some("Act I"));
    }

    #[tokio::test]
    async fn renders_date_time_and_history() {
        let mock = MockGeneration::new().reply(["one"]).reply(["two"]).reply(["three"]);
        let pipeline = pipeline(&["{input_text}", "second", "third"], &mock);
        let mut data = input("hi");

        collect(&pipeline, &mut data).await;
        let prompts = mock.prompts();

        assert!(prompts[0].contains("Current date: 2024-03-05\nCurrent time: 14:30:09"));
        assert!(!prompts[0].contains("User:"));
        assert_eq!(prompts[1].matches("User: ").count(), 1);
        assert_eq!(prompts[2].matches("User: ").count(), 2);
        assert!(prompts[2].contains("User: {input_text}\nAssistant: one"));
        assert!(prompts[2].contains("User: second\nAssistant: two"));

        // Per-task values never leak into the shared store.
        assert!(!data.contains("chat_history_section"));
        assert!(!data.contains("current_date"));
    }

    #[tokio::test]
    async fn history_can_be_disabled() {
        let mock = MockGeneration::new();
        let pipeline = pipeline(&["{input_text}", "second"], &mock).with_config(
            PipelineConfigBuilder::default()
                .include_chat_history(false)
                .build()
                .unwrap(),
        );
        let mut data = input("hi");

        collect(&pipeline, &mut data).await;
        assert!(!mock.prompts()[1].contains("User:"));
    }

    #[tokio::test]
    async fn failure_stops_the_run() {
        let mock = MockGeneration::new()
            .reply(["first"])
            .fail_after(["partial"], "rate limited")
            .reply(["never"]);
        let pipeline = pipeline(&["{input_text}", "b", "c"], &mock);
        let mut data = input("hi");

        let (events, error) = collect(&pipeline, &mut data).await;

        assert_eq!(
            events,
            [
                PipelineEvent::TaskBegin { position: 1 },
                PipelineEvent::ContentFragment { text: "first".into() },
                PipelineEvent::TaskEnd { position: 1 },
                PipelineEvent::TaskBegin { position: 2 },
                PipelineEvent::ContentFragment { text: "partial".into() },
            ]
        );
        assert!(error.is_some_and(|e| e.is_capability()));
        assert_eq!(data.get_text("task_1_output").as_deref(), Some("first"));
        assert!(!data.contains("task_2_output"));
        assert!(!data.contains("task_3_output"));
        assert_eq!(mock.calls(), 2);
        assert_eq!(pipeline.progress().status(), RunStatus::Failed);
        assert_eq!(pipeline.progress().current_task(), Some(2));
    }

    #[tokio::test]
    async fn unresolved_placeholder_aborts_before_generation() {
        let mock = MockGeneration::new().reply(["ok"]);
        let pipeline = pipeline(&["{input_text}", "{search_ref_1}"], &mock);
        let mut data = input("hi");

        let (events, error) = collect(&pipeline, &mut data).await;

        assert_eq!(events.len(), 3);
        assert!(matches!(error, Some(Error::UnresolvedPlaceholder { ref key }) if key == "search_ref_1"));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn values_are_not_rescanned() {
        let mock = MockGeneration::new().reply(["{input_text}"]).reply(["done"]);
        let pipeline = pipeline(&["{input_text}", "Quote: {task_1_output}"], &mock);
        let mut data = input("{{raw}} {secret}");

        let (_, error) = collect(&pipeline, &mut data).await;
        assert!(error.is_none());

        let prompts = mock.prompts();
        assert!(prompts[0].contains("<user>\n{{raw}} {secret}\n</user>"));
        assert!(prompts[1].contains("Quote: {input_text}\n</user>"));
    }

    #[tokio::test]
    async fn dropping_the_stream_cancels_generation() {
        let mock = MockGeneration::new().reply(["a", "b", "c"]).reply(["never"]);
        let pipeline = pipeline(&["{input_text}", "next"], &mock);
        let mut data = input("hi");

        {
            let events = pipeline.run(&mut data);
            let mut events = std::pin::pin!(events);
            let first = events.next().await.unwrap().unwrap();
            assert_eq!(first, PipelineEvent::TaskBegin { position: 1 });
            let second = events.next().await.unwrap().unwrap();
            assert_eq!(second.fragment(), Some("a"));
            assert_eq!(mock.open_streams(), 1);
        }

        assert_eq!(mock.open_streams(), 0);
        assert_eq!(mock.calls(), 1);
        assert!(!data.contains("task_1_output"));
    }

    #[tokio::test]
    async fn tasks_are_numbered_by_order() {
        let mock = MockGeneration::new().reply(["first"]).reply(["second"]);
        let tasks = vec![
            Task::new(2, TaskDefinition::new("Be helpful.", "{input_text}").unwrap()).unwrap(),
            Task::new(1, TaskDefinition::new("Be helpful.", "Next: {task_1_output}").unwrap())
                .unwrap(),
        ];
        let pipeline = Pipeline::new(tasks, mock.clone().into_service()).with_clock(clock());
        let mut data = input("hi");

        let (events, error) = collect(&pipeline, &mut data).await;
        assert!(error.is_none());

        let begins: Vec<_> = events
            .iter()
            .filter(|event| matches!(event, PipelineEvent::TaskBegin { .. }))
            .filter_map(PipelineEvent::position)
            .collect();
        assert_eq!(begins, [1, 2]);
        assert_eq!(data.get_text("task_1_output").as_deref(), Some("first"));
        assert_eq!(data.get_text("task_2_output").as_deref(), Some("second"));
        assert!(PromptMessages::parse(&mock.prompts()[1]).user.ends_with("Next: first"));
        assert!(mock.prompts()[1].contains("User: {input_text}\nAssistant: first"));
    }

    #[tokio::test]
    async fn empty_pipeline_completes_without_events() {
        let mock = MockGeneration::new();
        let pipeline = Pipeline::new(Vec::new(), mock.clone().into_service());
        let mut data = WorkflowData::new();

        let events: Vec<_> = pipeline.run(&mut data).try_collect().await.unwrap();
        assert!(events.is_empty());
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn per_task_values_shadow_store() {
        let mock = MockGeneration::new();
        let pipeline = pipeline(&["{input_text}"], &mock);
        let data: WorkflowData = [("current_date", "stale"), ("input_text", "x")]
            .into_iter()
            .collect();
        let ambient = Ambient::capture(clock().as_ref());

        let inputs = pipeline.task_inputs(&[], &pipeline.tasks()[0], &ambient, &data);
        assert_eq!(inputs.get_text("current_date").as_deref(), Some("2024-03-05"));
        assert_eq!(inputs.get_text("system_context").as_deref(), Some("Be helpful."));
        assert_eq!(data.get_text("current_date").as_deref(), Some("stale"));

        let prompt = pipeline.tasks()[0].render(&inputs).unwrap();
        assert!(Template::parse(&prompt).is_ok());
    }
}
