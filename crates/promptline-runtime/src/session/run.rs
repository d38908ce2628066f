//! A prepared pipeline run and its data store.

use futures::Stream;
use promptline_core::{Result, WorkflowData, task_output_key};

use crate::{Pipeline, PipelineEvent, RunProgress};

/// A prepared run: a pipeline plus the data store it writes to.
#[derive(Debug)]
pub struct PipelineRun {
    pipeline: Pipeline,
    data: WorkflowData,
}

impl PipelineRun {
    pub(crate) fn new(pipeline: Pipeline, data: WorkflowData) -> Self {
        Self { pipeline, data }
    }

    /// Streams the run's events. See [`Pipeline::run`].
    pub fn events(&mut self) -> impl Stream<Item = Result<PipelineEvent>> + Send + '_ {
        self.pipeline.run(&mut self.data)
    }

    /// Returns a handle observing this run's progress.
    pub fn progress(&self) -> RunProgress {
        self.pipeline.progress()
    }

    /// Returns the pipeline being run.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Returns the run's data store.
    pub fn data(&self) -> &WorkflowData {
        &self.data
    }

    /// Returns the output of the task at `position`, if it completed.
    pub fn output(&self, position: usize) -> Option<String> {
        self.data
            .get_text(&task_output_key(position))
            .map(|text| text.into_owned())
    }

    /// Consumes the run and returns its data store.
    pub fn into_data(self) -> WorkflowData {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::TryStreamExt;
    use jiff::civil::date;
    use jiff::tz::TimeZone;
    use promptline_core::mock::{MockGeneration, MockSearch};

    use crate::{FixedClock, PipelineSession, RunStatus, TaskDefinition, Transcript};

    #[tokio::test]
    async fn runs_example_pipeline_end_to_end() {
        let mock = MockGeneration::new()
            .reply(["Good morrow, ", "friend."])
            .reply(["ACT I. ", "A street."]);
        let now = date(2024, 3, 5)
            .at(9, 0, 0, 0)
            .to_zoned(TimeZone::UTC)
            .unwrap();

        let mut session = PipelineSession::new(mock.clone().into_service())
            .with_search(MockSearch::new().into_service())
            .with_clock(Arc::new(FixedClock::new(now)));
        session.add_task(TaskDefinition::first_example().unwrap());
        session.add_task(
            TaskDefinition::new("You are a playwright.", "{task_1_output}\n{search_ref_1}")
                .unwrap(),
        );
        session.search("verona").await.unwrap();

        let mut run = session.start_run("hello friend").unwrap();
        let events: Vec<_> = run.events().try_collect().await.unwrap();

        let mut transcript = Transcript::new();
        transcript.extend(&events);

        assert_eq!(run.output(1).as_deref(), Some("Good morrow, friend."));
        assert_eq!(run.output(2).as_deref(), Some("ACT I. A street."));
        assert_eq!(transcript.completed(), 2);
        assert!(transcript.markdown().starts_with("### Task 1 Output:\n\nGood morrow, friend."));
        assert_eq!(run.progress().status(), RunStatus::Completed);

        let prompts = mock.prompts();
        assert!(prompts[0].contains("<user>\nhello friend\n</user>"));
        assert!(prompts[1].contains("Good morrow, friend.\n{\"query\":\"verona\""));

        // Runs work on a snapshot; the session keeps only its seeded data.
        assert!(!session.data().contains("task_1_output"));
        assert!(!session.data().contains("input_text"));
    }
}
