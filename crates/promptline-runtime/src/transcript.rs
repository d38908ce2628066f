//! Consumer-side accumulation of run events.

use crate::PipelineEvent;

/// Markdown rendering of a run, built from its events.
///
/// Each task gets a `### Task N Output:` heading followed by its streamed
/// text, and finished tasks are closed with a `---` rule.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    markdown: String,
    outputs: Vec<(usize, String)>,
    completed: usize,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event.
    pub fn push(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::TaskBegin { position } => {
                self.markdown.push_str(&format!("### Task {position} Output:\n\n"));
                self.outputs.push((*position, String::new()));
            }
            PipelineEvent::ContentFragment { text } => {
                self.markdown.push_str(text);
                if let Some((_, output)) = self.outputs.last_mut() {
                    output.push_str(text);
                }
            }
            PipelineEvent::TaskEnd { .. } => {
                self.markdown.push_str("\n\n---\n\n");
                self.completed += 1;
            }
        }
    }

    /// Returns the rendered markdown so far.
    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    /// Returns the text streamed by the task at `position`.
    pub fn output(&self, position: usize) -> Option<&str> {
        self.outputs
            .iter()
            .find(|(p, _)| *p == position)
            .map(|(_, output)| output.as_str())
    }

    /// Returns the number of tasks that reached `TaskEnd`.
    pub fn completed(&self) -> usize {
        self.completed
    }
}

impl<'a> Extend<&'a PipelineEvent> for Transcript {
    fn extend<I: IntoIterator<Item = &'a PipelineEvent>>(&mut self, iter: I) {
        for event in iter {
            self.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_headings_and_separators() {
        let mut transcript = Transcript::new();
        transcript.extend(&[
            PipelineEvent::TaskBegin { position: 1 },
            PipelineEvent::ContentFragment { text: "Hail".into() },
            PipelineEvent::ContentFragment { text: "!".into() },
            PipelineEvent::TaskEnd { position: 1 },
            PipelineEvent::TaskBegin { position: 2 },
            PipelineEvent::ContentFragment { text: "Act".into() },
        ]);

        assert_eq!(
            transcript.markdown(),
            "### Task 1 Output:\n\nHail!\n\n---\n\n### Task 2 Output:\n\nAct"
        );
        assert_eq!(transcript.output(1), Some("Hail!"));
        assert_eq!(transcript.output(2), Some("Act"));
        assert_eq!(transcript.output(3), None);
        assert_eq!(transcript.completed(), 1);
    }
}
