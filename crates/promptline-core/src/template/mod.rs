//! Prompt templates with `{name}` placeholders.
//!
//! A [`Template`] is an ordered list of literal text and placeholder
//! references. Rendering looks every placeholder up in a [`WorkflowData`]
//! store; values are substituted literally and never rescanned for
//! placeholder syntax.
//!
//! `{{` and `}}` stand for literal braces. A complete render emits single
//! braces, a partial render re-escapes them so that its output parses back
//! into an equivalent template:
//!
//! ```rust
//! use promptline_core::{Template, WorkflowData};
//!
//! let template: Template = "Summarize {topic} for {audience}.".parse()?;
//!
//! let mut data = WorkflowData::new();
//! data.set("topic", "tide pools");
//!
//! let staged: Template = template.render(&data, true)?.parse()?;
//! assert_eq!(staged.to_string(), "Summarize tide pools for {audience}.");
//!
//! data.set("audience", "children");
//! assert_eq!(staged.render(&data, false)?, "Summarize tide pools for children.");
//! # Ok::<(), promptline_core::Error>(())
//! ```

mod messages;
mod parser;

use std::fmt;
use std::str::FromStr;

pub use messages::PromptMessages;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, WorkflowData};

/// A single piece of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Segment {
    /// Literal text, stored unescaped.
    Literal(String),
    /// A named substitution point.
    Placeholder(String),
}

/// A parsed prompt template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parses template source.
    ///
    /// Fails with [`Error::MalformedTemplate`] when braces are unbalanced, a
    /// placeholder is empty, or a placeholder name contains characters other
    /// than alphanumerics, `_`, `-` and `.`.
    pub fn parse(source: &str) -> Result<Self> {
        Ok(Self {
            segments: parser::parse_segments(source)?,
        })
    }

    /// Creates a template consisting of a single literal text.
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        let segments = if text.is_empty() {
            Vec::new()
        } else {
            vec![Segment::Literal(text)]
        };
        Self { segments }
    }

    /// Returns the segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the placeholder names in order of appearance.
    ///
    /// A name referenced several times is yielded each time.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Returns true if the template references the given placeholder.
    pub fn references(&self, name: &str) -> bool {
        self.placeholders().any(|p| p == name)
    }

    /// Returns the distinct placeholder names that `data` cannot resolve.
    pub fn missing<'a>(&'a self, data: &WorkflowData) -> Vec<&'a str> {
        let mut missing: Vec<&str> = Vec::new();
        for name in self.placeholders() {
            if !data.contains(name) && !missing.contains(&name) {
                missing.push(name);
            }
        }
        missing
    }

    /// Returns true if the template contains no placeholders.
    pub fn is_resolved(&self) -> bool {
        self.placeholders().next().is_none()
    }

    /// Renders the template against `data`.
    ///
    /// With `partial` set, absent placeholders are left intact and literal
    /// braces are re-escaped, so the output is itself valid template source.
    /// Without it, the first absent placeholder fails with
    /// [`Error::UnresolvedPlaceholder`].
    pub fn render(&self, data: &WorkflowData, partial: bool) -> Result<String> {
        let mut rendered = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) if partial => escape_into(&mut rendered, text),
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Placeholder(name) => match data.get_text(name) {
                    Some(value) if partial => escape_into(&mut rendered, &value),
                    Some(value) => rendered.push_str(&value),
                    None if partial => {
                        rendered.push('{');
                        rendered.push_str(name);
                        rendered.push('}');
                    }
                    None => return Err(Error::unresolved(name.as_str())),
                },
            }
        }

        Ok(rendered)
    }

    /// Renders with every placeholder required.
    pub fn render_complete(&self, data: &WorkflowData) -> Result<String> {
        self.render(data, false)
    }

    /// Renders leaving unresolved placeholders in place.
    pub fn render_partial(&self, data: &WorkflowData) -> Result<String> {
        self.render(data, true)
    }

    /// Replaces every occurrence of placeholder `name` with the segments of
    /// `template`, keeping the spliced placeholders live.
    pub fn splice(&self, name: &str, template: &Template) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + template.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Placeholder(p) if p == name => {
                    for inner in &template.segments {
                        push_segment(&mut segments, inner.clone());
                    }
                }
                other => push_segment(&mut segments, other.clone()),
            }
        }
        Self { segments }
    }
}

/// Appends a segment, merging adjacent literals.
fn push_segment(segments: &mut Vec<Segment>, segment: Segment) {
    match (segments.last_mut(), segment) {
        (Some(Segment::Literal(last)), Segment::Literal(text)) => last.push_str(&text),
        (_, segment) => segments.push(segment),
    }
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '{' => out.push_str("{{"),
            '}' => out.push_str("}}"),
            c => out.push(c),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut source = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => escape_into(&mut source, text),
                Segment::Placeholder(name) => {
                    source.push('{');
                    source.push_str(name);
                    source.push('}');
                }
            }
        }
        f.write_str(&source)
    }
}

impl FromStr for Template {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Template {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Template> for String {
    fn from(template: Template) -> Self {
        template.to_string()
    }
}
