//! System / user segments of a rendered prompt.

use serde::{Deserialize, Serialize};

/// Opening marker of the system segment.
pub const SYSTEM_OPEN: &str = "<system>";
/// Closing marker of the system segment.
pub const SYSTEM_CLOSE: &str = "</system>";
/// Opening marker of the user segment.
pub const USER_OPEN: &str = "<user>";
/// Closing marker of the user segment.
pub const USER_CLOSE: &str = "</user>";

/// A prompt split into its system and user segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessages {
    /// Content of the `<system>` segment, if present.
    pub system: Option<String>,
    /// Content of the `<user>` segment, or the whole prompt without markers.
    pub user: String,
}

impl PromptMessages {
    /// Splits a prompt on its `<system>` and `<user>` markers.
    ///
    /// A prompt without a user segment is treated as user content in full,
    /// minus any system segment it contains.
    pub fn parse(prompt: &str) -> Self {
        let system = between(prompt, SYSTEM_OPEN, SYSTEM_CLOSE)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let user = match between(prompt, USER_OPEN, USER_CLOSE) {
            Some(user) => user.trim().to_string(),
            None => strip_system(prompt).trim().to_string(),
        };

        Self { system, user }
    }

    /// Returns the content between the first user markers of `source`,
    /// exactly as written.
    ///
    /// Returns an empty string when the markers are absent.
    pub fn user_segment(source: &str) -> &str {
        between(source, USER_OPEN, USER_CLOSE).unwrap_or_default()
    }
}

/// Returns the text between the first `open` marker and the next `close`.
fn between<'a>(source: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = source.find(open)? + open.len();
    let end = source[start..].find(close)?;
    Some(&source[start..start + end])
}

fn strip_system(prompt: &str) -> String {
    let Some(start) = prompt.find(SYSTEM_OPEN) else {
        return prompt.to_string();
    };
    match prompt[start..].find(SYSTEM_CLOSE) {
        Some(end) => {
            let mut rest = prompt[..start].to_string();
            rest.push_str(&prompt[start + end + SYSTEM_CLOSE.len()..]);
            rest
        }
        None => prompt.to_string(),
    }
}
