//! Named references to externally sourced artifacts.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

use crate::{TRACING_TARGET, WorkflowData};

/// Kind of external capability that produced a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReferenceKind {
    /// Web search results.
    Search,
    /// Scraped page content.
    Scrape,
}

/// A stored result of a search or fetch call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// Placeholder name, e.g. `search_ref_2`.
    pub name: String,
    /// Capability that produced the payload.
    pub kind: ReferenceKind,
    /// Query or URL the payload was produced for.
    pub query: String,
    /// Payload stored in the workflow data under [`Reference::name`].
    pub payload: Value,
    /// When the reference was registered.
    pub created_at: Timestamp,
}

impl Reference {
    /// Returns the placeholder syntax that resolves to this reference.
    pub fn placeholder(&self) -> String {
        format!("{{{}}}", self.name)
    }
}

/// Assigns stable names to references and publishes their payloads.
///
/// Ordinals are counted per kind for the lifetime of the registry, so the
/// first search is `search_ref_1` even after several scrapes.
#[derive(Debug, Clone, Default)]
pub struct ReferenceRegistry {
    search: Vec<Reference>,
    scrape: Vec<Reference>,
}

impl ReferenceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a payload and writes it into `data` under the assigned name.
    pub fn register(
        &mut self,
        kind: ReferenceKind,
        query: impl Into<String>,
        payload: impl Into<Value>,
        data: &mut WorkflowData,
    ) -> Reference {
        let list = self.list_mut(kind);
        let name = format!("{kind}_ref_{}", list.len() + 1);

        let reference = Reference {
            name: name.clone(),
            kind,
            query: query.into(),
            payload: payload.into(),
            created_at: Timestamp::now(),
        };

        data.set(name, reference.payload.clone());
        list.push(reference.clone());

        tracing::debug!(
            target: TRACING_TARGET,
            name = %reference.name,
            kind = %kind,
            query = %reference.query,
            "Registered reference"
        );

        reference
    }

    /// Returns the references of one kind in registration order.
    pub fn references(&self, kind: ReferenceKind) -> &[Reference] {
        match kind {
            ReferenceKind::Search => &self.search,
            ReferenceKind::Scrape => &self.scrape,
        }
    }

    /// Returns the reference registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Reference> {
        self.iter().find(|r| r.name == name)
    }

    /// Returns every reference, searches first.
    pub fn iter(&self) -> impl Iterator<Item = &Reference> {
        self.search.iter().chain(self.scrape.iter())
    }

    /// Returns the total number of references.
    pub fn len(&self) -> usize {
        self.search.len() + self.scrape.len()
    }

    /// Returns true if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn list_mut(&mut self, kind: ReferenceKind) -> &mut Vec<Reference> {
        match kind {
            ReferenceKind::Search => &mut self.search,
            ReferenceKind::Scrape => &mut self.scrape,
        }
    }
}
