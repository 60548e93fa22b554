//! Type definitions for the model catalog.
//!
//! Descriptors are user-agnostic: nothing in a [`CatalogSnapshot`] depends on who is
//! asking. Per-user accessibility only exists on [`ResolvedModel`], which is computed
//! fresh for every request.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog document as served by descriptor sources (`{"models": [...]}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Descriptors in catalog order
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
}

/// Model capabilities advertised by the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelCapabilities {
    /// Whether the model supports image/file attachments (vision)
    pub vision: bool,

    /// Whether the model supports reasoning/thinking mode
    pub reasoning: bool,

    /// Whether the model supports tool/function calling
    pub tool_call: bool,

    /// Whether the model supports structured output (JSON mode)
    pub structured_output: bool,
}

/// Metadata record for one selectable model.
///
/// Unknown fields in source documents are ignored, including any `accessible`
/// flag: accessibility is never read from or stored on a descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Model identifier, unique within a snapshot (e.g., "gpt-4o")
    pub id: String,

    /// Provider key whose credentials unlock this model (e.g., "openai")
    pub provider: String,

    /// Human-readable model name
    pub display_name: String,

    /// Whether the model is usable without any provider credentials
    #[serde(default)]
    pub accessible_default: bool,

    /// Short description for model pickers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Model family (e.g., "claude-opus", "gpt-4")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    /// Maximum context window size (tokens)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_length: Option<i64>,

    /// Maximum output tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<i64>,

    #[serde(default)]
    pub capabilities: ModelCapabilities,
}

impl ModelDescriptor {
    /// Create a descriptor with default metadata.
    pub fn new(
        id: impl Into<String>,
        provider: impl Into<String>,
        display_name: impl Into<String>,
        accessible_default: bool,
    ) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            display_name: display_name.into(),
            accessible_default,
            description: None,
            family: None,
            context_length: None,
            max_output_tokens: None,
            capabilities: ModelCapabilities::default(),
        }
    }
}

/// One immutable, fully-built version of the model catalog.
///
/// Snapshots are shared behind an `Arc` and replaced wholesale on rebuild, so a
/// reader holding one never observes a partially updated catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogSnapshot {
    models: Vec<ModelDescriptor>,
    built_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    /// Construct a snapshot. Callers are responsible for id uniqueness; the store
    /// checks it before publishing.
    pub(crate) fn new(models: Vec<ModelDescriptor>, built_at: DateTime<Utc>) -> Self {
        Self { models, built_at }
    }

    /// Descriptors in catalog order.
    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Look up a descriptor by id.
    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == id)
    }
}

/// Providers a single user holds credentials for.
///
/// Sourced fresh per request from the credential lookup; never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderSet(HashSet<String>);

impl ProviderSet {
    /// The empty set (anonymous user or no keys).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, provider: &str) -> bool {
        self.0.contains(provider)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_subset(&self, other: &ProviderSet) -> bool {
        self.0.is_subset(&other.0)
    }
}

impl<S: Into<String>> FromIterator<S> for ProviderSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A descriptor annotated with whether the requesting user may use it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResolvedModel {
    #[serde(flatten)]
    pub model: ModelDescriptor,

    /// Computed per request: `accessible_default || user holds a key for provider`
    pub accessible: bool,
}
