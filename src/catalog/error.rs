use thiserror::Error;

/// Failure while fetching descriptors from a [`DescriptorSource`](super::DescriptorSource).
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("Failed to read catalog file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Catalog request failed: {0}")]
    Http(String),

    #[error("Catalog endpoint returned HTTP {0}")]
    Status(u16),

    #[error("Failed to parse catalog document: {0}")]
    Parse(String),
}

/// A catalog (re)build failed; no snapshot was published.
///
/// Cloneable so that every caller awaiting the same single-flight build receives
/// the same error.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    #[error("Descriptor source unavailable: {0}")]
    Source(#[from] SourceError),

    #[error("Duplicate model id in catalog: {0}")]
    DuplicateModelId(String),

    /// The build task panicked or was cancelled by runtime shutdown.
    #[error("Catalog build task did not complete: {0}")]
    Interrupted(String),
}

impl BuildError {
    /// Short label for metrics and error codes.
    pub fn kind(&self) -> &'static str {
        match self {
            BuildError::Source(_) => "source_unavailable",
            BuildError::DuplicateModelId(_) => "duplicate_model_id",
            BuildError::Interrupted(_) => "interrupted",
        }
    }
}
