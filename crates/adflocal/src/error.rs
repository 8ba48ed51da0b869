//! errors raised while resolving a single document
//!
//! Every variant carries the text, path or object name needed to point the user at the offending spot.

/// Failure of overlay, expression evaluation or window materialization
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("Invalid expression `{text}`: {reason}")]
    InvalidExpression { text: String, reason: &'static str },

    #[error("The function {namespace}.{method} is not supported")]
    UnsupportedFunction { namespace: String, method: String },

    #[error("The reference `{text}` is neither a known date, a format string nor an integer")]
    UnresolvedReference { text: String },

    #[error("partitionedBy source `{source_name}` is not supported (expected SliceStart, SliceEnd, WindowStart or WindowEnd)")]
    UnsupportedPartitionSource { source_name: String },

    #[error("Object `{object}` requires a configuration for `{path}` but none was supplied")]
    MissingConfiguration { object: String, path: String },

    #[error("No configuration setting found for object `{object}` and `{path}` (or any matching wildcard)")]
    UnresolvedConfigSentinel { object: String, path: String },

    #[error("Invalid format string `{format}`: {reason}")]
    InvalidFormat { format: String, reason: String },

    #[error("Invalid argument for {function}: {reason}")]
    InvalidArgument { function: String, reason: String },

    #[error("Invalid path expression `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Malformed partitionedBy entry: {reason}")]
    MalformedPartition { reason: String },

    #[error("Invalid document: {reason}")]
    InvalidDocument { reason: String },

    #[error("Document round-trip failed")]
    Json(#[from] serde_json::Error),
}

impl ResolveError {
    pub(crate) fn invalid_format(format: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            format: format.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_argument(function: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            function: function.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_partition(reason: impl Into<String>) -> Self {
        Self::MalformedPartition {
            reason: reason.into(),
        }
    }
}
