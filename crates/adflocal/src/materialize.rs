//! window materialization
//!
//! Resolves a (configuration resolved) document for one execution window:
//!
//! 1. every `$$` string scalar is replaced by the string form of its evaluated expression
//! 2. every `partitionedBy` block defines `{name}` placeholders rendered from a named date
//! 3. the placeholders are substituted in the serialized document text, which is then parsed again
//!
//! Placeholder substitution is textual: a `{name}` token is replaced wherever it occurs in the serialized
//! document, including property names and strings unrelated to the block that defined it. Only the placeholders
//! of the last `partitionedBy` block (in document order) are substituted.
use crate::error::ResolveError;
use crate::expression::{self, DateContext};
use crate::json_path::{display_location, PathStep};
use crate::util::escape_json_fragment;
use crate::value::Timestamp;
use crate::visit::VisitPropertiesMut;
use serde_json::Value;

/// Names of the dates available to expressions and partition descriptors
pub const DATE_SOURCES: [&str; 4] = ["SliceStart", "SliceEnd", "WindowStart", "WindowEnd"];

/// Property holding partition descriptors
const PARTITIONED_BY: &str = "partitionedBy";

/// One execution window
///
/// Window start/end fall back to slice start/end when not given.
#[derive(Debug, Clone, Copy, PartialEq, derive_new::new)]
pub struct Window {
    pub slice_start: Timestamp,
    pub slice_end: Timestamp,
    #[new(default)]
    pub window_start: Option<Timestamp>,
    #[new(default)]
    pub window_end: Option<Timestamp>,
}

impl Window {
    pub fn with_window(
        mut self,
        window_start: impl Into<Option<Timestamp>>,
        window_end: impl Into<Option<Timestamp>>,
    ) -> Self {
        self.window_start = window_start.into();
        self.window_end = window_end.into();
        self
    }

    /// Named dates in the order `SliceStart`, `SliceEnd`, `WindowStart`, `WindowEnd`
    pub fn date_context(&self) -> DateContext {
        DateContext::new()
            .with("SliceStart", self.slice_start)
            .with("SliceEnd", self.slice_end)
            .with("WindowStart", self.window_start.unwrap_or(self.slice_start))
            .with("WindowEnd", self.window_end.unwrap_or(self.slice_end))
    }
}

/// Placeholder token and its rendered replacement
type Placeholders = indexmap::IndexMap<String, String>;

/// Resolve all expressions and partition placeholders of `document` for `window`
///
/// `document` is consumed: callers that need the unresolved document again have to pass a copy.
#[tracing::instrument(level = "debug", skip_all, fields(object = document.get("name").and_then(serde_json::Value::as_str)))]
pub fn materialize(mut document: Value, window: &Window) -> Result<Value, ResolveError> {
    let context = window.date_context();
    let mut placeholders = Placeholders::new();

    document.visit_properties_mut(&mut |path: &[PathStep], value: &mut Value| -> Result<(), ResolveError> {
        if let Some(text) = value.as_str().filter(|text| expression::is_expression(text)) {
            let resolved = expression::evaluate(text, &context)?.coerce_to_string();
            tracing::trace!(location = %display_location(path), %resolved, "expression resolved");
            *value = Value::String(resolved);
            return Ok(());
        }

        let is_partitioned_by = matches!(
            path.last(),
            Some(PathStep::Key(key)) if key.eq_ignore_ascii_case(PARTITIONED_BY)
        );
        if is_partitioned_by {
            placeholders = partition_placeholders(value, &context)?;
            tracing::trace!(location = %display_location(path), ?placeholders, "partition placeholders");
        }

        Ok(())
    })?;

    if placeholders.is_empty() {
        return Ok(document);
    }

    let mut text = serde_json::to_string(&document)?;
    for (token, replacement) in &placeholders {
        text = text.replace(token.as_str(), &escape_json_fragment(replacement)?);
    }

    Ok(serde_json::from_str(&text)?)
}

/// Render the `{name}` placeholders of one `partitionedBy` block
fn partition_placeholders(
    descriptors: &Value,
    context: &DateContext,
) -> Result<Placeholders, ResolveError> {
    let Some(descriptors) = descriptors.as_array() else {
        return Err(ResolveError::malformed_partition(
            "partitionedBy must be a list",
        ));
    };

    let mut placeholders = Placeholders::new();
    for descriptor in descriptors {
        let name = descriptor
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ResolveError::malformed_partition("missing string `name`"))?;
        let date = descriptor
            .pointer("/value/date")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ResolveError::malformed_partition(format!("`{name}` is missing `value.date`"))
            })?;
        let format = descriptor
            .pointer("/value/format")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ResolveError::malformed_partition(format!("`{name}` is missing `value.format`"))
            })?;

        if !DATE_SOURCES
            .iter()
            .any(|source| source.eq_ignore_ascii_case(date))
        {
            return Err(ResolveError::UnsupportedPartitionSource {
                source_name: date.to_string(),
            });
        }

        let expression = format!("$$Text.Format('{{0:{format}}}', {date})");
        let rendered = expression::evaluate(&expression, context)?.coerce_to_string();

        let token = format!("{{{name}}}");
        if placeholders.insert(token, rendered).is_some() {
            return Err(ResolveError::malformed_partition(format!(
                "`{name}` is defined more than once"
            )));
        }
    }

    Ok(placeholders)
}
