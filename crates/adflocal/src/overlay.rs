//! configuration overlay
//!
//! A configuration document maps object names to a list of `{ "name": <path>, "value": <replacement> }` entries:
//!
//! ```json
//! {
//!   "MyDataset": [
//!     { "name": "$.properties.availability.frequency", "value": "Hour" }
//!   ]
//! }
//! ```
//!
//! Entries are applied in order and every location matched by an entry's path is replaced, so when several
//! (wildcard) entries match the same property the last one wins. Properties holding the `<config>` sentinel must
//! all be replaced, otherwise the overlay fails.
use crate::error::ResolveError;
use crate::json_path::{display_location, get_mut, JsonPath, Location, PathStep};
use crate::visit::VisitPropertiesMut;
use serde_json::Value;

/// Placeholder value that must be replaced by the configuration
pub const CONFIG_SENTINEL: &str = "<config>";

/// A named configuration document
#[derive(Debug, Clone, derive_new::new)]
pub struct Configuration {
    pub name: String,
    pub document: Value,
}

impl Configuration {
    /// Entries for the object with the given name, in configuration order
    pub fn entries_for(&self, object_name: &str) -> Result<Vec<(JsonPath, &Value)>, ResolveError> {
        let Some(entries) = self.document.get(object_name) else {
            return Ok(vec![]);
        };

        let Some(entries) = entries.as_array() else {
            return Err(ResolveError::InvalidDocument {
                reason: format!(
                    "configuration `{}` entry `{object_name}` must be a list",
                    self.name
                ),
            });
        };

        entries
            .iter()
            .map(|entry| {
                let (Some(path), Some(value)) =
                    (entry.get("name").and_then(Value::as_str), entry.get("value"))
                else {
                    return Err(ResolveError::InvalidDocument {
                        reason: format!(
                            "configuration `{}` entry for `{object_name}` must have a string `name` and a `value`",
                            self.name
                        ),
                    });
                };
                Ok((JsonPath::compile(path)?, value))
            })
            .collect()
    }
}

/// The top-level `name` of a document
pub fn object_name(document: &Value) -> Result<&str, ResolveError> {
    document
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| ResolveError::InvalidDocument {
            reason: "missing top-level string property `name`".to_string(),
        })
}

/// Locations of all `<config>` sentinels, in document order
pub fn find_sentinels(document: &mut Value) -> Result<Vec<Location>, ResolveError> {
    let mut found = vec![];
    document.visit_properties_mut(&mut |path: &[PathStep], value: &mut Value| -> Result<(), ResolveError> {
        if value.as_str() == Some(CONFIG_SENTINEL) {
            found.push(path.to_vec());
        }
        Ok(())
    })?;
    Ok(found)
}

/// Replace configured properties of `document`
///
/// Without a configuration this is a no-op, unless the document contains `<config>` sentinels.
///
/// Must be applied at most once per document: applying it again rewrites the same properties.
#[tracing::instrument(level = "debug", skip_all, fields(configuration = configuration.map(|c| c.name.as_str())))]
pub fn apply_configuration(
    document: &mut Value,
    configuration: Option<&Configuration>,
) -> Result<(), ResolveError> {
    let sentinels = find_sentinels(document)?;

    let Some(configuration) = configuration else {
        if let Some(first) = sentinels.first() {
            return Err(ResolveError::MissingConfiguration {
                object: object_name(document).unwrap_or_default().to_string(),
                path: display_location(first),
            });
        }
        return Ok(());
    };

    let object = object_name(document)?.to_string();
    let entries = configuration.entries_for(&object)?;
    tracing::debug!(%object, entries = entries.len(), sentinels = sentinels.len(), "apply configuration");

    for (path, value) in entries {
        let locations = path.locate(document);
        if locations.is_empty() {
            tracing::trace!(%object, path = %path.expression, "configuration entry matched nothing");
        }

        for location in locations {
            tracing::trace!(%object, location = %display_location(&location), "replace");
            if let Some(slot) = get_mut(document, &location) {
                *slot = value.clone();
            }
        }
    }

    if let Some(unresolved) = find_sentinels(document)?.first() {
        return Err(ResolveError::UnresolvedConfigSentinel {
            object,
            path: display_location(unresolved),
        });
    }

    Ok(())
}
