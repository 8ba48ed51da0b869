//! path expressions for configuration entries
//!
//! Supports a JSONPath-like subset:
//! - `$` root (optional)
//! - `.name` and `['name']` member access
//! - `[0]` array index
//! - `.*` and `[*]` wildcards (all members of an object or all elements of an array)
//! - `..name` recursive descent
//!
//! Instead of returning copies, a path resolves to the [Location]s of matching nodes so callers can replace them.
use crate::error::ResolveError;
use serde_json::Value;

/// One step from a node to one of its children
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

/// Address of a node, relative to the document root
pub type Location = Vec<PathStep>;

/// Render a location the way user facing messages refer to properties (`properties.activities[0].name`)
pub fn display_location(location: &[PathStep]) -> String {
    let mut out = String::new();
    for step in location {
        match step {
            PathStep::Key(key) if is_plain_identifier(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathStep::Key(key) => out.push_str(&format!("['{key}']")),
            PathStep::Index(index) => out.push_str(&format!("[{index}]")),
        }
    }
    out
}

fn is_plain_identifier(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '-')
}

/// Navigate to the node at `location`
pub fn get_mut<'v>(root: &'v mut Value, location: &[PathStep]) -> Option<&'v mut Value> {
    location.iter().try_fold(root, |node, step| match (step, node) {
        (PathStep::Key(key), Value::Object(object)) => object.get_mut(key),
        (PathStep::Index(index), Value::Array(array)) => array.get_mut(*index),
        _ => None,
    })
}

fn get<'v>(root: &'v Value, location: &[PathStep]) -> Option<&'v Value> {
    location.iter().try_fold(root, |node, step| match (step, node) {
        (PathStep::Key(key), Value::Object(object)) => object.get(key),
        (PathStep::Index(index), Value::Array(array)) => array.get(*index),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Member(String),
    Index(usize),
    Wildcard,
    RecursiveDescent(String),
}

/// Compiled path expression
#[derive(Debug, Clone)]
pub struct JsonPath {
    pub expression: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn compile(expression: &str) -> Result<Self, ResolveError> {
        let invalid = |reason: &str| ResolveError::InvalidPath {
            path: expression.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = vec![];
        let mut rest = expression.trim();
        rest = rest.strip_prefix('$').unwrap_or(rest);

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix("..") {
                let (name, after) = take_name(after);
                if name.is_empty() {
                    return Err(invalid("recursive descent requires a member name"));
                }
                segments.push(Segment::RecursiveDescent(name.to_string()));
                rest = after;
            } else if let Some(after) = rest.strip_prefix('.') {
                if after.starts_with('[') {
                    // `$.name.[*]` is accepted as `$.name[*]`
                    rest = after;
                    continue;
                }
                if let Some(after) = after.strip_prefix('*') {
                    segments.push(Segment::Wildcard);
                    rest = after;
                    continue;
                }
                let (name, after) = take_name(after);
                if name.is_empty() {
                    return Err(invalid("empty member name"));
                }
                segments.push(Segment::Member(name.to_string()));
                rest = after;
            } else if let Some(after) = rest.strip_prefix('[') {
                let Some(end) = bracket_end(after) else {
                    return Err(invalid("unclosed `[`"));
                };
                let inner = after[..end].trim();
                rest = &after[end + 1..];

                if inner == "*" {
                    segments.push(Segment::Wildcard);
                } else if let Some(quoted) = quoted_name(inner) {
                    segments.push(Segment::Member(quoted.to_string()));
                } else if let Ok(index) = inner.parse::<usize>() {
                    segments.push(Segment::Index(index));
                } else {
                    return Err(invalid("expected `*`, a quoted name or an index inside `[]`"));
                }
            } else if segments.is_empty() {
                // a leading member without `$.`
                let (name, after) = take_name(rest);
                segments.push(Segment::Member(name.to_string()));
                rest = after;
            } else {
                return Err(invalid("expected `.` or `[`"));
            }
        }

        Ok(Self {
            expression: expression.to_string(),
            segments,
        })
    }

    /// Locations of every node matched by this path, in document order
    pub fn locate(&self, root: &Value) -> Vec<Location> {
        let mut current: Vec<Location> = vec![vec![]];

        for segment in &self.segments {
            let mut next = vec![];
            for location in current {
                let Some(node) = get(root, &location) else {
                    continue;
                };

                match segment {
                    Segment::Member(name) => {
                        if node.as_object().is_some_and(|object| object.contains_key(name)) {
                            next.push(child(&location, PathStep::Key(name.clone())));
                        }
                    }
                    Segment::Index(index) => {
                        if node.as_array().is_some_and(|array| *index < array.len()) {
                            next.push(child(&location, PathStep::Index(*index)));
                        }
                    }
                    Segment::Wildcard => match node {
                        Value::Object(object) => next.extend(
                            object
                                .keys()
                                .map(|key| child(&location, PathStep::Key(key.clone()))),
                        ),
                        Value::Array(array) => next.extend(
                            (0..array.len()).map(|index| child(&location, PathStep::Index(index))),
                        ),
                        _ => {}
                    },
                    Segment::RecursiveDescent(name) => {
                        descend(node, location.clone(), name, &mut next)
                    }
                }
            }

            next.dedup();
            current = next;
        }

        tracing::trace!(path = %self.expression, matches = current.len(), "path located");
        current
    }
}

fn child(location: &[PathStep], step: PathStep) -> Location {
    let mut location = location.to_vec();
    location.push(step);
    location
}

fn descend(node: &Value, location: Location, name: &str, out: &mut Vec<Location>) {
    match node {
        Value::Object(object) => {
            if object.contains_key(name) {
                out.push(child(&location, PathStep::Key(name.to_string())));
            }
            for (key, value) in object {
                descend(value, child(&location, PathStep::Key(key.clone())), name, out);
            }
        }
        Value::Array(array) => {
            for (index, value) in array.iter().enumerate() {
                descend(value, child(&location, PathStep::Index(index)), name, out);
            }
        }
        _ => {}
    }
}

fn take_name(text: &str) -> (&str, &str) {
    let end = text.find(['.', '[']).unwrap_or(text.len());
    (&text[..end], &text[end..])
}

/// Position of the closing `]`, ignoring brackets inside quotes
fn bracket_end(text: &str) -> Option<usize> {
    let mut quote = None;
    for (index, ch) in text.char_indices() {
        match (ch, quote) {
            ('\'' | '"', None) => quote = Some(ch),
            (ch, Some(open)) if ch == open => quote = None,
            (']', None) => return Some(index),
            _ => {}
        }
    }
    None
}

fn quoted_name(text: &str) -> Option<&str> {
    ['\'', '"'].iter().find_map(|quote| {
        text.strip_prefix(*quote)
            .and_then(|inner| inner.strip_suffix(*quote))
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "name": "MyDataset",
            "properties": {
                "availability": { "frequency": "<config>", "interval": 1 },
                "typeProperties": {
                    "folderPath": "<config>",
                    "columns": [ { "name": "a" }, { "name": "b" } ]
                }
            }
        })
    }

    fn locate(path: &str) -> Vec<String> {
        JsonPath::compile(path)
            .unwrap()
            .locate(&document())
            .iter()
            .map(|location| display_location(location))
            .collect()
    }

    #[test]
    fn member_access() {
        assert_eq!(
            locate("$.properties.availability.frequency"),
            vec!["properties.availability.frequency"]
        );
        assert_eq!(
            locate("$['properties']['availability'].interval"),
            vec!["properties.availability.interval"]
        );
        assert!(locate("$.properties.missing").is_empty());
    }

    #[test]
    fn wildcards_and_indices() {
        assert_eq!(
            locate("$.properties.typeProperties.columns[*].name"),
            vec![
                "properties.typeProperties.columns[0].name",
                "properties.typeProperties.columns[1].name"
            ]
        );
        assert_eq!(
            locate("$.properties.*.frequency"),
            vec!["properties.availability.frequency"]
        );
        assert_eq!(
            locate("$.properties.typeProperties.columns[1]"),
            vec!["properties.typeProperties.columns[1]"]
        );
    }

    #[test]
    fn recursive_descent() {
        assert_eq!(
            locate("$..name"),
            vec![
                "name",
                "properties.typeProperties.columns[0].name",
                "properties.typeProperties.columns[1].name"
            ]
        );
    }

    #[test]
    fn dot_before_bracket() {
        let config = json!({ "MyDataset": [ { "name": "a" }, { "name": "b" } ] });
        let found = JsonPath::compile("$.MyDataset.[*]").unwrap().locate(&config);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn get_mut_replaces_node() {
        let mut document = document();
        let locations = JsonPath::compile("$.properties.availability")
            .unwrap()
            .locate(&document);
        *get_mut(&mut document, &locations[0]).unwrap() = json!("replaced");
        assert_eq!(document["properties"]["availability"], json!("replaced"));
    }

    #[test]
    fn invalid_paths() {
        for path in ["$.a[", "$.a[x]", "$..", "$.a..", "$['a']b"] {
            assert!(
                matches!(JsonPath::compile(path), Err(ResolveError::InvalidPath { .. })),
                "{path}"
            );
        }
    }

    #[test]
    fn display_quotes_unusual_keys() {
        assert_eq!(
            display_location(&[
                PathStep::Key("properties".into()),
                PathStep::Key("a b".into()),
                PathStep::Index(2)
            ]),
            "properties['a b'][2]"
        );
    }
}
