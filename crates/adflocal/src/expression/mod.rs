//! `$$` expression language
//!
//! An expression is either a function call `Namespace.Method(arg, arg, ...)` or, when nested inside a call, a
//! literal: a date reference (`SliceStart`), a quoted format string (`'{0:yyyy}'`) or an integer (`-1`).
//!
//! ```
//! # use adflocal::expression::{evaluate, DateContext};
//! # use adflocal::value::{parse_timestamp, Value};
//! let context = DateContext::new().with("SliceStart", parse_timestamp("2017-01-31").unwrap());
//!
//! let value = evaluate("$$Text.Format('{0:yyyy/MM/dd}', Date.AddDays(SliceStart, 1))", &context).unwrap();
//! assert_eq!(value, Value::from("2017/02/01"));
//! ```
pub mod format;
pub mod temporal;

use crate::error::ResolveError;
use crate::util::{is_quoted, split_arguments, unquote};
use crate::value::{Timestamp, Value};

/// Prefix marking a string scalar as expression
pub const SENTINEL: &str = "$$";

/// Does this scalar need to be evaluated?
pub fn is_expression(text: &str) -> bool {
    text.starts_with(SENTINEL)
}

/// Named date-times an expression can refer to
///
/// Insertion order is kept: the first entry is the argument of quoted format literals.
#[derive(Debug, Clone, Default)]
pub struct DateContext {
    dates: indexmap::IndexMap<String, Timestamp>,
}

impl DateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, timestamp: Timestamp) -> Self {
        self.insert(name, timestamp);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, timestamp: Timestamp) {
        self.dates.insert(name.into(), timestamp);
    }

    /// Case-insensitive lookup
    pub fn get(&self, name: &str) -> Option<Timestamp> {
        self.dates
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, timestamp)| *timestamp)
    }

    pub fn first(&self) -> Option<Timestamp> {
        self.dates.first().map(|(_, timestamp)| *timestamp)
    }
}

/// `Namespace.Method(arguments)` split into its parts
#[derive(Debug, PartialEq)]
struct FunctionCall<'t> {
    namespace: &'t str,
    method: &'t str,
    arguments: &'t str,
}

impl<'t> FunctionCall<'t> {
    /// Namespace runs up to the first `.`, method up to the first `(`, arguments up to the final `)`
    fn parse(text: &'t str) -> Option<Self> {
        let (namespace, rest) = text.split_once('.')?;
        let (method, rest) = rest.split_once('(')?;
        let arguments = rest.strip_suffix(')')?;

        Some(Self {
            namespace,
            method,
            arguments,
        })
    }

    fn kind(&self) -> FunctionKind {
        let namespace = self.namespace.trim();
        if namespace.eq_ignore_ascii_case("text") && self.method.trim().eq_ignore_ascii_case("format")
        {
            return FunctionKind::Format;
        }

        if ["time", "date", "datetime"]
            .iter()
            .any(|candidate| namespace.eq_ignore_ascii_case(candidate))
        {
            return FunctionKind::Temporal;
        }

        FunctionKind::Unsupported
    }

    fn name(&self) -> String {
        format!("{}.{}", self.namespace.trim(), self.method.trim())
    }

    fn unsupported(&self) -> ResolveError {
        ResolveError::UnsupportedFunction {
            namespace: self.namespace.trim().to_string(),
            method: self.method.trim().to_string(),
        }
    }

    fn evaluate(&self, context: &DateContext, depth: usize) -> Result<Value, ResolveError> {
        let kind = self.kind();
        let arguments = split_arguments(self.arguments);

        // a quoted format string is taken as written, it must not go through the date-literal fallback
        let (format_literal, arguments) = match (kind, arguments.split_first()) {
            (FunctionKind::Format, Some((first, rest))) if is_quoted(first) => {
                (Some(unquote(first).to_string()), rest)
            }
            _ => (None, arguments.as_slice()),
        };

        let mut evaluated = arguments
            .iter()
            .map(|argument| evaluate_at(argument, context, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::trace!(function = %self.name(), ?evaluated, "arguments evaluated");

        match kind {
            FunctionKind::Format => {
                let format = match format_literal {
                    Some(format) => format,
                    None if evaluated.is_empty() => {
                        return Err(ResolveError::invalid_argument(
                            &self.name(),
                            "a format string is required",
                        ))
                    }
                    None => match evaluated.remove(0) {
                        Value::String(format) => unquote(&format).to_string(),
                        other => {
                            return Err(ResolveError::invalid_argument(
                                &self.name(),
                                format!("format must be a string, got {}", other.type_name()),
                            ))
                        }
                    },
                };

                format::composite(&format, &evaluated).map(Value::String)
            }
            FunctionKind::Temporal => {
                let Some(transform) = temporal::lookup(self.method.trim()) else {
                    return Err(self.unsupported());
                };

                let Some((Value::DateTime(base), rest)) = evaluated.split_first() else {
                    return Err(ResolveError::invalid_argument(
                        &self.name(),
                        "the first argument must be a date-time",
                    ));
                };

                transform
                    .apply(&self.name(), *base, rest)
                    .map(Value::DateTime)
            }
            FunctionKind::Unsupported => Err(self.unsupported()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FunctionKind {
    Format,
    Temporal,
    Unsupported,
}

/// Evaluate a top-level `$$` expression
pub fn evaluate(text: &str, context: &DateContext) -> Result<Value, ResolveError> {
    evaluate_at(text, context, 0)
}

/// Evaluate `text` at the given nesting depth
///
/// Depth `0` requires the `$$` prefix and a function call. Deeper levels also accept literals.
#[tracing::instrument(level = "trace", skip(context))]
pub fn evaluate_at(text: &str, context: &DateContext, depth: usize) -> Result<Value, ResolveError> {
    if depth == 0 && !is_expression(text) {
        return Err(ResolveError::InvalidExpression {
            text: text.to_string(),
            reason: "an expression must start with `$$`",
        });
    }

    let stripped = text.trim_start_matches('$');

    if let Some(call) = FunctionCall::parse(stripped) {
        return call.evaluate(context, depth);
    }

    if depth == 0 {
        return Err(ResolveError::InvalidExpression {
            text: text.to_string(),
            reason: "only function calls are supported at the top level",
        });
    }

    resolve_literal(stripped, context)
}

fn resolve_literal(text: &str, context: &DateContext) -> Result<Value, ResolveError> {
    if let Some(timestamp) = context.get(text) {
        return Ok(Value::DateTime(timestamp));
    }

    // legacy: a quoted single placeholder literal is formatted with the first known date
    if text.starts_with("'{") && text.ends_with("}'") {
        if let Some(first) = context.first() {
            return format::composite(text, &[Value::DateTime(first)]).map(Value::String);
        }
    }

    if let Ok(integer) = text.parse::<i64>() {
        return Ok(Value::Integer(integer));
    }

    Err(ResolveError::UnresolvedReference {
        text: text.to_string(),
    })
}
