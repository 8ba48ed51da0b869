/// Split a function argument list on top-level commas
///
/// A comma only separates arguments when it is neither nested inside parentheses nor inside a single
/// quoted literal. Every argument is trimmed. An empty (or all-whitespace) list has no arguments.
///
/// `Date.AddDays(SliceStart, 1), '{0:yyyy,MM}'` splits into `Date.AddDays(SliceStart, 1)` and `'{0:yyyy,MM}'`.
pub(crate) fn split_arguments(text: &str) -> Vec<&str> {
    if text.trim().is_empty() {
        return vec![];
    }

    let mut arguments = vec![];
    let mut depth = 0usize;
    let mut quoted = false;
    let mut start = 0;

    for (index, ch) in text.char_indices() {
        match ch {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth = depth.saturating_sub(1),
            ',' if !quoted && depth == 0 => {
                arguments.push(text[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }

    arguments.push(text[start..].trim());
    arguments
}

/// Is the text wrapped in single quotes?
pub(crate) fn is_quoted(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'')
}

/// Remove one leading and one trailing single quote, if present
pub(crate) fn unquote(text: &str) -> &str {
    let text = text.strip_prefix('\'').unwrap_or(text);
    text.strip_suffix('\'').unwrap_or(text)
}

/// Escape a string so it can be spliced into the inside of a serialized json string
pub(crate) fn escape_json_fragment(text: &str) -> Result<String, serde_json::Error> {
    let quoted = serde_json::to_string(text)?;
    Ok(quoted[1..quoted.len() - 1].to_string())
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn split_arguments_respects_nesting() {
        assert_eq!(
            split_arguments("Date.AddDays(SliceStart, 1), '{0:yyyy,MM}' , 3"),
            vec!["Date.AddDays(SliceStart, 1)", "'{0:yyyy,MM}'", "3"]
        );
        assert_eq!(
            split_arguments("Time.AddHours(Date.AddDays(SliceEnd, -1), 2)"),
            vec!["Time.AddHours(Date.AddDays(SliceEnd, -1), 2)"]
        );
        assert!(split_arguments("  ").is_empty());
    }

    #[test]
    fn quotes() {
        assert!(is_quoted("'{0:yyyy}'"));
        assert!(!is_quoted("'"));
        assert!(!is_quoted("SliceStart"));
        assert_eq!(unquote("'{0:yyyy}'"), "{0:yyyy}");
        assert_eq!(unquote("''x''"), "'x'");
        assert_eq!(unquote("plain"), "plain");
    }

    #[test]
    fn escape_json() {
        assert_eq!(escape_json_fragment("a\"b\\c").unwrap(), "a\\\"b\\\\c");
        assert_eq!(escape_json_fragment("2017").unwrap(), "2017");
    }
}
