use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

/// A Redshift JSONPaths file: `{"jsonpaths": ["$['artist']", ...]}`
#[derive(Debug, Deserialize)]
struct JsonPathsFile {
    jsonpaths: Vec<String>,
}

/// Read a JSONPaths file and return the top-level key of each expression
pub fn load_jsonpaths(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSONPaths file: {:?}", path))?;
    let file: JsonPathsFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSONPaths file: {:?}", path))?;

    file.jsonpaths
        .iter()
        .map(|expr| parse_json_path(expr))
        .collect()
}

/// Parse `$['key']`, `$["key"]` or `$.key` into `key`.
///
/// Only top-level members are supported by the local loader.
pub fn parse_json_path(expr: &str) -> Result<String> {
    let trimmed = expr.trim();
    let Some(rest) = trimmed.strip_prefix('$') else {
        bail!("JSONPath expression must start with '$': {}", expr);
    };

    let key = if let Some(key) = rest.strip_prefix('.') {
        if key.contains(|c: char| c == '.' || c == '[') {
            bail!("Nested JSONPath expressions are not supported: {}", expr);
        }
        key
    } else if let Some(key) = bracketed(rest, '\'').or_else(|| bracketed(rest, '"')) {
        key
    } else {
        bail!("Unsupported JSONPath expression: {}", expr);
    };

    if key.is_empty() {
        bail!("Empty key in JSONPath expression: {}", expr);
    }

    Ok(key.to_string())
}

fn bracketed(rest: &str, quote: char) -> Option<&str> {
    let inner = rest
        .strip_prefix('[')?
        .strip_prefix(quote)?
        .strip_suffix(']')?
        .strip_suffix(quote)?;
    // `$['a']['b']` leaves a closing quote and bracket inside
    if inner.contains(quote) {
        return None;
    }
    Some(inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_supported_forms() {
        assert_eq!(parse_json_path("$['artist']").unwrap(), "artist");
        assert_eq!(parse_json_path("$[\"userId\"]").unwrap(), "userId");
        assert_eq!(parse_json_path(" $.ts ").unwrap(), "ts");
    }

    #[test]
    fn test_parse_rejects_nested_and_malformed() {
        assert!(parse_json_path("$['a']['b']").is_err());
        assert!(parse_json_path("$.a.b").is_err());
        assert!(parse_json_path("$.a[0]").is_err());
        assert!(parse_json_path("artist").is_err());
        assert!(parse_json_path("$['']").is_err());
        assert!(parse_json_path("$").is_err());
    }

    #[test]
    fn test_load_jsonpaths_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"jsonpaths": ["$['artist']", "$['auth']", "$.firstName"]}}"#
        )
        .unwrap();

        let keys = load_jsonpaths(file.path()).unwrap();
        assert_eq!(keys, vec!["artist", "auth", "firstName"]);
    }
}
