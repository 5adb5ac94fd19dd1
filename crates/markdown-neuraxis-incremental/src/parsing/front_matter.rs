use std::collections::BTreeMap;

/// Extracts top-level `key: value` (YAML) or `key = value` (TOML) pairs from a front matter body.
///
/// Only flat scalar fields are read. Indented lines, list items, comments and lines without a
/// separator are skipped, and surrounding quotes are stripped from values.
pub(crate) fn parse_fields(body: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    for line in body.lines() {
        if line.starts_with([' ', '\t', '-', '#']) || line.trim().is_empty() {
            continue;
        }
        let Some((key, value)) = split_field(line) else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            continue;
        }
        fields.insert(key.to_string(), unquote(value.trim()).to_string());
    }
    fields
}

fn split_field(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(':');
    let equals = line.find('=');
    let at = match (colon, equals) {
        (Some(c), Some(e)) => c.min(e),
        (Some(c), None) => c,
        (None, Some(e)) => e,
        (None, None) => return None,
    };
    Some((&line[..at], &line[at + 1..]))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
