//! Scalar and list value decoding for directive records.
//!
//! Values come from model-authored `key: value` lines. Decoding is lenient:
//! nothing here can fail, malformed input degrades to `None` or an empty list.

/// Decode a single raw value into an optional string.
///
/// Empty input and a case-insensitive `null` decode to `None`. One matching
/// pair of double quotes (or, failing that, single quotes) is stripped.
pub fn decode_scalar(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return None;
    }
    Some(strip_quotes(trimmed).to_string())
}

/// Decode a bracketed, comma-separated list into its items.
///
/// Brackets are optional. Items are trimmed, empty items are dropped, and each
/// item loses one matching quote pair. Commas inside quotes are not protected.
pub fn decode_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let inner = trimmed.strip_prefix('[').unwrap_or(trimmed);
    let inner = inner.strip_suffix(']').unwrap_or(inner);
    if inner.trim().is_empty() {
        return Vec::new();
    }

    inner
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| strip_quotes(part).to_string())
        .collect()
}

/// Strip one matching pair of surrounding quotes, double quotes first.
pub fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2
            && let Some(inner) = value
                .strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Render a value so that [`decode_scalar`] yields it back unchanged.
pub fn encode_scalar(value: &str) -> String {
    let looks_like_list = value.starts_with('[') && value.ends_with(']');
    if !looks_like_list && decode_scalar(value).as_deref() == Some(value) {
        value.to_string()
    } else {
        format!("\"{value}\"")
    }
}

/// Render a list in the bracketed form read by [`decode_list`].
pub fn encode_list(items: &[String]) -> String {
    let items: Vec<String> = items
        .iter()
        .map(|item| {
            if strip_quotes(item.trim()) == item {
                item.clone()
            } else {
                format!("\"{item}\"")
            }
        })
        .collect();
    format!("[{}]", items.join(", "))
}
