//! Field-scoped value transforms applied before a row is recorded.
//!
//! Each transform is pure and independent of filename derivation; the
//! pipeline skips a transform entirely when its column is absent.

/// Language code → display name. Codes outside the table pass through
/// unchanged.
pub const LANGUAGE_NAMES: &[(&str, &str)] = &[("eng", "english"), ("fre", "french")];

/// Rewrite a slash-delimited date into canonical `M/D/YYYY` form: numeric
/// month/day components lose their zero padding, everything else is kept
/// verbatim. Returns None for values that are not three slash-separated
/// parts — those pass through untouched (malformed dates are tolerated,
/// never an error).
pub fn canonicalize_date(raw: &str) -> Option<String> {
    if raw.is_empty() || !raw.contains('/') {
        return None;
    }
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() != 3 {
        return None;
    }
    Some(format!(
        "{}/{}/{}",
        strip_zero_padding(parts[0]),
        strip_zero_padding(parts[1]),
        parts[2]
    ))
}

fn strip_zero_padding(part: &str) -> String {
    match part.trim().parse::<u32>() {
        Ok(n) => n.to_string(),
        Err(_) => part.to_string(),
    }
}

/// Double every literal backslash so free-text fields survive downstream
/// escaping (titles, abstracts).
pub fn escape_backslashes(raw: &str) -> String {
    raw.replace('\\', "\\\\")
}

/// Merge the two keyword list conventions (`|#|` separators and
/// comma-space separators) into a single pipe-delimited list.
pub fn canonical_keywords(raw: &str) -> String {
    raw.replace("|#|", "|").replace(", ", "|")
}

/// Supervisor entries use only the `|#|` convention.
pub fn canonical_supervisors(raw: &str) -> String {
    raw.replace("|#|", "|")
}

/// Rewrite a language code through the lookup table; unknown codes pass
/// through unchanged.
pub fn canonical_language(raw: &str, languages: &[(&str, &str)]) -> String {
    languages
        .iter()
        .find(|(code, _)| *code == raw)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| raw.to_string())
}
