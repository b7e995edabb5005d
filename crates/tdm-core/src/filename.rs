//! Derived output filenames for downloaded theses.
//!
//! Two deterministic rules: the display rule builds
//! `{author}_{YYYYMM}_{degree}.pdf` from row metadata (append sink), the
//! store rule names the file after the unique row identifier (upsert sink).
//! Both fall back to `file_{rowIndex}.pdf`, and re-running on identical
//! input reproduces byte-identical names.

use deunicode::deunicode;

/// Full degree name → filename abbreviation. Unknown degrees map to
/// [`UNKNOWN_DEGREE`].
pub const DEGREE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("Master of Nursing", "MN"),
    ("Master of Arts", "MA"),
    ("Master of Laws", "LLM"),
    ("Doctor of Education", "DEd"),
    ("Doctor of Music", "DM"),
    (
        "Master of Arts/Master of Library and Information Studies",
        "MAMLIS",
    ),
    ("Doctor of Philosophy", "PhD"),
    ("Master of Science", "MSc"),
    ("Master of Education", "MEd"),
];

/// Abbreviation recorded when the degree name is missing from the table.
pub const UNKNOWN_DEGREE: &str = "UNK";

/// Look up the filename abbreviation for a full degree name.
pub fn degree_abbrev<'a>(degrees: &'a [(&str, &str)], full_name: &str) -> &'a str {
    degrees
        .iter()
        .find(|(name, _)| *name == full_name)
        .map(|(_, abbrev)| *abbrev)
        .unwrap_or(UNKNOWN_DEGREE)
}

/// Collapse an author field into a single `Last_First[_Middle]` token.
///
/// A value without a comma is read as "First [Middle] Last": the last
/// whitespace token moves to the front and gains a trailing comma. Comma
/// spacing is then normalized, commas and periods dropped, spaces replaced
/// with underscores. An empty or all-whitespace field yields an empty token.
pub fn author_token(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let name = if trimmed.contains(',') {
        trimmed.to_string()
    } else {
        let mut parts: Vec<String> = trimmed.split_whitespace().map(str::to_string).collect();
        if let Some(last) = parts.pop() {
            parts.insert(0, format!("{last},"));
        }
        parts.join(" ")
    };
    let name = name.replace(',', ", ").replace("  ", " ");
    name.replace(", ", " ").replace(' ', "_").replace('.', "")
}

/// Month and year of a slash-delimited `M/D/YYYY` date, or None when the
/// value is not usable for filename derivation (empty, wrong part count,
/// non-numeric month).
fn month_year(date: &str) -> Option<(u32, &str)> {
    if date.is_empty() || !date.contains('/') {
        return None;
    }
    let mut parts = date.split('/');
    let (month, _day, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let month: u32 = month.trim().parse().ok()?;
    Some((month, year))
}

/// Display rule: `{author}_{YYYY}{MM}_{degree}.pdf`, transliterated to
/// ASCII, double underscores collapsed. Rows without a usable submitted
/// date fall back to `file_{row_index}.pdf`.
pub fn derive_display_filename(
    author: &str,
    submitted_date: &str,
    degree: &str,
    degrees: &[(&str, &str)],
    row_index: usize,
) -> String {
    match month_year(submitted_date) {
        Some((month, year)) => {
            let author = author_token(author);
            let abbrev = degree_abbrev(degrees, degree);
            let name = format!("{author}_{year}{month:02}_{abbrev}.pdf").replace("__", "_");
            deunicode(&name)
        }
        None => format!("file_{row_index}.pdf"),
    }
}

/// Store rule: the sanitized unique row identifier with a `.pdf` extension,
/// or `file_{row_index}.pdf` when the identifier is empty or absent.
pub fn derive_store_filename(identifier: Option<&str>, row_index: usize) -> String {
    let id = identifier
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(sanitize_component)
        .filter(|s| !s.is_empty());
    match id {
        Some(id) => format!("{id}.pdf"),
        None => format!("file_{row_index}.pdf"),
    }
}

/// Make an identifier safe as a single filename component: path separators,
/// NUL, control characters and whitespace become underscores, runs of
/// underscores collapse, leading/trailing dots and underscores are trimmed.
fn sanitize_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_underscore = false;
    for c in raw.chars() {
        let keep = !(c == '\0' || c == '/' || c == '\\' || c.is_control() || c.is_whitespace());
        if keep {
            out.push(c);
            prev_underscore = false;
        } else if !prev_underscore {
            out.push('_');
            prev_underscore = true;
        }
    }
    out.trim_matches(|c| c == '.' || c == '_').to_string()
}
