//! Input table header handling: canonical keys and a precomputed
//! header-name → column-index map.
//!
//! The map is built once per run, outside the row loop. Raw header lookup
//! tolerates surrounding whitespace because real exports carry columns like
//! `" MD5"`.

use anyhow::{bail, Result};
use std::collections::HashMap;

/// Column names expected in the source export. Lookups through
/// [`HeaderIndex::get`] match these against trimmed raw headers, so padded
/// variants in the input still resolve.
pub mod columns {
    pub const AUTHOR: &str = "Author";
    pub const SUBMITTED_DATE: &str = "Submitted Date";
    pub const APPROVED_DATE: &str = "Approved Date";
    pub const EMBARGO_DATE: &str = "Date of Embargo";
    pub const DEGREE: &str = "Degree";
    pub const DOWNLOAD_LINK: &str = "Download Link";
    pub const MD5: &str = "MD5";
    pub const TITLE: &str = "Title";
    pub const ABSTRACT: &str = "Abstract";
    pub const OTHER_TITLES: &str = "Other Titles";
    pub const KEYWORDS: &str = "Keywords";
    pub const SUPERVISOR_INFO: &str = "Supervisor Info";
    pub const LANGUAGE: &str = "Language";
}

/// Canonicalize a raw header into a store column key: trim, lowercase,
/// collapse any whitespace run into a single underscore. Pure.
pub fn normalize_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_whitespace = false;
    for c in raw.trim().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
        } else {
            out.extend(c.to_lowercase());
            in_whitespace = false;
        }
    }
    out
}

/// Immutable header → index map for one input table.
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    raw: Vec<String>,
    by_trimmed: HashMap<String, usize>,
}

impl HeaderIndex {
    /// Build from the header row, in column order. Duplicate trimmed names
    /// resolve to the last occurrence.
    pub fn new<'a, I>(raw: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let raw: Vec<String> = raw.into_iter().map(str::to_string).collect();
        let by_trimmed = raw
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        Self { raw, by_trimmed }
    }

    /// Column index for `name`, matching the trimmed raw header.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.by_trimmed.get(name.trim()).copied()
    }

    /// The value of column `name` in `fields`, or None when the column is
    /// absent from this table.
    pub fn field<'f>(&self, name: &str, fields: &'f [String]) -> Option<&'f str> {
        self.get(name).and_then(|i| fields.get(i)).map(String::as_str)
    }

    /// Raw headers in input order.
    pub fn raw(&self) -> &[String] {
        &self.raw
    }

    /// Canonical keys in input order (store sink column names).
    pub fn normalized(&self) -> Vec<String> {
        self.raw.iter().map(|h| normalize_key(h)).collect()
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Fail when two distinct raw headers collapse to the same canonical key.
    /// The upsert sink calls this before creating its table; a silent
    /// collision there would drop a column.
    pub fn ensure_unique_normalized(&self) -> Result<()> {
        let mut seen: HashMap<String, &str> = HashMap::new();
        for raw in &self.raw {
            let key = normalize_key(raw);
            if let Some(first) = seen.get(key.as_str()) {
                bail!(
                    "headers {:?} and {:?} both normalize to {:?}",
                    first,
                    raw,
                    key
                );
            }
            seen.insert(key, raw);
        }
        Ok(())
    }
}
