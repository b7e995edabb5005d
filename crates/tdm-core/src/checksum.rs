//! MD5 digesting and verification of downloaded files.
//!
//! Digests are computed after download, streaming in fixed chunks so memory
//! stays bounded for large PDFs. The source export carries an expected MD5
//! per row; comparison is case-insensitive and tri-state.

use anyhow::{Context, Result};
use md5::{Digest, Md5};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Whether a downloaded file matched its expected digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestStatus {
    Valid,
    Invalid,
    /// No expected digest was present, or no file was produced to hash.
    Unknown,
}

impl DigestStatus {
    /// The 0/1 integer recorded in the `md5_valid` output column.
    pub fn as_flag(self) -> i64 {
        match self {
            DigestStatus::Valid => 1,
            DigestStatus::Invalid | DigestStatus::Unknown => 0,
        }
    }
}

/// Compute MD5 of a file and return the digest as lowercase hex.
/// Reads in chunks to keep memory use bounded; suitable for large files.
pub fn md5_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Md5::new();
    let mut buf = [0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compare an expected digest against a computed one. An empty expected
/// value yields [`DigestStatus::Unknown`]; otherwise the comparison is
/// exact but case-insensitive.
pub fn verify(expected: &str, actual: &str) -> DigestStatus {
    let expected = expected.trim();
    if expected.is_empty() {
        return DigestStatus::Unknown;
    }
    if expected.eq_ignore_ascii_case(actual.trim()) {
        DigestStatus::Valid
    } else {
        DigestStatus::Invalid
    }
}
