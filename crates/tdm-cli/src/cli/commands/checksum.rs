//! Checksum command: compute MD5 of a file.

use anyhow::Result;
use std::path::Path;
use tdm_core::checksum;

/// Compute and print MD5 of the given file.
pub fn run_checksum(path: &Path) -> Result<()> {
    let digest = checksum::md5_path(path)?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
