//! Single-attempt authenticated PDF download.
//!
//! One HTTP GET per row, body streamed to the destination file in libcurl's
//! chunked callbacks so memory stays bounded. No retries: a failed row is
//! recorded as failed and only a whole re-run revisits it, which is safe
//! because an existing destination file short-circuits the fetch.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::config::Credentials;

/// Why a single fetch attempt failed. Converted to a logged `false` at the
/// [`DownloadClient::fetch`] boundary; callers never see it.
#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error("{0}")]
    Transport(#[from] curl::Error),
    #[error("HTTP {0}")]
    Status(u32),
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
}

/// HTTP client for thesis PDFs: explicit credentials and timeout, no
/// ambient state.
#[derive(Debug, Clone)]
pub struct DownloadClient {
    credentials: Credentials,
    timeout: Duration,
}

impl DownloadClient {
    pub fn new(credentials: Credentials, timeout: Duration) -> Self {
        Self {
            credentials,
            timeout,
        }
    }

    /// Fetch `url` into `dest`. Returns true only when `dest` holds the full
    /// response body of a 2xx answer.
    ///
    /// An already-existing destination skips the network entirely and counts
    /// as success; this is the sole resume mechanism and does not re-validate
    /// the file's content. On any failure the partial destination file is
    /// removed so a later run cannot skip over a truncated artifact.
    pub fn fetch(&self, url: &str, dest: &Path) -> bool {
        if dest.exists() {
            tracing::debug!("{} already present, skipping download", dest.display());
            return true;
        }
        match self.fetch_to(url, dest) {
            Ok(()) => {
                tracing::debug!("downloaded {} -> {}", url, dest.display());
                true
            }
            Err(err) => {
                tracing::warn!("failed to download {}: {}", url, err);
                if dest.exists() {
                    if let Err(err) = fs::remove_file(dest) {
                        tracing::warn!(
                            "could not remove partial file {}: {}",
                            dest.display(),
                            err
                        );
                    }
                }
                false
            }
        }
    }

    fn fetch_to(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let mut file = File::create(dest)?;

        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(Duration::from_secs(30))?;
        easy.timeout(self.timeout)?;
        if !self.credentials.username.is_empty() {
            let mut auth = curl::easy::Auth::new();
            auth.basic(true);
            easy.http_auth(&auth)?;
            easy.username(&self.credentials.username)?;
            easy.password(&self.credentials.password)?;
        }

        {
            let mut transfer = easy.transfer();
            transfer.write_function(move |data| match file.write_all(data) {
                Ok(()) => Ok(data.len()),
                Err(err) => {
                    tracing::warn!("write to disk failed: {}", err);
                    Ok(0) // abort transfer
                }
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Status(code));
        }
        Ok(())
    }
}
