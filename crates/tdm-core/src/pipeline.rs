//! Sequential row pipeline: read, window, derive, transform, fetch, verify,
//! record.
//!
//! One row is fully completed (download + digest + sink write) before the
//! next begins. A download or checksum failure never aborts the run — the
//! row is recorded with its flag reflecting the failure and the pipeline
//! advances. Only setup errors (unreadable input, uncreatable output or
//! download directory) are fatal.

use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::time::Duration;

use crate::checksum::{self, DigestStatus};
use crate::config::{Credentials, FetchConfig, SinkKind};
use crate::download::DownloadClient;
use crate::filename::{self, DEGREE_ABBREVIATIONS};
use crate::header::{columns, HeaderIndex};
use crate::sink::{CsvSink, OutputRecord, RecordSink, SqliteSink};
use crate::transform::{self, LANGUAGE_NAMES};

/// Counters for one pipeline run, printed by the CLI when the run ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows processed and recorded (inside the window).
    pub processed: usize,
    /// Rows skipped before the offset.
    pub skipped: usize,
    /// Network fetches attempted (existing destinations don't count).
    pub downloads_attempted: usize,
    pub valid: usize,
    pub invalid: usize,
    pub unknown: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows processed ({} skipped), {} downloads attempted, md5: {} valid / {} invalid / {} unknown",
            self.processed,
            self.skipped,
            self.downloads_attempted,
            self.valid,
            self.invalid,
            self.unknown
        )
    }
}

/// Run the pipeline over the configured window and sink.
pub async fn run(cfg: &FetchConfig, credentials: Credentials) -> Result<RunSummary> {
    fs::create_dir_all(&cfg.download_dir).with_context(|| {
        format!("create download directory {}", cfg.download_dir.display())
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(&cfg.input_csv)
        .with_context(|| format!("open input table {}", cfg.input_csv.display()))?;
    let header = HeaderIndex::new(
        reader
            .headers()
            .with_context(|| format!("read header of {}", cfg.input_csv.display()))?
            .iter(),
    );

    let mut sink = match cfg.output.kind {
        SinkKind::Csv => RecordSink::Csv(CsvSink::open(&cfg.output.path, &header)?),
        SinkKind::Sqlite => {
            let id_column = cfg
                .output
                .id_column
                .as_deref()
                .context("output.id_column is required for the sqlite sink")?;
            RecordSink::Sqlite(SqliteSink::open(&cfg.output.path, &header, id_column).await?)
        }
    };

    let client = DownloadClient::new(credentials, Duration::from_secs(cfg.timeout_secs));
    let mut summary = RunSummary::default();

    for (idx, row) in reader.records().enumerate() {
        if idx < cfg.offset {
            summary.skipped += 1;
            continue;
        }
        if cfg.limit > 0 && idx >= cfg.offset + cfg.limit {
            break;
        }

        let row = row.with_context(|| format!("read row {idx} of {}", cfg.input_csv.display()))?;
        let mut fields: Vec<String> = row.iter().map(str::to_string).collect();
        fields.resize(header.len(), String::new());

        let filename = match sink.kind() {
            SinkKind::Csv => filename::derive_display_filename(
                header.field(columns::AUTHOR, &fields).unwrap_or(""),
                header.field(columns::SUBMITTED_DATE, &fields).unwrap_or(""),
                header.field(columns::DEGREE, &fields).unwrap_or(""),
                DEGREE_ABBREVIATIONS,
                idx,
            ),
            SinkKind::Sqlite => filename::derive_store_filename(
                cfg.output
                    .id_column
                    .as_deref()
                    .and_then(|id| header.field(id, &fields)),
                idx,
            ),
        };

        apply_transforms(&header, &mut fields);

        let url = header
            .field(columns::DOWNLOAD_LINK, &fields)
            .unwrap_or("")
            .trim()
            .to_string();

        let mut digest = DigestStatus::Unknown;
        if !url.is_empty() {
            let dest = cfg.download_dir.join(&filename);
            if !dest.exists() {
                summary.downloads_attempted += 1;
            }
            let fetched = client.fetch(&url, &dest);
            if fetched && dest.exists() {
                let expected = header.field(columns::MD5, &fields).unwrap_or("");
                match checksum::md5_path(&dest) {
                    Ok(actual) => {
                        digest = checksum::verify(expected, &actual);
                        match digest {
                            DigestStatus::Valid => tracing::info!("{} md5 valid", filename),
                            DigestStatus::Invalid => tracing::warn!(
                                "{} md5 mismatch (expected {}, got {})",
                                filename,
                                expected.trim().to_lowercase(),
                                actual
                            ),
                            DigestStatus::Unknown => {
                                tracing::info!("{} has no expected md5", filename)
                            }
                        }
                    }
                    Err(err) => tracing::warn!("could not hash {}: {}", dest.display(), err),
                }
            }
        }

        match digest {
            DigestStatus::Valid => summary.valid += 1,
            DigestStatus::Invalid => summary.invalid += 1,
            DigestStatus::Unknown => summary.unknown += 1,
        }

        sink.write(&OutputRecord {
            filename,
            fields,
            digest,
        })
        .await
        .with_context(|| format!("record row {idx}"))?;
        summary.processed += 1;
    }

    tracing::info!("processing complete: {}", summary);
    Ok(summary)
}

/// Field-scoped value rewrites; each is a no-op when its column is absent.
fn apply_transforms(header: &HeaderIndex, fields: &mut [String]) {
    for name in [
        columns::SUBMITTED_DATE,
        columns::APPROVED_DATE,
        columns::EMBARGO_DATE,
    ] {
        if let Some(i) = header.get(name) {
            if let Some(canonical) = transform::canonicalize_date(&fields[i]) {
                fields[i] = canonical;
            }
        }
    }
    for name in [columns::TITLE, columns::ABSTRACT, columns::OTHER_TITLES] {
        if let Some(i) = header.get(name) {
            fields[i] = transform::escape_backslashes(&fields[i]);
        }
    }
    if let Some(i) = header.get(columns::KEYWORDS) {
        fields[i] = transform::canonical_keywords(&fields[i]);
    }
    if let Some(i) = header.get(columns::SUPERVISOR_INFO) {
        fields[i] = transform::canonical_supervisors(&fields[i]);
    }
    if let Some(i) = header.get(columns::LANGUAGE) {
        fields[i] = transform::canonical_language(&fields[i], LANGUAGE_NAMES);
    }
}
