//! Per-row outcome sinks.
//!
//! Two interchangeable write contracts: an append-only CSV file preserving
//! input column order, and a SQLite table keyed by the unique identifier
//! column so overlapping re-runs replace instead of duplicate.

mod append;
mod upsert;

pub use append::CsvSink;
pub use upsert::SqliteSink;

use anyhow::Result;

use crate::checksum::DigestStatus;
use crate::config::SinkKind;

/// One fully processed row, written exactly once and never mutated after.
#[derive(Debug, Clone)]
pub struct OutputRecord {
    /// Derived output filename (also the download destination name).
    pub filename: String,
    /// Transformed field values, parallel to the input header.
    pub fields: Vec<String>,
    pub digest: DigestStatus,
}

/// Outcome recorder selected by configuration.
pub enum RecordSink {
    Csv(CsvSink),
    Sqlite(SqliteSink),
}

impl RecordSink {
    pub fn kind(&self) -> SinkKind {
        match self {
            RecordSink::Csv(_) => SinkKind::Csv,
            RecordSink::Sqlite(_) => SinkKind::Sqlite,
        }
    }

    /// Persist one record. CSV appends; SQLite inserts or replaces by the
    /// identifier column.
    pub async fn write(&mut self, record: &OutputRecord) -> Result<()> {
        match self {
            RecordSink::Csv(sink) => sink.write(record),
            RecordSink::Sqlite(sink) => sink.write(record).await,
        }
    }
}
