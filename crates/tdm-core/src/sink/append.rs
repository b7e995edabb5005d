//! Append sink: one CSV output row per processed record.
//!
//! The header row is written once, when the output file is new or empty:
//! `filename`, the raw input columns in original order, then `md5_valid`.
//! Prior rows are never rewritten, so re-running an overlapping window
//! appends duplicate rows — documented behavior of this sink; use the
//! sqlite sink for keyed re-runs.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;

use super::OutputRecord;
use crate::header::HeaderIndex;

pub struct CsvSink {
    writer: csv::Writer<File>,
}

impl CsvSink {
    /// Open the output file for appending, writing the header row first if
    /// the file is new or empty.
    pub fn open(path: &Path, header: &HeaderIndex) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open output csv {}", path.display()))?;
        let needs_header = file.metadata()?.len() == 0;
        let mut writer = csv::Writer::from_writer(file);

        if needs_header {
            let mut row: Vec<&str> = Vec::with_capacity(header.len() + 2);
            row.push("filename");
            row.extend(header.raw().iter().map(String::as_str));
            row.push("md5_valid");
            writer.write_record(&row)?;
            writer.flush()?;
        }

        Ok(Self { writer })
    }

    /// Append one record and flush, so every recorded outcome is durable
    /// before the next row starts.
    pub fn write(&mut self, record: &OutputRecord) -> Result<()> {
        let flag = record.digest.as_flag().to_string();
        let mut row: Vec<&str> = Vec::with_capacity(record.fields.len() + 2);
        row.push(record.filename.as_str());
        row.extend(record.fields.iter().map(String::as_str));
        row.push(flag.as_str());
        self.writer.write_record(&row)?;
        self.writer.flush()?;
        Ok(())
    }
}
