//! Upsert sink: SQLite table keyed by the unique identifier column.
//!
//! Column names are the normalized keys of the input header plus `filename`
//! and `md5_valid`. Each record is INSERT OR REPLACEd by primary key, so
//! re-running the pipeline over an overlapping offset/limit window never
//! duplicates a thesis.

use anyhow::{bail, Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;

use super::OutputRecord;
use crate::header::{normalize_key, HeaderIndex};

const TABLE: &str = "theses";

/// Percent-encode a path for use in a sqlite:// URI so spaces and special
/// chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub struct SqliteSink {
    pool: Pool<Sqlite>,
    insert_sql: String,
    column_count: usize,
}

impl SqliteSink {
    /// Open (or create) the database at `path` and ensure the table exists.
    ///
    /// Fails fast when the declared identifier column is missing from the
    /// input, when two raw headers normalize to the same key, or when a
    /// normalized key collides with the sink's own `filename`/`md5_valid`
    /// columns — a silent collision would drop a column from the store.
    pub async fn open(path: &Path, header: &HeaderIndex, id_column: &str) -> Result<Self> {
        if header.get(id_column).is_none() {
            bail!("identifier column {:?} not present in the input header", id_column);
        }
        header.ensure_unique_normalized()?;

        let columns = header.normalized();
        for key in &columns {
            if key == "filename" || key == "md5_valid" {
                bail!("input header {:?} collides with the sink's own column", key);
            }
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&uri)
            .await
            .with_context(|| format!("open output store {}", path.display()))?;

        let id_key = normalize_key(id_column);
        let mut create = format!("CREATE TABLE IF NOT EXISTS {TABLE} (\n    filename TEXT NOT NULL");
        for key in &columns {
            create.push_str(",\n    ");
            create.push_str(&quote_ident(key));
            create.push_str(" TEXT NOT NULL");
        }
        create.push_str(",\n    md5_valid INTEGER NOT NULL");
        create.push_str(&format!(",\n    PRIMARY KEY ({})\n)", quote_ident(&id_key)));
        sqlx::query(&create).execute(&pool).await?;

        let mut names = vec!["filename".to_string()];
        names.extend(columns.iter().map(|c| quote_ident(c)));
        names.push("md5_valid".to_string());
        let placeholders = vec!["?"; names.len()].join(", ");
        let insert_sql = format!(
            "INSERT OR REPLACE INTO {TABLE} ({}) VALUES ({})",
            names.join(", "),
            placeholders
        );

        Ok(Self {
            pool,
            insert_sql,
            column_count: header.len(),
        })
    }

    /// Insert the record, replacing any existing row with the same
    /// identifier value.
    pub async fn write(&mut self, record: &OutputRecord) -> Result<()> {
        if record.fields.len() != self.column_count {
            bail!(
                "record has {} fields, table expects {}",
                record.fields.len(),
                self.column_count
            );
        }
        let mut query = sqlx::query(&self.insert_sql).bind(&record.filename);
        for field in &record.fields {
            query = query.bind(field);
        }
        query = query.bind(record.digest.as_flag());
        query.execute(&self.pool).await?;
        Ok(())
    }
}
