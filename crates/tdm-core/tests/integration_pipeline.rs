//! End-to-end pipeline tests: local HTTP server, real CSV input, both sinks.

mod common;

use common::auth_server::{self, AuthServerOptions};
use std::fs;
use std::path::Path;
use tdm_core::config::{Credentials, FetchConfig, OutputConfig, SinkKind};
use tdm_core::pipeline;
use tempfile::tempdir;

// md5 of b"hello\n"
const BODY: &[u8] = b"hello\n";
const BODY_MD5: &str = "b1946ac92492d2347c6235b4d2611184";

fn credentials() -> Credentials {
    Credentials {
        username: "alice".to_string(),
        password: "secret".to_string(),
    }
}

fn config(dir: &Path, input: &Path, kind: SinkKind) -> FetchConfig {
    let output_path = match kind {
        SinkKind::Csv => dir.join("out.csv"),
        SinkKind::Sqlite => dir.join("out.db"),
    };
    FetchConfig {
        input_csv: input.to_path_buf(),
        download_dir: dir.join("pdfs"),
        offset: 0,
        limit: 0,
        timeout_secs: 5,
        username: None,
        output: OutputConfig {
            kind,
            path: output_path,
            id_column: Some("Identifier".to_string()),
        },
    }
}

#[tokio::test]
async fn downloads_verifies_and_records_to_csv() {
    let url = auth_server::start_with_options(
        BODY.to_vec(),
        AuthServerOptions {
            require_basic_auth: true,
            fail_with: None,
        },
    );
    let dir = tempdir().unwrap();
    let input = dir.path().join("theses.csv");
    fs::write(
        &input,
        format!(
            "Identifier,Author,Title,Submitted Date,Approved Date,Degree,Keywords,Language,Download Link, MD5\n\
             t-1,John Doe,A\\Title,3/5/2021,03/15/2021,Master of Science,\"cats|#|dogs, birds\",eng,{url},{md5}\n\
             t-2,\"Smith, Jane\",,,,Doctor of Philosophy,,fre,,\n",
            url = url,
            md5 = BODY_MD5.to_uppercase()
        ),
    )
    .unwrap();

    let cfg = config(dir.path(), &input, SinkKind::Csv);
    let summary = pipeline::run(&cfg, credentials()).await.unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.downloads_attempted, 1);
    assert_eq!(summary.valid, 1);
    assert_eq!(summary.invalid, 0);
    assert_eq!(summary.unknown, 1);

    let pdf = cfg.download_dir.join("Doe_John_202103_MSc.pdf");
    assert_eq!(fs::read(&pdf).unwrap(), BODY);

    let out = fs::read_to_string(&cfg.output.path).unwrap();
    let mut lines = out.lines();
    assert_eq!(
        lines.next(),
        Some(
            "filename,Identifier,Author,Title,Submitted Date,Approved Date,Degree,Keywords,Language,Download Link, MD5,md5_valid"
        )
    );
    let first = lines.next().unwrap();
    assert!(first.starts_with("Doe_John_202103_MSc.pdf,t-1,John Doe,A\\\\Title,3/5/2021,3/15/2021,Master of Science,cats|dogs|birds,english,"));
    assert!(first.ends_with(",1"));
    let second = lines.next().unwrap();
    assert!(second.starts_with("file_1.pdf,t-2,"));
    assert!(second.ends_with(",0"));
    assert_eq!(lines.next(), None);
}

#[tokio::test]
async fn window_leaves_rows_outside_untouched() {
    let url = auth_server::start(BODY.to_vec());
    let dir = tempdir().unwrap();
    let input = dir.path().join("theses.csv");

    let mut text = String::from("Identifier,Author,Download Link, MD5\n");
    for i in 0..20 {
        text.push_str(&format!("t-{i},Author {i},{url},\n"));
    }
    fs::write(&input, text).unwrap();

    let mut cfg = config(dir.path(), &input, SinkKind::Csv);
    cfg.offset = 5;
    cfg.limit = 3;
    let summary = pipeline::run(&cfg, credentials()).await.unwrap();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.skipped, 5);
    assert_eq!(summary.downloads_attempted, 3);

    // No submitted date column, so filenames are index-based.
    let mut downloaded: Vec<String> = fs::read_dir(&cfg.download_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    downloaded.sort();
    assert_eq!(downloaded, vec!["file_5.pdf", "file_6.pdf", "file_7.pdf"]);

    let out = fs::read_to_string(&cfg.output.path).unwrap();
    let rows: Vec<&str> = out.lines().skip(1).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].starts_with("file_5.pdf,t-5,"));
    assert!(rows[2].starts_with("file_7.pdf,t-7,"));
}

#[tokio::test]
async fn existing_destination_is_not_refetched() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("theses.csv");
    // The URL host is unresolvable; a network attempt would fail the row.
    fs::write(
        &input,
        format!(
            "Identifier,Author,Download Link, MD5\n\
             t-1,John Doe,http://tdm.invalid/thesis.pdf,{BODY_MD5}\n"
        ),
    )
    .unwrap();

    let cfg = config(dir.path(), &input, SinkKind::Csv);
    fs::create_dir_all(&cfg.download_dir).unwrap();
    fs::write(cfg.download_dir.join("file_0.pdf"), BODY).unwrap();

    let summary = pipeline::run(&cfg, credentials()).await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.downloads_attempted, 0);
    assert_eq!(summary.valid, 1, "pre-existing file was verified, not refetched");
}

#[tokio::test]
async fn failed_download_is_recorded_and_leaves_no_partial_file() {
    let url = auth_server::start_with_options(
        BODY.to_vec(),
        AuthServerOptions {
            require_basic_auth: false,
            fail_with: Some("500 Internal Server Error"),
        },
    );
    let dir = tempdir().unwrap();
    let input = dir.path().join("theses.csv");
    fs::write(
        &input,
        format!("Identifier,Author,Download Link, MD5\nt-1,John Doe,{url},{BODY_MD5}\n"),
    )
    .unwrap();

    let cfg = config(dir.path(), &input, SinkKind::Csv);
    let summary = pipeline::run(&cfg, credentials()).await.unwrap();
    assert_eq!(summary.processed, 1, "row failure never aborts the run");
    assert_eq!(summary.valid, 0);
    assert_eq!(summary.unknown, 1);
    assert!(
        !cfg.download_dir.join("file_0.pdf").exists(),
        "partial file must be cleaned up"
    );

    let out = fs::read_to_string(&cfg.output.path).unwrap();
    let row = out.lines().nth(1).unwrap();
    assert!(row.ends_with(",0"));
}

#[tokio::test]
async fn sqlite_rerun_over_overlapping_window_does_not_duplicate() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("theses.csv");
    let mut text = String::from("Identifier,Author\n");
    for i in 0..6 {
        text.push_str(&format!("t-{i},Author {i}\n"));
    }
    fs::write(&input, text).unwrap();

    let mut cfg = config(dir.path(), &input, SinkKind::Sqlite);
    cfg.limit = 4;
    let first = pipeline::run(&cfg, credentials()).await.unwrap();
    assert_eq!(first.processed, 4);

    cfg.offset = 2;
    let second = pipeline::run(&cfg, credentials()).await.unwrap();
    assert_eq!(second.processed, 4);

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite://{}", cfg.output.path.display()))
        .await
        .unwrap();
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM theses")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 6, "t-2 and t-3 were replaced, not duplicated");

    let filename: (String,) =
        sqlx::query_as("SELECT filename FROM theses WHERE identifier = 't-4'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(filename.0, "t-4.pdf");
}

#[tokio::test]
async fn missing_input_table_is_fatal() {
    let dir = tempdir().unwrap();
    let cfg = config(dir.path(), &dir.path().join("nope.csv"), SinkKind::Csv);
    assert!(pipeline::run(&cfg, credentials()).await.is_err());
}
