//! `tdm run` – execute the row pipeline over the configured window.

use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tdm_core::config::{Credentials, FetchConfig, SinkKind};
use tdm_core::pipeline;

/// Command-line overrides applied on top of the config file.
#[derive(Debug, Default)]
pub struct RunOverrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub sink: Option<SinkKind>,
    pub download_dir: Option<PathBuf>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub id_column: Option<String>,
}

pub async fn run_pipeline(mut cfg: FetchConfig, overrides: RunOverrides) -> Result<()> {
    if let Some(input) = overrides.input {
        cfg.input_csv = input;
    }
    if let Some(output) = overrides.output {
        cfg.output.path = output;
    }
    if let Some(sink) = overrides.sink {
        cfg.output.kind = sink;
    }
    if let Some(download_dir) = overrides.download_dir {
        cfg.download_dir = download_dir;
    }
    if let Some(offset) = overrides.offset {
        cfg.offset = offset;
    }
    if let Some(limit) = overrides.limit {
        cfg.limit = limit;
    }
    if let Some(id_column) = overrides.id_column {
        cfg.output.id_column = Some(id_column);
    }

    let credentials = resolve_credentials(cfg.username.clone())?;
    let summary = pipeline::run(&cfg, credentials).await?;
    println!("{summary}");
    Ok(())
}

/// Username from `TDM_USERNAME`, the config file, or a prompt; password from
/// `TDM_PASSWORD` or a prompt. The core only ever sees the resolved value.
fn resolve_credentials(configured_username: Option<String>) -> Result<Credentials> {
    let username = match std::env::var("TDM_USERNAME") {
        Ok(user) if !user.is_empty() => user,
        _ => match configured_username {
            Some(user) if !user.is_empty() => user,
            _ => prompt("Repository username: ")?,
        },
    };
    let password = match std::env::var("TDM_PASSWORD") {
        Ok(pass) if !pass.is_empty() => pass,
        _ => prompt("Repository password: ")?,
    };
    Ok(Credentials { username, password })
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read credential from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
