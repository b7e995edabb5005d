use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Which sink records processed rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Append-only CSV file, raw column order preserved.
    #[default]
    Csv,
    /// SQLite table keyed by the configured identifier column.
    Sqlite,
}

/// Output destination (`[output]` table in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub kind: SinkKind,
    /// CSV file or SQLite database path, depending on `kind`.
    pub path: PathBuf,
    /// Unique identifier column; required by the sqlite sink.
    #[serde(default)]
    pub id_column: Option<String>,
}

/// Global configuration loaded from `~/.config/tdm/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Source table: one row per thesis, header row first.
    pub input_csv: PathBuf,
    /// Directory downloaded PDFs are written into.
    pub download_dir: PathBuf,
    /// Skip the first `offset` rows (0-based source index).
    #[serde(default)]
    pub offset: usize,
    /// Process at most `limit` rows after the offset; 0 means no limit.
    #[serde(default)]
    pub limit: usize,
    /// Per-request transfer timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Basic Auth username; the password is never stored in the config file.
    #[serde(default)]
    pub username: Option<String>,
    pub output: OutputConfig,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            input_csv: PathBuf::from("theses.csv"),
            download_dir: PathBuf::from("downloads"),
            offset: 0,
            limit: 0,
            timeout_secs: default_timeout_secs(),
            username: None,
            output: OutputConfig {
                kind: SinkKind::Csv,
                path: PathBuf::from("theses_out.csv"),
                id_column: None,
            },
        }
    }
}

/// HTTP Basic Auth credentials, resolved by the caller (environment or
/// prompt) and passed explicitly into the downloader. The core never reads
/// ambient state for these.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("tdm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FetchConfig = toml::from_str(&data)?;
    Ok(cfg)
}
