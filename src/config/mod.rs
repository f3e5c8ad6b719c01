mod file_config;

pub use file_config::FileConfig;

use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "sparkify.db";
pub const DEFAULT_SONG_DATA_DIR: &str = "data/song_data";
pub const DEFAULT_LOG_DATA_DIR: &str = "data/log_data";

/// Values taken from the command line before the TOML file is applied.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub song_data_dir: Option<PathBuf>,
    pub log_data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtlConfig {
    pub db_path: PathBuf,
    pub song_data_dir: PathBuf,
    pub log_data_dir: PathBuf,
}

impl EtlConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Self {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let song_data_dir = file
            .song_data_dir
            .map(PathBuf::from)
            .or_else(|| cli.song_data_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SONG_DATA_DIR));

        let log_data_dir = file
            .log_data_dir
            .map(PathBuf::from)
            .or_else(|| cli.log_data_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DATA_DIR));

        Self {
            db_path,
            song_data_dir,
            log_data_dir,
        }
    }
}
