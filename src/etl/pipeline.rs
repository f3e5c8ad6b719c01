//! Drives a loader over every JSON file of a dataset, one commit per file.

use super::discover::discover_json_files;
use super::log_loader::LogLoader;
use super::quality::LoadStats;
use super::song_loader::SongLoader;
use crate::error::EtlResult;
use crate::warehouse::SqliteWarehouse;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Loads one source file into the warehouse.
///
/// Implementations write through `conn`, which is the per-file transaction
/// opened by [`run`]; they must not commit.
pub trait FileLoader {
    /// Short dataset name used in progress logging.
    fn dataset(&self) -> &'static str;

    fn load_file(&self, conn: &Connection, path: &Path) -> EtlResult<LoadStats>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub files: Vec<PathBuf>,
    pub stats: LoadStats,
}

impl PipelineReport {
    pub fn total(&self) -> usize {
        self.files.len()
    }
}

/// Runs `loader` over every JSON file below `source_root`.
///
/// Each file is loaded and committed in its own transaction. The first
/// failing file is rolled back and its error returned; files committed before
/// it stay in the warehouse.
pub fn run<L: FileLoader>(
    warehouse: &mut SqliteWarehouse,
    source_root: &Path,
    loader: &L,
) -> EtlResult<PipelineReport> {
    let files = discover_json_files(source_root)?;
    let total = files.len();
    let mut stats = LoadStats::default();

    for (index, path) in files.iter().enumerate() {
        let tx = warehouse.transaction()?;
        let file_stats = loader
            .load_file(&tx, path)
            .and_then(|file_stats| {
                tx.commit()?;
                Ok(file_stats)
            })
            .map_err(|e| {
                error!("Aborting {} load at {}: {}", loader.dataset(), path.display(), e);
                e.in_file(path)
            })?;

        if file_stats.gap_count() > 0 {
            warn!(
                "{}: skipped {} user rows, {} songplays; {} songplays without song match",
                path.display(),
                file_stats.skipped_users,
                file_stats.skipped_songplays,
                file_stats.unresolved_songplays
            );
        }
        stats += file_stats;
        info!("{}/{} files processed.", index + 1, total);
    }

    info!(
        "Finished {} data: {} songs, {} artists, {} users, {} time entries, {} songplays",
        loader.dataset(),
        stats.songs,
        stats.artists,
        stats.users,
        stats.time_entries,
        stats.songplays
    );

    Ok(PipelineReport { files, stats })
}

pub fn run_song_load(warehouse: &mut SqliteWarehouse, root: &Path) -> EtlResult<PipelineReport> {
    warehouse.validate_schema()?;
    run(warehouse, root, &SongLoader)
}

pub fn run_log_load(warehouse: &mut SqliteWarehouse, root: &Path) -> EtlResult<PipelineReport> {
    warehouse.validate_schema()?;
    run(warehouse, root, &LogLoader)
}
