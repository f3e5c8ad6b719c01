mod discover;
mod log_loader;
mod pipeline;
mod quality;
mod records;
mod song_loader;

pub use discover::discover_json_files;
pub use log_loader::LogLoader;
pub use pipeline::{run, run_log_load, run_song_load, FileLoader, PipelineReport};
pub use quality::{has_missing_required_field, DataQualityGap, LoadStats};
pub use records::{LogEvent, SongRecord, NEXT_SONG_PAGE};
pub use song_loader::SongLoader;
