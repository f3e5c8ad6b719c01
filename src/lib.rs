//! Sparkify ETL
//!
//! Provisions a star-schema warehouse in SQLite and loads it from the song
//! metadata and user activity log JSON datasets.

pub mod config;
pub mod error;
pub mod etl;
pub mod sqlite_persistence;
pub mod warehouse;

pub use error::{EtlError, EtlResult};
pub use etl::{run_log_load, run_song_load, PipelineReport};
pub use warehouse::SqliteWarehouse;
