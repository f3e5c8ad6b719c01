//! Loads song-metadata documents into the `songs` and `artists` dimensions.

use super::pipeline::FileLoader;
use super::quality::LoadStats;
use super::records::SongRecord;
use crate::error::{EtlError, EtlResult};
use crate::warehouse::{upsert_artist, upsert_song, Artist, Song};
use rusqlite::Connection;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

pub struct SongLoader;

/// Splits a song record into its song row and artist row.
pub fn song_and_artist(record: SongRecord) -> (Song, Artist) {
    let song = Song {
        song_id: record.song_id,
        title: record.title,
        artist_id: record.artist_id.clone(),
        year: record.year,
        duration: record.duration,
    };
    let artist = Artist {
        artist_id: record.artist_id,
        name: record.artist_name,
        location: record.artist_location,
        latitude: record.artist_latitude,
        longitude: record.artist_longitude,
    };
    (song, artist)
}

pub fn read_song_record(path: &Path) -> EtlResult<SongRecord> {
    let file = File::open(path).map_err(|e| EtlError::io(path, e))?;
    let record: SongRecord =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| EtlError::parse(path, e))?;

    if record.song_id.is_empty() {
        return Err(EtlError::parse(path, "empty song_id"));
    }
    if record.artist_id.is_empty() {
        return Err(EtlError::parse(path, "empty artist_id"));
    }
    Ok(record)
}

impl FileLoader for SongLoader {
    fn dataset(&self) -> &'static str {
        "song"
    }

    fn load_file(&self, conn: &Connection, path: &Path) -> EtlResult<LoadStats> {
        let (song, artist) = song_and_artist(read_song_record(path)?);
        debug!("Loading song {} by artist {}", song.song_id, artist.artist_id);

        upsert_song(conn, &song)?;
        upsert_artist(conn, &artist)?;

        Ok(LoadStats {
            songs: 1,
            artists: 1,
            ..LoadStats::default()
        })
    }
}
