//! SQLite-backed warehouse holding the star schema.

use super::models::{Artist, Song, Songplay, TimeEntry, User};
use super::schema::{
    TABLE_ARTISTS, TABLE_SONGPLAYS, TABLE_SONGS, TABLE_TIME, TABLE_USERS, WAREHOUSE_SCHEMA,
};
use crate::error::{EtlError, EtlResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use tracing::info;

/// Row counts for every warehouse table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub songs: usize,
    pub artists: usize,
    pub users: usize,
    pub time: usize,
    pub songplays: usize,
}

pub struct SqliteWarehouse {
    conn: Connection,
}

impl SqliteWarehouse {
    pub fn open<P: AsRef<Path>>(db_path: P) -> EtlResult<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| EtlError::Connectivity {
            path: db_path.to_path_buf(),
            source,
        })?;
        Self::configure(&conn)?;
        info!("Opened warehouse database at {}", db_path.display());
        Ok(SqliteWarehouse { conn })
    }

    pub fn open_in_memory() -> EtlResult<Self> {
        let conn = Connection::open_in_memory().map_err(|source| EtlError::Connectivity {
            path: ":memory:".into(),
            source,
        })?;
        Self::configure(&conn)?;
        Ok(SqliteWarehouse { conn })
    }

    /// Foreign keys stay declarative: songs are written before their artist
    /// and facts may reference users skipped by the quality rules.
    fn configure(conn: &Connection) -> EtlResult<()> {
        conn.pragma_update(None, "foreign_keys", false)?;
        Ok(())
    }

    /// Drops and recreates every table. Destroys all loaded data.
    pub fn reset_schema(&self) -> EtlResult<()> {
        self.drop_schema()?;
        self.create_schema()
    }

    pub fn create_schema(&self) -> EtlResult<()> {
        WAREHOUSE_SCHEMA.create(&self.conn)?;
        info!(
            "Created warehouse schema version {} ({} tables)",
            WAREHOUSE_SCHEMA.version,
            WAREHOUSE_SCHEMA.tables.len()
        );
        Ok(())
    }

    pub fn drop_schema(&self) -> EtlResult<()> {
        WAREHOUSE_SCHEMA.drop(&self.conn)?;
        info!("Dropped warehouse schema");
        Ok(())
    }

    /// Fails unless the database carries the current schema.
    pub fn validate_schema(&self) -> EtlResult<()> {
        WAREHOUSE_SCHEMA
            .check_version(&self.conn)
            .and_then(|_| WAREHOUSE_SCHEMA.validate(&self.conn))
            .map_err(|e| {
                EtlError::Schema(format!(
                    "{:#}. Run the reset command to provision the warehouse.",
                    e
                ))
            })
    }

    pub fn transaction(&mut self) -> EtlResult<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn table_counts(&self) -> EtlResult<TableCounts> {
        let count = |table: &str| -> EtlResult<usize> {
            let n: i64 =
                self.conn
                    .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
            Ok(n as usize)
        };
        Ok(TableCounts {
            songs: count(TABLE_SONGS)?,
            artists: count(TABLE_ARTISTS)?,
            users: count(TABLE_USERS)?,
            time: count(TABLE_TIME)?,
            songplays: count(TABLE_SONGPLAYS)?,
        })
    }
}

// =========================================================================
// Row writers, usable on a plain connection or inside a transaction
// =========================================================================

pub fn upsert_song(conn: &Connection, song: &Song) -> EtlResult<()> {
    conn.execute(
        "INSERT INTO songs (song_id, title, artist_id, year, duration) VALUES (?1, ?2, ?3, ?4, ?5) \
         ON CONFLICT(song_id) DO UPDATE SET title = excluded.title, artist_id = excluded.artist_id, \
         year = excluded.year, duration = excluded.duration",
        params![
            song.song_id,
            song.title,
            song.artist_id,
            song.year,
            song.duration
        ],
    )?;
    Ok(())
}

pub fn upsert_artist(conn: &Connection, artist: &Artist) -> EtlResult<()> {
    conn.execute(
        "INSERT INTO artists (artist_id, name, location, latitude, longitude) VALUES (?1, ?2, ?3, ?4, ?5) \
         ON CONFLICT(artist_id) DO UPDATE SET name = excluded.name, location = excluded.location, \
         latitude = excluded.latitude, longitude = excluded.longitude",
        params![
            artist.artist_id,
            artist.name,
            artist.location,
            artist.latitude,
            artist.longitude
        ],
    )?;
    Ok(())
}

/// Last write wins, so a user's most recent subscription level is kept.
pub fn upsert_user(conn: &Connection, user: &User) -> EtlResult<()> {
    conn.execute(
        "INSERT INTO users (user_id, first_name, last_name, gender, level) VALUES (?1, ?2, ?3, ?4, ?5) \
         ON CONFLICT(user_id) DO UPDATE SET first_name = excluded.first_name, \
         last_name = excluded.last_name, gender = excluded.gender, level = excluded.level",
        params![
            user.user_id,
            user.first_name,
            user.last_name,
            user.gender.as_str(),
            user.level.as_str()
        ],
    )?;
    Ok(())
}

/// Returns false when the instant was already present.
pub fn insert_time(conn: &Connection, entry: &TimeEntry) -> EtlResult<bool> {
    let inserted = conn.execute(
        "INSERT INTO time (start_time, hour, day, week, month, year, weekday) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) ON CONFLICT(start_time) DO NOTHING",
        params![
            entry.start_time,
            entry.hour,
            entry.day,
            entry.week,
            entry.month,
            entry.year,
            entry.weekday
        ],
    )?;
    Ok(inserted > 0)
}

/// Inserts a fact row and returns its store-assigned `songplay_id`.
pub fn insert_songplay(conn: &Connection, songplay: &Songplay) -> EtlResult<i64> {
    conn.execute(
        "INSERT INTO songplays (file_sequence, start_time, user_id, level, song_id, artist_id, \
         session_id, location, user_agent) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            songplay.file_sequence,
            songplay.start_time,
            songplay.user_id,
            songplay.level.as_str(),
            songplay.song_id,
            songplay.artist_id,
            songplay.session_id,
            songplay.location,
            songplay.user_agent
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Resolves `(song_id, artist_id)` by exact match on title, artist name and duration.
pub fn find_song(
    conn: &Connection,
    title: &str,
    artist_name: &str,
    duration: f64,
) -> EtlResult<Option<(String, String)>> {
    let found = conn
        .query_row(
            "SELECT songs.song_id, artists.artist_id FROM songs \
             JOIN artists ON songs.artist_id = artists.artist_id \
             WHERE songs.title = ?1 AND artists.name = ?2 AND songs.duration = ?3",
            params![title, artist_name, duration],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(found)
}
