//! Star schema for the song-play warehouse.
//!
//! One fact table (`songplays`) and four dimensions (`songs`, `artists`,
//! `users`, `time`). Foreign keys are declared for documentation and schema
//! validation; the warehouse connection turns `PRAGMA foreign_keys` off, so
//! dimension rows may arrive in any order.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

pub const TABLE_SONGS: &str = "songs";
pub const TABLE_ARTISTS: &str = "artists";
pub const TABLE_USERS: &str = "users";
pub const TABLE_TIME: &str = "time";
pub const TABLE_SONGPLAYS: &str = "songplays";

const ARTISTS_TABLE: Table = Table {
    name: TABLE_ARTISTS,
    columns: &[
        sqlite_column!(
            "artist_id",
            &SqlType::Text,
            is_primary_key = true,
            non_null = true
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("location", &SqlType::Text),
        sqlite_column!("latitude", &SqlType::Real),
        sqlite_column!("longitude", &SqlType::Real),
    ],
    indices: &[("idx_artists_name", "name")],
};

const SONGS_TABLE: Table = Table {
    name: TABLE_SONGS,
    columns: &[
        sqlite_column!(
            "song_id",
            &SqlType::Text,
            is_primary_key = true,
            non_null = true
        ),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: TABLE_ARTISTS,
                foreign_column: "artist_id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("year", &SqlType::Integer, non_null = true), // 0 = unknown
        sqlite_column!("duration", &SqlType::Real, non_null = true),
    ],
    indices: &[("idx_songs_title", "title"), ("idx_songs_artist", "artist_id")],
};

const USERS_TABLE: Table = Table {
    name: TABLE_USERS,
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Text,
            is_primary_key = true,
            non_null = true
        ),
        sqlite_column!("first_name", &SqlType::Text, non_null = true),
        sqlite_column!("last_name", &SqlType::Text, non_null = true),
        sqlite_column!("gender", &SqlType::Text, non_null = true), // 'M', 'F'
        sqlite_column!("level", &SqlType::Text, non_null = true), // 'free', 'paid'
    ],
    indices: &[],
};

const TIME_TABLE: Table = Table {
    name: TABLE_TIME,
    columns: &[
        sqlite_column!(
            "start_time",
            &SqlType::Text,
            is_primary_key = true,
            non_null = true
        ), // RFC 3339, UTC, millisecond precision
        sqlite_column!("hour", &SqlType::Integer, non_null = true),
        sqlite_column!("day", &SqlType::Integer, non_null = true),
        sqlite_column!("week", &SqlType::Integer, non_null = true),
        sqlite_column!("month", &SqlType::Integer, non_null = true),
        sqlite_column!("year", &SqlType::Integer, non_null = true),
        sqlite_column!("weekday", &SqlType::Integer, non_null = true), // 0 = Sunday
    ],
    indices: &[],
};

const SONGPLAYS_TABLE: Table = Table {
    name: TABLE_SONGPLAYS,
    columns: &[
        sqlite_column!("songplay_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("file_sequence", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "start_time",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: TABLE_TIME,
                foreign_column: "start_time",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "user_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: TABLE_USERS,
                foreign_column: "user_id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("level", &SqlType::Text, non_null = true),
        sqlite_column!(
            "song_id",
            &SqlType::Text,
            foreign_key = Some(&ForeignKey {
                foreign_table: TABLE_SONGS,
                foreign_column: "song_id",
                on_delete: ForeignKeyOnChange::SetNull,
            })
        ),
        sqlite_column!(
            "artist_id",
            &SqlType::Text,
            foreign_key = Some(&ForeignKey {
                foreign_table: TABLE_ARTISTS,
                foreign_column: "artist_id",
                on_delete: ForeignKeyOnChange::SetNull,
            })
        ),
        sqlite_column!("session_id", &SqlType::Integer, non_null = true),
        sqlite_column!("location", &SqlType::Text, non_null = true),
        sqlite_column!("user_agent", &SqlType::Text, non_null = true),
    ],
    indices: &[
        ("idx_songplays_start_time", "start_time"),
        ("idx_songplays_user", "user_id"),
    ],
};

/// Dimensions first, the fact table last; dropping walks this in reverse.
pub const WAREHOUSE_SCHEMA: VersionedSchema = VersionedSchema {
    version: 0,
    tables: &[
        ARTISTS_TABLE,
        SONGS_TABLE,
        USERS_TABLE,
        TIME_TABLE,
        SONGPLAYS_TABLE,
    ],
};
