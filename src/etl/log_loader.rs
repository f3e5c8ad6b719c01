//! Loads activity-log files into `users`, `time` and `songplays`.
//!
//! Each file is newline-delimited JSON, one page-view event per line. Every
//! event contributes a user row; only `NextSong` events contribute time rows
//! and facts.

use super::pipeline::FileLoader;
use super::quality::{required_fields, DataQualityGap, LoadStats};
use super::records::LogEvent;
use crate::error::{EtlError, EtlResult};
use crate::warehouse::{
    find_song, insert_songplay, insert_time, upsert_user, Songplay, TimeEntry, User,
};
use rusqlite::Connection;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

pub struct LogLoader;

/// A parsed event with its 1-based line number in the source file.
pub struct NumberedEvent {
    pub line: usize,
    pub event: LogEvent,
}

pub fn read_log_events(path: &Path) -> EtlResult<Vec<NumberedEvent>> {
    let file = File::open(path).map_err(|e| EtlError::io(path, e))?;
    let mut events = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line_number = index + 1;
        let line = line.map_err(|e| EtlError::io(path, e))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let event: LogEvent = serde_json::from_str(trimmed)
            .map_err(|e| EtlError::parse_at_line(path, line_number, e))?;
        events.push(NumberedEvent {
            line: line_number,
            event,
        });
    }
    Ok(events)
}

/// Projects the user dimension row out of an event.
///
/// `Ok(None)` when the projection has a missing field.
pub fn user_row(path: &Path, numbered: &NumberedEvent) -> EtlResult<Option<User>> {
    let event = &numbered.event;
    let Some([user_id, first_name, last_name, gender, level]) = required_fields([
        event.user_id.as_deref(),
        event.first_name.as_deref(),
        event.last_name.as_deref(),
        event.gender.as_deref(),
        event.level.as_deref(),
    ]) else {
        return Ok(None);
    };

    Ok(Some(User {
        user_id: user_id.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        gender: gender
            .parse()
            .map_err(|e| EtlError::parse_at_line(path, numbered.line, e))?,
        level: level
            .parse()
            .map_err(|e| EtlError::parse_at_line(path, numbered.line, e))?,
    }))
}

pub fn time_row(path: &Path, numbered: &NumberedEvent) -> EtlResult<TimeEntry> {
    TimeEntry::from_epoch_millis(numbered.event.ts).ok_or_else(|| {
        EtlError::parse_at_line(
            path,
            numbered.line,
            format!("timestamp {} out of range", numbered.event.ts),
        )
    })
}

/// Builds the fact row for a `NextSong` event, resolving song and artist.
///
/// `Ok(None)` when the projection has a missing field; unresolved songs are
/// reported through `on_gap` and leave `song_id`/`artist_id` empty.
pub fn songplay_row(
    conn: &Connection,
    path: &Path,
    numbered: &NumberedEvent,
    file_sequence: i64,
    mut on_gap: impl FnMut(DataQualityGap),
) -> EtlResult<Option<Songplay>> {
    let event = &numbered.event;
    let (Some(session_id), Some([user_id, level, location, user_agent])) = (
        event.session_id,
        required_fields([
            event.user_id.as_deref(),
            event.level.as_deref(),
            event.location.as_deref(),
            event.user_agent.as_deref(),
        ]),
    ) else {
        return Ok(None);
    };

    let resolved = match (event.song.as_deref(), event.artist.as_deref(), event.length) {
        (Some(title), Some(artist_name), Some(length)) => {
            find_song(conn, title, artist_name, length)?
        }
        _ => None,
    };
    if resolved.is_none() {
        debug!(
            "{}:{} no song matches {:?} by {:?} ({:?}s)",
            path.display(),
            numbered.line,
            event.song,
            event.artist,
            event.length
        );
        on_gap(DataQualityGap::UnresolvedSong);
    }
    let (song_id, artist_id) = resolved.unzip();

    Ok(Some(Songplay {
        file_sequence,
        start_time: time_row(path, numbered)?.start_time,
        user_id: user_id.to_string(),
        level: level
            .parse()
            .map_err(|e| EtlError::parse_at_line(path, numbered.line, e))?,
        song_id,
        artist_id,
        session_id,
        location: location.to_string(),
        user_agent: user_agent.to_string(),
    }))
}

impl FileLoader for LogLoader {
    fn dataset(&self) -> &'static str {
        "log"
    }

    fn load_file(&self, conn: &Connection, path: &Path) -> EtlResult<LoadStats> {
        let events = read_log_events(path)?;
        let mut stats = LoadStats::default();

        for numbered in &events {
            match user_row(path, numbered)? {
                Some(user) => {
                    upsert_user(conn, &user)?;
                    stats.users += 1;
                }
                None => {
                    debug!(
                        "{}:{} skipping user row with missing field",
                        path.display(),
                        numbered.line
                    );
                    stats.record_gap(DataQualityGap::MissingUserField);
                }
            }
        }

        let plays: Vec<&NumberedEvent> = events.iter().filter(|e| e.event.is_next_song()).collect();

        for numbered in &plays {
            let entry = time_row(path, numbered)?;
            if insert_time(conn, &entry)? {
                stats.time_entries += 1;
            }
        }

        let mut file_sequence = 0;
        for numbered in &plays {
            let mut gaps = Vec::new();
            let songplay = songplay_row(conn, path, numbered, file_sequence, |gap| {
                gaps.push(gap)
            })?;
            match songplay {
                Some(songplay) => {
                    insert_songplay(conn, &songplay)?;
                    stats.songplays += 1;
                    file_sequence += 1;
                    for gap in gaps {
                        stats.record_gap(gap);
                    }
                }
                None => {
                    debug!(
                        "{}:{} skipping songplay with missing field",
                        path.display(),
                        numbered.line
                    );
                    stats.record_gap(DataQualityGap::MissingSongplayField);
                }
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::{upsert_artist, upsert_song, Artist, Song, SqliteWarehouse};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn play_event(ts: i64, user_id: &str, song: &str, artist: &str, length: f64) -> String {
        format!(
            r#"{{"artist":"{artist}","auth":"Logged In","firstName":"Lily","gender":"F","itemInSession":1,"lastName":"Koch","length":{length},"level":"paid","location":"Chicago-Naperville-Elgin, IL-IN-WI","method":"PUT","page":"NextSong","registration":1540910000000.0,"sessionId":818,"song":"{song}","status":200,"ts":{ts},"userAgent":"Mozilla/5.0","userId":"{user_id}"}}"#
        )
    }

    fn home_event(ts: i64) -> String {
        format!(
            r#"{{"artist":null,"auth":"Logged In","firstName":"Lily","gender":"F","itemInSession":0,"lastName":"Koch","length":null,"level":"paid","location":"Chicago-Naperville-Elgin, IL-IN-WI","method":"GET","page":"Home","registration":1540910000000.0,"sessionId":818,"song":null,"status":200,"ts":{ts},"userAgent":"Mozilla/5.0","userId":"15"}}"#
        )
    }

    fn logged_out_event(ts: i64) -> String {
        format!(
            r#"{{"artist":null,"auth":"Logged Out","firstName":null,"gender":null,"itemInSession":0,"lastName":null,"length":null,"level":"free","location":null,"method":"GET","page":"Home","registration":null,"sessionId":52,"song":null,"status":200,"ts":{ts},"userAgent":null,"userId":""}}"#
        )
    }

    fn write_log(dir: &TempDir, lines: &[String]) -> PathBuf {
        let path = dir.path().join("events.json");
        fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    fn create_warehouse() -> SqliteWarehouse {
        let warehouse = SqliteWarehouse::open_in_memory().unwrap();
        warehouse.reset_schema().unwrap();
        warehouse
    }

    fn seed_song(warehouse: &SqliteWarehouse) {
        upsert_song(
            warehouse.connection(),
            &Song {
                song_id: "SOZCTXZ12AB0182364".to_string(),
                title: "Setanta matins".to_string(),
                artist_id: "AR5KOSW1187FB35FF4".to_string(),
                year: 0,
                duration: 269.58322,
            },
        )
        .unwrap();
        upsert_artist(
            warehouse.connection(),
            &Artist {
                artist_id: "AR5KOSW1187FB35FF4".to_string(),
                name: "Elena".to_string(),
                location: Some("Dubai UAE".to_string()),
                latitude: Some(49.80388),
                longitude: Some(15.47491),
            },
        )
        .unwrap();
    }

    #[test]
    fn test_only_next_song_events_produce_time_and_facts() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_log(
            &temp_dir,
            &[
                home_event(1541121900000),
                play_event(1541121934796, "15", "A", "B", 1.0),
                home_event(1541121999000),
            ],
        );
        let warehouse = create_warehouse();

        let stats = LogLoader.load_file(warehouse.connection(), &path).unwrap();
        assert_eq!(stats.time_entries, 1);
        assert_eq!(stats.songplays, 1);

        let counts = warehouse.table_counts().unwrap();
        assert_eq!(counts.time, 1);
        assert_eq!(counts.songplays, 1);
        assert_eq!(counts.users, 1);
    }

    #[test]
    fn test_user_rows_with_missing_fields_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_log(
            &temp_dir,
            &[logged_out_event(1541121900000), home_event(1541121910000)],
        );
        let warehouse = create_warehouse();

        let stats = LogLoader.load_file(warehouse.connection(), &path).unwrap();
        assert_eq!(stats.users, 1);
        assert_eq!(stats.skipped_users, 1);
        assert_eq!(warehouse.table_counts().unwrap().users, 1);
    }

    #[test]
    fn test_songplay_is_kept_when_user_row_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let event = play_event(1541121934796, "15", "A", "B", 1.0)
            .replace(r#""firstName":"Lily""#, r#""firstName":"""#);
        let path = write_log(&temp_dir, &[event]);
        let warehouse = create_warehouse();

        let stats = LogLoader.load_file(warehouse.connection(), &path).unwrap();
        assert_eq!(stats.skipped_users, 1);
        assert_eq!(stats.songplays, 1);

        let counts = warehouse.table_counts().unwrap();
        assert_eq!(counts.users, 0);
        assert_eq!(counts.songplays, 1);
        let user_id: String = warehouse
            .connection()
            .query_row("SELECT user_id FROM songplays", [], |r| r.get(0))
            .unwrap();
        assert_eq!(user_id, "15");
    }

    #[test]
    fn test_skip_does_not_stop_later_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_log(
            &temp_dir,
            &[
                play_event(1541121934796, "", "A", "B", 1.0),
                play_event(1541121944796, "15", "A", "B", 1.0),
            ],
        );
        let warehouse = create_warehouse();

        let stats = LogLoader.load_file(warehouse.connection(), &path).unwrap();
        assert_eq!(stats.skipped_songplays, 1);
        assert_eq!(stats.songplays, 1);

        let sequence: i64 = warehouse
            .connection()
            .query_row("SELECT file_sequence FROM songplays", [], |r| r.get(0))
            .unwrap();
        assert_eq!(sequence, 0);
    }

    #[test]
    fn test_unresolved_song_yields_null_references() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_log(
            &temp_dir,
            &[play_event(1541121934796, "15", "Unknown Song", "Nobody", 100.0)],
        );
        let warehouse = create_warehouse();
        seed_song(&warehouse);

        let stats = LogLoader.load_file(warehouse.connection(), &path).unwrap();
        assert_eq!(stats.songplays, 1);
        assert_eq!(stats.unresolved_songplays, 1);

        let (song_id, artist_id): (Option<String>, Option<String>) = warehouse
            .connection()
            .query_row("SELECT song_id, artist_id FROM songplays", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(song_id, None);
        assert_eq!(artist_id, None);
    }

    #[test]
    fn test_resolves_song_and_artist() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_log(
            &temp_dir,
            &[play_event(1541121934796, "15", "Setanta matins", "Elena", 269.58322)],
        );
        let warehouse = create_warehouse();
        seed_song(&warehouse);

        let stats = LogLoader.load_file(warehouse.connection(), &path).unwrap();
        assert_eq!(stats.unresolved_songplays, 0);

        let (song_id, artist_id, start_time): (String, String, String) = warehouse
            .connection()
            .query_row(
                "SELECT song_id, artist_id, start_time FROM songplays",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(song_id, "SOZCTXZ12AB0182364");
        assert_eq!(artist_id, "AR5KOSW1187FB35FF4");
        assert_eq!(start_time, "2018-11-02T01:25:34.796Z");
    }

    #[test]
    fn test_time_row_breakdown() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_log(&temp_dir, &[play_event(1541121934796, "15", "A", "B", 1.0)]);
        let warehouse = create_warehouse();
        LogLoader.load_file(warehouse.connection(), &path).unwrap();

        let row: (u32, u32, u32, u32, i32, u32) = warehouse
            .connection()
            .query_row(
                "SELECT hour, day, week, month, year, weekday FROM time",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?)),
            )
            .unwrap();
        assert_eq!(row, (1, 2, 44, 11, 2018, 5));
    }

    #[test]
    fn test_malformed_line_is_parse_error_with_line_number() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_log(
            &temp_dir,
            &[home_event(1541121900000), "{\"page\": \"Home\"".to_string()],
        );
        let warehouse = create_warehouse();

        match LogLoader.load_file(warehouse.connection(), &path) {
            Err(EtlError::Parse { line, .. }) => assert_eq!(line, Some(2)),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_log(
            &temp_dir,
            &[home_event(1541121900000), String::new(), home_event(1541121910000)],
        );
        let events = read_log_events(&path).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].line, 3);
    }
}
