//! Row types for the star schema.

use chrono::{DateTime, Datelike, SecondsFormat, Timelike, Utc};
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq)]
pub struct Song {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    /// 0 when the release year is unknown.
    pub year: i32,
    pub duration: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Artist {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Gender::Male),
            "F" => Ok(Gender::Female),
            other => Err(format!("Unknown gender \"{}\"", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Free,
    Paid,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Free => "free",
            Level::Paid => "paid",
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Level::Free),
            "paid" => Ok(Level::Paid),
            other => Err(format!("Unknown subscription level \"{}\"", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub level: Level,
}

/// Calendar breakdown of a single event instant, in UTC.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeEntry {
    pub start_time: String,
    pub hour: u32,
    pub day: u32,
    /// ISO 8601 week number.
    pub week: u32,
    pub month: u32,
    pub year: i32,
    /// 0 = Sunday .. 6 = Saturday.
    pub weekday: u32,
}

impl TimeEntry {
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        TimeEntry {
            start_time: start_time_key(instant),
            hour: instant.hour(),
            day: instant.day(),
            week: instant.iso_week().week(),
            month: instant.month(),
            year: instant.year(),
            weekday: instant.weekday().num_days_from_sunday(),
        }
    }

    /// `None` when the timestamp is outside the representable range.
    pub fn from_epoch_millis(ts: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(ts).map(Self::from_instant)
    }
}

/// Key shared by `time.start_time` and `songplays.start_time`.
pub fn start_time_key(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Songplay {
    /// Position among the facts written from one log file, starting at 0.
    pub file_sequence: i64,
    pub start_time: String,
    pub user_id: String,
    pub level: Level,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i64,
    pub location: String,
    pub user_agent: String,
}
