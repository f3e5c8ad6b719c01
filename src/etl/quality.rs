//! Data-quality rules and per-load statistics.
//!
//! A gap is a tolerated defect in the source data. It never aborts a load;
//! the affected row is skipped or written with NULL references.

use std::ops::AddAssign;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataQualityGap {
    /// A user projection had an empty or absent field; no user row written.
    MissingUserField,
    /// A songplay projection had an empty or absent field; no fact written.
    MissingSongplayField,
    /// No song matched (title, artist, duration); fact written with NULL song/artist.
    UnresolvedSong,
}

/// True when any projected field is absent or an empty string.
pub fn has_missing_required_field(fields: &[Option<&str>]) -> bool {
    fields
        .iter()
        .any(|field| field.map(str::is_empty).unwrap_or(true))
}

/// The projected fields when none is missing, `None` otherwise.
pub fn required_fields<'a, const N: usize>(
    fields: [Option<&'a str>; N],
) -> Option<[&'a str; N]> {
    if has_missing_required_field(&fields) {
        return None;
    }
    Some(fields.map(Option::unwrap_or_default))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub songs: usize,
    pub artists: usize,
    pub users: usize,
    pub time_entries: usize,
    pub songplays: usize,
    pub skipped_users: usize,
    pub skipped_songplays: usize,
    pub unresolved_songplays: usize,
}

impl LoadStats {
    pub fn record_gap(&mut self, gap: DataQualityGap) {
        match gap {
            DataQualityGap::MissingUserField => self.skipped_users += 1,
            DataQualityGap::MissingSongplayField => self.skipped_songplays += 1,
            DataQualityGap::UnresolvedSong => self.unresolved_songplays += 1,
        }
    }

    pub fn gap_count(&self) -> usize {
        self.skipped_users + self.skipped_songplays + self.unresolved_songplays
    }
}

impl AddAssign for LoadStats {
    fn add_assign(&mut self, other: Self) {
        self.songs += other.songs;
        self.artists += other.artists;
        self.users += other.users;
        self.time_entries += other.time_entries;
        self.songplays += other.songplays;
        self.skipped_users += other.skipped_users;
        self.skipped_songplays += other.skipped_songplays;
        self.unresolved_songplays += other.unresolved_songplays;
    }
}
