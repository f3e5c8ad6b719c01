mod models;
mod schema;
mod store;

pub use models::{start_time_key, Artist, Gender, Level, Song, Songplay, TimeEntry, User};
pub use schema::WAREHOUSE_SCHEMA;
pub use store::{
    find_song, insert_songplay, insert_time, upsert_artist, upsert_song, upsert_user,
    SqliteWarehouse, TableCounts,
};
