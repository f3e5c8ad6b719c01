use sparkify_etl::SqliteWarehouse;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const SONG_1_ID: &str = "SOMZWCG12A8C13C480";
pub const SONG_1_TITLE: &str = "I Didn't Mean To";
pub const SONG_1_DURATION: f64 = 218.93179;
pub const ARTIST_1_ID: &str = "ARD7TVE1187B99BFB1";
pub const ARTIST_1_NAME: &str = "Casual";

pub const SONG_2_ID: &str = "SOCIWDW12A8C13D406";
pub const ARTIST_2_ID: &str = "ARMJAGH1187FB546F3";

pub struct TestDataset {
    pub dir: TempDir,
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    pub db_path: PathBuf,
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn song_json(
    song_id: &str,
    title: &str,
    duration: f64,
    year: i32,
    artist_id: &str,
    artist_name: &str,
) -> String {
    format!(
        r#"{{"num_songs": 1, "artist_id": "{artist_id}", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "{artist_name}", "song_id": "{song_id}", "title": "{title}", "duration": {duration}, "year": {year}}}"#
    )
}

pub fn next_song_event(ts: i64, user_id: &str, song: &str, artist: &str, length: f64) -> String {
    format!(
        r#"{{"artist":"{artist}","auth":"Logged In","firstName":"Kaylee","gender":"F","itemInSession":0,"lastName":"Summers","length":{length},"level":"free","location":"Phoenix-Mesa-Scottsdale, AZ","method":"PUT","page":"NextSong","registration":1540344794796.0,"sessionId":139,"song":"{song}","status":200,"ts":{ts},"userAgent":"Mozilla\/5.0 (Windows NT 6.1; WOW64)","userId":"{user_id}"}}"#
    )
}

pub fn other_page_event(ts: i64) -> String {
    format!(
        r#"{{"artist":null,"auth":"Logged In","firstName":"Walter","gender":"M","itemInSession":0,"lastName":"Frye","length":null,"level":"free","location":"San Francisco-Oakland-Hayward, CA","method":"GET","page":"Home","registration":1540919166796.0,"sessionId":38,"song":null,"status":200,"ts":{ts},"userAgent":"Mozilla\/5.0 (Macintosh)","userId":"39"}}"#
    )
}

/// 2 song files and 1 log file with 3 `NextSong` events and 1 `Home` event.
///
/// The first play matches song 1; the other two match nothing.
pub fn create_test_dataset() -> TestDataset {
    let dir = TempDir::new().unwrap();
    let song_data = dir.path().join("song_data");
    let log_data = dir.path().join("log_data");

    write(
        &song_data.join("A/A/A/TRAAAAW128F429D538.json"),
        &song_json(
            SONG_1_ID,
            SONG_1_TITLE,
            SONG_1_DURATION,
            0,
            ARTIST_1_ID,
            ARTIST_1_NAME,
        ),
    );
    write(
        &song_data.join("A/B/C/TRABCEI128F424C983.json"),
        &song_json(
            SONG_2_ID,
            "Soul Deep",
            148.03546,
            1969,
            ARTIST_2_ID,
            "The Box Tops",
        ),
    );

    let log_lines = [
        next_song_event(1541121934796, "8", SONG_1_TITLE, ARTIST_1_NAME, SONG_1_DURATION),
        other_page_event(1541121940000),
        next_song_event(1541122241796, "8", "Mercy:The Laundromat", "Pavement", 178.83383),
        next_song_event(1541122458796, "8", "Porque Es Tan Dificil", "Gustavo Cerati", 184.08444),
    ];
    write(
        &log_data.join("2018/11/2018-11-02-events.json"),
        &log_lines.join("\n"),
    );

    let db_path = dir.path().join("sparkify.db");
    TestDataset {
        dir,
        song_data,
        log_data,
        db_path,
    }
}

pub fn open_fresh_warehouse(dataset: &TestDataset) -> SqliteWarehouse {
    let warehouse = SqliteWarehouse::open(&dataset.db_path).unwrap();
    warehouse.reset_schema().unwrap();
    warehouse
}
