use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sparkify_etl::config::{CliConfig, EtlConfig, FileConfig};
use sparkify_etl::{run_log_load, run_song_load, PipelineReport, SqliteWarehouse};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "sparkify-etl")]
#[command(about = "Provision the Sparkify warehouse and load song and log data into it")]
struct CliArgs {
    /// Path to the SQLite warehouse database file.
    #[clap(long)]
    pub db: Option<PathBuf>,

    /// Optional TOML config file. Its values override command line options.
    #[clap(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drop and recreate every warehouse table. Destroys existing data.
    Reset,
    /// Create any missing warehouse tables.
    CreateSchema,
    /// Drop every warehouse table.
    DropSchema,
    /// Load song metadata files into songs and artists.
    LoadSongs {
        /// Root of the song dataset.
        dir: Option<PathBuf>,
    },
    /// Load activity log files into users, time and songplays.
    LoadLogs {
        /// Root of the log dataset.
        dir: Option<PathBuf>,
    },
    /// Load songs, then logs.
    Run {
        /// Reset the schema before loading.
        #[clap(long, default_value_t = false)]
        reset: bool,

        #[clap(long)]
        song_data: Option<PathBuf>,

        #[clap(long)]
        log_data: Option<PathBuf>,
    },
}

fn log_report(dataset: &str, report: &PipelineReport) {
    info!(
        "{} load: {} files, {} user rows skipped, {} songplays skipped, {} songplays unresolved",
        dataset,
        report.total(),
        report.stats.skipped_users,
        report.stats.skipped_songplays,
        report.stats.unresolved_songplays
    );
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let (song_data_dir, log_data_dir) = match &cli_args.command {
        Command::LoadSongs { dir } => (dir.clone(), None),
        Command::LoadLogs { dir } => (None, dir.clone()),
        Command::Run {
            song_data,
            log_data,
            ..
        } => (song_data.clone(), log_data.clone()),
        _ => (None, None),
    };
    let cli_config = CliConfig {
        db_path: cli_args.db.clone(),
        song_data_dir,
        log_data_dir,
    };
    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let config = EtlConfig::resolve(&cli_config, file_config);

    let mut warehouse = SqliteWarehouse::open(&config.db_path)?;
    let schema_remains = !matches!(cli_args.command, Command::DropSchema);

    match cli_args.command {
        Command::Reset => warehouse.reset_schema()?,
        Command::CreateSchema => warehouse.create_schema()?,
        Command::DropSchema => warehouse.drop_schema()?,
        Command::LoadSongs { .. } => {
            let report = run_song_load(&mut warehouse, &config.song_data_dir)?;
            log_report("Song", &report);
        }
        Command::LoadLogs { .. } => {
            let report = run_log_load(&mut warehouse, &config.log_data_dir)?;
            log_report("Log", &report);
        }
        Command::Run { reset, .. } => {
            if reset {
                warehouse.reset_schema()?;
            }
            let report = run_song_load(&mut warehouse, &config.song_data_dir)?;
            log_report("Song", &report);
            let report = run_log_load(&mut warehouse, &config.log_data_dir)?;
            log_report("Log", &report);
        }
    }

    if schema_remains {
        let counts = warehouse.table_counts()?;
        info!(
            "Warehouse contains: {} songs, {} artists, {} users, {} time entries, {} songplays",
            counts.songs, counts.artists, counts.users, counts.time, counts.songplays
        );
    }

    Ok(())
}
