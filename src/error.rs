use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an ETL run.
///
/// Skipped rows and unresolved song lookups are not errors; they are
/// reported as [`crate::etl::DataQualityGap`]s in the load statistics.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Could not open warehouse database {path}: {source}")]
    Connectivity {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Failed to parse {path}{}: {reason}", .line.map(|l| format!(" (line {l})")).unwrap_or_default())]
    Parse {
        path: PathBuf,
        line: Option<usize>,
        reason: String,
    },

    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: Box<EtlError>,
    },
}

impl EtlError {
    pub fn parse(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        EtlError::Parse {
            path: path.into(),
            line: None,
            reason: reason.to_string(),
        }
    }

    pub fn parse_at_line(path: impl Into<PathBuf>, line: usize, reason: impl ToString) -> Self {
        EtlError::Parse {
            path: path.into(),
            line: Some(line),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EtlError::Io {
            path: path.into(),
            source,
        }
    }

    /// Attaches the source file to errors that do not already name one.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            EtlError::Database(_) | EtlError::Schema(_) => EtlError::Load {
                path: path.into(),
                source: Box::new(self),
            },
            other => other,
        }
    }
}

impl From<anyhow::Error> for EtlError {
    fn from(err: anyhow::Error) -> Self {
        EtlError::Schema(format!("{:#}", err))
    }
}

pub type EtlResult<T> = Result<T, EtlError>;
