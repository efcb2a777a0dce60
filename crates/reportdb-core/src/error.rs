use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportDbError>;

#[derive(Debug, Error)]
pub enum ReportDbError {
    /// Normalized mapping lacks an expected key or carries the wrong shape.
    /// Indicates a version mismatch between normalizer and persistence, so
    /// the run must stop rather than guess.
    #[error("incompatible mapping: {0}")]
    Mapping(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl ReportDbError {
    pub fn mapping(context: impl Into<String>) -> Self {
        Self::Mapping(context.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Mapping(_) => "INCOMPATIBLE_MAPPING",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Sqlite(_) => "SQLITE_ERROR",
        }
    }
}
