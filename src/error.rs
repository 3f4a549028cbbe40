use thiserror::Error;
use uuid::Uuid;

/// Failures raised by the dashboard engine.
///
/// Every variant is deterministic given its input; nothing here is retried.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("dataset is empty or has no header row")]
    MissingHeader,

    #[error("unexpected header: expected {expected}, found {found}")]
    HeaderMismatch { expected: String, found: String },

    #[error("line {line}: {reason}")]
    Parse { line: u64, reason: String },

    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: date {date} does not follow {previous}")]
    OutOfOrder {
        line: u64,
        date: chrono::NaiveDate,
        previous: chrono::NaiveDate,
    },

    #[error("trend needs at least 2 points, got {len}")]
    InsufficientSeries { len: usize },

    #[error("series value at position {index} is not finite")]
    NonFiniteSeries { index: usize },

    #[error("no {kind} with id {id}")]
    UnknownEntity { kind: &'static str, id: Uuid },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
