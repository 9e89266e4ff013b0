use chrono::NaiveDate;

/// Rejections raised before any request leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("start date {start} is after end date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },

    #[error("date range spans {days} days; at most {max} days may be queried")]
    SpanTooLong { days: i64, max: i64 },

    #[error("an auth key is required to query the training API")]
    MissingCredential,
}

/// A single page request that did not produce a body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("transport error on page {page}: {reason}")]
    Transport { page: u32, reason: String },

    #[error("endpoint returned HTTP {status} on page {page}")]
    Status { page: u32, status: u16 },
}

impl FetchError {
    pub fn page(&self) -> u32 {
        match self {
            FetchError::Transport { page, .. } | FetchError::Status { page, .. } => *page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("response is not valid XML: {reason}")]
    InvalidXml { reason: String },

    #[error("response has no srchList element")]
    MissingResultList,
}

/// Reasons a single row is dropped. The page carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("field {field} is not a non-negative integer: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("field {field} is empty")]
    MissingField { field: &'static str },

    #[error("total fee overflows: {enrollment} enrolled at {fee_per_head} per head")]
    FeeOverflow { enrollment: u64, fee_per_head: u64 },

    #[error("field {field} is zero")]
    ZeroValue { field: &'static str },

    #[error("course type {found:?} does not match requested {expected:?}")]
    CourseTypeMismatch { expected: String, found: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("xlsx export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("nothing to export: no sheet was requested")]
    Empty,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
