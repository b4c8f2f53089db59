use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoxOfficeError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Section index {index} out of range: report has {len} sections")]
    SectionOutOfRange { index: usize, len: usize },

    #[error("Row index {index} out of range: section '{section}' has {len} rows")]
    RowOutOfRange {
        section: String,
        index: usize,
        len: usize,
    },

    #[error("Report '{0}' is finalized and cannot be edited")]
    ReportFinalized(String),

    #[error("Malformed report document: {0}")]
    MalformedReport(String),

    #[error("Invariant violation in {location}: {details}")]
    InvariantViolation { location: String, details: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BoxOfficeError>;
