//! CSV export of registry queries.

pub mod flatten;
pub mod to_csv;

pub use flatten::{flatten_json_ext, FlatTable};

use thiserror::Error;

use crate::errors::CoreError;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unknown export field '{0}'")]
    UnknownField(String),

    #[error("Invalid fieldsColumns: {0}")]
    InvalidColumns(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ExportError> for CoreError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::UnknownField(_) => CoreError::invalid_field("fields", err.to_string()),
            ExportError::InvalidColumns(_) => {
                CoreError::invalid_field("fieldsColumns", err.to_string())
            }
            other => CoreError::internal(other.to_string()).with_source(other),
        }
    }
}
