//! ep_io — import/export surface for the EP engine.
//!
//! - Tabular import of historical results and polls (CSV always, XLSX
//!   behind the `xlsx` feature): one identifying column (`Año` for
//!   historical, `Encuesta` for polls) plus one numeric column per party.
//! - `Params` loading from JSON.
//! - JSON artifact writing for run results.
//!
//! Shared error type (`IoError`) with `From` conversions used across
//! modules; rows that don't sum to 100 are *warnings* carried alongside
//! the data, never rejections.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for ep_io (used by tabular/artifact modules).
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors.
    #[error("io/path error: {0}")]
    Path(String),

    /// CSV shape or decoding errors.
    #[error("csv error: {0}")]
    Csv(String),

    /// Workbook (XLSX) shape or decoding errors.
    #[error("xlsx error: {0}")]
    Xlsx(String),

    /// JSON serialization/deserialization errors.
    #[error("json error: {0}")]
    Json(String),

    /// Table contents violating the import contract
    /// (missing id column, duplicate keys, non-numeric cells).
    #[error("invalid table at {location}: {msg}")]
    Table { location: String, msg: String },

    /// Parameter domain violations surfaced while loading config.
    #[error("invalid params: {0}")]
    Params(String),
}

pub type IoResult<T> = Result<T, IoError>;

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<csv::Error> for IoError {
    fn from(e: csv::Error) -> Self {
        IoError::Csv(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        IoError::Json(e.to_string())
    }
}

pub mod artifact;
pub mod tabular;

pub mod prelude {
    pub use crate::{IoError, IoResult};
    pub use crate::artifact::{load_params, write_json};
    pub use crate::tabular::{read_historical, read_polls, ImportWarning, Imported};
}
