//! Error types for index construction and reverse-geocoding queries.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeocodeError>;

#[derive(Error, Debug)]
pub enum GeocodeError {
    /// A coordinate value is not a finite number.
    #[error("Cannot parse {field} value {value:?} as a finite number")]
    Parse { field: String, value: String },

    /// The input table does not carry the expected columns.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The index was built from zero records.
    #[error("Cannot query an empty index")]
    EmptyIndex,

    /// A query was issued before the geocoder was built.
    #[error("Geocoder has not been built")]
    NotBuilt,

    /// The shared geocoder has already been built.
    #[error("Geocoder has already been built")]
    AlreadyBuilt,

    /// A worker failed while processing part of a parallel batch.
    #[error("Worker failed on sub-batch {sub_batch} (queries {start}..{end}): {source}")]
    WorkerFailure {
        sub_batch: usize,
        start: usize,
        end: usize,
        #[source]
        source: Box<GeocodeError>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid snapshot format")]
    InvalidFormat,
}

impl GeocodeError {
    pub(crate) fn parse(field: impl Into<String>, value: impl ToString) -> Self {
        GeocodeError::Parse {
            field: field.into(),
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_worker_failure_exposes_source() {
        let err = GeocodeError::WorkerFailure {
            sub_batch: 2,
            start: 50,
            end: 75,
            source: Box::new(GeocodeError::parse("lat", "abc")),
        };

        let message = err.to_string();
        assert!(message.contains("sub-batch 2"));
        assert!(message.contains("50..75"));

        let source = err.source().expect("source should be set");
        assert!(source.to_string().contains("\"abc\""));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: GeocodeError = io.into();
        assert!(matches!(err, GeocodeError::Io(_)));
    }
}
