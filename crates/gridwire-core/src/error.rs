//! Core error types.

use thiserror::Error;

/// Coarse error classes used to decide what a failure envelope reveals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed request parameter.
    Parameter,
    /// Named resource does not exist.
    ResourceNotFound,
    /// Invalid sort/filter column reference or filter value.
    Validation,
    /// Failure while filtering, ordering or slicing the resource.
    Execution,
}

/// Grid request errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A required request parameter is absent.
    #[error("{0} not in request")]
    MissingParameter(String),

    /// A request parameter could not be decoded.
    #[error("invalid value {value:?} for parameter {key}")]
    MalformedParameter { key: String, value: String },

    /// The resource name is not `<namespace>.<entity>`.
    #[error("invalid resource name {0:?}, expected <namespace>.<entity>")]
    InvalidResource(String),

    /// No resource is registered under the name.
    #[error("{0} did not match any resource")]
    ResourceNotFound(String),

    /// A sort directive references a column outside the column list.
    #[error("sort column {index} out of range for {columns} columns")]
    InvalidSortColumn { index: usize, columns: usize },

    /// A filter directive references a column outside the column list.
    #[error("filter column {index} out of range for {columns} columns")]
    InvalidFilterColumn { index: usize, columns: usize },

    /// A filter slot carries an unusable comparison or value.
    #[error("invalid filter on {field}: {source}")]
    InvalidFilter {
        field: String,
        #[source]
        source: gridwire_proto::Error,
    },

    /// A regular expression filter does not compile.
    #[error("invalid regular expression on {field}: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    /// The configured date format is not a valid strftime pattern.
    #[error("invalid date format {0:?}")]
    InvalidDateFormat(String),

    /// The resource failed while filtering, ordering or slicing.
    #[error("execution error: {0}")]
    Execution(String),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingParameter(_)
            | Error::MalformedParameter { .. }
            | Error::InvalidResource(_) => ErrorKind::Parameter,
            Error::ResourceNotFound(_) => ErrorKind::ResourceNotFound,
            Error::InvalidSortColumn { .. }
            | Error::InvalidFilterColumn { .. }
            | Error::InvalidFilter { .. }
            | Error::InvalidPattern { .. } => ErrorKind::Validation,
            Error::InvalidDateFormat(_) | Error::Execution(_) => ErrorKind::Execution,
        }
    }

    /// Shorthand for a backend failure.
    pub fn execution(message: impl Into<String>) -> Self {
        Error::Execution(message.into())
    }
}

/// Result alias for grid operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::MissingParameter("sEcho".into()).kind(),
            ErrorKind::Parameter
        );
        assert_eq!(
            Error::ResourceNotFound("a.b".into()).kind(),
            ErrorKind::ResourceNotFound
        );
        assert_eq!(
            Error::InvalidSortColumn { index: 5, columns: 2 }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(Error::execution("boom").kind(), ErrorKind::Execution);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::MissingParameter("sEcho".into()).to_string(),
            "sEcho not in request"
        );
        assert_eq!(
            Error::InvalidSortColumn { index: 5, columns: 2 }.to_string(),
            "sort column 5 out of range for 2 columns"
        );
    }
}
