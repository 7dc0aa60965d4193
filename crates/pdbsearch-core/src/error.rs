//! Error types for pdbsearch-core.
//!
//! Every contract the library enforces has its own [`SearchError`] variant so
//! callers can match on what was violated. Construction and option errors are
//! raised before any I/O; transport errors surface at the page fetch that
//! triggered them.

use thiserror::Error;

/// Failure reported by a [`Transport`](crate::transport::Transport) or
/// [`SchemaSource`](crate::transport::SchemaSource).
///
/// `Clone` so that a failed [`Session`](crate::session::Session) can hand the
/// same error back on every later pull.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("operation not supported by this transport: {0}")]
    Unsupported(String),
}

/// pdbsearch error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("missing required field `{field}` for {context}")]
    MissingRequiredField {
        field: &'static str,
        context: &'static str,
    },

    #[error("fields {fields:?} are mutually exclusive for {context}")]
    ConflictingFields {
        fields: Vec<&'static str>,
        context: &'static str,
    },

    #[error("operator `{operator}` cannot be used on `{attribute}`: {reason}")]
    InvalidOperatorForAttribute {
        attribute: String,
        operator: String,
        reason: String,
    },

    #[error("parameter `{parameter}` = {value} is outside {allowed}")]
    OutOfRangeParameter {
        parameter: &'static str,
        value: String,
        allowed: String,
    },

    #[error("a structure motif query needs {min}-{max} residues, got {count}")]
    ResidueCount { count: usize, min: usize, max: usize },

    #[error("too many exchanges: {count} (at most {max} {scope})")]
    TooManyExchanges {
        count: usize,
        max: usize,
        scope: &'static str,
    },

    #[error("unknown residue exchange code `{0}`")]
    UnknownExchangeCode(String),

    #[error("attribute `{name}` exists in several services ({services}); specify the service explicitly")]
    AmbiguousAttribute { name: String, services: String },

    #[error("attribute not found: {0}")]
    AttributeNotFound(String),

    #[error("negation is not supported by {0} queries")]
    UnsupportedNegation(&'static str),

    #[error("invalid request option: {0}")]
    InvalidOption(String),

    #[error("invalid attribute search pattern: {0}")]
    InvalidPattern(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for pdbsearch operations.
pub type Result<T> = std::result::Result<T, SearchError>;

impl From<regex::Error> for SearchError {
    fn from(err: regex::Error) -> Self {
        SearchError::InvalidPattern(err.to_string())
    }
}

impl From<fst::Error> for SearchError {
    fn from(err: fst::Error) -> Self {
        SearchError::Schema(err.to_string())
    }
}
