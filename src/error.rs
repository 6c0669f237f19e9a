//! Error types for footprints

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Footprints errors
///
/// Attribute-level failures met while screening collector candidates are not
/// errors: they end up as diagnostics in a [`crate::reporting::ReportSink`].
/// What remains here either breaks a definition (see [`Error::is_schema_error`])
/// or was explicitly asked to be fatal.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Too many substitution passes for attribute `{attr}` ({passes})")]
    MaxIter { attr: String, passes: usize },

    #[error("Could not replace `[{key}]` in attribute `{attr}`")]
    UnreachableAttr { attr: String, key: String },

    #[error("No valid value for attribute `{attr}`")]
    Fatal { attr: String },

    #[error("Invalid footprint definition: {0}")]
    InvalidDefinition(String),

    #[error("Could not format `{placeholder}`: {reason}")]
    Format { placeholder: String, reason: String },

    #[error("Attribute `{attr}` is read-only ({op})")]
    ReadOnly { attr: String, op: &'static str },

    #[error("Invalid value for attribute `{attr}`: {reason}")]
    AttributeValue { attr: String, reason: String },

    #[error("No such footprint attribute `{0}`")]
    NoSuchAttribute(String),

    #[error("Unknown priority level: {0}")]
    UnknownLevel(String),

    #[error("Definition parse error: {0}")]
    SchemaParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for errors that reveal a broken definition rather than an
    /// unmatched description. Collector searches let these through.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Error::MaxIter { .. }
                | Error::UnreachableAttr { .. }
                | Error::InvalidDefinition(_)
                | Error::Format { .. }
        )
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<serde_norway::Error> for Error {
    fn from(e: serde_norway::Error) -> Self {
        Error::SchemaParse(e.to_string())
    }
}
