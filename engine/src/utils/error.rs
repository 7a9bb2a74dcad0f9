use thiserror::Error;

/// The engine's only hard failure.
///
/// Design: missing or malformed telemetry never errors; it degrades the
/// affected metric to undefined so one defective node cannot prevent
/// rendering any other node. A `FormatError` is reserved for structurally
/// invalid property keys supplied by a caller, which is a programming error
/// and is surfaced rather than swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("malformed property key: {key:?}")]
    MalformedKey { key: String },
}

impl FormatError {
    pub fn malformed_key(key: impl Into<String>) -> Self {
        Self::MalformedKey { key: key.into() }
    }
}

pub type FormatResult<T> = Result<T, FormatError>;
