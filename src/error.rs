//! Error taxonomy for edit requests.

use serde::Serialize;
use thiserror::Error;

/// Why a single edit request could not be applied.
#[derive(Debug, Error)]
pub enum PatchError {
    /// Empty batch, blank change type, or blank text where it is required.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("change type '{0}' is not supported")]
    UnsupportedChangeKind(String),

    #[error("file '{0}' not found")]
    FileNotFound(String),

    /// No declaration's text matched the requested original code.
    #[error("{what} not found in '{file}'")]
    NotFound { file: String, what: &'static str },

    /// Replacement text is not a valid declaration of the expected kind, or
    /// splicing it in would break the file's syntax.
    #[error("invalid replacement {what} for '{file}': {reason}")]
    InvalidReplacement {
        file: String,
        what: &'static str,
        reason: String,
    },

    #[error("line range {start}..={end} is out of bounds for '{file}' ({line_count} lines)")]
    OutOfBounds {
        file: String,
        start: i64,
        end: i64,
        line_count: usize,
    },

    #[error("io error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Serializable discriminant of [`PatchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    UnsupportedChangeKind,
    FileNotFound,
    NotFound,
    InvalidReplacement,
    OutOfBounds,
    IoFailure,
}

impl PatchError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::UnsupportedChangeKind(_) => ErrorKind::UnsupportedChangeKind,
            Self::FileNotFound(_) => ErrorKind::FileNotFound,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidReplacement { .. } => ErrorKind::InvalidReplacement,
            Self::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            Self::Io { .. } => ErrorKind::IoFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let err = PatchError::NotFound {
            file: "A.cs".to_string(),
            what: "method",
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "method not found in 'A.cs'");

        let err = PatchError::io("A.cs", std::io::Error::other("disk full"));
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let value = serde_json::to_string(&ErrorKind::UnsupportedChangeKind).unwrap();
        assert_eq!(value, "\"unsupported_change_kind\"");
    }
}
