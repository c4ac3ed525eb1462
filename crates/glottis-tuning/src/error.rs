//! Error types for scale and keyboard-mapping loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or parsing tuning files.
///
/// None of these affect the tuning currently in use; a failed load
/// leaves the previous scale active.
#[derive(Debug, Error)]
pub enum TuningError {
    /// The file could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file ended before the description and count lines.
    #[error("missing header: expected a description line and a degree count")]
    MissingHeader,

    /// The count line is not an unsigned integer.
    #[error("line {line}: invalid degree count '{value}'")]
    InvalidCount {
        /// 1-based line number.
        line: usize,
        /// Offending text.
        value: String,
    },

    /// A degree line matches none of ratio, cents, or integer (strict mode).
    #[error("line {line}: cannot interpret '{entry}' as a scale degree")]
    UnrecognizedDegree {
        /// 1-based line number.
        line: usize,
        /// Offending entry.
        entry: String,
    },

    /// A degree has the right shape but an unusable value.
    #[error("line {line}: invalid degree '{entry}': {reason}")]
    InvalidDegree {
        /// 1-based line number.
        line: usize,
        /// Offending entry.
        entry: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Strict mode: the number of degrees disagrees with the count line.
    #[error("unexpected number of entries: expected {expected}, got {actual}")]
    CountMismatch {
        /// Declared count plus the implicit 1/1.
        expected: usize,
        /// Parsed degrees plus the implicit 1/1.
        actual: usize,
    },

    /// A keyboard mapping violates its format.
    #[error("keyboard mapping line {line}: {reason}")]
    InvalidKeyboardMapping {
        /// 1-based line number, 0 when the problem is the file as a whole.
        line: usize,
        /// What is wrong.
        reason: String,
    },
}

impl TuningError {
    /// Create an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TuningError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a keyboard-mapping error.
    pub fn keyboard_mapping(line: usize, reason: impl Into<String>) -> Self {
        TuningError::InvalidKeyboardMapping {
            line,
            reason: reason.into(),
        }
    }

    /// Line the error refers to, when there is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            TuningError::InvalidCount { line, .. }
            | TuningError::UnrecognizedDegree { line, .. }
            | TuningError::InvalidDegree { line, .. } => Some(*line),
            TuningError::InvalidKeyboardMapping { line, .. } if *line > 0 => Some(*line),
            _ => None,
        }
    }

    /// Whether the file content (rather than access to it) is at fault.
    pub fn is_format_error(&self) -> bool {
        !matches!(self, TuningError::Io { .. })
    }
}

/// Result alias for tuning operations.
pub type Result<T> = std::result::Result<T, TuningError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::path::Path;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn io_factory_keeps_path_and_source() {
        let err = TuningError::io("/scales/missing.scl", mock_io_err());
        assert!(matches!(
            err,
            TuningError::Io { ref path, .. } if path == Path::new("/scales/missing.scl")
        ));
        assert!(err.source().is_some());
        assert!(!err.is_format_error());
    }

    #[test]
    fn count_mismatch_display() {
        let err = TuningError::CountMismatch { expected: 4, actual: 3 };
        assert_eq!(err.to_string(), "unexpected number of entries: expected 4, got 3");
        assert!(err.is_format_error());
        assert_eq!(err.line(), None);
    }

    #[test]
    fn degree_errors_report_line() {
        let err = TuningError::UnrecognizedDegree { line: 7, entry: "abc".into() };
        assert_eq!(err.line(), Some(7));
        assert!(err.to_string().contains("line 7"));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn keyboard_mapping_whole_file_has_no_line() {
        let err = TuningError::keyboard_mapping(0, "truncated header");
        assert_eq!(err.line(), None);
        assert_eq!(err.to_string(), "keyboard mapping line 0: truncated header");
    }
}
