//! Error types for tagsmith.
//!
//! Uses thiserror for derive macros. Every variant carries a message that
//! names the offending tag, path, or value so the CLI can print it as-is.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for tagsmith operations.
#[derive(Error, Debug)]
pub enum TagsmithError {
    /// Invalid CLI input, uninitialized project, or filesystem failure.
    #[error("{0}")]
    UserError(String),

    /// A macro tag or its argument list is malformed.
    #[error("Tag validation failed: {0}")]
    ValidationError(String),

    /// A file or directory named by a tag does not exist under the project root.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A file or directory name matched several equally close candidates.
    #[error("Ambiguous match for '{name}': {candidates}")]
    Ambiguous { name: String, candidates: String },

    /// The declared checksum does not match the number of stripped lines.
    #[error(
        "Checksum mismatch: declared {expected} macro lines but {actual} were stripped; source file left untouched"
    )]
    IntegrityError { expected: i64, actual: i64 },

    /// Mutually exclusive directives were both present.
    #[error("Conflicting directives: {0}")]
    ConflictError(String),

    /// A subprocess could not be spawned or exceeded its timeout.
    #[error("Subprocess failed: {0}")]
    SubprocessError(String),

    /// The remote model call failed.
    #[error("Remote dispatch failed: {0}")]
    DispatchError(String),
}

impl TagsmithError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            TagsmithError::UserError(_) => exit_codes::USER_ERROR,
            TagsmithError::ValidationError(_) => exit_codes::VALIDATION_FAILURE,
            TagsmithError::NotFound(_) | TagsmithError::Ambiguous { .. } => {
                exit_codes::RESOLUTION_FAILURE
            }
            TagsmithError::IntegrityError { .. } => exit_codes::INTEGRITY_FAILURE,
            TagsmithError::ConflictError(_) => exit_codes::CONFLICT_FAILURE,
            TagsmithError::SubprocessError(_) => exit_codes::SUBPROCESS_FAILURE,
            TagsmithError::DispatchError(_) => exit_codes::DISPATCH_FAILURE,
        }
    }
}

/// Result type alias for tagsmith operations.
pub type Result<T> = std::result::Result<T, TagsmithError>;
