//! Error types and exit code constants for typecorr.
//!
//! `TypecorrError` is the single error type surfaced by the CLI. Subsystem
//! errors (`StoreError`, `ConfigError`, the Python front end's analysis
//! errors) are bridged into it with `From` impls.
//!
//! ## Taxonomy
//!
//! - **Resolution**: a named symbol could not be found on its expected
//!   owner. Never fatal; callers log it and continue.
//! - **Parse**: a source file could not be parsed. Fatal for that file only.
//! - **Analysis**: an unexpected failure while walking one file. Same
//!   containment as `Parse`.
//! - **Aggregation**: a failure while normalizing or merging a raw type.
//!   Aborts the whole aggregation step.
//!
//! ## Exit Codes
//!
//! - `2`: Invalid arguments or configuration
//! - `3`: Parse / analysis errors
//! - `4`: Aggregation errors
//! - `5`: I/O and serialization errors
//! - `10`: Internal errors

use std::fmt;

use thiserror::Error;

use crate::aggregate::AggregationError;
use crate::config::ConfigError;
use crate::store::StoreError;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Stable process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments or configuration.
    InvalidArguments = 2,
    /// A source file could not be parsed or analyzed.
    AnalysisError = 3,
    /// Normalization or merging of a raw type failed.
    AggregationError = 4,
    /// Reading or writing an artifact failed.
    IoError = 5,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for the analysis pass and the CLI.
#[derive(Debug, Error)]
pub enum TypecorrError {
    /// Invalid arguments from the caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Invalid or unreadable configuration.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A symbol could not be resolved on its owner.
    #[error("{file}: could not get obj for {symbol}")]
    Resolution { file: String, symbol: String },

    /// A source file could not be parsed.
    #[error("failed to parse file: {file}: {message}")]
    Parse { file: String, message: String },

    /// Analysis of a parsed file failed.
    #[error("failed to analyze file: {file}: {message}")]
    Analysis { file: String, message: String },

    /// Normalizing or merging a raw type failed.
    #[error("failed to aggregate type '{raw_type}': {message}")]
    Aggregation { raw_type: String, message: String },

    /// Reading or writing an artifact failed.
    #[error("IO error at {path}: {message}")]
    Io { path: String, message: String },

    /// JSON (de)serialization failed.
    #[error("serialization error: {message}")]
    Serialization { message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    Internal { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&TypecorrError> for OutputErrorCode {
    fn from(err: &TypecorrError) -> Self {
        match err {
            TypecorrError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            TypecorrError::Config { .. } => OutputErrorCode::InvalidArguments,
            TypecorrError::Resolution { .. } => OutputErrorCode::AnalysisError,
            TypecorrError::Parse { .. } => OutputErrorCode::AnalysisError,
            TypecorrError::Analysis { .. } => OutputErrorCode::AnalysisError,
            TypecorrError::Aggregation { .. } => OutputErrorCode::AggregationError,
            TypecorrError::Io { .. } => OutputErrorCode::IoError,
            TypecorrError::Serialization { .. } => OutputErrorCode::IoError,
            TypecorrError::Internal { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<TypecorrError> for OutputErrorCode {
    fn from(err: TypecorrError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Bridges
// ============================================================================

impl From<StoreError> for TypecorrError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io { path, source } => TypecorrError::Io {
                path: path.display().to_string(),
                message: source.to_string(),
            },
            StoreError::Json { path, source } => TypecorrError::Serialization {
                message: format!("{}: {}", path.display(), source),
            },
            StoreError::MalformedLine { path, line, content } => TypecorrError::Serialization {
                message: format!("{}:{}: malformed map line '{}'", path.display(), line, content),
            },
        }
    }
}

impl From<AggregationError> for TypecorrError {
    fn from(err: AggregationError) -> Self {
        TypecorrError::Aggregation {
            raw_type: err.raw_type().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<ConfigError> for TypecorrError {
    fn from(err: ConfigError) -> Self {
        TypecorrError::Config {
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl TypecorrError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        TypecorrError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a resolution error for `symbol` in `file`.
    pub fn resolution(file: impl Into<String>, symbol: impl Into<String>) -> Self {
        TypecorrError::Resolution {
            file: file.into(),
            symbol: symbol.into(),
        }
    }

    /// Create an aggregation error for a raw type.
    pub fn aggregation(raw_type: impl Into<String>, message: impl Into<String>) -> Self {
        TypecorrError::Aggregation {
            raw_type: raw_type.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        TypecorrError::Internal {
            message: message.into(),
        }
    }

    /// The file this error is scoped to, if any.
    pub fn file(&self) -> Option<&str> {
        match self {
            TypecorrError::Resolution { file, .. }
            | TypecorrError::Parse { file, .. }
            | TypecorrError::Analysis { file, .. } => Some(file),
            _ => None,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

/// Result type for typecorr operations.
pub type TypecorrResult<T> = Result<T, TypecorrError>;

// ============================================================================
// Tests
// ============================================================================
