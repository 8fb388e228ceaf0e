//! Error bridge implementations for Python front-end errors.
//!
//! `impl From<X> for TypecorrError` conversions from the front end's error
//! types to the unified `TypecorrError`. They live here rather than in
//! `typecorr-core` because core does not know the Python types.

use typecorr_core::error::TypecorrError;

use crate::files::FileError;
use crate::traces::TraceError;
use crate::walker::WalkError;

// ============================================================================
// Bridge: FileError -> TypecorrError
// ============================================================================

impl From<FileError> for TypecorrError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::NotADirectory { .. } | FileError::NoPackageName { .. } => {
                TypecorrError::InvalidArguments {
                    message: err.to_string(),
                }
            }
            FileError::Io(source) => TypecorrError::Io {
                path: String::new(),
                message: source.to_string(),
            },
        }
    }
}

// ============================================================================
// Bridge: TraceError -> TypecorrError
// ============================================================================

impl From<TraceError> for TypecorrError {
    fn from(err: TraceError) -> Self {
        match err {
            TraceError::Io { path, source } => TypecorrError::Io {
                path: path.display().to_string(),
                message: source.to_string(),
            },
            TraceError::Json { path, source } => TypecorrError::Serialization {
                message: format!("{}: {}", path.display(), source),
            },
        }
    }
}

// ============================================================================
// Bridge: WalkError -> TypecorrError
// ============================================================================

impl From<WalkError> for TypecorrError {
    fn from(err: WalkError) -> Self {
        TypecorrError::Internal {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;
    use typecorr_core::error::OutputErrorCode;

    #[test]
    fn missing_package_is_invalid_arguments() {
        let err = TypecorrError::from(FileError::NotADirectory {
            path: "nope".to_string(),
        });
        assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn trace_io_keeps_path() {
        let err = TypecorrError::from(TraceError::Io {
            path: PathBuf::from("tracing/pkg.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        });
        match err {
            TypecorrError::Io { path, .. } => assert_eq!(path, "tracing/pkg.json"),
            other => panic!("Expected Io, got {:?}", other),
        }
    }

    #[test]
    fn walk_error_is_internal() {
        let err = TypecorrError::from(WalkError::UnbalancedContext { depth: 2 });
        assert_eq!(err.error_code(), OutputErrorCode::InternalError);
    }
}
