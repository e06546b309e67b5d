//! The error taxonomy shared by every backend.

use std::path::PathBuf;

use thiserror::Error;

/// Every way a trash operation can fail.
///
/// Each variant is a distinct, matchable kind so callers can tell a missing
/// source file from a permissions problem from an unsupported platform.
#[derive(Error, Debug)]
pub enum Error {
    /// The path handed to [`crate::move_to_trash`] was not absolute.
    #[error("path is not absolute: {path}")]
    InvalidArgument { path: PathBuf },

    /// The source path does not exist.
    #[error("no such file or directory: {path}")]
    NotFound { path: PathBuf },

    /// A required directory or file could not be created or written.
    #[error("access denied: {path}")]
    AccessDenied { path: PathBuf, source: Option<std::io::Error> },

    /// A volume's `.Trash` directory fails the specification's checks and no
    /// fallback was allowed to recover from it.
    #[error("top directory trash unavailable at {path}: {reason}")]
    TopDirUnavailable { path: PathBuf, reason: String },

    /// An underlying syscall, COM call, or HRESULT failed.
    #[error("platform error ({code}) during {function_name}")]
    IoError { function_name: &'static str, code: i32, source: Option<std::io::Error> },

    /// This platform has no trash implementation.
    #[error("trash is not supported on this platform")]
    NotSupported,

    /// A `.trashinfo` file is unreadable or missing a mandatory key.
    #[error("corrupt trashinfo at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

impl Error {
    pub(crate) fn io(function_name: &'static str, source: std::io::Error) -> Error {
        let code = source.raw_os_error().unwrap_or(-1);
        Error::IoError { function_name, code, source: Some(source) }
    }

    pub(crate) fn access_denied(path: impl Into<PathBuf>, source: std::io::Error) -> Error {
        Error::AccessDenied { path: path.into(), source: Some(source) }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
