//! Build pass error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a build pass.
///
/// Pages written before the failing file stay on disk; there is no rollback.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("source root `{0}` does not exist")]
    SourceRootMissing(PathBuf),

    #[error("cannot read source `{path}`")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write `{path}`")]
    DestinationWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceUnreadable {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DestinationWrite {
            path: path.into(),
            source,
        }
    }

    /// Path of the file or directory the error is about.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::SourceRootMissing(path)
            | Self::SourceUnreadable { path, .. }
            | Self::DestinationWrite { path, .. } => path,
        }
    }
}

impl From<walkdir::Error> for BuildError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(PathBuf::from).unwrap_or_default();
        Self::unreadable(path, err.into())
    }
}
