//! Error types for the download module.
//!
//! [`DownloadError`] describes why a single attempt failed; [`AssetFailure`]
//! is the terminal record for an asset whose attempts are exhausted.

use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiError;

/// Errors that can fail one download attempt.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Metadata fetch or original-content request failed.
    #[error(transparent)]
    Fetch(#[from] ApiError),

    /// File system error creating or finishing the output file.
    #[error("error creating file {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Writing streamed content to the output failed.
    #[error("error writing content of asset {asset_id}: {source}")]
    Transfer {
        /// The asset being written.
        asset_id: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The task running this download ended abnormally.
    #[error("download task failed: {0}")]
    TaskFailed(String),

    /// The claimed output path was created by someone else before we opened it.
    #[error("output path {path} was taken before it could be created")]
    PathTaken {
        /// The contested path.
        path: PathBuf,
    },
}

impl DownloadError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a transfer (write) error.
    pub fn transfer(asset_id: impl Into<String>, source: std::io::Error) -> Self {
        Self::Transfer {
            asset_id: asset_id.into(),
            source,
        }
    }

    /// Creates a path-taken error.
    pub fn path_taken(path: impl Into<PathBuf>) -> Self {
        Self::PathTaken { path: path.into() }
    }
}

/// Terminal failure of one asset after all attempts.
#[derive(Debug, Error)]
#[error("failed to download asset {asset_id} after {attempts} attempts: {last_error}")]
pub struct AssetFailure {
    /// The asset that could not be downloaded.
    pub asset_id: String,
    /// How many attempts were made.
    pub attempts: u32,
    /// The error observed on the last attempt.
    #[source]
    pub last_error: DownloadError,
}
