//! Error types surfaced by the core crate.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to draw a hand from the image pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// More cards were requested than the pool holds.
    #[error("cannot draw {requested} cards from a pool of {available}")]
    InsufficientPool {
        /// Number of cards asked for.
        requested: usize,
        /// Number of identifiers in the pool.
        available: usize,
    },
}

/// Failure to resolve a single card-face asset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// The file does not exist under the asset root.
    #[error("asset {} not found", .0.display())]
    Missing(PathBuf),
    /// The file exists but could not be read.
    #[error("failed to read {}: {reason}", .path.display())]
    Unreadable {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error message.
        reason: String,
    },
    /// The file was read but holds no data.
    #[error("asset {} is empty", .0.display())]
    Empty(PathBuf),
    /// The file extension is not a known image type.
    #[error("unsupported image type for {0}")]
    Unsupported(String),
}

/// Failure to build an image pool from disk.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The front-face directory is missing.
    #[error("front-face directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),
    /// Directory traversal failed.
    #[error("failed to scan {}: {source}", .path.display())]
    Scan {
        /// Directory being scanned.
        path: PathBuf,
        /// Walk error.
        #[source]
        source: walkdir::Error,
    },
    /// No usable image files were found.
    #[error("no card images found in {}", .0.display())]
    Empty(PathBuf),
}
