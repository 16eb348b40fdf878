//! Error types for catalog filtering.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur while filtering a catalog export.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Failed to open or read the XML file.
    #[error("failed to read catalog file: {path}")]
    FileRead {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The XML is malformed.
    #[error("XML error at byte {position}: {message}")]
    Xml {
        /// Byte offset where the error was detected.
        position: u64,
        /// Description of what's wrong.
        message: String,
    },

    /// The JSON report could not be written.
    #[error("failed to write report: {path}")]
    FileWrite {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The JSON report could not be serialised.
    #[error("failed to serialise report")]
    Serialise(#[from] serde_json::Error),
}

impl CatalogError {
    /// Creates a file read error.
    pub fn file_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates an XML error.
    pub fn xml(position: u64, message: impl Into<String>) -> Self {
        Self::Xml {
            position,
            message: message.into(),
        }
    }

    /// Creates a file write error.
    pub fn file_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }
}
