//! Error taxonomy reported at the boundary of a single project sync.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Release query or asset transfer failed, including non-success HTTP statuses
    Network(String),
    /// Release metadata did not have the expected shape
    MalformedResponse(String),
    /// No asset name satisfied the project's matcher
    NoMatchingAsset { pattern: String },
    /// The downloaded archive could not be opened or an entry could not be written
    CorruptArchive(String),
    /// Preparing or swapping the cache/extraction directories failed
    Filesystem(String),
}

impl SyncError {
    pub fn network(error: anyhow::Error) -> Self {
        SyncError::Network(format!("{:#}", error))
    }

    pub fn corrupt_archive(error: anyhow::Error) -> Self {
        SyncError::CorruptArchive(format!("{:#}", error))
    }

    pub fn filesystem(error: anyhow::Error) -> Self {
        SyncError::Filesystem(format!("{:#}", error))
    }

    /// Short class name, used in run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Network(_) => "NetworkError",
            SyncError::MalformedResponse(_) => "MalformedResponseError",
            SyncError::NoMatchingAsset { .. } => "NoMatchingAssetError",
            SyncError::CorruptArchive(_) => "CorruptArchiveError",
            SyncError::Filesystem(_) => "FilesystemError",
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Network(msg) => write!(f, "Network error: {}", msg),
            SyncError::MalformedResponse(msg) => {
                write!(f, "Malformed release metadata: {}", msg)
            }
            SyncError::NoMatchingAsset { pattern } => {
                write!(f, "No matching assets found for: {}", pattern)
            }
            SyncError::CorruptArchive(msg) => write!(f, "Corrupt archive: {}", msg),
            SyncError::Filesystem(msg) => write!(f, "Filesystem error: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {}
