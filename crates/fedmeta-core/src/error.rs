//! Error types for metadata fetching, verification and inspection.

/// Errors raised while fetching, verifying or reading federation metadata.
#[derive(Debug, thiserror::Error)]
pub enum FedmetaError {
    /// Transport failure reaching the metadata URL.
    #[error("failed to download metadata from {url}: {message}")]
    Network { url: String, message: String },

    /// Key set file unreadable or unusable.
    #[error("failed to read key set from {path}: {message}")]
    KeyRead { path: String, message: String },

    /// No signature entry of the envelope could be verified.
    #[error("signature verification failed: {reason}")]
    Verification { reason: String },

    /// Cached copy present but could not be copied to the output.
    #[error("failed to use cached metadata {path}: {message}")]
    CacheCopy { path: String, message: String },

    /// Metadata document unreadable or malformed.
    #[error("failed to read metadata from {path}: {message}")]
    MetadataRead { path: String, message: String },

    /// Destination file could not be written.
    #[error("failed to write {path}: {message}")]
    Output { path: String, message: String },

    /// Entity or server lookup in verified metadata failed.
    #[error("lookup failed: {message}")]
    Lookup { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl FedmetaError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Input / config issues
            Self::Config { .. } => 1,
            Self::MetadataRead { .. } => 1,

            // Trust anchor
            Self::KeyRead { .. } => 2,

            Self::Lookup { .. } => 3,

            // Security
            Self::Verification { .. } => 4,

            // Network
            Self::Network { .. } => 5,

            // Local filesystem
            Self::CacheCopy { .. } => 6,
            Self::Output { .. } => 6,
        }
    }

    pub(crate) fn verification(reason: impl Into<String>) -> Self {
        Self::Verification {
            reason: reason.into(),
        }
    }

    pub(crate) fn lookup(message: impl Into<String>) -> Self {
        Self::Lookup {
            message: message.into(),
        }
    }
}

/// Result type for fedmeta operations.
pub type FedmetaResult<T> = Result<T, FedmetaError>;
