//! # Error Types

/// Errors from ctcfeed operations.
#[derive(Debug, thiserror::Error)]
pub enum CtcFeedError {
    /// A construction or call parameter is invalid.
    ///
    /// Raised eagerly; never recovered internally.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The corpus on disk (or in memory) is inconsistent.
    ///
    /// Raised at load time; no partially loaded store is retained.
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    /// An index selection cannot be assembled into a batch.
    #[error("invalid batch: {0}")]
    InvalidBatch(String),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An array file could not be decoded.
    #[error("npy error: {0}")]
    Npy(String),

    /// Parse error (frame-count index, etc.)
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<ndarray_npy::ReadNpyError> for CtcFeedError {
    fn from(error: ndarray_npy::ReadNpyError) -> Self {
        CtcFeedError::Npy(error.to_string())
    }
}

impl From<serde_json::Error> for CtcFeedError {
    fn from(error: serde_json::Error) -> Self {
        CtcFeedError::Parse(error.to_string())
    }
}

/// Result type for ctcfeed operations.
pub type CFResult<T> = core::result::Result<T, CtcFeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CtcFeedError::Configuration("batch_size must be > 0".to_string());
        assert_eq!(err.to_string(), "configuration error: batch_size must be > 0");

        let err = CtcFeedError::DataIntegrity("3 != 4".to_string());
        assert_eq!(err.to_string(), "data integrity error: 3 != 4");

        let err: CtcFeedError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, CtcFeedError::Parse(_)));
    }
}
