//! Error types for dataset construction, configuration and access.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Everything that can go wrong while loading or windowing a grid tensor.
///
/// Errors are raised at the call that triggers them (construction,
/// configuration or access) and are never retried internally.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Windowing parameters that cannot produce a valid representation.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The array file could not be opened or read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a readable `.npy` array of a supported dtype.
    #[error("NumPy read error: {0}")]
    Npy(#[from] ndarray_npy::ReadNpyError),

    /// The array does not have the expected rank.
    #[error("Shape mismatch: expected a rank-{expected_rank} array (T×C×H×W), got shape {shape:?}")]
    InvalidShape {
        /// Rank the loader requires
        expected_rank: usize,
        /// Shape actually found
        shape: Vec<usize>,
    },

    /// `get` was called with an index outside `[0, len)`.
    #[error("Index {index} out of bounds for dataset of length {len}")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Current dataset length
        len: usize,
    },

    /// A configuration file could not be parsed or written.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DatasetError {
    /// Shorthand for a [`DatasetError::Configuration`] error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether this error came from invalid windowing parameters.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_error_message() {
        let err = DatasetError::IndexOutOfBounds { index: 7, len: 7 };
        assert_eq!(err.to_string(), "Index 7 out of bounds for dataset of length 7");
    }

    #[test]
    fn test_configuration_helper() {
        let err = DatasetError::configuration("at least one scale must be active");
        assert!(err.is_configuration());
        assert!(err.to_string().contains("at least one scale"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.npy");
        let err: DatasetError = io.into();
        assert!(matches!(err, DatasetError::Io(_)));
        assert!(!err.is_configuration());
    }
}
