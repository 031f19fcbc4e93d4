//! Error types for observable collections.

use horizon_observable_core::PropertyError;

/// Result type alias for collection operations.
pub type Result<T> = std::result::Result<T, CollectionError>;

/// Errors that can occur when operating on an observable collection.
///
/// Every error is raised before any mutation takes place, so a rejected call
/// leaves the collection untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    /// An absent element or an element of the wrong type was supplied.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A positional argument fell outside the collection bounds.
    #[error("Index {index} is out of range for a collection of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A mutation was attempted through a read-only view.
    #[error("Operation '{operation}' is not supported on a read-only view")]
    NotSupported { operation: &'static str },

    /// A one-time setting was configured more than once.
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },
}

impl CollectionError {
    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an index-out-of-range error.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Create a not-supported error.
    pub fn not_supported(operation: &'static str) -> Self {
        Self::NotSupported { operation }
    }

    /// Create an invalid-operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}

impl From<PropertyError> for CollectionError {
    fn from(err: PropertyError) -> Self {
        Self::invalid_operation(err.to_string())
    }
}
