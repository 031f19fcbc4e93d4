//! Error types for Horizon Observable core.

use std::fmt;

/// Error types for property operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// A one-time property already holds a value.
    AlreadySet {
        /// The name of the property.
        name: &'static str,
    },
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadySet { name } => {
                write!(f, "Property '{}' can only be set once", name)
            }
        }
    }
}

impl std::error::Error for PropertyError {}
