//! Error types for trie operations.
//!
//! Every fallible operation on a [`PersistentHamt`](super::PersistentHamt)
//! aborts on the first failing hash or equality call and returns a
//! [`TrieError`]. The map the operation was called on is never modified.

use thiserror::Error;

/// Raised when a key's native hash cannot be computed.
///
/// # Examples
///
/// ```rust
/// use persistent_hamt::persistent::HashError;
///
/// let error = HashError::new("key is not hashable");
/// assert_eq!(format!("{error}"), "failed to hash key: key is not hashable");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to hash key: {message}")]
pub struct HashError {
    message: String,
}

impl HashError {
    /// Creates a new hash error with the given description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Raised when an equality predicate between two keys or two values fails.
///
/// # Examples
///
/// ```rust
/// use persistent_hamt::persistent::CompareError;
///
/// let error = CompareError::new("incomparable values");
/// assert_eq!(format!("{error}"), "failed to compare: incomparable values");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to compare: {message}")]
pub struct CompareError {
    message: String,
}

impl CompareError {
    /// Creates a new comparison error with the given description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors that abort a trie operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrieError {
    /// Hashing the key failed.
    #[error(transparent)]
    Hash(#[from] HashError),
    /// Comparing two keys or two values failed.
    #[error(transparent)]
    Compare(#[from] CompareError),
}
