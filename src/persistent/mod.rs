//! Persistent (immutable) hash array mapped trie.
//!
//! This module provides [`PersistentHamt`], an immutable map that uses
//! structural sharing: every update returns a new map and shares all
//! unchanged nodes with the map it came from.
//!
//! - [`PersistentHamt`]: the map itself
//! - [`Iter`], [`Keys`], [`Values`]: allocation-free borrowing iterators
//! - [`TryHash`], [`TryEq`]: the fallible hashing and equality used for keys
//!   and values
//! - [`TrieError`]: the error returned when hashing or comparing fails
//!
//! # Structural Sharing
//!
//! Nodes are never modified after construction. An update rebuilds only
//! the nodes on the path from the changed entry to the root.
//!
//! # Examples
//!
//! ```rust
//! use persistent_hamt::persistent::{PersistentHamt, TrieError};
//!
//! # fn main() -> Result<(), TrieError> {
//! let t0 = PersistentHamt::new();
//! let t1 = t0.assoc("a", 1)?;
//! let t2 = t1.assoc("b", 2)?;
//! let t3 = t2.without("a")?;
//!
//! assert_eq!((t0.len(), t1.len(), t2.len(), t3.len()), (0, 1, 2, 1));
//! assert_eq!(t3.find("a")?, None);
//! assert_eq!(t3.find("b")?, Some(&2));
//! # Ok(())
//! # }
//! ```
//!
//! # Fallible Keys
//!
//! ```rust
//! use persistent_hamt::persistent::{HashError, PersistentHamt, TrieError, TryHash};
//!
//! #[derive(PartialEq)]
//! struct Unhashable;
//!
//! impl TryHash for Unhashable {
//!     fn try_hash(&self) -> Result<u64, HashError> {
//!         Err(HashError::new("unhashable"))
//!     }
//! }
//!
//! let map: PersistentHamt<Unhashable, i32> = PersistentHamt::new();
//! assert!(matches!(map.assoc(Unhashable, 1), Err(TrieError::Hash(_))));
//! assert!(map.is_empty());
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`, so maps can
/// be shared between threads.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod compare;
mod dump;
mod error;
mod hamt;
mod hash;
mod iter;
mod node;

pub use compare::TryEq;
pub use error::{CompareError, HashError, TrieError};
pub use hamt::PersistentHamt;
pub use hash::{TryHash, fold, reduce};
pub use iter::{Iter, Keys, Values};

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentHamt<String, i32>: Send, Sync);

#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(PersistentHamt<String, i32>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================
