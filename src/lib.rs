//! # persistent-hamt
//!
//! A persistent hash array mapped trie for Rust.
//!
//! ## Overview
//!
//! [`PersistentHamt`](persistent::PersistentHamt) is an immutable map. Every
//! update returns a new map sharing all unchanged structure with the old
//! one, so keeping many versions alive is cheap:
//!
//! - **Structural sharing**: updates rebuild one root-to-leaf path
//! - **Identity short-circuit**: no-op updates return the same root
//! - **Fallible keys**: hashing and equality may fail without corrupting
//!   anything
//! - **Allocation-free iteration** over a fixed-depth explicit stack
//!
//! ## Feature Flags
//!
//! - `arc`: share nodes through `Arc` so maps are `Send + Sync`
//! - `serde`: serialize and deserialize maps as maps
//! - `fxhash`: hash keys with `rustc_hash::FxHasher`
//! - `ahash`: hash keys with `ahash::AHasher`
//!
//! ## Example
//!
//! ```rust
//! use persistent_hamt::prelude::*;
//!
//! let scope = PersistentHamt::new().assoc("x", 1).unwrap();
//! let nested = scope.assoc("x", 2).unwrap();
//!
//! assert_eq!(scope.find("x"), Ok(Some(&1)));
//! assert_eq!(nested.find("x"), Ok(Some(&2)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use persistent_hamt::prelude::*;
/// ```
pub mod prelude {
    pub use crate::persistent::*;
}

pub mod persistent;
