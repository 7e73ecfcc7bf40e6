//! Persistent (immutable) hash map based on a hash array mapped trie.
//!
//! This module provides [`PersistentHamt`], an immutable map whose updates
//! return new maps sharing all unchanged structure with the original.
//!
//! # Overview
//!
//! The trie branches 32 ways and consumes a 32-bit reduced hash five bits
//! per level, so no path is longer than seven levels plus a collision node.
//!
//! - O(log32 N) `find`, `assoc` and `without`
//! - O(1) `len` and `is_empty`
//! - An update that changes nothing returns a map sharing the same root,
//!   detectable in O(1) with [`PersistentHamt::ptr_eq`]
//!
//! Hashing and comparing keys may fail (see [`TryHash`] and [`TryEq`]).
//! Every operation that hashes or compares therefore returns a
//! [`Result`], and a failure leaves the map it was called on untouched.
//!
//! # Examples
//!
//! ```rust
//! use persistent_hamt::persistent::{PersistentHamt, TrieError};
//!
//! # fn main() -> Result<(), TrieError> {
//! let map = PersistentHamt::new()
//!     .assoc("one", 1)?
//!     .assoc("two", 2)?;
//!
//! let updated = map.assoc("one", 100)?;
//! assert_eq!(map.find("one")?, Some(&1));
//! assert_eq!(updated.find("one")?, Some(&100));
//!
//! let same = map.assoc("two", 2)?;
//! assert!(same.ptr_eq(&map));
//! # Ok(())
//! # }
//! ```

use std::borrow::Borrow;
use std::fmt;

use super::ReferenceCounter;
use super::compare::TryEq;
use super::error::TrieError;
use super::hash::{TryHash, reduce};
use super::iter::{Iter, Keys, Values};
use super::node::{Assoc, Entry, Node, Without};

// =============================================================================
// PersistentHamt Definition
// =============================================================================

/// A persistent (immutable) hash map based on a hash array mapped trie.
///
/// # Time Complexity
///
/// | Operation      | Complexity        |
/// |----------------|-------------------|
/// | `new`          | O(1)              |
/// | `find`         | O(log32 N)        |
/// | `assoc`        | O(log32 N)        |
/// | `without`      | O(log32 N)        |
/// | `contains_key` | O(log32 N)        |
/// | `len`          | O(1)              |
/// | `equals`       | O(N log32 N)      |
///
/// # Examples
///
/// ```rust
/// use persistent_hamt::persistent::PersistentHamt;
///
/// let map = PersistentHamt::singleton("key".to_string(), 42).unwrap();
/// assert_eq!(map.find("key"), Ok(Some(&42)));
/// ```
pub struct PersistentHamt<K, V> {
    root: ReferenceCounter<Node<K, V>>,
    count: usize,
}

impl<K, V> PersistentHamt<K, V> {
    /// Creates a new empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_hamt::persistent::PersistentHamt;
    ///
    /// let map: PersistentHamt<String, i32> = PersistentHamt::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: ReferenceCounter::new(Node::empty()),
            count: 0,
        }
    }

    /// Returns the number of entries in the map.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns `true` if both maps share the same root node.
    ///
    /// Maps sharing a root are equal without looking at their contents.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_hamt::persistent::PersistentHamt;
    ///
    /// let map = PersistentHamt::new().assoc(1, "one").unwrap();
    /// assert!(map.ptr_eq(&map.clone()));
    /// assert!(map.ptr_eq(&map.without(&2).unwrap()));
    /// assert!(!map.ptr_eq(&map.without(&1).unwrap()));
    /// ```
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        ReferenceCounter::ptr_eq(&self.root, &other.root)
    }

    /// Returns an iterator over the key-value pairs.
    ///
    /// Iteration order follows the trie layout and is unrelated to
    /// insertion order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.root, self.count)
    }

    /// Returns an iterator over the key-value pairs.
    ///
    /// Equivalent to [`iter`](Self::iter).
    #[inline]
    pub fn items(&self) -> Iter<'_, K, V> {
        self.iter()
    }

    /// Returns an iterator over the keys.
    #[inline]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    /// Returns an iterator over the values.
    #[inline]
    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }

    pub(crate) fn root(&self) -> &Node<K, V> {
        &self.root
    }

    /// Looks up the value stored for `key`.
    ///
    /// The key may be any borrowed form of the map's key type, as long as
    /// its hash and equality agree with the key type's.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError`] if hashing `key` or comparing it with a stored
    /// key fails.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_hamt::persistent::PersistentHamt;
    ///
    /// let map = PersistentHamt::new().assoc("a".to_string(), 1).unwrap();
    /// assert_eq!(map.find("a"), Ok(Some(&1)));
    /// assert_eq!(map.find("b"), Ok(None));
    /// ```
    pub fn find<Q>(&self, key: &Q) -> Result<Option<&V>, TrieError>
    where
        K: Borrow<Q>,
        Q: TryHash + TryEq + ?Sized,
    {
        self.try_find(key)
            .inspect_err(|error| tracing::debug!(%error, "lookup aborted"))
    }

    fn try_find<Q>(&self, key: &Q) -> Result<Option<&V>, TrieError>
    where
        K: Borrow<Q>,
        Q: TryHash + TryEq + ?Sized,
    {
        let hash = reduce(key)?;
        self.root.find(0, hash, key)
    }

    /// Returns the value stored for `key`, or `default` if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError`] if the lookup fails.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_hamt::persistent::PersistentHamt;
    ///
    /// let map = PersistentHamt::new().assoc("a", 1).unwrap();
    /// assert_eq!(map.get_or("a", &0), Ok(&1));
    /// assert_eq!(map.get_or("b", &0), Ok(&0));
    /// ```
    pub fn get_or<'a, Q>(&'a self, key: &Q, default: &'a V) -> Result<&'a V, TrieError>
    where
        K: Borrow<Q>,
        Q: TryHash + TryEq + ?Sized,
    {
        Ok(self.find(key)?.unwrap_or(default))
    }

    /// Returns `true` if the map contains `key`.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError`] if the lookup fails.
    pub fn contains_key<Q>(&self, key: &Q) -> Result<bool, TrieError>
    where
        K: Borrow<Q>,
        Q: TryHash + TryEq + ?Sized,
    {
        Ok(self.find(key)?.is_some())
    }

    /// Returns a map without `key`.
    ///
    /// If `key` is absent the returned map shares this map's root.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError`] if hashing `key` or comparing it with a stored
    /// key fails.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_hamt::persistent::PersistentHamt;
    ///
    /// let map = PersistentHamt::new().assoc("a", 1).unwrap().assoc("b", 2).unwrap();
    /// let removed = map.without("a").unwrap();
    ///
    /// assert_eq!(removed.len(), 1);
    /// assert_eq!(removed.find("a"), Ok(None));
    /// assert_eq!(map.len(), 2);
    /// ```
    pub fn without<Q>(&self, key: &Q) -> Result<Self, TrieError>
    where
        K: Borrow<Q>,
        Q: TryHash + TryEq + ?Sized,
    {
        self.try_without(key)
            .inspect_err(|error| tracing::debug!(%error, "removal aborted"))
    }

    fn try_without<Q>(&self, key: &Q) -> Result<Self, TrieError>
    where
        K: Borrow<Q>,
        Q: TryHash + TryEq + ?Sized,
    {
        let hash = reduce(key)?;
        match self.root.without(0, hash, key)? {
            Without::NotFound => Ok(self.clone()),
            Without::Empty => Ok(Self::new()),
            Without::Replaced(node) => Ok(Self {
                root: ReferenceCounter::new(node),
                count: self.count.saturating_sub(1),
            }),
        }
    }
}

impl<K, V> PersistentHamt<K, V>
where
    K: TryHash + TryEq,
    V: TryEq,
{
    /// Creates a map containing a single entry.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError`] if hashing `key` fails.
    pub fn singleton(key: K, value: V) -> Result<Self, TrieError> {
        Self::new().assoc(key, value)
    }

    /// Builds a map from key-value pairs. Later pairs win over earlier
    /// pairs with an equal key.
    ///
    /// # Errors
    ///
    /// Returns the first [`TrieError`] raised while inserting.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_hamt::persistent::PersistentHamt;
    ///
    /// let map = PersistentHamt::from_entries([(1, "a"), (2, "b"), (1, "c")]).unwrap();
    /// assert_eq!(map.len(), 2);
    /// assert_eq!(map.find(&1), Ok(Some(&"c")));
    /// ```
    pub fn from_entries<I>(entries: I) -> Result<Self, TrieError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        entries
            .into_iter()
            .try_fold(Self::new(), |map, (key, value)| map.assoc(key, value))
    }

    /// Returns a map in which `key` is bound to `value`.
    ///
    /// If `key` is already bound to an equal value the returned map shares
    /// this map's root. Otherwise a new path of nodes is built from the
    /// changed leaf to a new root and everything else is shared. When the
    /// key is replaced, the incoming key is the one stored.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError`] if hashing `key`, comparing keys or comparing
    /// values fails.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_hamt::persistent::PersistentHamt;
    ///
    /// let empty = PersistentHamt::new();
    /// let map = empty.assoc("a", 1).unwrap();
    ///
    /// assert_eq!(empty.len(), 0);
    /// assert_eq!(map.len(), 1);
    /// assert!(map.assoc("a", 1).unwrap().ptr_eq(&map));
    /// ```
    pub fn assoc(&self, key: K, value: V) -> Result<Self, TrieError> {
        self.try_assoc(key, value)
            .inspect_err(|error| tracing::debug!(%error, "insertion aborted"))
    }

    fn try_assoc(&self, key: K, value: V) -> Result<Self, TrieError> {
        let hash = reduce(&key)?;
        let entry = ReferenceCounter::new(Entry::new(hash, key, value));
        match Node::assoc(&self.root, 0, entry)? {
            Assoc::Unchanged => Ok(self.clone()),
            Assoc::Updated { node, added } => Ok(Self {
                root: ReferenceCounter::new(node),
                count: self.count + usize::from(added),
            }),
        }
    }

    /// Compares the contents of two maps.
    ///
    /// Maps are equal when they hold the same keys bound to equal values,
    /// whatever the shape of their tries.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError`] if a lookup in `other` or a value comparison
    /// fails.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_hamt::persistent::PersistentHamt;
    ///
    /// let left = PersistentHamt::from_entries([(1, 'a'), (2, 'b')]).unwrap();
    /// let right = PersistentHamt::from_entries([(2, 'b'), (1, 'a')]).unwrap();
    /// assert_eq!(left.equals(&right), Ok(true));
    /// ```
    pub fn equals(&self, other: &Self) -> Result<bool, TrieError> {
        if self.ptr_eq(other) {
            return Ok(true);
        }
        if self.count != other.count {
            return Ok(false);
        }
        for (key, value) in self {
            match other.find(key)? {
                Some(other_value) if value.try_eq(other_value)? => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<K, V> Clone for PersistentHamt<K, V> {
    fn clone(&self) -> Self {
        Self {
            root: ReferenceCounter::clone(&self.root),
            count: self.count,
        }
    }
}

impl<K, V> Default for PersistentHamt<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K, V> IntoIterator for &'a PersistentHamt<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Maps whose comparison fails are reported as unequal.
impl<K, V> PartialEq for PersistentHamt<K, V>
where
    K: TryHash + TryEq,
    V: TryEq,
{
    fn eq(&self, other: &Self) -> bool {
        matches!(self.equals(other), Ok(true))
    }
}

impl<K, V> Eq for PersistentHamt<K, V>
where
    K: std::hash::Hash + Eq,
    V: Eq,
{
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentHamt<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V> serde::Serialize for PersistentHamt<K, V>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
struct PersistentHamtVisitor<K, V> {
    marker: std::marker::PhantomData<fn() -> PersistentHamt<K, V>>,
}

#[cfg(feature = "serde")]
impl<K, V> PersistentHamtVisitor<K, V> {
    const fn new() -> Self {
        Self {
            marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::de::Visitor<'de> for PersistentHamtVisitor<K, V>
where
    K: serde::Deserialize<'de> + TryHash + TryEq,
    V: serde::Deserialize<'de> + TryEq,
{
    type Value = PersistentHamt<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut map = PersistentHamt::new();
        while let Some((key, value)) = access.next_entry()? {
            map = map.assoc(key, value).map_err(serde::de::Error::custom)?;
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::Deserialize<'de> for PersistentHamt<K, V>
where
    K: serde::Deserialize<'de> + TryHash + TryEq,
    V: serde::Deserialize<'de> + TryEq,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(PersistentHamtVisitor::new())
    }
}

// =============================================================================
// Tests
// =============================================================================
