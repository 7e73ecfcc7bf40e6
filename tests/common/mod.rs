//! Key and value types shared by the integration tests.

#![allow(dead_code)]

use persistent_hamt::persistent::{CompareError, HashError, PersistentHamt, TrieError, TryEq, TryHash};
use std::fmt;

// =============================================================================
// Keys with chosen hashes
// =============================================================================

/// A key whose native hash is chosen by the test.
///
/// Hashes below 2^32 fold to themselves, so tests can lay out trie shapes
/// fragment by fragment.
#[derive(Clone, PartialEq, Eq)]
pub struct HashKey {
    pub name: &'static str,
    pub hash: u64,
}

impl HashKey {
    pub const fn new(name: &'static str, hash: u64) -> Self {
        Self { name, hash }
    }
}

impl fmt::Debug for HashKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name)
    }
}

impl TryHash for HashKey {
    fn try_hash(&self) -> Result<u64, HashError> {
        Ok(self.hash)
    }
}

// =============================================================================
// Keys and values with injectable failures
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    None,
    Hash,
    Compare,
}

/// A key whose hashing or comparison can be made to fail.
#[derive(Clone, Debug)]
pub struct ProbeKey {
    pub name: &'static str,
    pub hash: u64,
    pub fault: Fault,
}

impl ProbeKey {
    pub const fn healthy(name: &'static str, hash: u64) -> Self {
        Self {
            name,
            hash,
            fault: Fault::None,
        }
    }

    pub const fn unhashable(name: &'static str) -> Self {
        Self {
            name,
            hash: 0,
            fault: Fault::Hash,
        }
    }

    pub const fn incomparable(name: &'static str, hash: u64) -> Self {
        Self {
            name,
            hash,
            fault: Fault::Compare,
        }
    }
}

impl TryHash for ProbeKey {
    fn try_hash(&self) -> Result<u64, HashError> {
        match self.fault {
            Fault::Hash => Err(HashError::new(format!("cannot hash {}", self.name))),
            Fault::None | Fault::Compare => Ok(self.hash),
        }
    }
}

impl TryEq for ProbeKey {
    fn try_eq(&self, other: &Self) -> Result<bool, CompareError> {
        if self.fault == Fault::Compare || other.fault == Fault::Compare {
            return Err(CompareError::new(format!(
                "cannot compare {} with {}",
                self.name, other.name
            )));
        }
        Ok(self.name == other.name)
    }
}

/// A value whose comparison always fails.
#[derive(Clone, Debug)]
pub struct Brittle(pub i32);

impl TryEq for Brittle {
    fn try_eq(&self, _other: &Self) -> Result<bool, CompareError> {
        Err(CompareError::new("brittle values cannot be compared"))
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Unwraps a trie result, failing the test with the error's message.
pub fn ok<T>(result: Result<T, TrieError>) -> T {
    result.unwrap_or_else(|error| panic!("unexpected trie error: {error}"))
}

/// Builds a map from keys with chosen hashes, valued by insertion index.
pub fn hashed_map(keys: &[HashKey]) -> PersistentHamt<HashKey, usize> {
    ok(PersistentHamt::from_entries(
        keys.iter().cloned().enumerate().map(|(index, key)| (key, index)),
    ))
}

/// Returns the map's pairs sorted by key name.
pub fn sorted_pairs<V: Clone>(map: &PersistentHamt<HashKey, V>) -> Vec<(&'static str, V)> {
    let mut pairs: Vec<_> = map.iter().map(|(key, value)| (key.name, value.clone())).collect();
    pairs.sort_by_key(|(name, _)| *name);
    pairs
}

/// Returns the second line of a dump, which describes the root node.
pub fn root_line<K: fmt::Debug, V: fmt::Debug>(map: &PersistentHamt<K, V>) -> String {
    map.dump().lines().nth(1).unwrap_or_default().trim().to_string()
}

/// Distinct names for keys laid out one per fragment.
pub const NAMES: [&str; 32] = [
    "k00", "k01", "k02", "k03", "k04", "k05", "k06", "k07",
    "k08", "k09", "k10", "k11", "k12", "k13", "k14", "k15",
    "k16", "k17", "k18", "k19", "k20", "k21", "k22", "k23",
    "k24", "k25", "k26", "k27", "k28", "k29", "k30", "k31",
];

/// Returns keys whose hashes are `0..count`, one per root fragment.
pub fn fragment_keys(count: usize) -> Vec<HashKey> {
    NAMES
        .iter()
        .copied()
        .take(count)
        .zip(0_u64..)
        .map(|(name, hash)| HashKey::new(name, hash))
        .collect()
}
