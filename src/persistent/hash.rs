//! Hash reduction for trie indexing.
//!
//! Keys supply a native 64-bit hash through [`TryHash`]. The trie only
//! consumes 32 bits of it: [`fold`] XORs the high and low halves together,
//! and every trie level then reads the next 5-bit fragment of the result.
//!
//! The folding must stay exactly as it is. Structural tests pin down
//! tree shapes that are derived from it.

use std::hash::{Hash, Hasher};

use super::error::HashError;

#[cfg(feature = "fxhash")]
type KeyHasher = rustc_hash::FxHasher;

#[cfg(all(feature = "ahash", not(feature = "fxhash")))]
type KeyHasher = ahash::AHasher;

#[cfg(not(any(feature = "fxhash", feature = "ahash")))]
type KeyHasher = std::collections::hash_map::DefaultHasher;

/// Number of hash bits consumed by one trie level.
pub(crate) const BITS_PER_LEVEL: u32 = 5;

/// Mask selecting one 5-bit fragment.
const FRAGMENT_MASK: u32 = (1 << BITS_PER_LEVEL) - 1;

/// A key that can produce a native hash, possibly failing.
///
/// Every `T: Hash` gets an implementation that never fails. Types whose
/// hashing can fail implement this trait by hand instead of [`Hash`].
///
/// # Examples
///
/// ```rust
/// use persistent_hamt::persistent::{HashError, TryHash};
///
/// struct Opaque;
///
/// impl TryHash for Opaque {
///     fn try_hash(&self) -> Result<u64, HashError> {
///         Err(HashError::new("opaque values are unhashable"))
///     }
/// }
///
/// assert!(Opaque.try_hash().is_err());
/// assert!("key".try_hash().is_ok());
/// ```
pub trait TryHash {
    /// Returns the native hash of `self`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the hash cannot be computed.
    fn try_hash(&self) -> Result<u64, HashError>;
}

impl<T: Hash + ?Sized> TryHash for T {
    #[inline]
    fn try_hash(&self) -> Result<u64, HashError> {
        Ok(compute_hash(self))
    }
}

/// Hashes a value with the hasher selected at build time.
fn compute_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = KeyHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Folds a native 64-bit hash into the 32-bit hash used for indexing.
///
/// # Examples
///
/// ```rust
/// use persistent_hamt::persistent::fold;
///
/// assert_eq!(fold(0x0000_0001_0000_0003), 2);
/// assert_eq!(fold(42), 42);
/// ```
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub const fn fold(native: u64) -> i32 {
    ((native & 0xffff_ffff) as u32 ^ (native >> 32) as u32) as i32
}

/// Computes the reduced 32-bit hash of a key.
///
/// # Errors
///
/// Returns [`HashError`] if the key fails to hash.
#[inline]
pub fn reduce<Q: TryHash + ?Sized>(key: &Q) -> Result<i32, HashError> {
    key.try_hash().map(fold)
}

/// Extracts the 5-bit fragment of `hash` at `shift`.
#[inline]
#[allow(clippy::cast_sign_loss)]
pub(crate) const fn fragment(hash: i32, shift: u32) -> usize {
    let bits = match (hash as u32).checked_shr(shift) {
        Some(bits) => bits,
        None => 0,
    };
    (bits & FRAGMENT_MASK) as usize
}

/// Returns the bitmap bit owning the fragment of `hash` at `shift`.
#[inline]
pub(crate) const fn bit_position(hash: i32, shift: u32) -> u32 {
    1 << fragment(hash, shift)
}

/// Returns the slot index of `bit` within a compacted bitmap node.
#[inline]
pub(crate) const fn bit_index(bitmap: u32, bit: u32) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}
