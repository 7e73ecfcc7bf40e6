//! Fallible equality for keys and values.

use super::error::CompareError;

/// An equality predicate that may fail.
///
/// Every `T: PartialEq` gets an implementation that never fails. Key or
/// value types whose comparison can fail implement this trait by hand
/// instead of [`PartialEq`].
///
/// # Examples
///
/// ```rust
/// use persistent_hamt::persistent::TryEq;
///
/// assert_eq!(1.try_eq(&1), Ok(true));
/// assert_eq!("a".try_eq("b"), Ok(false));
/// ```
pub trait TryEq {
    /// Returns whether `self` equals `other`.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError`] if the two values cannot be compared.
    fn try_eq(&self, other: &Self) -> Result<bool, CompareError>;
}

impl<T: PartialEq + ?Sized> TryEq for T {
    #[inline]
    fn try_eq(&self, other: &Self) -> Result<bool, CompareError> {
        Ok(self == other)
    }
}
