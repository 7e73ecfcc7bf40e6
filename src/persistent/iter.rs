//! Borrowing iterators over a [`PersistentHamt`](super::PersistentHamt).
//!
//! Traversal is depth-first over an explicit stack of at most
//! [`MAX_TREE_DEPTH`] frames held inline in the iterator. Stepping never
//! allocates and never touches a reference count: every node visited is
//! kept alive by the borrowed map.

use std::fmt;
use std::iter::FusedIterator;

use arrayvec::ArrayVec;

use super::node::{MAX_TREE_DEPTH, Node, Slot};

/// A node being visited and the next position to look at inside it.
struct Frame<'a, K, V> {
    node: &'a Node<K, V>,
    position: usize,
}

impl<K, V> Clone for Frame<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Frame<'_, K, V> {}

// =============================================================================
// Iter
// =============================================================================

/// An iterator over the key-value pairs of a
/// [`PersistentHamt`](super::PersistentHamt).
///
/// Pairs are produced in trie order, which depends on the keys' hashes and
/// not on insertion order.
pub struct Iter<'a, K, V> {
    stack: ArrayVec<Frame<'a, K, V>, MAX_TREE_DEPTH>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(root: &'a Node<K, V>, len: usize) -> Self {
        let mut stack = ArrayVec::new();
        if len > 0 {
            stack.push(Frame {
                node: root,
                position: 0,
            });
        }
        Self {
            stack,
            remaining: len,
        }
    }

    fn descend(&mut self, node: &'a Node<K, V>) {
        self.stack.push(Frame { node, position: 0 });
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let node: &'a Node<K, V> = frame.node;
            let position = frame.position;

            match node {
                Node::Bitmap(bitmap) => match bitmap.slots().get(position) {
                    None => {
                        self.stack.pop();
                    }
                    Some(Slot::Entry(entry)) => {
                        frame.position = position + 1;
                        self.remaining = self.remaining.saturating_sub(1);
                        return Some((&entry.key, &entry.value));
                    }
                    Some(Slot::Node(child)) => {
                        frame.position = position + 1;
                        self.descend(child);
                    }
                },
                Node::Array(array) => match array.next_child(position) {
                    None => {
                        self.stack.pop();
                    }
                    Some((index, child)) => {
                        frame.position = index + 1;
                        self.descend(child);
                    }
                },
                Node::Collision(collision) => match collision.entries().get(position) {
                    None => {
                        self.stack.pop();
                    }
                    Some(entry) => {
                        frame.position = position + 1;
                        self.remaining = self.remaining.saturating_sub(1);
                        return Some((&entry.key, &entry.value));
                    }
                },
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

impl<K, V> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Iter")
            .field("depth", &self.stack.len())
            .field("remaining", &self.remaining)
            .finish()
    }
}

// =============================================================================
// Keys and Values
// =============================================================================

/// An iterator over the keys of a [`PersistentHamt`](super::PersistentHamt).
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(crate) const fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> fmt::Debug for Keys<'_, K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Keys").field("inner", &self.inner).finish()
    }
}

/// An iterator over the values of a [`PersistentHamt`](super::PersistentHamt).
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Values<'a, K, V> {
    pub(crate) const fn new(inner: Iter<'a, K, V>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> fmt::Debug for Values<'_, K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Values").field("inner", &self.inner).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::persistent::PersistentHamt;
    use rstest::rstest;
    use std::collections::HashSet;

    fn build(count: i32) -> PersistentHamt<i32, i32> {
        PersistentHamt::from_entries((0..count).map(|key| (key, key * 2)))
            .unwrap_or_else(|error| panic!("unexpected error: {error}"))
    }

    #[rstest]
    fn test_empty_map_yields_nothing() {
        let map: PersistentHamt<i32, i32> = PersistentHamt::new();
        let mut iter = map.iter();
        assert_eq!(iter.len(), 0);
        assert_eq!(iter.next(), None);
    }

    #[rstest]
    #[case(1)]
    #[case(15)]
    #[case(16)]
    #[case(1000)]
    fn test_every_pair_is_yielded_once(#[case] count: i32) {
        let map = build(count);
        let seen: HashSet<i32> = map.iter().map(|(key, _)| *key).collect();
        assert_eq!(seen, (0..count).collect::<HashSet<_>>());
        assert!(map.iter().all(|(key, value)| *value == key * 2));
    }

    #[rstest]
    fn test_len_counts_down() {
        let map = build(40);
        let mut iter = map.iter();
        assert_eq!(iter.len(), 40);
        iter.next();
        iter.next();
        assert_eq!(iter.size_hint(), (38, Some(38)));
        assert_eq!(iter.by_ref().count(), 38);
        assert_eq!(iter.len(), 0);
    }

    #[rstest]
    fn test_exhausted_iterator_stays_exhausted() {
        let map = build(3);
        let mut iter = map.iter();
        assert_eq!(iter.by_ref().count(), 3);
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }

    #[rstest]
    fn test_clone_resumes_independently() {
        let map = build(20);
        let mut iter = map.iter();
        iter.next();
        let rest: Vec<_> = iter.clone().collect();
        assert_eq!(rest.len(), 19);
        assert_eq!(iter.collect::<Vec<_>>(), rest);
    }

    #[rstest]
    fn test_keys_and_values_follow_pair_order() {
        let map = build(50);
        let pairs: Vec<_> = map.iter().collect();
        let keys: Vec<_> = map.keys().collect();
        let values: Vec<_> = map.values().collect();
        assert_eq!(keys, pairs.iter().map(|(key, _)| *key).collect::<Vec<_>>());
        assert_eq!(values, pairs.iter().map(|(_, value)| *value).collect::<Vec<_>>());
        assert_eq!(map.keys().len(), 50);
    }

    /// Neither `Clone` nor `Debug`.
    #[derive(Hash, PartialEq, Eq)]
    struct Opaque(u8);

    #[rstest]
    fn test_keys_and_values_clone_without_cloneable_entries() {
        let map = PersistentHamt::from_entries((0..20).map(|index| (Opaque(index), Opaque(index))))
            .unwrap_or_else(|error| panic!("unexpected error: {error}"));

        let mut keys = map.keys();
        keys.next();
        let resumed = keys.clone();
        assert_eq!(resumed.len(), 19);
        assert_eq!(
            keys.map(|key| key.0).collect::<Vec<_>>(),
            resumed.map(|key| key.0).collect::<Vec<_>>()
        );

        let values = map.values();
        assert_eq!(values.clone().count(), 20);
        assert_eq!(values.map(|value| u32::from(value.0)).sum::<u32>(), (0..20).sum());
    }

    #[rstest]
    fn test_keys_and_values_debug_without_debuggable_entries() {
        let map = PersistentHamt::singleton(Opaque(1), Opaque(2))
            .unwrap_or_else(|error| panic!("unexpected error: {error}"));

        assert!(format!("{:?}", map.keys()).starts_with("Keys"));
        assert!(format!("{:?}", map.values()).starts_with("Values"));
    }
}
