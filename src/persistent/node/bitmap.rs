//! Sparse bitmap-indexed nodes.

use std::borrow::Borrow;

use smallvec::{SmallVec, smallvec};

use super::{
    ARRAY_THRESHOLD, ArrayNode, Assoc, BRANCHING_FACTOR, Entry, Node, Slot, Without, compare_entries,
    fork,
};
use crate::persistent::ReferenceCounter;
use crate::persistent::compare::TryEq;
use crate::persistent::error::TrieError;
use crate::persistent::hash::{BITS_PER_LEVEL, bit_index, bit_position, fragment};

pub(crate) type Slots<K, V> = SmallVec<[Slot<K, V>; 4]>;

/// A node storing one compacted slot per set bit of `bitmap`.
///
/// Bit `i` is set iff the node owns fragment `i` at its depth. The slot for
/// a set bit lives at the number of set bits below it.
pub(crate) struct BitmapNode<K, V> {
    bitmap: u32,
    slots: Slots<K, V>,
}

impl<K, V> BitmapNode<K, V> {
    /// Creates a node with no slots.
    pub(crate) fn empty() -> Self {
        Self {
            bitmap: 0,
            slots: SmallVec::new(),
        }
    }

    pub(crate) fn from_parts(bitmap: u32, slots: Slots<K, V>) -> Self {
        debug_assert_eq!(bitmap.count_ones() as usize, slots.len());
        debug_assert!(slots.len() < ARRAY_THRESHOLD);
        Self { bitmap, slots }
    }

    /// Creates a node at depth `shift` holding only `entry`.
    pub(crate) fn single(shift: u32, entry: ReferenceCounter<Entry<K, V>>) -> Self {
        Self::from_parts(bit_position(entry.hash, shift), smallvec![Slot::Entry(entry)])
    }

    /// Creates a node at depth `shift` whose only slot is `node`, placed at
    /// the fragment of `hash`.
    pub(crate) fn wrapping(shift: u32, hash: i32, node: ReferenceCounter<Node<K, V>>) -> Self {
        Self::from_parts(bit_position(hash, shift), smallvec![Slot::Node(node)])
    }

    /// Creates a node at depth `shift` holding two entries with different
    /// reduced hashes.
    pub(crate) fn fork(
        shift: u32,
        existing: ReferenceCounter<Entry<K, V>>,
        entry: ReferenceCounter<Entry<K, V>>,
    ) -> Self {
        debug_assert_ne!(existing.hash, entry.hash);
        let existing_bit = bit_position(existing.hash, shift);
        let entry_bit = bit_position(entry.hash, shift);
        if existing_bit == entry_bit {
            let hash = entry.hash;
            let child = fork(shift + BITS_PER_LEVEL, existing, entry);
            return Self::wrapping(shift, hash, ReferenceCounter::new(child));
        }
        let slots = if existing_bit < entry_bit {
            smallvec![Slot::Entry(existing), Slot::Entry(entry)]
        } else {
            smallvec![Slot::Entry(entry), Slot::Entry(existing)]
        };
        Self::from_parts(existing_bit | entry_bit, slots)
    }

    pub(crate) const fn bitmap(&self) -> u32 {
        self.bitmap
    }

    pub(crate) fn slots(&self) -> &[Slot<K, V>] {
        &self.slots
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns the entry of a node holding exactly one slot that is an entry.
    pub(crate) fn sole_entry(&self) -> Option<&ReferenceCounter<Entry<K, V>>> {
        match self.slots.as_slice() {
            [Slot::Entry(entry)] => Some(entry),
            _ => None,
        }
    }

    /// Iterates the fragments owned by this node in slot order.
    pub(crate) fn fragments(&self) -> impl Iterator<Item = usize> + '_ {
        let bitmap = self.bitmap;
        (0..BRANCHING_FACTOR).filter(move |index| bitmap & (1 << *index) != 0)
    }

    fn with_slot(&self, index: usize, slot: Slot<K, V>) -> Self {
        let mut slots = self.slots.clone();
        slots[index] = slot;
        Self::from_parts(self.bitmap, slots)
    }

    fn with_inserted(&self, bit: u32, index: usize, slot: Slot<K, V>) -> Self {
        let mut slots = Slots::with_capacity(self.slots.len() + 1);
        slots.extend(self.slots[..index].iter().cloned());
        slots.push(slot);
        slots.extend(self.slots[index..].iter().cloned());
        Self::from_parts(self.bitmap | bit, slots)
    }

    fn without_slot(&self, bit: u32, index: usize) -> Self {
        let slots = self
            .slots
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != index)
            .map(|(_, slot)| slot.clone())
            .collect();
        Self::from_parts(self.bitmap & !bit, slots)
    }

    fn removing(&self, bit: u32, index: usize) -> Without<K, V> {
        if self.slots.len() == 1 {
            Without::Empty
        } else {
            Without::Replaced(Node::Bitmap(self.without_slot(bit, index)))
        }
    }

    /// Spreads every slot and the new entry into a dense node.
    ///
    /// Entries become single-entry bitmap children one level deeper.
    fn promote(&self, shift: u32, entry: ReferenceCounter<Entry<K, V>>) -> ArrayNode<K, V> {
        let child_shift = shift + BITS_PER_LEVEL;
        let mut children: [Option<ReferenceCounter<Node<K, V>>>; BRANCHING_FACTOR] =
            std::array::from_fn(|_| None);
        for (index, slot) in self.fragments().zip(self.slots.iter()) {
            children[index] = Some(match slot {
                Slot::Node(node) => ReferenceCounter::clone(node),
                Slot::Entry(existing) => ReferenceCounter::new(Node::Bitmap(Self::single(
                    child_shift,
                    ReferenceCounter::clone(existing),
                ))),
            });
        }
        let index = fragment(entry.hash, shift);
        children[index] = Some(ReferenceCounter::new(Node::Bitmap(Self::single(
            child_shift,
            entry,
        ))));
        let population = self.slots.len() + 1;
        tracing::trace!(shift, population, "promoting bitmap node to array node");
        ArrayNode::from_parts(population, children)
    }

    pub(crate) fn assoc(
        &self,
        shift: u32,
        entry: ReferenceCounter<Entry<K, V>>,
    ) -> Result<Assoc<K, V>, TrieError>
    where
        K: TryEq,
        V: TryEq,
    {
        let bit = bit_position(entry.hash, shift);
        let index = bit_index(self.bitmap, bit);

        if self.bitmap & bit == 0 {
            let node = if self.slots.len() + 1 >= ARRAY_THRESHOLD {
                Node::Array(self.promote(shift, entry))
            } else {
                Node::Bitmap(self.with_inserted(bit, index, Slot::Entry(entry)))
            };
            return Ok(Assoc::Updated { node, added: true });
        }

        match &self.slots[index] {
            Slot::Node(child) => match Node::assoc(child, shift + BITS_PER_LEVEL, entry)? {
                Assoc::Unchanged => Ok(Assoc::Unchanged),
                Assoc::Updated { node, added } => Ok(Assoc::Updated {
                    node: Node::Bitmap(self.with_slot(index, Slot::Node(ReferenceCounter::new(node)))),
                    added,
                }),
            },
            Slot::Entry(existing) => match compare_entries(existing, &entry)? {
                Some(true) => Ok(Assoc::Unchanged),
                Some(false) => Ok(Assoc::Updated {
                    node: Node::Bitmap(self.with_slot(index, Slot::Entry(entry))),
                    added: false,
                }),
                None => {
                    let child = fork(shift + BITS_PER_LEVEL, ReferenceCounter::clone(existing), entry);
                    Ok(Assoc::Updated {
                        node: Node::Bitmap(
                            self.with_slot(index, Slot::Node(ReferenceCounter::new(child))),
                        ),
                        added: true,
                    })
                }
            },
        }
    }

    pub(crate) fn without<Q>(&self, shift: u32, hash: i32, key: &Q) -> Result<Without<K, V>, TrieError>
    where
        K: Borrow<Q>,
        Q: TryEq + ?Sized,
    {
        let bit = bit_position(hash, shift);
        if self.bitmap & bit == 0 {
            return Ok(Without::NotFound);
        }
        let index = bit_index(self.bitmap, bit);

        match &self.slots[index] {
            Slot::Node(child) => match child.without(shift + BITS_PER_LEVEL, hash, key)? {
                Without::NotFound => Ok(Without::NotFound),
                Without::Empty => Ok(self.removing(bit, index)),
                Without::Replaced(node) => {
                    let inlined = node.inlinable_entry().map(ReferenceCounter::clone);
                    let slot = match inlined {
                        Some(entry) => Slot::Entry(entry),
                        None => Slot::Node(ReferenceCounter::new(node)),
                    };
                    Ok(Without::Replaced(Node::Bitmap(self.with_slot(index, slot))))
                }
            },
            Slot::Entry(existing) => {
                let stored: &Q = existing.key.borrow();
                if stored.try_eq(key)? {
                    Ok(self.removing(bit, index))
                } else {
                    Ok(Without::NotFound)
                }
            }
        }
    }

    pub(crate) fn find<Q>(&self, shift: u32, hash: i32, key: &Q) -> Result<Option<&V>, TrieError>
    where
        K: Borrow<Q>,
        Q: TryEq + ?Sized,
    {
        let bit = bit_position(hash, shift);
        if self.bitmap & bit == 0 {
            return Ok(None);
        }
        match &self.slots[bit_index(self.bitmap, bit)] {
            Slot::Node(child) => child.find(shift + BITS_PER_LEVEL, hash, key),
            Slot::Entry(existing) => {
                let stored: &Q = existing.key.borrow();
                Ok(stored.try_eq(key)?.then_some(&existing.value))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    type TestNode = Node<i32, &'static str>;

    fn entry(hash: i32, value: &'static str) -> ReferenceCounter<Entry<i32, &'static str>> {
        ReferenceCounter::new(Entry::new(hash, hash, value))
    }

    fn insert(node: &ReferenceCounter<TestNode>, hash: i32, value: &'static str) -> ReferenceCounter<TestNode> {
        match Node::assoc(node, 0, entry(hash, value)) {
            Ok(Assoc::Updated { node, .. }) => ReferenceCounter::new(node),
            Ok(Assoc::Unchanged) => ReferenceCounter::clone(node),
            Err(error) => panic!("unexpected error: {error}"),
        }
    }

    fn build(hashes: impl IntoIterator<Item = i32>) -> ReferenceCounter<TestNode> {
        hashes
            .into_iter()
            .fold(ReferenceCounter::new(Node::empty()), |node, hash| insert(&node, hash, "v"))
    }

    fn as_bitmap(node: &TestNode) -> &BitmapNode<i32, &'static str> {
        match node {
            Node::Bitmap(bitmap) => bitmap,
            other => panic!("expected a bitmap node, found {}", other.kind()),
        }
    }

    #[rstest]
    fn test_slots_follow_fragment_order() {
        let node = build([9, 3, 27, 0]);
        let bitmap = as_bitmap(&node);
        assert_eq!(bitmap.bitmap(), (1 << 0) | (1 << 3) | (1 << 9) | (1 << 27));
        assert_eq!(bitmap.fragments().collect::<Vec<_>>(), vec![0, 3, 9, 27]);
        let hashes: Vec<i32> = bitmap
            .slots()
            .iter()
            .map(|slot| match slot {
                Slot::Entry(entry) => entry.hash,
                Slot::Node(_) => panic!("unexpected sub-node"),
            })
            .collect();
        assert_eq!(hashes, vec![0, 3, 9, 27]);
    }

    #[rstest]
    fn test_equal_value_is_unchanged() {
        let node = build([1]);
        assert!(matches!(
            Node::assoc(&node, 0, entry(1, "v")),
            Ok(Assoc::Unchanged)
        ));
    }

    #[rstest]
    fn test_new_value_replaces_without_growing() {
        let node = build([1, 2]);
        match Node::assoc(&node, 0, entry(1, "w")) {
            Ok(Assoc::Updated { node, added }) => {
                assert!(!added);
                assert_eq!(node.find(0, 1, &1), Ok(Some(&"w")));
                assert_eq!(node.find(0, 2, &2), Ok(Some(&"v")));
            }
            _ => panic!("expected an updated node"),
        }
    }

    #[rstest]
    fn test_fifteen_fragments_stay_bitmap() {
        let node = build(0..15);
        assert_eq!(as_bitmap(&node).len(), 15);
    }

    #[rstest]
    fn test_sixteenth_fragment_promotes() {
        let node = build(0..16);
        match node.as_ref() {
            Node::Array(array) => assert_eq!(array.count(), 16),
            other => panic!("expected an array node, found {}", other.kind()),
        }
        for hash in 0..16 {
            assert_eq!(node.find(0, hash, &hash), Ok(Some(&"v")));
        }
    }

    #[rstest]
    fn test_shared_fragment_forks_one_level_down() {
        let node = build([1, 1 | (1 << 5)]);
        let bitmap = as_bitmap(&node);
        assert_eq!(bitmap.len(), 1);
        assert!(matches!(bitmap.slots()[0], Slot::Node(_)));
        assert_eq!(node.entry_count(), 2);
    }

    #[rstest]
    fn test_removing_nested_entry_inlines_survivor() {
        let node = build([1, 1 | (1 << 5), 2]);
        let Ok(Without::Replaced(remaining)) = node.without(0, 1 | (1 << 5), &(1 | (1 << 5))) else {
            panic!("expected a replaced node");
        };
        let bitmap = as_bitmap(&remaining);
        assert_eq!(bitmap.len(), 2);
        assert!(bitmap.slots().iter().all(|slot| matches!(slot, Slot::Entry(_))));
    }

    #[rstest]
    fn test_removing_last_entry_signals_empty() {
        let node = build([4]);
        assert!(matches!(node.without(0, 4, &4), Ok(Without::Empty)));
    }

    #[rstest]
    fn test_missing_key_is_not_found() {
        let node = build([4]);
        assert!(matches!(node.without(0, 5, &5), Ok(Without::NotFound)));
        assert!(matches!(node.without(0, 4 | (1 << 5), &99), Ok(Without::NotFound)));
        assert_eq!(node.find(0, 5, &5), Ok(None));
    }
}
