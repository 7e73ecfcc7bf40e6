//! Nodes for keys whose reduced hashes are identical.

use std::borrow::Borrow;

use smallvec::{SmallVec, smallvec};

use super::{Assoc, BitmapNode, Entry, Node, Without, compare_entries};
use crate::persistent::ReferenceCounter;
use crate::persistent::compare::TryEq;
use crate::persistent::error::TrieError;

type Entries<K, V> = SmallVec<[ReferenceCounter<Entry<K, V>>; 2]>;

/// Two or more entries sharing one reduced hash, kept in insertion order.
pub(crate) struct CollisionNode<K, V> {
    hash: i32,
    entries: Entries<K, V>,
}

impl<K, V> CollisionNode<K, V> {
    fn from_parts(hash: i32, entries: Entries<K, V>) -> Self {
        debug_assert!(entries.len() >= 2);
        debug_assert!(entries.iter().all(|entry| entry.hash == hash));
        Self { hash, entries }
    }

    /// Creates a node from two entries with equal hashes and distinct keys.
    pub(crate) fn pair(
        existing: ReferenceCounter<Entry<K, V>>,
        entry: ReferenceCounter<Entry<K, V>>,
    ) -> Self {
        Self::from_parts(existing.hash, smallvec![existing, entry])
    }

    pub(crate) const fn hash(&self) -> i32 {
        self.hash
    }

    pub(crate) fn entries(&self) -> &[ReferenceCounter<Entry<K, V>>] {
        &self.entries
    }

    fn position<Q>(&self, key: &Q) -> Result<Option<usize>, TrieError>
    where
        K: Borrow<Q>,
        Q: TryEq + ?Sized,
    {
        for (index, entry) in self.entries.iter().enumerate() {
            let stored: &Q = entry.key.borrow();
            if stored.try_eq(key)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Inserts `entry` into the collision node `this`, found at depth `shift`.
    ///
    /// An entry with a different hash cannot join the node. The node is then
    /// wrapped in a single-slot bitmap node at the same depth, which takes
    /// the insertion instead.
    pub(crate) fn assoc(
        &self,
        this: &ReferenceCounter<Node<K, V>>,
        shift: u32,
        entry: ReferenceCounter<Entry<K, V>>,
    ) -> Result<Assoc<K, V>, TrieError>
    where
        K: TryEq,
        V: TryEq,
    {
        if entry.hash != self.hash {
            tracing::trace!(shift, hash = self.hash, "wrapping collision node in bitmap node");
            let wrapper = BitmapNode::wrapping(shift, self.hash, ReferenceCounter::clone(this));
            return wrapper.assoc(shift, entry);
        }

        for (index, existing) in self.entries.iter().enumerate() {
            match compare_entries(existing, &entry)? {
                None => {}
                Some(true) => return Ok(Assoc::Unchanged),
                Some(false) => {
                    let mut entries = self.entries.clone();
                    entries[index] = entry;
                    return Ok(Assoc::Updated {
                        node: Node::Collision(Self::from_parts(self.hash, entries)),
                        added: false,
                    });
                }
            }
        }

        let mut entries = Entries::with_capacity(self.entries.len() + 1);
        entries.extend(self.entries.iter().cloned());
        entries.push(entry);
        Ok(Assoc::Updated {
            node: Node::Collision(Self::from_parts(self.hash, entries)),
            added: true,
        })
    }

    pub(crate) fn without<Q>(&self, shift: u32, hash: i32, key: &Q) -> Result<Without<K, V>, TrieError>
    where
        K: Borrow<Q>,
        Q: TryEq + ?Sized,
    {
        if hash != self.hash {
            return Ok(Without::NotFound);
        }
        let Some(index) = self.position(key)? else {
            return Ok(Without::NotFound);
        };

        match self.entries.len() {
            0 | 1 => Ok(Without::Empty),
            2 => {
                let survivor = ReferenceCounter::clone(&self.entries[1 - index]);
                tracing::trace!(shift, hash, "dissolving collision node");
                Ok(Without::Replaced(Node::Bitmap(BitmapNode::single(shift, survivor))))
            }
            _ => {
                let entries = self
                    .entries
                    .iter()
                    .enumerate()
                    .filter(|(position, _)| *position != index)
                    .map(|(_, entry)| ReferenceCounter::clone(entry))
                    .collect();
                Ok(Without::Replaced(Node::Collision(Self::from_parts(hash, entries))))
            }
        }
    }

    pub(crate) fn find<Q>(&self, hash: i32, key: &Q) -> Result<Option<&V>, TrieError>
    where
        K: Borrow<Q>,
        Q: TryEq + ?Sized,
    {
        if hash != self.hash {
            return Ok(None);
        }
        Ok(self
            .position(key)?
            .map(|index| &self.entries[index].value))
    }
}
