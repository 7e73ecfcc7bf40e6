//! Dense array nodes.

use std::borrow::Borrow;

use super::bitmap::Slots;
use super::{ARRAY_THRESHOLD, Assoc, BRANCHING_FACTOR, BitmapNode, Entry, Node, Slot, Without};
use crate::persistent::ReferenceCounter;
use crate::persistent::compare::TryEq;
use crate::persistent::error::TrieError;
use crate::persistent::hash::{BITS_PER_LEVEL, fragment};

type Children<K, V> = [Option<ReferenceCounter<Node<K, V>>>; BRANCHING_FACTOR];

/// A node addressing its children directly by fragment.
///
/// `count` is the number of occupied children and never drops below
/// [`ARRAY_THRESHOLD`].
pub(crate) struct ArrayNode<K, V> {
    count: usize,
    children: Children<K, V>,
}

impl<K, V> ArrayNode<K, V> {
    pub(crate) fn from_parts(count: usize, children: Children<K, V>) -> Self {
        debug_assert_eq!(children.iter().flatten().count(), count);
        debug_assert!(count >= ARRAY_THRESHOLD);
        Self { count, children }
    }

    pub(crate) const fn count(&self) -> usize {
        self.count
    }

    pub(crate) const fn children(&self) -> &Children<K, V> {
        &self.children
    }

    /// Returns the first occupied child at or after `position`.
    pub(crate) fn next_child(&self, position: usize) -> Option<(usize, &Node<K, V>)> {
        self.children
            .iter()
            .enumerate()
            .skip(position)
            .find_map(|(index, child)| child.as_deref().map(|child| (index, child)))
    }

    fn with_child(
        &self,
        index: usize,
        child: Option<ReferenceCounter<Node<K, V>>>,
        count: usize,
    ) -> Self {
        let mut children = self.children.clone();
        children[index] = child;
        Self::from_parts(count, children)
    }

    /// Flattens every child except `skipped` into a bitmap node.
    ///
    /// Single-entry bitmap children are inlined as entries.
    fn demote(&self, shift: u32, skipped: usize) -> BitmapNode<K, V> {
        let mut bitmap = 0_u32;
        let mut slots = Slots::new();
        for (index, child) in self.children.iter().enumerate() {
            let Some(child) = child else {
                continue;
            };
            if index == skipped {
                continue;
            }
            bitmap |= 1 << index;
            slots.push(match child.inlinable_entry() {
                Some(entry) => Slot::Entry(ReferenceCounter::clone(entry)),
                None => Slot::Node(ReferenceCounter::clone(child)),
            });
        }
        tracing::trace!(
            shift,
            population = slots.len(),
            "demoting array node to bitmap node"
        );
        BitmapNode::from_parts(bitmap, slots)
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
        let index = fragment(entry.hash, shift);
        match &self.children[index] {
            None => {
                let child = Node::Bitmap(BitmapNode::single(shift + BITS_PER_LEVEL, entry));
                Ok(Assoc::Updated {
                    node: Node::Array(self.with_child(
                        index,
                        Some(ReferenceCounter::new(child)),
                        self.count + 1,
                    )),
                    added: true,
                })
            }
            Some(child) => match Node::assoc(child, shift + BITS_PER_LEVEL, entry)? {
                Assoc::Unchanged => Ok(Assoc::Unchanged),
                Assoc::Updated { node, added } => Ok(Assoc::Updated {
                    node: Node::Array(self.with_child(
                        index,
                        Some(ReferenceCounter::new(node)),
                        self.count,
                    )),
                    added,
                }),
            },
        }
    }

    pub(crate) fn without<Q>(&self, shift: u32, hash: i32, key: &Q) -> Result<Without<K, V>, TrieError>
    where
        K: Borrow<Q>,
        Q: TryEq + ?Sized,
    {
        let index = fragment(hash, shift);
        let Some(child) = &self.children[index] else {
            return Ok(Without::NotFound);
        };

        match child.without(shift + BITS_PER_LEVEL, hash, key)? {
            Without::NotFound => Ok(Without::NotFound),
            Without::Replaced(node) => Ok(Without::Replaced(Node::Array(self.with_child(
                index,
                Some(ReferenceCounter::new(node)),
                self.count,
            )))),
            Without::Empty => {
                let remaining = self.count - 1;
                if remaining == 0 {
                    Ok(Without::Empty)
                } else if remaining >= ARRAY_THRESHOLD {
                    Ok(Without::Replaced(Node::Array(
                        self.with_child(index, None, remaining),
                    )))
                } else {
                    Ok(Without::Replaced(Node::Bitmap(self.demote(shift, index))))
                }
            }
        }
    }

    pub(crate) fn find<Q>(&self, shift: u32, hash: i32, key: &Q) -> Result<Option<&V>, TrieError>
    where
        K: Borrow<Q>,
        Q: TryEq + ?Sized,
    {
        match &self.children[fragment(hash, shift)] {
            None => Ok(None),
            Some(child) => child.find(shift + BITS_PER_LEVEL, hash, key),
        }
    }
}
