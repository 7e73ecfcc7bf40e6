//! Trie node kinds and the dispatch between them.
//!
//! A trie is built from three node kinds:
//!
//! - [`BitmapNode`]: a sparse node with one compacted slot per set bit of a
//!   32-bit population bitmap. A slot holds either an entry or a sub-node.
//! - [`ArrayNode`]: a dense node with 32 optional children, used once a
//!   level holds 16 or more fragments.
//! - [`CollisionNode`]: two or more entries whose reduced hashes are equal.
//!
//! [`Node`] dispatches `assoc`, `without` and `find` to the right kind.
//! Nodes are never mutated once built. Every change constructs new nodes
//! along the path to the root and shares everything else.

mod array;
mod bitmap;
mod collision;

use std::borrow::Borrow;

pub(crate) use array::ArrayNode;
pub(crate) use bitmap::BitmapNode;
pub(crate) use collision::CollisionNode;

use super::ReferenceCounter;
use super::compare::TryEq;
use super::error::TrieError;

// =============================================================================
// Constants
// =============================================================================

/// Number of children an array node can address.
pub(crate) const BRANCHING_FACTOR: usize = 32;

/// Population at which a level is stored as an [`ArrayNode`].
///
/// A bitmap node about to reach this population is promoted, and an array
/// node whose population drops below it is demoted.
pub(crate) const ARRAY_THRESHOLD: usize = 16;

/// Maximum number of nodes on any root-to-leaf path.
///
/// Seven levels consume the 32-bit hash five bits at a time, and a
/// collision node may hang below the deepest of them.
pub(crate) const MAX_TREE_DEPTH: usize = 8;

// =============================================================================
// Entries and Slots
// =============================================================================

/// A key-value pair together with the key's reduced hash.
///
/// Entries are shared between versions of a trie, so restructuring never
/// needs to hash a key again.
pub(crate) struct Entry<K, V> {
    pub(crate) hash: i32,
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K, V> Entry<K, V> {
    pub(crate) const fn new(hash: i32, key: K, value: V) -> Self {
        Self { hash, key, value }
    }
}

/// The content of one occupied bitmap position.
pub(crate) enum Slot<K, V> {
    /// A key-value pair stored inline.
    Entry(ReferenceCounter<Entry<K, V>>),
    /// A sub-node one level deeper.
    Node(ReferenceCounter<Node<K, V>>),
}

impl<K, V> Clone for Slot<K, V> {
    fn clone(&self) -> Self {
        match self {
            Self::Entry(entry) => Self::Entry(ReferenceCounter::clone(entry)),
            Self::Node(node) => Self::Node(ReferenceCounter::clone(node)),
        }
    }
}

// =============================================================================
// Operation Results
// =============================================================================

/// Outcome of inserting an entry into a node.
pub(crate) enum Assoc<K, V> {
    /// The key was already present with an equal value.
    Unchanged,
    /// A replacement node was built.
    Updated {
        node: Node<K, V>,
        /// Whether the number of entries grew.
        added: bool,
    },
}

/// Outcome of removing a key from a node.
pub(crate) enum Without<K, V> {
    /// The key is not present below this node.
    NotFound,
    /// The removed entry was the last one in this node.
    Empty,
    /// The key was removed and this is the node that remains.
    Replaced(Node<K, V>),
}

// =============================================================================
// Node
// =============================================================================

/// A trie node of any kind.
pub(crate) enum Node<K, V> {
    Bitmap(BitmapNode<K, V>),
    Array(ArrayNode<K, V>),
    Collision(CollisionNode<K, V>),
}

impl<K, V> Node<K, V> {
    /// Creates the node used as the root of an empty trie.
    pub(crate) fn empty() -> Self {
        Self::Bitmap(BitmapNode::empty())
    }

    /// Inserts `entry` below `this`, which sits at depth `shift`.
    ///
    /// Takes the shared handle rather than `&self` because a collision node
    /// receiving a foreign hash must be wrapped, not copied.
    pub(crate) fn assoc(
        this: &ReferenceCounter<Self>,
        shift: u32,
        entry: ReferenceCounter<Entry<K, V>>,
    ) -> Result<Assoc<K, V>, TrieError>
    where
        K: TryEq,
        V: TryEq,
    {
        match this.as_ref() {
            Self::Bitmap(bitmap) => bitmap.assoc(shift, entry),
            Self::Array(array) => array.assoc(shift, entry),
            Self::Collision(collision) => CollisionNode::assoc(collision, this, shift, entry),
        }
    }

    /// Removes `key`, whose reduced hash is `hash`, from below this node.
    pub(crate) fn without<Q>(&self, shift: u32, hash: i32, key: &Q) -> Result<Without<K, V>, TrieError>
    where
        K: Borrow<Q>,
        Q: TryEq + ?Sized,
    {
        match self {
            Self::Bitmap(bitmap) => bitmap.without(shift, hash, key),
            Self::Array(array) => array.without(shift, hash, key),
            Self::Collision(collision) => collision.without(shift, hash, key),
        }
    }

    /// Looks up the value stored for `key`.
    pub(crate) fn find<Q>(&self, shift: u32, hash: i32, key: &Q) -> Result<Option<&V>, TrieError>
    where
        K: Borrow<Q>,
        Q: TryEq + ?Sized,
    {
        match self {
            Self::Bitmap(bitmap) => bitmap.find(shift, hash, key),
            Self::Array(array) => array.find(shift, hash, key),
            Self::Collision(collision) => collision.find(hash, key),
        }
    }

    /// Returns the sole entry of a single-entry bitmap node.
    ///
    /// Such nodes are inlined into a parent bitmap instead of being kept
    /// as a sub-node.
    pub(crate) fn inlinable_entry(&self) -> Option<&ReferenceCounter<Entry<K, V>>> {
        match self {
            Self::Bitmap(bitmap) => bitmap.sole_entry(),
            Self::Array(_) | Self::Collision(_) => None,
        }
    }

    /// Returns the node's kind name as it appears in dumps and logs.
    pub(crate) const fn kind(&self) -> &'static str {
        match self {
            Self::Bitmap(_) => "BitmapNode",
            Self::Array(_) => "ArrayNode",
            Self::Collision(_) => "CollisionNode",
        }
    }
}

/// Compares two entries' values, reporting whether `entry` would change
/// anything when stored over `existing`.
///
/// Returns `None` when the keys differ.
pub(crate) fn compare_entries<K: TryEq, V: TryEq>(
    existing: &Entry<K, V>,
    entry: &Entry<K, V>,
) -> Result<Option<bool>, TrieError> {
    if !existing.key.try_eq(&entry.key)? {
        return Ok(None);
    }
    Ok(Some(existing.value.try_eq(&entry.value)?))
}

/// Builds the node at depth `shift` holding two entries that met in the
/// same parent slot.
pub(crate) fn fork<K, V>(
    shift: u32,
    existing: ReferenceCounter<Entry<K, V>>,
    entry: ReferenceCounter<Entry<K, V>>,
) -> Node<K, V> {
    if existing.hash == entry.hash {
        tracing::trace!(shift, hash = entry.hash, "creating collision node");
        return Node::Collision(CollisionNode::pair(existing, entry));
    }
    Node::Bitmap(BitmapNode::fork(shift, existing, entry))
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
impl<K, V> Node<K, V> {
    /// Returns the direct child nodes of this node.
    pub(crate) fn child_nodes(&self) -> Vec<&ReferenceCounter<Self>> {
        match self {
            Self::Bitmap(bitmap) => bitmap
                .slots()
                .iter()
                .filter_map(|slot| match slot {
                    Slot::Node(node) => Some(node),
                    Slot::Entry(_) => None,
                })
                .collect(),
            Self::Array(array) => array.children().iter().flatten().collect(),
            Self::Collision(_) => Vec::new(),
        }
    }

    /// Returns the number of entries stored below this node.
    pub(crate) fn entry_count(&self) -> usize {
        let own = match self {
            Self::Bitmap(bitmap) => bitmap
                .slots()
                .iter()
                .filter(|slot| matches!(slot, Slot::Entry(_)))
                .count(),
            Self::Array(_) => 0,
            Self::Collision(collision) => collision.entries().len(),
        };
        own + self
            .child_nodes()
            .into_iter()
            .map(|child| child.entry_count())
            .sum::<usize>()
    }
}
