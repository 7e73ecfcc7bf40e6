//! Text rendering of a trie's node structure.

use std::fmt::{self, Debug, Display, Write};

use super::hamt::PersistentHamt;
use super::node::{Node, Slot};

const INDENT: usize = 4;

impl<K: Debug, V: Debug> PersistentHamt<K, V> {
    /// Renders every node of the trie, one line per node or entry.
    ///
    /// Each level is indented by four spaces. A `NULL:` line introduces a
    /// sub-node held in a bitmap slot, and an `index::` line introduces the
    /// array child stored for that fragment.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_hamt::persistent::PersistentHamt;
    ///
    /// let map = PersistentHamt::singleton(1_u8, "one").unwrap();
    /// let dump = map.dump();
    ///
    /// assert!(dump.starts_with("HAMT(len=1):\n    BitmapNode(count=1 bitmap=0b"));
    /// assert!(dump.ends_with("        1: \"one\"\n"));
    /// ```
    #[must_use]
    pub fn dump(&self) -> String {
        TreeDump { map: self }.to_string()
    }
}

struct TreeDump<'a, K, V> {
    map: &'a PersistentHamt<K, V>,
}

impl<K: Debug, V: Debug> Display for TreeDump<'_, K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(formatter, "HAMT(len={}):", self.map.len())?;
        write_node(formatter, self.map.root(), 1)
    }
}

fn write_line(out: &mut impl Write, level: usize, line: fmt::Arguments<'_>) -> fmt::Result {
    writeln!(out, "{:width$}{line}", "", width = level * INDENT)
}

fn write_node<K: Debug, V: Debug>(out: &mut impl Write, node: &Node<K, V>, level: usize) -> fmt::Result {
    match node {
        Node::Bitmap(bitmap) => {
            write_line(
                out,
                level,
                format_args!(
                    "{}(count={} bitmap={:#b}):",
                    node.kind(),
                    bitmap.len(),
                    bitmap.bitmap()
                ),
            )?;
            for slot in bitmap.slots() {
                match slot {
                    Slot::Entry(entry) => {
                        write_line(out, level + 1, format_args!("{:?}: {:?}", entry.key, entry.value))?;
                    }
                    Slot::Node(child) => {
                        write_line(out, level + 1, format_args!("NULL:"))?;
                        write_node(out, child, level + 2)?;
                    }
                }
            }
        }
        Node::Array(array) => {
            write_line(
                out,
                level,
                format_args!("{}(count={}):", node.kind(), array.count()),
            )?;
            for (index, child) in array.children().iter().enumerate() {
                if let Some(child) = child {
                    write_line(out, level + 1, format_args!("{index}::"))?;
                    write_node(out, child, level + 2)?;
                }
            }
        }
        Node::Collision(collision) => {
            write_line(
                out,
                level,
                format_args!(
                    "{}(hash={} count={}):",
                    node.kind(),
                    collision.hash(),
                    collision.entries().len()
                ),
            )?;
            for entry in collision.entries() {
                write_line(out, level + 1, format_args!("{:?}: {:?}", entry.key, entry.value))?;
            }
        }
    }
    Ok(())
}
