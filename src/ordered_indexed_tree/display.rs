use core::fmt;

use alloc::vec::Vec;

use super::{NodeRef, OrderedIndexedTree};
use crate::raw::{Handle, Node, RawAvlTree, WalkStack};

/// Where a node hangs relative to its parent.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Position {
    /// The node has no parent.
    Root,
    /// The node is its parent's left child.
    Left,
    /// The node is its parent's right child.
    Right,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Position::Root => "root",
            Position::Left => "left",
            Position::Right => "right",
        })
    }
}

/// A snapshot of one node's bookkeeping, as produced by
/// [`OrderedIndexedTree::dump`].
///
/// Neighbouring nodes are reported by key.
#[derive(Debug, Eq, PartialEq)]
pub struct NodeRecord<'a, K, V> {
    /// Handle to the node itself.
    pub node: NodeRef,
    /// Distance from the root; the root has depth 0.
    pub depth: usize,
    /// Which side of its parent the node hangs on.
    pub position: Position,
    /// The node's key.
    pub key: &'a K,
    /// The node's value.
    pub value: &'a V,
    /// Cached height; a leaf has height 1.
    pub height: usize,
    /// `height(left) - height(right)`.
    pub balance_factor: i32,
    /// Number of entries in the subtree rooted here.
    pub subtree_size: usize,
    /// Key of the parent node.
    pub parent: Option<&'a K>,
    /// Key of the left child.
    pub left: Option<&'a K>,
    /// Key of the right child.
    pub right: Option<&'a K>,
    /// Key of the in-order predecessor.
    pub prev: Option<&'a K>,
    /// Key of the in-order successor.
    pub next: Option<&'a K>,
}

/// Indented, pre-order rendering of a tree for debugging.
///
/// This `struct` is created by the [`display`] method on [`OrderedIndexedTree`].
///
/// [`display`]: OrderedIndexedTree::display
pub struct TreeDisplay<'a, K, V> {
    tree: &'a OrderedIndexedTree<K, V>,
}

impl<K, V> OrderedIndexedTree<K, V> {
    /// Returns a record for every node, in pre-order (node, then left subtree,
    /// then right subtree).
    ///
    /// Intended for tests and debugging; the layout of the tree depends on the
    /// history of insertions and deletions.
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::OrderedIndexedTree;
    /// use threaded_avl::ordered_indexed_tree::Position;
    ///
    /// let mut tree = OrderedIndexedTree::new();
    /// for key in [1, 2, 3] {
    ///     tree.insert(key, ()).unwrap();
    /// }
    ///
    /// let records = tree.dump();
    /// assert_eq!(records[0].position, Position::Root);
    /// assert_eq!(*records[0].key, 2);
    /// assert_eq!(records[0].subtree_size, 3);
    /// assert_eq!(records[1].prev, None);
    /// assert_eq!(records[1].next, Some(&2));
    /// ```
    #[must_use]
    pub fn dump(&self) -> Vec<NodeRecord<'_, K, V>> {
        let raw = &self.raw;
        let mut records = Vec::with_capacity(raw.len());
        let mut stack: WalkStack<(Handle, usize, Position)> = WalkStack::new();

        if let Some(root) = raw.root() {
            stack.push((root, 0, Position::Root));
        }

        while let Some((handle, depth, position)) = stack.pop() {
            let node = raw.node(handle);
            records.push(NodeRecord {
                node: NodeRef(handle),
                depth,
                position,
                key: node.key(),
                value: node.value(),
                height: usize::from(node.height()),
                balance_factor: raw.balance_factor(handle),
                subtree_size: node.size().to_usize(),
                parent: key_of(raw, node.parent()),
                left: key_of(raw, node.left()),
                right: key_of(raw, node.right()),
                prev: key_of(raw, node.prev()),
                next: key_of(raw, node.next()),
            });

            // Right first so the left subtree is popped first.
            if let Some(right) = node.right() {
                stack.push((right, depth + 1, Position::Right));
            }
            if let Some(left) = node.left() {
                stack.push((left, depth + 1, Position::Left));
            }
        }

        records
    }

    /// Returns a [`Display`](fmt::Display) adapter printing one line per node,
    /// indented by depth.
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::OrderedIndexedTree;
    ///
    /// let mut tree = OrderedIndexedTree::new();
    /// tree.insert(2, "b").unwrap();
    /// tree.insert(1, "a").unwrap();
    ///
    /// let text = tree.display().to_string();
    /// assert!(text.starts_with("root 2 => \"b\""));
    /// assert!(text.contains("\n    left 1 => \"a\""));
    /// ```
    pub fn display(&self) -> TreeDisplay<'_, K, V> {
        TreeDisplay { tree: self }
    }
}

fn key_of<K, V>(raw: &RawAvlTree<K, V>, handle: Option<Handle>) -> Option<&K> {
    handle.map(|h| raw.node(h)).map(Node::key)
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Display for TreeDisplay<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in self.tree.dump() {
            for _ in 0..record.depth {
                f.write_str("    ")?;
            }
            writeln!(
                f,
                "{} {:?} => {:?} (height: {}, balance: {}, size: {}, parent: {:?}, left: {:?}, right: {:?}, prev: {:?}, next: {:?})",
                record.position,
                record.key,
                record.value,
                record.height,
                record.balance_factor,
                record.subtree_size,
                record.parent,
                record.left,
                record.right,
                record.prev,
                record.next,
            )?;
        }
        Ok(())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TreeDisplay<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
