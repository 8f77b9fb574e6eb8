use core::borrow::Borrow;
use core::ops::Index;

use super::{NodeRef, OrderedIndexedTree};
use crate::{Rank, TreeError};

impl<K, V> OrderedIndexedTree<K, V> {
    /// Returns the node at position `index` in sorted key order.
    ///
    /// The index is zero-based.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::OutOfRange`] if `index >= self.size()`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::{OrderedIndexedTree, TreeError};
    ///
    /// let mut tree = OrderedIndexedTree::new();
    /// tree.insert("a", 10).unwrap();
    /// tree.insert("c", 30).unwrap();
    /// tree.insert("b", 20).unwrap();
    ///
    /// let node = tree.at(1).unwrap();
    /// assert_eq!(tree.get_node(node), Some((&"b", &20)));
    /// assert_eq!(tree.at(3), Err(TreeError::OutOfRange { index: 3, len: 3 }));
    /// ```
    pub fn at(&self, index: usize) -> Result<NodeRef, TreeError> {
        self.raw.at(index).map(NodeRef).ok_or(TreeError::OutOfRange {
            index,
            len: self.raw.len(),
        })
    }

    /// Returns the zero-based rank of `node` in sorted key order, or `None` if
    /// `node` is stale.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn rank(&self, node: NodeRef) -> Option<usize> {
        self.raw.try_node(node.0)?;
        Some(self.raw.rank_of_handle(node.0))
    }
}

impl<K: Ord, V> OrderedIndexedTree<K, V> {
    /// Returns the zero-based rank of `key` in sorted order, or `None` if the
    /// key is not present.
    ///
    /// For every present key `k`, `tree.at(tree.index(&k)?)` is the node of `k`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::OrderedIndexedTree;
    ///
    /// let mut tree = OrderedIndexedTree::new();
    /// tree.insert(10, "a").unwrap();
    /// tree.insert(20, "b").unwrap();
    ///
    /// assert_eq!(tree.index(&10), Some(0));
    /// assert_eq!(tree.index(&15), None);
    /// ```
    #[must_use]
    pub fn index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.rank_of(key)
    }
}

/// Indexes into the tree by rank.
///
/// # Panics
///
/// Panics if `rank` is out of bounds.
///
/// # Examples
///
/// ```
/// use threaded_avl::{OrderedIndexedTree, Rank};
///
/// let mut tree = OrderedIndexedTree::new();
/// tree.insert("a", 1).unwrap();
/// tree.insert("b", 2).unwrap();
///
/// assert_eq!(tree[Rank(1)], 2);
/// ```
impl<K, V> Index<Rank> for OrderedIndexedTree<K, V> {
    type Output = V;

    fn index(&self, rank: Rank) -> &Self::Output {
        self.raw.at(rank.0).map(|h| self.raw.node(h).value()).expect("index out of bounds")
    }
}
