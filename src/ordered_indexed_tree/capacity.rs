use super::OrderedIndexedTree;
use crate::raw::RawAvlTree;

impl<K, V> OrderedIndexedTree<K, V> {
    /// Creates an empty tree with room for at least `capacity` entries before
    /// the node arena reallocates.
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::OrderedIndexedTree;
    ///
    /// let tree: OrderedIndexedTree<i32, i32> = OrderedIndexedTree::with_capacity(32);
    /// assert!(tree.is_empty());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity) for memory allocation.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        OrderedIndexedTree {
            raw: RawAvlTree::with_capacity(capacity),
        }
    }

    /// Returns the number of entries the tree can hold without reallocating.
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::OrderedIndexedTree;
    ///
    /// let tree: OrderedIndexedTree<i32, i32> = OrderedIndexedTree::with_capacity(32);
    /// assert!(tree.capacity() >= 32);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }
}
