use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;
use core::ops::Index;

use crate::TreeError;
use crate::raw::{Handle, RawAvlTree};

mod capacity;
mod display;
mod order_statistic;
mod range;

pub use crate::Rank;
pub use display::{NodeRecord, Position, TreeDisplay};
pub use range::{Direction, NodeRange};

/// An ordered map based on an [AVL tree], augmented for order statistics and
/// threaded in key order.
///
/// Keys must implement [`Ord`]; each key is stored at most once. Every node
/// additionally records
///
/// - the number of entries in its subtree, so positional lookups
///   ([`at`](Self::at)) and ranking ([`index`](Self::index)) take O(log n);
/// - links to its in-order predecessor and successor, so stepping with
///   [`prev`](Self::prev)/[`next`](Self::next) takes O(1) and a range of `k`
///   entries takes O(log n + k).
///
/// Lookups hand out [`NodeRef`]s: small copyable handles that can be resolved
/// against the tree with [`key`](Self::key), [`value`](Self::value) and friends.
///
/// It is a logic error for a key to be modified in such a way that the key's ordering relative to
/// any other key, as determined by the [`Ord`] trait, changes while it is in the tree. The
/// behavior resulting from such a logic error is not specified, but will be encapsulated to the
/// `OrderedIndexedTree` that observed the logic error and not result in undefined behavior.
///
/// # Examples
///
/// ```
/// use threaded_avl::OrderedIndexedTree;
///
/// let mut tree = OrderedIndexedTree::new();
/// for key in [5, 3, 8, 1, 4, 7, 9] {
///     tree.insert(key, key * 10).unwrap();
/// }
///
/// assert_eq!(tree.keys().copied().collect::<Vec<_>>(), [1, 3, 4, 5, 7, 8, 9]);
/// assert_eq!(tree.key(tree.at(0).unwrap()), Some(&1));
/// assert_eq!(tree.index(&7), Some(4));
///
/// let between: Vec<_> = tree
///     .key_range(&3, &8)
///     .unwrap()
///     .map(|node| *tree.key(node).unwrap())
///     .collect();
/// assert_eq!(between, [3, 4, 5, 7, 8]);
///
/// tree.delete(&5).unwrap();
/// assert_eq!(tree.size(), 6);
/// ```
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
pub struct OrderedIndexedTree<K, V> {
    raw: RawAvlTree<K, V>,
}

/// A handle to one entry of an [`OrderedIndexedTree`].
///
/// A `NodeRef` stays valid while its entry is in the tree, no matter how many
/// other entries are inserted or deleted around it. Once its own entry is
/// deleted (or the tree cleared), accessors return `None` for it until the slot
/// is reused by a later insertion, after which it resolves to that newer entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct NodeRef(Handle);

/// An iterator over the entries of an `OrderedIndexedTree`, in key order.
///
/// This `struct` is created by the [`iter`] method on [`OrderedIndexedTree`].
///
/// [`iter`]: OrderedIndexedTree::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V> {
    tree: &'a RawAvlTree<K, V>,
    front: Option<Handle>,
    back: Option<Handle>,
    remaining: usize,
}

/// An iterator over the keys of an `OrderedIndexedTree`.
///
/// This `struct` is created by the [`keys`] method on [`OrderedIndexedTree`].
///
/// [`keys`]: OrderedIndexedTree::keys
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

/// An iterator over the values of an `OrderedIndexedTree`.
///
/// This `struct` is created by the [`values`] method on [`OrderedIndexedTree`].
///
/// [`values`]: OrderedIndexedTree::values
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<K, V> OrderedIndexedTree<K, V> {
    /// Makes a new, empty `OrderedIndexedTree`.
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::OrderedIndexedTree;
    ///
    /// let mut tree = OrderedIndexedTree::new();
    /// tree.insert(1, "a").unwrap();
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        OrderedIndexedTree { raw: RawAvlTree::new() }
    }

    /// Removes every entry. Clearing an empty tree is a no-op.
    ///
    /// All outstanding [`NodeRef`]s become stale.
    ///
    /// # Complexity
    ///
    /// O(n) to drop the entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::OrderedIndexedTree;
    ///
    /// let mut tree = OrderedIndexedTree::new();
    /// tree.insert(1, "a").unwrap();
    /// tree.clear();
    /// tree.clear();
    /// assert!(tree.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns the number of entries in the tree.
    ///
    /// Same count as [`len`](Self::len), which is the preferred name and the
    /// one the iterators' `ExactSizeIterator::len` mirrors.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn size(&self) -> usize {
        self.raw.len()
    }

    /// Returns the number of entries in the tree, following the standard
    /// collections. [`size`](Self::size) returns the same count.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the tree holds no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the height of the tree: 0 when empty, 1 for a single entry.
    ///
    /// An AVL tree of `n` entries never exceeds roughly `1.44 * log2(n + 2)`.
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Returns the root node, if any.
    #[must_use]
    pub fn root(&self) -> Option<NodeRef> {
        self.raw.root().map(NodeRef)
    }

    /// Returns the node with the smallest key.
    ///
    /// # Complexity
    ///
    /// O(1) - the head of the thread is cached.
    #[must_use]
    pub fn find_min(&self) -> Option<NodeRef> {
        self.raw.first().map(NodeRef)
    }

    /// Returns the node with the largest key.
    ///
    /// # Complexity
    ///
    /// O(1) - the tail of the thread is cached.
    #[must_use]
    pub fn find_max(&self) -> Option<NodeRef> {
        self.raw.last().map(NodeRef)
    }

    /// Returns the node with the smallest key in the subtree rooted at `node`.
    ///
    /// Returns `None` if `node` is stale.
    ///
    /// # Complexity
    ///
    /// O(height of the subtree)
    #[must_use]
    pub fn subtree_min(&self, node: NodeRef) -> Option<NodeRef> {
        self.raw.try_node(node.0)?;
        Some(NodeRef(self.raw.subtree_min(node.0)))
    }

    /// Returns the node with the largest key in the subtree rooted at `node`.
    ///
    /// Returns `None` if `node` is stale.
    #[must_use]
    pub fn subtree_max(&self, node: NodeRef) -> Option<NodeRef> {
        self.raw.try_node(node.0)?;
        Some(NodeRef(self.raw.subtree_max(node.0)))
    }

    /// Returns the in-order predecessor of `node`.
    ///
    /// # Complexity
    ///
    /// O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::OrderedIndexedTree;
    ///
    /// let mut tree = OrderedIndexedTree::new();
    /// let a = tree.insert(1, ()).unwrap();
    /// let b = tree.insert(2, ()).unwrap();
    /// assert_eq!(tree.prev(b), Some(a));
    /// assert_eq!(tree.prev(a), None);
    /// ```
    #[must_use]
    pub fn prev(&self, node: NodeRef) -> Option<NodeRef> {
        self.raw.try_node(node.0)?.prev().map(NodeRef)
    }

    /// Returns the in-order successor of `node`.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn next(&self, node: NodeRef) -> Option<NodeRef> {
        self.raw.try_node(node.0)?.next().map(NodeRef)
    }

    /// Returns the key stored at `node`.
    #[must_use]
    pub fn key(&self, node: NodeRef) -> Option<&K> {
        self.raw.try_node(node.0).map(|n| n.key())
    }

    /// Returns the value stored at `node`.
    #[must_use]
    pub fn value(&self, node: NodeRef) -> Option<&V> {
        self.raw.try_node(node.0).map(|n| n.value())
    }

    /// Returns a mutable reference to the value stored at `node`.
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::OrderedIndexedTree;
    ///
    /// let mut tree = OrderedIndexedTree::new();
    /// let node = tree.insert("a", 1).unwrap();
    /// *tree.value_mut(node).unwrap() += 1;
    /// assert_eq!(tree.get(&"a"), Some(&2));
    /// ```
    pub fn value_mut(&mut self, node: NodeRef) -> Option<&mut V> {
        self.raw.try_node_mut(node.0).map(|n| n.value_mut())
    }

    /// Returns the key-value pair stored at `node`.
    #[must_use]
    pub fn get_node(&self, node: NodeRef) -> Option<(&K, &V)> {
        self.raw.try_node(node.0).map(|n| (n.key(), n.value()))
    }

    /// Returns the height of the subtree rooted at `node`.
    #[must_use]
    pub fn node_height(&self, node: NodeRef) -> Option<usize> {
        self.raw.try_node(node.0).map(|n| usize::from(n.height()))
    }

    /// Returns `height(left) - height(right)` for `node`; always within `-1..=1`.
    #[must_use]
    pub fn balance_factor(&self, node: NodeRef) -> Option<i32> {
        self.raw.try_node(node.0)?;
        Some(self.raw.balance_factor(node.0))
    }

    /// Returns the number of entries in the subtree rooted at `node`.
    #[must_use]
    pub fn subtree_size(&self, node: NodeRef) -> Option<usize> {
        self.raw.try_node(node.0).map(|n| n.size().to_usize())
    }

    /// Gets an iterator over the entries of the tree, sorted by key.
    ///
    /// The iterator walks the thread from the minimum; every call starts afresh.
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::OrderedIndexedTree;
    ///
    /// let mut tree = OrderedIndexedTree::new();
    /// tree.insert(3, "c").unwrap();
    /// tree.insert(1, "a").unwrap();
    /// tree.insert(2, "b").unwrap();
    ///
    /// let mut iter = tree.iter();
    /// assert_eq!(iter.next(), Some((&1, &"a")));
    /// assert_eq!(iter.next_back(), Some((&3, &"c")));
    /// assert_eq!(iter.next(), Some((&2, &"b")));
    /// assert_eq!(iter.next(), None);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            tree: &self.raw,
            front: self.raw.first(),
            back: self.raw.last(),
            remaining: self.raw.len(),
        }
    }

    /// Gets an iterator over the keys of the tree, in sorted order.
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
    /// let keys: Vec<_> = tree.keys().copied().collect();
    /// assert_eq!(keys, [1, 2]);
    /// ```
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Gets an iterator over the values of the tree, in order by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::OrderedIndexedTree;
    ///
    /// let mut tree = OrderedIndexedTree::new();
    /// tree.insert(1, "hello").unwrap();
    /// tree.insert(2, "goodbye").unwrap();
    ///
    /// let values: Vec<_> = tree.values().copied().collect();
    /// assert_eq!(values, ["hello", "goodbye"]);
    /// ```
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K: Ord, V> OrderedIndexedTree<K, V> {
    /// Inserts a key-value pair and returns a handle to the new node.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::DuplicateKey`] if `key` is already present; the tree
    /// is left untouched. Use [`update`](Self::update) to replace a value.
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
    /// let node = tree.insert(37, "a").unwrap();
    /// assert_eq!(tree.get_node(node), Some((&37, &"a")));
    /// assert_eq!(tree.insert(37, "b"), Err(TreeError::DuplicateKey));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<NodeRef, TreeError> {
        self.raw.insert(key, value).map(NodeRef)
    }

    /// Removes `key` from the tree, returning the stored key-value pair.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`] if `key` is not present.
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
    /// tree.insert(1, "a").unwrap();
    /// assert_eq!(tree.delete(&1), Ok((1, "a")));
    /// assert_eq!(tree.delete(&1), Err(TreeError::NotFound));
    /// ```
    pub fn delete<Q>(&mut self, key: &Q) -> Result<(K, V), TreeError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.delete(key)
    }

    /// Replaces the value stored under `key`, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`] if `key` is not present.
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::OrderedIndexedTree;
    ///
    /// let mut tree = OrderedIndexedTree::new();
    /// tree.insert("a", 1).unwrap();
    /// assert_eq!(tree.update(&"a", 2), Ok(1));
    /// assert_eq!(tree.get(&"a"), Some(&2));
    /// assert!(tree.update(&"b", 3).is_err());
    /// ```
    pub fn update<Q>(&mut self, key: &Q, value: V) -> Result<V, TreeError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.update(key, value)
    }

    /// Returns the node holding `key`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn find<Q>(&self, key: &Q) -> Option<NodeRef>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.search(self.raw.root(), key).map(NodeRef)
    }

    /// Returns the node holding `key`, searching only the subtree rooted at `from`.
    ///
    /// Returns `None` if `from` is stale.
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::OrderedIndexedTree;
    ///
    /// let mut tree = OrderedIndexedTree::new();
    /// for key in 1..=7 {
    ///     tree.insert(key, ()).unwrap();
    /// }
    /// let right = tree.find(&6).unwrap();
    /// assert_eq!(tree.find_from(right, &7), tree.find(&7));
    /// assert_eq!(tree.find_from(right, &1), None);
    /// ```
    #[must_use]
    pub fn find_from<Q>(&self, from: NodeRef, key: &Q) -> Option<NodeRef>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.try_node(from.0)?;
        self.raw.search(Some(from.0), key).map(NodeRef)
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get_mut(key)
    }

    /// Returns `true` if the tree contains `key`.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(key).is_some()
    }

    /// Returns the in-order predecessor of the node holding `key`.
    ///
    /// Returns `None` if `key` is absent or is the minimum.
    #[must_use]
    pub fn key_prev<Q>(&self, key: &Q) -> Option<NodeRef>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.prev(self.find(key)?)
    }

    /// Returns the in-order successor of the node holding `key`.
    ///
    /// Returns `None` if `key` is absent or is the maximum.
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::OrderedIndexedTree;
    ///
    /// let mut tree = OrderedIndexedTree::new();
    /// tree.insert(10, ()).unwrap();
    /// tree.insert(20, ()).unwrap();
    /// assert_eq!(tree.key_next(&10), tree.find(&20));
    /// assert_eq!(tree.key_next(&20), None);
    /// assert_eq!(tree.key_next(&15), None);
    /// ```
    #[must_use]
    pub fn key_next<Q>(&self, key: &Q) -> Option<NodeRef>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.next(self.find(key)?)
    }

    /// Walks the whole tree and verifies its structural invariants: key order,
    /// AVL balance, cached heights and subtree sizes, parent links, and the
    /// in-order thread.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidState`] describing the first violation found.
    /// A tree mutated only through this API never fails the check.
    ///
    /// # Complexity
    ///
    /// O(n)
    pub fn check_invariants(&self) -> Result<(), TreeError> {
        self.raw.check_invariants()
    }
}

impl<K: Clone, V: Clone> Clone for OrderedIndexedTree<K, V> {
    /// Clones the tree node for node; `NodeRef`s from the original resolve to
    /// the same entries in the clone.
    fn clone(&self) -> Self {
        OrderedIndexedTree { raw: self.raw.clone() }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedIndexedTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Default for OrderedIndexedTree<K, V> {
    /// Creates an empty `OrderedIndexedTree`.
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K, V> IntoIterator for &'a OrderedIndexedTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

/// Looks up a value by key.
///
/// # Panics
///
/// Panics if the key is not present in the tree.
impl<K, Q, V> Index<&Q> for OrderedIndexedTree<K, V>
where
    K: Borrow<Q> + Ord,
    Q: ?Sized + Ord,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<'a, K: 'a, V: 'a> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let node = self.tree.node(self.front?);
        self.front = node.next();
        self.remaining -= 1;
        Some((node.key(), node.value()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: 'a, V: 'a> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let node = self.tree.node(self.back?);
        self.back = node.prev();
        self.remaining -= 1;
        Some((node.key(), node.value()))
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
        Iter {
            tree: self.tree,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Keys { inner: self.inner.clone() }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Keys<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Values { inner: self.inner.clone() }
    }
}

impl<K, V: fmt::Debug> fmt::Debug for Values<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
