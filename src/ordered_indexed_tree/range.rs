use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;

use super::{NodeRef, OrderedIndexedTree};
use crate::TreeError;
use crate::raw::{Handle, RawAvlTree};

/// The order in which a [`NodeRange`] walks the thread.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Direction {
    /// Smallest key first, following `next` links.
    Ascending,
    /// Largest key first, following `prev` links.
    Descending,
}

/// A lazy walk along the in-order thread between two nodes, both inclusive.
///
/// This `struct` is created by [`key_range`], [`index_range`] and
/// [`interval_range`] on [`OrderedIndexedTree`]. Each yields the
/// [`NodeRef`]s of the entries in the range; resolve them with
/// [`OrderedIndexedTree::key`] and friends. The endpoints are resolved once,
/// when the range is created; call the method again for a fresh walk.
///
/// # Examples
///
/// ```
/// use threaded_avl::OrderedIndexedTree;
///
/// let mut tree = OrderedIndexedTree::new();
/// for key in [1, 3, 4, 5, 7, 8, 9] {
///     tree.insert(key, ()).unwrap();
/// }
///
/// let range = tree.key_range(&8, &3).unwrap();
/// assert_eq!(range.len(), 5);
/// let keys: Vec<_> = range.map(|node| *tree.key(node).unwrap()).collect();
/// assert_eq!(keys, [8, 7, 5, 4, 3]);
/// ```
///
/// [`key_range`]: OrderedIndexedTree::key_range
/// [`index_range`]: OrderedIndexedTree::index_range
/// [`interval_range`]: OrderedIndexedTree::interval_range
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct NodeRange<'a, K, V> {
    tree: &'a RawAvlTree<K, V>,
    front: Option<Handle>,
    back: Option<Handle>,
    remaining: usize,
    direction: Direction,
}

impl<'a, K, V> NodeRange<'a, K, V> {
    fn empty(tree: &'a RawAvlTree<K, V>, direction: Direction) -> Self {
        NodeRange {
            tree,
            front: None,
            back: None,
            remaining: 0,
            direction,
        }
    }

    /// Range from `from` to `to`, walking in whichever direction reaches `to`.
    fn between(tree: &'a RawAvlTree<K, V>, from: Handle, to: Handle) -> Self {
        let direction = if tree.rank_of_handle(from) <= tree.rank_of_handle(to) {
            Direction::Ascending
        } else {
            Direction::Descending
        };
        Self::directed(tree, from, to, direction)
    }

    /// Range from `from` to `to` in `direction`; empty if `to` lies behind `from`.
    fn directed(tree: &'a RawAvlTree<K, V>, from: Handle, to: Handle, direction: Direction) -> Self {
        let (start, end) = (tree.rank_of_handle(from), tree.rank_of_handle(to));
        let remaining = match direction {
            Direction::Ascending if start <= end => end - start + 1,
            Direction::Descending if start >= end => start - end + 1,
            _ => return Self::empty(tree, direction),
        };

        NodeRange {
            tree,
            front: Some(from),
            back: Some(to),
            remaining,
            direction,
        }
    }

    /// Returns the direction of the walk.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    fn step(&self, handle: Handle, direction: Direction) -> Option<Handle> {
        let node = self.tree.node(handle);
        match direction {
            Direction::Ascending => node.next(),
            Direction::Descending => node.prev(),
        }
    }
}

impl<K, V> OrderedIndexedTree<K, V> {
    /// Returns the nodes from the entry at rank `from` to the entry at rank `to`,
    /// both inclusive. The walk is descending when `from > to`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::OutOfRange`] if either rank is `>= self.size()`.
    ///
    /// # Complexity
    ///
    /// O(log n) to create, O(1) per item.
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::OrderedIndexedTree;
    ///
    /// let mut tree = OrderedIndexedTree::new();
    /// for key in [10, 20, 30, 40] {
    ///     tree.insert(key, ()).unwrap();
    /// }
    ///
    /// let keys: Vec<_> = tree.index_range(1, 2).unwrap().map(|n| *tree.key(n).unwrap()).collect();
    /// assert_eq!(keys, [20, 30]);
    /// assert!(tree.index_range(1, 4).is_err());
    /// ```
    pub fn index_range(&self, from: usize, to: usize) -> Result<NodeRange<'_, K, V>, TreeError> {
        let from = self.at(from)?;
        let to = self.at(to)?;
        Ok(NodeRange::between(&self.raw, from.0, to.0))
    }

    /// Returns the greatest node whose key is `<= probe`.
    ///
    /// `probe` does not have to be a key of the tree, nor even of type `K`; it
    /// only has to be comparable with the keys. Returns `None` if every key is
    /// greater than `probe` or the comparison is undefined.
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::OrderedIndexedTree;
    ///
    /// let mut tree = OrderedIndexedTree::new();
    /// tree.insert(10, ()).unwrap();
    /// tree.insert(20, ()).unwrap();
    ///
    /// assert_eq!(tree.floor(&15), tree.find(&10));
    /// assert_eq!(tree.floor(&5), None);
    /// ```
    #[must_use]
    pub fn floor<T>(&self, probe: &T) -> Option<NodeRef>
    where
        T: ?Sized,
        K: PartialOrd<T>,
    {
        self.raw.floor(probe).map(NodeRef)
    }

    /// Returns the smallest node whose key is `>= probe`.
    ///
    /// The mirror image of [`floor`](Self::floor).
    #[must_use]
    pub fn ceiling<T>(&self, probe: &T) -> Option<NodeRef>
    where
        T: ?Sized,
        K: PartialOrd<T>,
    {
        self.raw.ceiling(probe).map(NodeRef)
    }

    /// Returns the nodes whose keys fall within the closed interval between
    /// `a` and `b`, which need not be keys of the tree.
    ///
    /// When `a <= b` the walk is ascending from the first key `>= a` to the last
    /// key `<= b`. When `a > b` it is descending from the last key `<= a` to the
    /// first key `>= b`. The range is empty when no key lies in the interval or
    /// when `a` and `b` do not compare.
    ///
    /// # Complexity
    ///
    /// O(log n) to create, O(1) per item.
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::OrderedIndexedTree;
    ///
    /// let mut tree = OrderedIndexedTree::new();
    /// for key in [1, 3, 4, 5, 7, 8, 9] {
    ///     tree.insert(key, ()).unwrap();
    /// }
    ///
    /// let keys: Vec<_> = tree.interval_range(&2, &6).map(|n| *tree.key(n).unwrap()).collect();
    /// assert_eq!(keys, [3, 4, 5]);
    ///
    /// let keys: Vec<_> = tree.interval_range(&6, &2).map(|n| *tree.key(n).unwrap()).collect();
    /// assert_eq!(keys, [5, 4, 3]);
    ///
    /// assert_eq!(tree.interval_range(&10, &20).count(), 0);
    /// ```
    pub fn interval_range<T>(&self, a: &T, b: &T) -> NodeRange<'_, K, V>
    where
        T: ?Sized + PartialOrd,
        K: PartialOrd<T>,
    {
        let (from, to, direction) = match a.partial_cmp(b) {
            Some(Ordering::Less | Ordering::Equal) => (self.raw.ceiling(a), self.raw.floor(b), Direction::Ascending),
            Some(Ordering::Greater) => (self.raw.floor(a), self.raw.ceiling(b), Direction::Descending),
            None => return NodeRange::empty(&self.raw, Direction::Ascending),
        };

        match (from, to) {
            (Some(from), Some(to)) => NodeRange::directed(&self.raw, from, to, direction),
            _ => NodeRange::empty(&self.raw, direction),
        }
    }
}

impl<K: Ord, V> OrderedIndexedTree<K, V> {
    /// Returns the nodes from the node of `from` to the node of `to`, both
    /// inclusive. The walk is descending when `from > to`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotFound`] if either key is absent.
    ///
    /// # Complexity
    ///
    /// O(log n) to create, O(1) per item.
    ///
    /// # Examples
    ///
    /// ```
    /// use threaded_avl::{OrderedIndexedTree, TreeError};
    ///
    /// let mut tree = OrderedIndexedTree::new();
    /// for key in [5, 3, 8, 1, 4, 7, 9] {
    ///     tree.insert(key, ()).unwrap();
    /// }
    ///
    /// let keys: Vec<_> = tree.key_range(&3, &8).unwrap().map(|n| *tree.key(n).unwrap()).collect();
    /// assert_eq!(keys, [3, 4, 5, 7, 8]);
    /// assert_eq!(tree.key_range(&2, &8).err(), Some(TreeError::NotFound));
    /// ```
    pub fn key_range<Q>(&self, from: &Q, to: &Q) -> Result<NodeRange<'_, K, V>, TreeError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let from = self.find(from).ok_or(TreeError::NotFound)?;
        let to = self.find(to).ok_or(TreeError::NotFound)?;
        Ok(NodeRange::between(&self.raw, from.0, to.0))
    }
}

impl<K, V> Iterator for NodeRange<'_, K, V> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        if self.remaining == 0 {
            return None;
        }

        let handle = self.front?;
        self.remaining -= 1;
        self.front = self.step(handle, self.direction);
        Some(NodeRef(handle))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for NodeRange<'_, K, V> {
    fn next_back(&mut self) -> Option<NodeRef> {
        if self.remaining == 0 {
            return None;
        }

        let handle = self.back?;
        self.remaining -= 1;
        let backwards = match self.direction {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        };
        self.back = self.step(handle, backwards);
        Some(NodeRef(handle))
    }
}

impl<K, V> ExactSizeIterator for NodeRange<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for NodeRange<'_, K, V> {}

impl<K, V> Clone for NodeRange<'_, K, V> {
    fn clone(&self) -> Self {
        NodeRange {
            tree: self.tree,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
            direction: self.direction,
        }
    }
}

impl<K, V> fmt::Debug for NodeRange<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRange")
            .field("direction", &self.direction)
            .field("remaining", &self.remaining)
            .finish()
    }
}
