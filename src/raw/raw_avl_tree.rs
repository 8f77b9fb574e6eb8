use core::borrow::Borrow;
use core::cmp::Ordering;

use alloc::format;
use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Node, Side};
use super::size::Size;
use crate::TreeError;

/// Explicit stack for whole-tree walks. AVL height stays well below the inline
/// capacity for any arena a `Handle` can address.
pub(crate) type WalkStack<T> = SmallVec<[T; 64]>;

/// The core AVL implementation backing `OrderedIndexedTree`.
#[derive(Clone)]
pub(crate) struct RawAvlTree<K, V> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K, V>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
    /// Total number of key-value pairs in the tree.
    len: usize,
    /// Head of the in-order thread (minimum key).
    first: Option<Handle>,
    /// Tail of the in-order thread (maximum key).
    last: Option<Handle>,
}

impl<K, V> RawAvlTree<K, V> {
    /// Creates a new, empty tree.
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            len: 0,
            first: None,
            last: None,
        }
    }

    /// Creates a new tree with room for `capacity` nodes.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
            len: 0,
            first: None,
            last: None,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Drops every node. Calling it on an empty tree is a no-op.
    pub(crate) fn clear(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(len = self.len, "clearing tree");

        self.nodes.clear();
        self.root = None;
        self.len = 0;
        self.first = None;
        self.last = None;
    }

    pub(crate) fn root(&self) -> Option<Handle> {
        self.root
    }

    pub(crate) fn first(&self) -> Option<Handle> {
        self.first
    }

    pub(crate) fn last(&self) -> Option<Handle> {
        self.last
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    fn node_mut(&mut self, handle: Handle) -> &mut Node<K, V> {
        self.nodes.get_mut(handle)
    }

    /// Resolves a caller-supplied handle, which may be stale.
    pub(crate) fn try_node(&self, handle: Handle) -> Option<&Node<K, V>> {
        self.nodes.try_get(handle)
    }

    pub(crate) fn try_node_mut(&mut self, handle: Handle) -> Option<&mut Node<K, V>> {
        self.nodes.try_get_mut(handle)
    }

    /// Height of the whole tree; 0 when empty.
    pub(crate) fn height(&self) -> usize {
        usize::from(self.height_of(self.root))
    }

    fn height_of(&self, handle: Option<Handle>) -> u8 {
        handle.map_or(0, |h| self.node(h).height())
    }

    pub(crate) fn size_of(&self, handle: Option<Handle>) -> Size {
        handle.map_or(Size::ZERO, |h| self.node(h).size())
    }

    /// `height(left) - height(right)`.
    pub(crate) fn balance_factor(&self, handle: Handle) -> i32 {
        let node = self.node(handle);
        i32::from(self.height_of(node.left())) - i32::from(self.height_of(node.right()))
    }

    /// Leftmost node of the subtree rooted at `handle`.
    pub(crate) fn subtree_min(&self, handle: Handle) -> Handle {
        let mut current = handle;
        while let Some(left) = self.node(current).left() {
            current = left;
        }
        current
    }

    /// Rightmost node of the subtree rooted at `handle`.
    pub(crate) fn subtree_max(&self, handle: Handle) -> Handle {
        let mut current = handle;
        while let Some(right) = self.node(current).right() {
            current = right;
        }
        current
    }

    /// Returns the node at position `index` in key order.
    pub(crate) fn at(&self, index: usize) -> Option<Handle> {
        if index >= self.len {
            return None;
        }

        // `lower` is the rank of the leftmost node of the current subtree.
        let mut current = self.root?;
        let mut lower = 0;

        loop {
            let node = self.node(current);
            let mid = lower + self.size_of(node.left()).to_usize();
            match index.cmp(&mid) {
                Ordering::Equal => return Some(current),
                Ordering::Less => current = node.left()?,
                Ordering::Greater => {
                    lower = mid + 1;
                    current = node.right()?;
                }
            }
        }
    }

    /// Rank of a live node, found by climbing parent links.
    pub(crate) fn rank_of_handle(&self, handle: Handle) -> usize {
        let mut rank = self.size_of(self.node(handle).left()).to_usize();
        let mut current = handle;

        while let Some(parent) = self.node(current).parent() {
            let node = self.node(parent);
            if node.right() == Some(current) {
                rank += self.size_of(node.left()).to_usize() + 1;
            }
            current = parent;
        }

        rank
    }

    /// Recomputes `height` and `size` of `handle` from its children.
    fn update_metrics(&mut self, handle: Handle) {
        let (left, right) = {
            let node = self.node(handle);
            (node.left(), node.right())
        };
        let height = 1 + self.height_of(left).max(self.height_of(right));
        let size = Size::of_subtree(self.size_of(left), self.size_of(right));

        let node = self.node_mut(handle);
        node.set_height(height);
        node.set_size(size);
    }

    /// Points whatever referenced `old` as a child (or the root slot) at `new`.
    fn replace_child(&mut self, parent: Option<Handle>, old: Handle, new: Option<Handle>) {
        match parent {
            Some(parent) => {
                let node = self.node_mut(parent);
                if node.left() == Some(old) {
                    node.set_left(new);
                } else {
                    node.set_right(new);
                }
            }
            None => self.root = new,
        }
    }

    /// Joins two thread positions: `before.next = after` and `after.prev = before`.
    /// A missing end updates the cached head or tail instead.
    fn link(&mut self, before: Option<Handle>, after: Option<Handle>) {
        match before {
            Some(before) => self.node_mut(before).set_next(after),
            None => self.first = after,
        }
        match after {
            Some(after) => self.node_mut(after).set_prev(before),
            None => self.last = before,
        }
    }

    /// Rotates the subtree rooted at `x` so that `x` moves down to side `down`
    /// and its child on the opposite side takes its place. Returns the new
    /// subtree root.
    ///
    /// `down == Side::Left` is a left rotation, `down == Side::Right` a right rotation.
    fn rotate(&mut self, x: Handle, down: Side) -> Handle {
        let up = down.opposite();
        let Some(y) = self.node(x).child(up) else {
            debug_assert!(false, "rotate: missing child on the rising side");
            return x;
        };
        let inner = self.node(y).child(down);
        let parent = self.node(x).parent();

        // The inner grandchild changes sides, from `y` over to `x`.
        self.node_mut(x).set_child(up, inner);
        if let Some(inner) = inner {
            self.node_mut(inner).set_parent(Some(x));
        }

        self.node_mut(y).set_parent(parent);
        self.replace_child(parent, x, Some(y));

        self.node_mut(y).set_child(down, Some(x));
        self.node_mut(x).set_parent(Some(y));

        // Bottom-up: `x` is now the child of `y`.
        self.update_metrics(x);
        self.update_metrics(y);

        #[cfg(feature = "tracing")]
        tracing::trace!(
            from = x.to_index(),
            to = y.to_index(),
            direction = ?down,
            height = self.node(y).height(),
            "rotated"
        );

        y
    }

    /// Walks from `start` to the root, refreshing metrics and restoring the AVL
    /// balance of every node on the way.
    fn rebalance_from(&mut self, start: Option<Handle>) {
        let mut current = start;

        while let Some(handle) = current {
            self.update_metrics(handle);

            let node = self.node(handle);
            let subtree_root = match (self.balance_factor(handle), node.left(), node.right()) {
                (2.., Some(left), _) => {
                    // Left-right case: straighten the left child first.
                    if self.balance_factor(left) < 0 {
                        self.rotate(left, Side::Left);
                    }
                    self.rotate(handle, Side::Right)
                }
                (..=-2, _, Some(right)) => {
                    // Right-left case.
                    if self.balance_factor(right) > 0 {
                        self.rotate(right, Side::Right);
                    }
                    self.rotate(handle, Side::Left)
                }
                _ => handle,
            };

            current = self.node(subtree_root).parent();
        }
    }

    /// Unlinks `handle` from the tree and the thread, rebalances, and returns its entry.
    pub(crate) fn remove_node(&mut self, handle: Handle) -> (K, V) {
        let (parent, left, right, prev, next) = {
            let node = self.node(handle);
            (node.parent(), node.left(), node.right(), node.prev(), node.next())
        };

        let rebalance_start = match (left, right) {
            (Some(left), Some(right)) => {
                // The in-order successor takes over this node's position.
                let successor = self.subtree_min(right);
                debug_assert_eq!(Some(successor), next, "successor must be the thread neighbour");

                let start = if successor == right {
                    Some(successor)
                } else {
                    // Detach the successor; its right child fills the gap.
                    let successor_parent = self.node(successor).parent();
                    let successor_right = self.node(successor).right();
                    if let Some(successor_parent) = successor_parent {
                        self.node_mut(successor_parent).set_left(successor_right);
                    }
                    if let Some(successor_right) = successor_right {
                        self.node_mut(successor_right).set_parent(successor_parent);
                    }
                    self.node_mut(successor).set_right(Some(right));
                    self.node_mut(right).set_parent(Some(successor));
                    successor_parent
                };

                self.node_mut(successor).set_left(Some(left));
                self.node_mut(left).set_parent(Some(successor));
                self.node_mut(successor).set_parent(parent);
                self.replace_child(parent, handle, Some(successor));
                start
            }
            (child, None) | (None, child) => {
                if let Some(child) = child {
                    self.node_mut(child).set_parent(parent);
                }
                self.replace_child(parent, handle, child);
                parent
            }
        };

        self.link(prev, next);
        self.len -= 1;

        #[cfg(feature = "tracing")]
        tracing::trace!(node = handle.to_index(), len = self.len, "removed node");

        let entry = self.nodes.take(handle).into_entry();
        self.rebalance_from(rebalance_start);
        debug_assert_eq!(self.nodes.len(), self.len);
        entry
    }

    /// Returns the greatest node whose key is `<= probe`.
    ///
    /// Returns `None` when every key is greater or the probe is incomparable.
    pub(crate) fn floor<T>(&self, probe: &T) -> Option<Handle>
    where
        T: ?Sized,
        K: PartialOrd<T>,
    {
        let mut current = self.root;
        let mut best = None;

        while let Some(handle) = current {
            let node = self.node(handle);
            match node.key().partial_cmp(probe)? {
                Ordering::Equal => return Some(handle),
                Ordering::Less => {
                    best = Some(handle);
                    current = node.right();
                }
                Ordering::Greater => current = node.left(),
            }
        }

        best
    }

    /// Returns the smallest node whose key is `>= probe`.
    ///
    /// Returns `None` when every key is smaller or the probe is incomparable.
    pub(crate) fn ceiling<T>(&self, probe: &T) -> Option<Handle>
    where
        T: ?Sized,
        K: PartialOrd<T>,
    {
        let mut current = self.root;
        let mut best = None;

        while let Some(handle) = current {
            let node = self.node(handle);
            match node.key().partial_cmp(probe)? {
                Ordering::Equal => return Some(handle),
                Ordering::Greater => {
                    best = Some(handle);
                    current = node.left();
                }
                Ordering::Less => current = node.right(),
            }
        }

        best
    }
}

impl<K: Ord, V> RawAvlTree<K, V> {
    /// Binary search for `key` within the subtree rooted at `from`.
    pub(crate) fn search<Q>(&self, from: Option<Handle>, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = from;

        while let Some(handle) = current {
            let node = self.node(handle);
            current = match key.cmp(node.key().borrow()) {
                Ordering::Equal => return Some(handle),
                Ordering::Less => node.left(),
                Ordering::Greater => node.right(),
            };
        }

        None
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.search(self.root, key).map(|h| self.node(h).value())
    }

    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let handle = self.search(self.root, key)?;
        Some(self.node_mut(handle).value_mut())
    }

    /// Returns the rank (0-indexed position) of a key.
    pub(crate) fn rank_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        let mut lower = 0;

        while let Some(handle) = current {
            let node = self.node(handle);
            let mid = lower + self.size_of(node.left()).to_usize();
            current = match key.cmp(node.key().borrow()) {
                Ordering::Equal => return Some(mid),
                Ordering::Less => node.left(),
                Ordering::Greater => {
                    lower = mid + 1;
                    node.right()
                }
            };
        }

        None
    }

    /// Inserts a new entry and returns its handle.
    ///
    /// Fails with [`TreeError::DuplicateKey`] before allocating anything if the
    /// key is already present.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Result<Handle, TreeError> {
        let Some(mut parent) = self.root else {
            let handle = self.nodes.alloc(Node::new(key, value));
            self.root = Some(handle);
            self.first = Some(handle);
            self.last = Some(handle);
            self.len = 1;
            return Ok(handle);
        };

        let side = loop {
            let node = self.node(parent);
            let side = match key.cmp(node.key()) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => return Err(TreeError::DuplicateKey),
            };
            match node.child(side) {
                Some(child) => parent = child,
                None => break side,
            }
        };

        let handle = self.nodes.alloc(Node::new(key, value));
        self.node_mut(handle).set_parent(Some(parent));
        self.node_mut(parent).set_child(side, Some(handle));

        // A new leaf is the immediate in-order neighbour of its parent.
        match side {
            Side::Left => {
                let before = self.node(parent).prev();
                self.link(before, Some(handle));
                self.link(Some(handle), Some(parent));
            }
            Side::Right => {
                let after = self.node(parent).next();
                self.link(Some(parent), Some(handle));
                self.link(Some(handle), after);
            }
        }

        self.len += 1;

        #[cfg(feature = "tracing")]
        tracing::trace!(node = handle.to_index(), parent = parent.to_index(), side = ?side, "inserted leaf");

        self.rebalance_from(Some(parent));
        Ok(handle)
    }

    /// Removes `key`, returning its entry.
    pub(crate) fn delete<Q>(&mut self, key: &Q) -> Result<(K, V), TreeError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let handle = self.search(self.root, key).ok_or(TreeError::NotFound)?;
        Ok(self.remove_node(handle))
    }

    /// Replaces the value stored under `key`, returning the previous value.
    pub(crate) fn update<Q>(&mut self, key: &Q, value: V) -> Result<V, TreeError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let handle = self.search(self.root, key).ok_or(TreeError::NotFound)?;
        Ok(self.node_mut(handle).replace_value(value))
    }

    /// Verifies every structural invariant, reporting the first violation.
    pub(crate) fn check_invariants(&self) -> Result<(), TreeError> {
        let Some(root) = self.root else {
            if self.len != 0 || self.first.is_some() || self.last.is_some() {
                return Err(invalid(format!("empty tree has len {} or dangling thread ends", self.len)));
            }
            return Ok(());
        };

        if self.node(root).parent().is_some() {
            return Err(invalid(format!("root {} has a parent", root.to_index())));
        }
        if self.size_of(Some(root)).to_usize() != self.len {
            return Err(invalid(format!(
                "root size {} does not match len {}",
                self.size_of(Some(root)).to_usize(),
                self.len
            )));
        }

        // In-order walk, checked step by step against the thread.
        let mut stack: WalkStack<Handle> = WalkStack::new();
        let mut current = Some(root);
        let mut expected = self.first;
        let mut previous: Option<Handle> = None;
        let mut visited = 0;

        loop {
            while let Some(handle) = current {
                if stack.len() > self.len {
                    return Err(invalid(format!("cycle below node {}", handle.to_index())));
                }
                stack.push(handle);
                current = self.node(handle).left();
            }
            let Some(handle) = stack.pop() else {
                break;
            };

            if visited >= self.len {
                return Err(invalid(format!("more than {} nodes reachable from the root", self.len)));
            }
            if expected != Some(handle) {
                return Err(invalid(format!("thread out of step with in-order walk at rank {visited}")));
            }

            let node = self.node(handle);
            if node.prev() != previous {
                return Err(invalid(format!("prev link broken at rank {visited}")));
            }
            if let Some(previous) = previous
                && self.node(previous).key() >= node.key()
            {
                return Err(invalid(format!("keys not strictly increasing at rank {visited}")));
            }
            self.check_node(handle)?;

            visited += 1;
            previous = Some(handle);
            expected = node.next();
            current = node.right();
        }

        if expected.is_some() {
            return Err(invalid(format!("thread continues past the last of {visited} nodes")));
        }
        if self.last != previous {
            return Err(invalid("cached tail is not the maximum node".into()));
        }
        if visited != self.len {
            return Err(invalid(format!("{visited} nodes reachable but len is {}", self.len)));
        }

        Ok(())
    }

    fn check_node(&self, handle: Handle) -> Result<(), TreeError> {
        let node = self.node(handle);
        let index = handle.to_index();

        for child in [node.left(), node.right()].into_iter().flatten() {
            if self.node(child).parent() != Some(handle) {
                return Err(invalid(format!("child {} of node {index} has a wrong parent", child.to_index())));
            }
        }

        let height = 1 + self.height_of(node.left()).max(self.height_of(node.right()));
        if node.height() != height {
            return Err(invalid(format!("node {index} has height {} but should be {height}", node.height())));
        }

        let size = Size::of_subtree(self.size_of(node.left()), self.size_of(node.right()));
        if node.size() != size {
            return Err(invalid(format!(
                "node {index} has size {} but should be {}",
                node.size().to_usize(),
                size.to_usize()
            )));
        }

        let balance = self.balance_factor(handle);
        if !(-1..=1).contains(&balance) {
            return Err(invalid(format!("node {index} has balance factor {balance}")));
        }

        Ok(())
    }
}

fn invalid(message: alloc::string::String) -> TreeError {
    TreeError::InvalidState(message)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::uninlined_format_args)]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    impl<K: Ord, V> RawAvlTree<K, V> {
        /// Panics with a descriptive message if any invariant is violated.
        pub(crate) fn validate_invariants(&self) {
            if let Err(error) = self.check_invariants() {
                panic!("{error}");
            }
        }

        fn thread_keys(&self) -> Vec<&K> {
            let mut keys = Vec::new();
            let mut current = self.first;
            while let Some(handle) = current {
                keys.push(self.node(handle).key());
                current = self.node(handle).next();
            }
            keys
        }

        fn root_key(&self) -> Option<&K> {
            self.root.map(|h| self.node(h).key())
        }
    }

    fn build(keys: &[i32]) -> RawAvlTree<i32, i32> {
        let mut tree = RawAvlTree::new();
        for &key in keys {
            tree.insert(key, key * 10).expect("keys are distinct");
            tree.validate_invariants();
        }
        tree
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i32),
        Delete(i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0i32..500).prop_map(Op::Insert),
            2 => (0i32..500).prop_map(Op::Delete),
        ]
    }

    #[test]
    fn empty_tree() {
        let tree: RawAvlTree<i32, i32> = RawAvlTree::new();
        tree.validate_invariants();
        assert_eq!(tree.height(), 0);
        assert!(tree.at(0).is_none());
        assert!(tree.rank_of(&0).is_none());
        assert!(tree.floor(&0).is_none());
        assert!(tree.ceiling(&0).is_none());
    }

    #[test]
    fn left_left_case_rotates_right() {
        let tree = build(&[3, 2, 1]);
        assert_eq!(tree.root_key(), Some(&2));
        assert_eq!(tree.height(), 2);
    }

    #[test]
    fn right_right_case_rotates_left() {
        let tree = build(&[1, 2, 3]);
        assert_eq!(tree.root_key(), Some(&2));
        assert_eq!(tree.height(), 2);
    }

    #[test]
    fn left_right_case_double_rotates() {
        let tree = build(&[3, 1, 2]);
        assert_eq!(tree.root_key(), Some(&2));
        assert_eq!(tree.thread_keys(), [&1, &2, &3]);
    }

    #[test]
    fn right_left_case_double_rotates() {
        let tree = build(&[1, 3, 2]);
        assert_eq!(tree.root_key(), Some(&2));
        assert_eq!(tree.thread_keys(), [&1, &2, &3]);
    }

    #[test]
    fn delete_leaf() {
        let mut tree = build(&[2, 1, 3]);
        assert_eq!(tree.delete(&1), Ok((1, 10)));
        tree.validate_invariants();
        assert_eq!(tree.thread_keys(), [&2, &3]);
        assert_eq!(tree.first, tree.search(tree.root, &2));
    }

    #[test]
    fn delete_node_with_one_child() {
        let mut tree = build(&[2, 1, 3, 4]);
        assert_eq!(tree.delete(&3), Ok((3, 30)));
        tree.validate_invariants();
        assert_eq!(tree.thread_keys(), [&1, &2, &4]);
        assert_eq!(tree.last, tree.search(tree.root, &4));
    }

    #[test]
    fn delete_with_successor_as_right_child() {
        let mut tree = build(&[2, 1, 3]);
        let three = tree.search(tree.root, &3);
        assert_eq!(tree.delete(&2), Ok((2, 20)));
        tree.validate_invariants();
        assert_eq!(tree.root, three);
        assert_eq!(tree.thread_keys(), [&1, &3]);
    }

    #[test]
    fn delete_with_deep_successor() {
        let mut tree = build(&[50, 25, 75, 10, 30, 60, 90, 65]);
        let sixty = tree.search(tree.root, &60);
        assert_eq!(tree.delete(&50), Ok((50, 500)));
        tree.validate_invariants();
        assert_eq!(tree.root, sixty);
        assert_eq!(tree.thread_keys(), [&10, &25, &30, &60, &65, &75, &90]);
    }

    #[test]
    fn delete_triggers_rebalance() {
        let mut tree = build(&[5, 3, 8, 1]);
        tree.delete(&8).unwrap();
        tree.validate_invariants();
        assert_eq!(tree.root_key(), Some(&3));
    }

    #[test]
    fn delete_missing_key() {
        let mut tree = build(&[1, 2, 3]);
        assert_eq!(tree.delete(&9), Err(TreeError::NotFound));
        assert_eq!(tree.len(), 3);
        tree.validate_invariants();
    }

    #[test]
    fn duplicate_insert_is_rejected_without_mutation() {
        let mut tree = build(&[1, 2, 3]);
        assert_eq!(tree.insert(2, 0), Err(TreeError::DuplicateKey));
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get(&2), Some(&20));
        assert_eq!(tree.nodes.len(), 3);
        tree.validate_invariants();
    }

    #[test]
    fn handles_survive_unrelated_deletes() {
        let mut tree = RawAvlTree::new();
        let handles: Vec<_> = (0..64).map(|k| tree.insert(k, k).unwrap()).collect();
        for k in (0..64).step_by(2) {
            tree.delete(&k).unwrap();
            tree.validate_invariants();
        }
        for k in (1..64).step_by(2) {
            let handle = handles[k as usize];
            assert_eq!(*tree.node(handle).key(), k);
            assert_eq!(tree.rank_of_handle(handle), (k / 2) as usize);
        }
    }

    #[test]
    fn floor_and_ceiling() {
        let tree = build(&[10, 20, 30]);
        let key = |h: Option<Handle>| h.map(|h| *tree.node(h).key());
        assert_eq!(key(tree.floor(&5)), None);
        assert_eq!(key(tree.floor(&10)), Some(10));
        assert_eq!(key(tree.floor(&25)), Some(20));
        assert_eq!(key(tree.floor(&99)), Some(30));
        assert_eq!(key(tree.ceiling(&5)), Some(10));
        assert_eq!(key(tree.ceiling(&25)), Some(30));
        assert_eq!(key(tree.ceiling(&30)), Some(30));
        assert_eq!(key(tree.ceiling(&31)), None);
    }

    #[test]
    fn broken_height_is_reported() {
        let mut tree = build(&[1, 2, 3]);
        let root = tree.root.unwrap();
        tree.node_mut(root).set_height(7);
        assert!(matches!(tree.check_invariants(), Err(TreeError::InvalidState(_))));
    }

    #[test]
    fn broken_thread_is_reported() {
        let mut tree = build(&[1, 2, 3]);
        let first = tree.first.unwrap();
        tree.node_mut(first).set_next(None);
        assert!(matches!(tree.check_invariants(), Err(TreeError::InvalidState(_))));
    }

    #[test]
    fn ascending_inserts_stay_logarithmic() {
        let mut tree = RawAvlTree::new();
        for i in 1..=1000 {
            tree.insert(i, ()).unwrap();
        }
        tree.validate_invariants();
        assert!(tree.height() <= 11, "height {}", tree.height());
    }

    proptest! {
        #[test]
        fn random_operations_preserve_invariants(ops in prop::collection::vec(op_strategy(), 0..300)) {
            let mut tree: RawAvlTree<i32, i32> = RawAvlTree::new();
            let mut expected: BTreeMap<i32, i32> = BTreeMap::new();

            for op in ops {
                match op {
                    Op::Insert(key) => {
                        let result = tree.insert(key, key * 2);
                        if expected.contains_key(&key) {
                            prop_assert_eq!(result, Err(TreeError::DuplicateKey));
                        } else {
                            prop_assert!(result.is_ok());
                            expected.insert(key, key * 2);
                        }
                    }
                    Op::Delete(key) => {
                        let result = tree.delete(&key).ok();
                        prop_assert_eq!(result, expected.remove_entry(&key));
                    }
                }
                tree.validate_invariants();
                prop_assert_eq!(tree.len(), expected.len());
            }

            let keys: Vec<_> = expected.keys().collect();
            prop_assert_eq!(tree.thread_keys(), keys);
        }

        #[test]
        fn at_and_rank_of_agree(keys in prop::collection::btree_set(0i32..1000, 1..200)) {
            let mut tree: RawAvlTree<i32, ()> = RawAvlTree::new();
            for &key in &keys {
                tree.insert(key, ()).unwrap();
            }

            for (rank, key) in keys.iter().enumerate() {
                let handle = tree.at(rank).expect("rank in bounds");
                prop_assert_eq!(tree.node(handle).key(), key);
                prop_assert_eq!(tree.rank_of(key), Some(rank));
                prop_assert_eq!(tree.rank_of_handle(handle), rank);
            }
            prop_assert!(tree.at(keys.len()).is_none());
        }
    }
}
