use super::handle::Handle;
use super::size::Size;

/// Which child link of its parent a node hangs from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    pub(crate) const fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

// AVL node: one entry plus its structural and threading links.
#[derive(Clone)]
pub(crate) struct Node<K, V> {
    key: K,
    value: V,
    // Height of the subtree rooted here; a leaf has height 1.
    height: u8,
    // Number of entries in the subtree rooted here, for order-statistic operations.
    size: Size,
    parent: Option<Handle>,
    left: Option<Handle>,
    right: Option<Handle>,
    // In-order neighbours.
    prev: Option<Handle>,
    next: Option<Handle>,
}

impl<K, V> Node<K, V> {
    /// Creates a detached leaf.
    pub(crate) fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            height: 1,
            size: Size::ONE,
            parent: None,
            left: None,
            right: None,
            prev: None,
            next: None,
        }
    }

    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    pub(crate) fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Swaps in a new value, returning the old one.
    pub(crate) fn replace_value(&mut self, value: V) -> V {
        core::mem::replace(&mut self.value, value)
    }

    pub(crate) fn into_entry(self) -> (K, V) {
        (self.key, self.value)
    }

    pub(crate) fn height(&self) -> u8 {
        self.height
    }

    pub(crate) fn set_height(&mut self, height: u8) {
        self.height = height;
    }

    pub(crate) fn size(&self) -> Size {
        self.size
    }

    pub(crate) fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    pub(crate) fn parent(&self) -> Option<Handle> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        self.parent = parent;
    }

    pub(crate) fn left(&self) -> Option<Handle> {
        self.left
    }

    pub(crate) fn set_left(&mut self, left: Option<Handle>) {
        self.left = left;
    }

    pub(crate) fn right(&self) -> Option<Handle> {
        self.right
    }

    pub(crate) fn set_right(&mut self, right: Option<Handle>) {
        self.right = right;
    }

    pub(crate) fn child(&self, side: Side) -> Option<Handle> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub(crate) fn set_child(&mut self, side: Side, child: Option<Handle>) {
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }

    pub(crate) fn prev(&self) -> Option<Handle> {
        self.prev
    }

    pub(crate) fn set_prev(&mut self, prev: Option<Handle>) {
        self.prev = prev;
    }

    pub(crate) fn next(&self) -> Option<Handle> {
        self.next
    }

    pub(crate) fn set_next(&mut self, next: Option<Handle>) {
        self.next = next;
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn new_node_is_detached_leaf() {
        let node = Node::new(7, "seven");
        assert_eq!(*node.key(), 7);
        assert_eq!(*node.value(), "seven");
        assert_eq!(node.height(), 1);
        assert_eq!(node.size(), Size::ONE);
        assert!(node.left().is_none() && node.right().is_none());
        assert!(node.parent().is_none());
        assert!(node.prev().is_none() && node.next().is_none());
    }

    #[test]
    fn child_links_by_side() {
        let mut node = Node::new(1, ());
        let l = Handle::from_index(3);
        let r = Handle::from_index(4);
        node.set_child(Side::Left, Some(l));
        node.set_child(Side::Right, Some(r));
        assert_eq!(node.left(), Some(l));
        assert_eq!(node.child(Side::Right), Some(r));
    }

    #[test]
    fn replace_value_returns_old() {
        let mut node = Node::new(1, 10);
        assert_eq!(node.replace_value(20), 10);
        *node.value_mut() += 1;
        assert_eq!(node.into_entry(), (1, 21));
    }
}
