/// A zero-based rank into the sorted order of a tree.
///
/// # Examples
///
/// ```
/// use threaded_avl::{OrderedIndexedTree, Rank};
///
/// let mut tree = OrderedIndexedTree::new();
/// tree.insert("b", 20).unwrap();
/// tree.insert("a", 10).unwrap();
///
/// assert_eq!(tree[Rank(0)], 10);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Rank(pub usize);
