use alloc::string::String;

/// Errors reported by [`OrderedIndexedTree`](crate::OrderedIndexedTree).
///
/// Every failing operation is rejected before the tree is touched, so an `Err`
/// always leaves the tree exactly as it was.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TreeError {
    /// The requested key is not present in the tree.
    #[error("key not found")]
    NotFound,
    /// The key being inserted is already present in the tree.
    #[error("key already present")]
    DuplicateKey,
    /// A rank outside `0..len` was requested.
    #[error("index {index} out of range for tree of size {len}")]
    OutOfRange {
        /// The rejected rank.
        index: usize,
        /// The number of entries at the time of the call.
        len: usize,
    },
    /// A structural invariant does not hold. Only produced by
    /// [`check_invariants`](crate::OrderedIndexedTree::check_invariants).
    #[error("tree invariant violated: {0}")]
    InvalidState(String),
}
