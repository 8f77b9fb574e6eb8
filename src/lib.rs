//! Order-statistic threaded AVL tree for Rust.
//!
//! This crate provides [`OrderedIndexedTree`], a self-balancing binary search tree
//! that keeps two augmentations on every node:
//!
//! - a subtree size, giving O(log n) positional access with [`at`](OrderedIndexedTree::at)
//!   and O(log n) ranking with [`index`](OrderedIndexedTree::index);
//! - `prev`/`next` links threading the nodes into a doubly linked list in key order,
//!   giving O(1) [`next`](OrderedIndexedTree::next)/[`prev`](OrderedIndexedTree::prev)
//!   and O(log n + k) range extraction.
//!
//! # Example
//!
//! ```
//! use threaded_avl::{OrderedIndexedTree, Rank};
//!
//! let mut scores = OrderedIndexedTree::new();
//! scores.insert("Alice", 100).unwrap();
//! scores.insert("Bob", 85).unwrap();
//! scores.insert("Carol", 92).unwrap();
//!
//! assert_eq!(scores.get(&"Bob"), Some(&85));
//! assert_eq!(scores.size(), 3);
//!
//! // Order-statistic operations (O(log n))
//! let median = scores.at(1).unwrap();
//! assert_eq!(scores.key(median), Some(&"Bob"));
//! assert_eq!(scores.index(&"Carol"), Some(2));
//! assert_eq!(scores[Rank(0)], 100);
//!
//! // Threaded traversal (O(1) per step)
//! let next = scores.next(median).unwrap();
//! assert_eq!(scores.key(next), Some(&"Carol"));
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Stable handles** - [`NodeRef`]s survive rebalancing and the removal of other keys
//! - **`tracing`** - Optional feature emitting trace events for rotations and mutations
//!
//! # Implementation
//!
//! Nodes live in an arena and refer to each other by compact handles. Only the
//! `left`/`right` links describe the tree shape; `parent`, `prev` and `next` are
//! lookup links that are repaired on every insert, delete and rotation.

#![no_std]
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod error;
mod order_statistic;
mod raw;

pub mod ordered_indexed_tree;

pub use error::TreeError;
pub use order_statistic::Rank;
pub use ordered_indexed_tree::{NodeRef, OrderedIndexedTree};
