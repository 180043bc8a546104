#![deny(missing_docs)]

//! Ordered, key-unique map backed by an unbalanced binary search tree, see [`collections::BstMap`].
//!
//! The tree is never rebalanced behind the caller's back; search depth is restored
//! on demand via [`collections::BstMap::balance`], which rebuilds the tree at
//! minimal height.

//!# Features
//!
//! This crate supports the following cargo features:
//! - `serde` : enables serialisation of [`collections::BstMap`] via serde crate.

/// Containers.
pub mod collections;
