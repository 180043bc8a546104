//! [`BstMap`] - an ordered map over an unbalanced binary search tree.
//!
//! Unlike [`std::collections::BTreeMap`] the tree makes no shape guarantee
//! on mutation: nodes are placed where the search for their key bottoms out,
//! so a pathological insertion order degrades search to O(n). In exchange,
//! insertion and removal never move any node but the one being spliced, and
//! [`BstMap::balance`] rebuilds the tree at minimal height in one pass when
//! the caller decides it is worth paying for.
//!
//! Every node carries a parent back-reference, so in-order traversal walks
//! the tree using child and parent links only - no auxiliary stack, no
//! recursion.
//!
//! # Example
//!
//! ```
//!     use bstmap::collections::bst_map::BstMap;
//!     let mut mymap = BstMap::new();
//!     mymap.insert("England", "London");
//!     mymap.insert("France", "Paris");
//!     println!("The capital of France is {}", mymap[&"France"]);
//! ```
//!
//!# Features
//!
//! This crate supports the following cargo features:
//! - `serde` : enables serialisation of [`BstMap`] via serde crate.

use std::{cmp::Ordering, fmt, fmt::Debug, iter::FusedIterator};

mod arena;
use arena::{Node, NodeArena};

/// Key ordering for a [`BstMap`], fixed when the map is constructed.
///
/// Must be a strict weak order; two keys are considered equal iff neither
/// orders before the other. Every placement decision in the tree goes
/// through this trait, so swapping the order out from under a non-empty map
/// is not expressible.
pub trait KeyOrder<K>: Clone {
    /// Compare two keys.
    fn order(&self, a: &K, b: &K) -> Ordering;
}

/// Default [`KeyOrder`] that uses the key type's [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct NaturalOrder;

impl<K: Ord> KeyOrder<K> for NaturalOrder {
    fn order(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// `BstMap` - ordered, key-unique map backed by an unbalanced binary search tree.
///
/// General guide to implementation:
///
/// Nodes live in a slab arena and refer to each other by stable `u32`
/// indices; the map holds the root index and the comparator. Search, insert
/// and the entry API all share one descent routine (`locate`). Removal
/// splices the in-order successor node into the gap rather than copying its
/// data, and treats "no parent" as "rewrite the root slot", so root removal
/// is the same code path as any other. Iteration is stackless, stepping
/// through leftmost/parent links.
pub struct BstMap<K, V, C: KeyOrder<K> = NaturalOrder> {
    arena: NodeArena<K, V>,
    root: Option<u32>,
    len: usize,
    order: C,
}

impl<K: Ord, V> Default for BstMap<K, V> {
    /// Creates an empty BstMap.
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone, C: KeyOrder<K>> Clone for BstMap<K, V, C> {
    /// Deep copy: every node is cloned into a fresh arena, so mutating the
    /// copy never affects the source.
    fn clone(&self) -> Self {
        Self {
            arena: self.arena.clone(),
            root: self.root,
            len: self.len,
            order: self.order.clone(),
        }
    }
}

impl<K: Ord, V> BstMap<K, V> {
    /// Returns a new, empty map ordered by the key type's [`Ord`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_order(NaturalOrder)
    }
}

impl<K, V, C: KeyOrder<K>> BstMap<K, V, C> {
    /// Returns a new, empty map with the specified key order.
    ///
    /// # Example
    ///
    /// ```
    ///     use std::cmp::Ordering;
    ///     use bstmap::collections::bst_map::{BstMap, KeyOrder};
    ///
    ///     #[derive(Clone)]
    ///     struct Descending;
    ///     impl KeyOrder<i32> for Descending {
    ///         fn order(&self, a: &i32, b: &i32) -> Ordering {
    ///             b.cmp(a)
    ///         }
    ///     }
    ///
    ///     let mut map = BstMap::with_order(Descending);
    ///     map.insert(1, "one");
    ///     map.insert(2, "two");
    ///     assert_eq!(map.first_key_value(), Some((&2, &"two")));
    /// ```
    #[must_use]
    pub fn with_order(order: C) -> Self {
        Self {
            arena: NodeArena::new(),
            root: None,
            len: 0,
            order,
        }
    }

    /// Get number of key-value pairs in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the map empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Clear the map, destroying the whole tree.
    pub fn clear(&mut self) {
        self.len = 0;
        self.root = None;
        self.arena.clear();
    }

    /// Walk from the root towards `key`, descending left or right by
    /// comparison, exactly once per call. Returns `None` for an empty tree;
    /// otherwise the node the descent stopped at, together with the
    /// comparison that stopped it: `Equal` means the key was found, `Less`
    /// or `Greater` means the node is the would-be parent for insertion.
    fn locate(&self, key: &K) -> Option<(u32, Ordering)> {
        let mut cur = self.root?;
        loop {
            let node = self.arena.node(cur);
            match self.order.order(key, &node.key) {
                Ordering::Less => match node.left {
                    Some(left) => cur = left,
                    None => return Some((cur, Ordering::Less)),
                },
                Ordering::Greater => match node.right {
                    Some(right) => cur = right,
                    None => return Some((cur, Ordering::Greater)),
                },
                Ordering::Equal => return Some((cur, Ordering::Equal)),
            }
        }
    }

    fn insert_pair(&mut self, key: K, value: V) -> (u32, bool) {
        match self.locate(&key) {
            None => {
                let ix = self.arena.alloc(Node::new(key, value, None));
                self.root = Some(ix);
                self.len += 1;
                (ix, true)
            }
            Some((anchor, Ordering::Equal)) => (anchor, false),
            Some((anchor, side)) => {
                let ix = self.arena.alloc(Node::new(key, value, Some(anchor)));
                let anode = self.arena.node_mut(anchor);
                if side == Ordering::Less {
                    anode.left = Some(ix);
                } else {
                    anode.right = Some(ix);
                }
                self.len += 1;
                (ix, true)
            }
        }
    }

    /// Insert a key-value pair. If the key is already present the map is
    /// left untouched (no overwrite) and the flag is false; otherwise a new
    /// leaf is attached and the flag is true. Either way the returned
    /// cursor is positioned on the entry for `key`.
    ///
    /// # Example
    ///
    /// ```
    ///     use bstmap::collections::bst_map::BstMap;
    ///     let mut map = BstMap::new();
    ///     assert!(map.insert(8, 8).1);
    ///     assert!(!map.insert(8, 9).1);
    ///     assert_eq!(map.get(&8), Some(&8));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> (Cursor<'_, K, V, C>, bool) {
        let (ix, inserted) = self.insert_pair(key, value);
        (
            Cursor {
                map: &*self,
                node: Some(ix),
            },
            inserted,
        )
    }

    /// Get a cursor positioned on the entry for `key`, or the end cursor if
    /// the key is absent (or the map is empty).
    #[must_use]
    pub fn find(&self, key: &K) -> Cursor<'_, K, V, C> {
        let node = match self.locate(key) {
            Some((ix, Ordering::Equal)) => Some(ix),
            _ => None,
        };
        Cursor { map: self, node }
    }

    /// Does the map have an entry for the specified key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Get reference to the value corresponding to the key.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        match self.locate(key) {
            Some((ix, Ordering::Equal)) => Some(&self.arena.node(ix).value),
            _ => None,
        }
    }

    /// Get a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.locate(key) {
            Some((ix, Ordering::Equal)) => Some(&mut self.arena.node_mut(ix).value),
            _ => None,
        }
    }

    /// Get references to the corresponding key and value.
    #[must_use]
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        match self.locate(key) {
            Some((ix, Ordering::Equal)) => {
                let node = self.arena.node(ix);
                Some((&node.key, &node.value))
            }
            _ => None,
        }
    }

    /// Get references to first key and value (least key).
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let node = self.arena.node(self.arena.leftmost(self.root?));
        Some((&node.key, &node.value))
    }

    /// Get references to last key and value (greatest key).
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let node = self.arena.node(self.arena.rightmost(self.root?));
        Some((&node.key, &node.value))
    }

    /// Remove key-value pair from map, returning just the value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_k, v)| v)
    }

    /// Remove key-value pair from map.
    ///
    /// The matching node is spliced out structurally: in the two-children
    /// case its in-order successor node is relocated into the gap, not
    /// copied, so the removal touches no entry data but the pair returned.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let ix = match self.locate(key) {
            Some((ix, Ordering::Equal)) => ix,
            _ => return None,
        };
        let node = self.arena.unlink(&mut self.root, ix);
        self.len -= 1;
        Some((node.key, node.value))
    }

    /// Remove by key, reporting whether a pair was removed. An empty map or
    /// an absent key is an ordinary `false`, never an error.
    pub fn erase(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    /// Get Entry for map key.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, C> {
        match self.locate(&key) {
            Some((ix, Ordering::Equal)) => Entry::Occupied(OccupiedEntry { map: self, node: ix }),
            anchor => Entry::Vacant(VacantEntry {
                key,
                anchor: anchor.map(|(ix, _)| ix),
                map: self,
            }),
        }
    }

    /// Rebuild the tree at minimal height: ⌈log2(n+1)⌉ levels for n pairs.
    ///
    /// The tree is flattened to a sorted sequence by one in-order
    /// traversal, discarded, and rebuilt by recursive median insertion
    /// (lower median on even-length ranges), which is deterministic for a
    /// given key set. The key-value pairs themselves are untouched.
    pub fn balance(&mut self) {
        let mut pairs: Vec<Option<(K, V)>> = self.take_sorted().into_iter().map(Some).collect();
        let len = pairs.len();
        self.rebuild(&mut pairs, 0, len);
    }

    // Insert the median of pairs[lo..hi], then recurse on both halves.
    // Every insertion lands in an already-balanced partial tree, so the
    // descents stay within one of optimal depth throughout.
    fn rebuild(&mut self, pairs: &mut [Option<(K, V)>], lo: usize, hi: usize) {
        if lo >= hi {
            return;
        }
        let mid = lo + (hi - lo - 1) / 2;
        let (key, value) = pairs[mid].take().unwrap();
        self.insert_pair(key, value);
        self.rebuild(pairs, lo, mid);
        self.rebuild(pairs, mid + 1, hi);
    }

    /// Flatten the tree into ascending (key, value) pairs, leaving the map
    /// empty. One traversal to fix the order, then the nodes are drained.
    fn take_sorted(&mut self) -> Vec<(K, V)> {
        let mut order = Vec::with_capacity(self.len);
        let mut cur = self.root.map(|root| self.arena.leftmost(root));
        while let Some(ix) = cur {
            order.push(ix);
            cur = self.arena.next_in_order(ix);
        }
        let mut pairs = Vec::with_capacity(order.len());
        for ix in order {
            let node = self.arena.free(ix);
            pairs.push((node.key, node.value));
        }
        self.root = None;
        self.len = 0;
        self.arena.clear();
        pairs
    }

    /// Height of the tree: the number of nodes on the longest root-to-leaf
    /// path. An empty map has height 0. After [`BstMap::balance`] this is
    /// ⌈log2(n+1)⌉.
    #[must_use]
    pub fn height(&self) -> usize {
        self.root.map_or(0, |root| self.subtree_height(root))
    }

    // Structural recursion, bounded by tree height.
    fn subtree_height(&self, ix: u32) -> usize {
        let node = self.arena.node(ix);
        let left = node.left.map_or(0, |l| self.subtree_height(l));
        let right = node.right.map_or(0, |r| self.subtree_height(r));
        1 + left.max(right)
    }

    /// Get iterator of references to key-value pairs, in ascending key
    /// order. The iterator walks the tree through child and parent links
    /// only; it is forward-only and single-pass, but cheap to re-derive.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            arena: &self.arena,
            next: self.root.map(|root| self.arena.leftmost(root)),
            remaining: self.len,
        }
    }

    /// Get iterator of references to keys.
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    /// Get iterator of references to values.
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }

    /// Get consuming iterator that returns all the keys, in sorted order.
    #[must_use]
    pub fn into_keys(self) -> IntoKeys<K, V> {
        IntoKeys(self.into_iter())
    }

    /// Get consuming iterator that returns all the values, in sorted order.
    #[must_use]
    pub fn into_values(self) -> IntoValues<K, V> {
        IntoValues(self.into_iter())
    }

    /// Cursor positioned on the first (least-key) entry, or the end cursor
    /// if the map is empty.
    #[must_use]
    pub fn front(&self) -> Cursor<'_, K, V, C> {
        Cursor {
            map: self,
            node: self.root.map(|root| self.arena.leftmost(root)),
        }
    }

    /// The end cursor: the distinguished position past the last entry.
    #[must_use]
    pub fn end(&self) -> Cursor<'_, K, V, C> {
        Cursor {
            map: self,
            node: None,
        }
    }

    /// Verify the tree invariants: strict key ordering along the in-order
    /// walk, parent/child mutual consistency, and the stored length.
    #[cfg(test)]
    pub(crate) fn check(&self) {
        if let Some(root) = self.root {
            assert!(self.arena.node(root).parent.is_none());
        }
        let mut count = 0;
        let mut prev: Option<u32> = None;
        let mut cur = self.root.map(|root| self.arena.leftmost(root));
        while let Some(ix) = cur {
            let node = self.arena.node(ix);
            if let Some(left) = node.left {
                assert_eq!(self.arena.node(left).parent, Some(ix));
            }
            if let Some(right) = node.right {
                assert_eq!(self.arena.node(right).parent, Some(ix));
            }
            if let Some(prev) = prev {
                let prev_key = &self.arena.node(prev).key;
                assert_eq!(self.order.order(prev_key, &node.key), Ordering::Less);
            }
            prev = Some(ix);
            count += 1;
            cur = self.arena.next_in_order(ix);
        }
        assert_eq!(count, self.len);
    }
} // End impl BstMap

use std::hash::{Hash, Hasher};
impl<K: Hash, V: Hash, C: KeyOrder<K>> Hash for BstMap<K, V, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for elt in self {
            elt.hash(state);
        }
    }
}
impl<K: PartialEq, V: PartialEq, C: KeyOrder<K>> PartialEq for BstMap<K, V, C> {
    fn eq(&self, other: &BstMap<K, V, C>) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}
impl<K: Eq, V: Eq, C: KeyOrder<K>> Eq for BstMap<K, V, C> {}

impl<K: PartialOrd, V: PartialOrd, C: KeyOrder<K>> PartialOrd for BstMap<K, V, C> {
    fn partial_cmp(&self, other: &BstMap<K, V, C>) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}
impl<K: Ord, V: Ord, C: KeyOrder<K>> Ord for BstMap<K, V, C> {
    fn cmp(&self, other: &BstMap<K, V, C>) -> Ordering {
        self.iter().cmp(other.iter())
    }
}
impl<K, V, C: KeyOrder<K>> IntoIterator for BstMap<K, V, C> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    /// Convert `BstMap` to [`IntoIter`].
    fn into_iter(mut self) -> IntoIter<K, V> {
        IntoIter(self.take_sorted().into_iter())
    }
}
impl<'a, K, V, C: KeyOrder<K>> IntoIterator for &'a BstMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}
impl<K: Ord, V> FromIterator<(K, V)> for BstMap<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> BstMap<K, V> {
        let mut map = BstMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
impl<K: Ord, V, const N: usize> From<[(K, V); N]> for BstMap<K, V> {
    fn from(arr: [(K, V); N]) -> BstMap<K, V> {
        let mut map = BstMap::new();
        for (k, v) in arr {
            map.insert(k, v);
        }
        map
    }
}
impl<K, V, C: KeyOrder<K>> Extend<(K, V)> for BstMap<K, V, C> {
    fn extend<T>(&mut self, iter: T)
    where
        T: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}
impl<K, V, C: KeyOrder<K>> std::ops::Index<&K> for BstMap<K, V, C> {
    type Output = V;

    /// Returns a reference to the value corresponding to the supplied key.
    ///
    /// Panics if the key is not present in the `BstMap`. The inserting half
    /// of a find-or-default access is [`BstMap::entry`] with
    /// [`Entry::or_default`].
    #[inline]
    fn index(&self, key: &K) -> &V {
        self.get(key).expect("no entry found for key")
    }
}
impl<K: Debug, V: Debug, C: KeyOrder<K>> Debug for BstMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
impl<K: fmt::Display, V: fmt::Display, C: KeyOrder<K>> fmt::Display for BstMap<K, V, C> {
    /// Ordered dump: one `key: value` line per entry, ascending by key.
    /// A single traversal, no structural mutation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in self.iter() {
            writeln!(f, "{k}: {v}")?;
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

#[cfg(feature = "serde")]
use std::marker::PhantomData;

#[cfg(feature = "serde")]
impl<K: Serialize, V: Serialize, C: KeyOrder<K>> Serialize for BstMap<K, V, C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
struct BstMapVisitor<K: Ord, V> {
    marker: PhantomData<fn() -> BstMap<K, V>>,
}

#[cfg(feature = "serde")]
impl<K: Ord, V> BstMapVisitor<K, V> {
    fn new() -> Self {
        BstMapVisitor {
            marker: PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> Visitor<'de> for BstMapVisitor<K, V>
where
    K: Deserialize<'de> + Ord,
    V: Deserialize<'de>,
{
    type Value = BstMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("BstMap")
    }

    fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut map = BstMap::new();
        while let Some((k, v)) = access.next_entry()? {
            map.insert(k, v);
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> Deserialize<'de> for BstMap<K, V>
where
    K: Deserialize<'de> + Ord,
    V: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(BstMapVisitor::new())
    }
}

/// Entry in a [`BstMap`], obtained from [`BstMap::entry`].
pub enum Entry<'a, K, V, C: KeyOrder<K> = NaturalOrder> {
    /// Vacant entry - map doesn't yet contain key.
    Vacant(VacantEntry<'a, K, V, C>),
    /// Occupied entry - map already contains key.
    Occupied(OccupiedEntry<'a, K, V, C>),
}
impl<'a, K, V, C: KeyOrder<K>> Entry<'a, K, V, C> {
    /// Get reference to entry key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Vacant(e) => &e.key,
            Entry::Occupied(e) => e.key(),
        }
    }

    /// Insert default value, returning mutable reference to inserted value.
    ///
    /// This is the find-or-insert-default access: it never fails, and may
    /// grow the tree by one leaf.
    ///
    /// # Example
    ///
    /// ```
    ///     use bstmap::collections::bst_map::BstMap;
    ///     let mut map: BstMap<i32, i32> = BstMap::new();
    ///     assert_eq!(*map.entry(5).or_default(), 0);
    ///     assert!(map.contains_key(&5));
    /// ```
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        match self {
            Entry::Vacant(e) => e.insert(Default::default()),
            Entry::Occupied(e) => e.into_mut(),
        }
    }

    /// Insert value, returning mutable reference to inserted value.
    pub fn or_insert(self, value: V) -> &'a mut V {
        match self {
            Entry::Vacant(e) => e.insert(value),
            Entry::Occupied(e) => e.into_mut(),
        }
    }

    /// Insert default value obtained from function, returning mutable reference to inserted value.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Vacant(e) => e.insert(default()),
            Entry::Occupied(e) => e.into_mut(),
        }
    }

    /// Modify existing value ( if entry is occupied ).
    pub fn and_modify<F>(mut self, f: F) -> Entry<'a, K, V, C>
    where
        F: FnOnce(&mut V),
    {
        match &mut self {
            Entry::Vacant(_e) => {}
            Entry::Occupied(e) => {
                let v = e.get_mut();
                f(v);
            }
        }
        self
    }
}

/// Vacant [Entry].
pub struct VacantEntry<'a, K, V, C: KeyOrder<K> = NaturalOrder> {
    key: K,
    // Node the key search bottomed out at: the would-be parent. None iff
    // the map is empty.
    anchor: Option<u32>,
    map: &'a mut BstMap<K, V, C>,
}

impl<K: Debug, V, C: KeyOrder<K>> Debug for VacantEntry<'_, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VacantEntry").field(self.key()).finish()
    }
}

impl<'a, K, V, C: KeyOrder<K>> VacantEntry<'a, K, V, C> {
    /// Get reference to entry key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Get entry key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Insert value into map returning reference to inserted value.
    pub fn insert(self, value: V) -> &'a mut V {
        let map = self.map;
        let ix = match self.anchor {
            None => {
                let ix = map.arena.alloc(Node::new(self.key, value, None));
                map.root = Some(ix);
                ix
            }
            Some(anchor) => {
                let side = map.order.order(&self.key, &map.arena.node(anchor).key);
                let ix = map.arena.alloc(Node::new(self.key, value, Some(anchor)));
                let anode = map.arena.node_mut(anchor);
                if side == Ordering::Less {
                    anode.left = Some(ix);
                } else {
                    anode.right = Some(ix);
                }
                ix
            }
        };
        map.len += 1;
        &mut map.arena.node_mut(ix).value
    }
}

/// Occupied [Entry].
pub struct OccupiedEntry<'a, K, V, C: KeyOrder<K> = NaturalOrder> {
    map: &'a mut BstMap<K, V, C>,
    node: u32,
}
impl<K: Debug, V: Debug, C: KeyOrder<K>> Debug for OccupiedEntry<'_, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OccupiedEntry")
            .field("key", self.key())
            .field("value", self.get())
            .finish()
    }
}

impl<'a, K, V, C: KeyOrder<K>> OccupiedEntry<'a, K, V, C> {
    /// Get reference to entry key.
    #[must_use]
    pub fn key(&self) -> &K {
        &self.map.arena.node(self.node).key
    }

    /// Remove (key,value) from map, returning key and value.
    #[must_use]
    pub fn remove_entry(self) -> (K, V) {
        let node = self.map.arena.unlink(&mut self.map.root, self.node);
        self.map.len -= 1;
        (node.key, node.value)
    }

    /// Remove (key,value) from map, returning the value.
    #[must_use]
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Get reference to the value.
    #[must_use]
    pub fn get(&self) -> &V {
        &self.map.arena.node(self.node).value
    }

    /// Get mutable reference to the value.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.map.arena.node_mut(self.node).value
    }

    /// Get mutable reference to the value, consuming the entry.
    #[must_use]
    pub fn into_mut(self) -> &'a mut V {
        &mut self.map.arena.node_mut(self.node).value
    }

    /// Update the value returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        std::mem::replace(self.get_mut(), value)
    }
}

// Iteration.

/// Iterator returned by [`BstMap::iter`].
///
/// Steps through the tree using child and parent links only: the next node
/// after `n` is the leftmost node of `n`'s right subtree, or else the first
/// ancestor reached from a left-child position. Forward-only, as the
/// sequence contract requires; there is no `next_back`.
pub struct Iter<'a, K, V> {
    arena: &'a NodeArena<K, V>,
    next: Option<u32>,
    remaining: usize,
}
impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena,
            next: self.next,
            remaining: self.remaining,
        }
    }
}
impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        let ix = self.next?;
        let node = self.arena.node(ix);
        self.next = self.arena.next_in_order(ix);
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Consuming iterator returned by [`BstMap::into_iter`].
pub struct IntoIter<K, V>(std::vec::IntoIter<(K, V)>);
impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}
impl<K, V> ExactSizeIterator for IntoIter<K, V> {
    fn len(&self) -> usize {
        self.0.len()
    }
}
impl<K, V> FusedIterator for IntoIter<K, V> {}

/// Iterator returned by [`BstMap::keys`].
#[derive(Clone)]
pub struct Keys<'a, K, V>(Iter<'a, K, V>);
impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, _v)| k)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}
impl<K, V> ExactSizeIterator for Keys<'_, K, V> {
    fn len(&self) -> usize {
        self.0.len()
    }
}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Iterator returned by [`BstMap::values`].
#[derive(Clone)]
pub struct Values<'a, K, V>(Iter<'a, K, V>);
impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_k, v)| v)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}
impl<K, V> ExactSizeIterator for Values<'_, K, V> {
    fn len(&self) -> usize {
        self.0.len()
    }
}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// Iterator returned by [`BstMap::into_keys`].
pub struct IntoKeys<K, V>(IntoIter<K, V>);
impl<K, V> Iterator for IntoKeys<K, V> {
    type Item = K;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, _v)| k)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}
impl<K, V> ExactSizeIterator for IntoKeys<K, V> {
    fn len(&self) -> usize {
        self.0.len()
    }
}
impl<K, V> FusedIterator for IntoKeys<K, V> {}

/// Iterator returned by [`BstMap::into_values`].
pub struct IntoValues<K, V>(IntoIter<K, V>);
impl<K, V> Iterator for IntoValues<K, V> {
    type Item = V;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_k, v)| v)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}
impl<K, V> ExactSizeIterator for IntoValues<K, V> {
    fn len(&self) -> usize {
        self.0.len()
    }
}
impl<K, V> FusedIterator for IntoValues<K, V> {}

/// Read-only position in a [`BstMap`], returned by [`BstMap::find`],
/// [`BstMap::insert`], [`BstMap::front`] and [`BstMap::end`].
///
/// A cursor holds a shared borrow of the map for its whole lifetime, so the
/// tree cannot be structurally mutated while any cursor is live - the
/// invalidated-cursor hazard is a compile error here, not a runtime fault.
/// The end position (no current node) is represented by the same type;
/// advancing past the last entry reaches it and stays there.
pub struct Cursor<'a, K, V, C: KeyOrder<K> = NaturalOrder> {
    map: &'a BstMap<K, V, C>,
    node: Option<u32>,
}
impl<K, V, C: KeyOrder<K>> Clone for Cursor<'_, K, V, C> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<K, V, C: KeyOrder<K>> Copy for Cursor<'_, K, V, C> {}
impl<K, V, C: KeyOrder<K>> PartialEq for Cursor<'_, K, V, C> {
    /// Cursors are equal iff they address the same position of the same map.
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.map, other.map) && self.node == other.node
    }
}
impl<K, V, C: KeyOrder<K>> Eq for Cursor<'_, K, V, C> {}
impl<K: Debug, V: Debug, C: KeyOrder<K>> Debug for Cursor<'_, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.key_value()).finish()
    }
}

impl<'a, K, V, C: KeyOrder<K>> Cursor<'a, K, V, C> {
    /// References to the current key and value, or `None` at the end
    /// position.
    #[must_use]
    pub fn key_value(&self) -> Option<(&'a K, &'a V)> {
        let node = self.map.arena.node(self.node?);
        Some((&node.key, &node.value))
    }

    /// Reference to the current key, or `None` at the end position.
    #[must_use]
    pub fn key(&self) -> Option<&'a K> {
        self.key_value().map(|(k, _v)| k)
    }

    /// Reference to the current value, or `None` at the end position.
    #[must_use]
    pub fn value(&self) -> Option<&'a V> {
        self.key_value().map(|(_k, v)| v)
    }

    /// Is this the end position?
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// Step to the in-order successor. At the last entry this reaches the
    /// end position; at the end position it stays there.
    pub fn move_next(&mut self) {
        if let Some(ix) = self.node {
            self.node = self.map.arena.next_in_order(ix);
        }
    }
}

// Tests.

/* mimalloc cannot be used with miri */
#[cfg(all(test, not(miri)))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[cfg(test)]
mod mytests;
