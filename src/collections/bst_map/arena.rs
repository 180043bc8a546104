//! Node storage for the map.
//!
//! Nodes live in a slab-style arena and address each other by `u32` index.
//! A node owns nothing but its key and value; the tree shape is entirely in
//! the index links, so the parent back-reference is non-owning and splicing
//! a node never moves or reallocates any other node. Freed slots go on a
//! free list, keeping the indices of surviving nodes stable.

/// A tree vertex: key-value pair plus parent/left/right links.
///
/// Invariant: if `parent` is `Some(p)`, then node `p` has this node as its
/// left or right child, and vice versa.
#[derive(Clone, Debug)]
pub struct Node<K, V> {
    pub key: K,
    pub value: V,
    pub parent: Option<u32>,
    pub left: Option<u32>,
    pub right: Option<u32>,
}

impl<K, V> Node<K, V> {
    pub fn new(key: K, value: V, parent: Option<u32>) -> Self {
        Self {
            key,
            value,
            parent,
            left: None,
            right: None,
        }
    }
}

#[derive(Clone, Debug)]
enum Slot<K, V> {
    // Next slot on the free list, if any.
    Free(Option<u32>),
    Used(Node<K, V>),
}

/// Slab of nodes. Cloning the arena clones every live node, which is all a
/// deep copy of the tree needs.
#[derive(Clone, Debug)]
pub struct NodeArena<K, V> {
    slots: Vec<Slot<K, V>>,
    free: Option<u32>,
}

impl<K, V> NodeArena<K, V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: None,
        }
    }

    /// Store a node, reusing a free slot when one exists.
    pub fn alloc(&mut self, node: Node<K, V>) -> u32 {
        match self.free {
            Some(ix) => {
                let next = match &self.slots[ix as usize] {
                    Slot::Free(next) => *next,
                    Slot::Used(_) => unreachable!("live node on the free list"),
                };
                self.free = next;
                self.slots[ix as usize] = Slot::Used(node);
                ix
            }
            None => {
                let ix = u32::try_from(self.slots.len()).expect("map node limit exceeded");
                self.slots.push(Slot::Used(node));
                ix
            }
        }
    }

    /// Take the node out of slot `ix` and put the slot on the free list.
    /// The node's links are returned as they were; the caller has already
    /// spliced it out of the tree.
    pub fn free(&mut self, ix: u32) -> Node<K, V> {
        let slot = std::mem::replace(&mut self.slots[ix as usize], Slot::Free(self.free));
        self.free = Some(ix);
        match slot {
            Slot::Used(node) => node,
            Slot::Free(_) => unreachable!("freeing a free slot"),
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free = None;
    }

    pub fn node(&self, ix: u32) -> &Node<K, V> {
        match &self.slots[ix as usize] {
            Slot::Used(node) => node,
            Slot::Free(_) => unreachable!("dangling node index"),
        }
    }

    pub fn node_mut(&mut self, ix: u32) -> &mut Node<K, V> {
        match &mut self.slots[ix as usize] {
            Slot::Used(node) => node,
            Slot::Free(_) => unreachable!("dangling node index"),
        }
    }

    /// Descend left links from `ix` as far as they go.
    pub fn leftmost(&self, mut ix: u32) -> u32 {
        while let Some(left) = self.node(ix).left {
            ix = left;
        }
        ix
    }

    /// Descend right links from `ix` as far as they go.
    pub fn rightmost(&self, mut ix: u32) -> u32 {
        while let Some(right) = self.node(ix).right {
            ix = right;
        }
        ix
    }

    /// In-order successor of `ix`: the leftmost node of the right subtree,
    /// or failing that the first ancestor reached from a left-child
    /// position. No stack, only child and parent links.
    pub fn next_in_order(&self, ix: u32) -> Option<u32> {
        if let Some(right) = self.node(ix).right {
            return Some(self.leftmost(right));
        }
        self.next_ancestor(ix)
    }

    /// Climb parent links while coming from a right child; the parent first
    /// reached from a left child is the successor. `None` past the root.
    fn next_ancestor(&self, mut ix: u32) -> Option<u32> {
        while let Some(parent) = self.node(ix).parent {
            if self.node(parent).right == Some(ix) {
                ix = parent;
            } else {
                return Some(parent);
            }
        }
        None
    }

    /// Point the link that currently addresses `old` at `new` instead, and
    /// fix `new`'s parent back-reference. `parent == None` means `old` is
    /// the root, so the tree's root slot is rewritten; root removal is not
    /// a separate code path anywhere above this.
    pub fn replace_child(
        &mut self,
        root: &mut Option<u32>,
        parent: Option<u32>,
        old: u32,
        new: Option<u32>,
    ) {
        match parent {
            None => *root = new,
            Some(p) => {
                let pnode = self.node_mut(p);
                if pnode.left == Some(old) {
                    pnode.left = new;
                } else {
                    pnode.right = new;
                }
            }
        }
        if let Some(child) = new {
            self.node_mut(child).parent = parent;
        }
    }

    /// Splice node `ix` out of the tree and return it.
    ///
    /// Dispatches on the children of `ix`:
    /// - no children: clear the owning link;
    /// - one child: the child takes the slot of `ix`;
    /// - two children: the in-order successor is detached from its spot
    ///   (its right subtree, if any, takes its place), then re-homed into
    ///   the slot of `ix` with both former subtrees of `ix` reattached.
    ///
    /// The successor node is relocated, not copied, so indices of all other
    /// nodes remain valid across the removal.
    pub fn unlink(&mut self, root: &mut Option<u32>, ix: u32) -> Node<K, V> {
        let parent = self.node(ix).parent;
        let left = self.node(ix).left;
        let right = self.node(ix).right;
        match (left, right) {
            (None, None) => {
                self.replace_child(root, parent, ix, None);
            }
            (Some(child), None) | (None, Some(child)) => {
                self.replace_child(root, parent, ix, Some(child));
            }
            (Some(left), Some(right)) => {
                let succ = self.leftmost(right);
                if succ != right {
                    // succ is the left child of its parent; its right
                    // subtree takes the gap it leaves behind.
                    let succ_parent = self.node(succ).parent;
                    let succ_right = self.node(succ).right;
                    self.replace_child(root, succ_parent, succ, succ_right);
                    self.node_mut(succ).right = Some(right);
                    self.node_mut(right).parent = Some(succ);
                }
                self.node_mut(succ).left = Some(left);
                self.node_mut(left).parent = Some(succ);
                self.replace_child(root, parent, ix, Some(succ));
            }
        }
        self.free(ix)
    }
}
