//! An arena-backed binary search tree with rotation primitives, an AVL tree built on top of them,
//! and a rotation-only transformation that reshapes one tree into another.

// Conventions used in comments:
// - The height of a subtree rooted at `x` is denoted `h(x)`. A missing subtree has height 0 and a
//   leaf has height 1.
// - The balance factor of a node `x` is `h(right(x)) - h(left(x))`.
// - A node is a pivot if its balance factor lies outside `-1..=1`.
//
// The fundamental invariants of every tree in this crate are:
// 1. For every node `n`, all keys in `left(n)` are less than `n.key`, and all keys in `right(n)`
//    are greater.
// 2. If `c` is a child of `p`, then `p(c) = p`. The root has no parent.
//
// An `AvlTree` additionally maintains:
// 3. `n.height = 1 + max(h(left(n)), h(right(n)))` for every node.
// 4. No node is a pivot.

use core::{borrow::Borrow, cmp::Ordering, fmt, mem, ops::Not};

mod avl;
mod debug;
mod error;
mod iter;
mod rotate;
mod transform;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use avl::AvlTree;
pub use error::{RotateError, TransformError};
pub use iter::{Iter, Keys, Values};

/// A stable handle to a node stored in a [`Tree`].
///
/// Handles stay valid across rotations and rebalancing. Once the node is removed, its slot may be
/// reused by a later insertion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The side of a node on which a child hangs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dir::Left => f.write_str("left"),
            Dir::Right => f.write_str("right"),
        }
    }
}

type Link = Option<NodeId>;

/// A key-value pair together with its position in a tree.
#[derive(Clone, Debug)]
pub struct Node<K, V> {
    key: K,
    value: V,
    parent: Link,
    children: [Link; 2],
    // Only maintained by `AvlTree`.
    height: u32,
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V, parent: Link) -> Self {
        Node {
            key,
            value,
            parent,
            children: [None; 2],
            height: 1,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn child(&self, dir: Dir) -> Option<NodeId> {
        self.children[dir as usize]
    }

    #[inline]
    pub fn left(&self) -> Option<NodeId> {
        self.child(Dir::Left)
    }

    #[inline]
    pub fn right(&self) -> Option<NodeId> {
        self.child(Dir::Right)
    }
}

/// An unbalanced binary search tree whose nodes live in an arena.
///
/// Every node is owned by the arena; parent and child links are plain [`NodeId`] handles, so the
/// cyclic parent/child relationship never participates in ownership.
#[derive(Clone)]
pub struct Tree<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<NodeId>,
    root: Link,
    len: usize,
}

impl<K, V> Tree<K, V> {
    /// Returns a new empty tree.
    pub const fn new() -> Tree<K, V> {
        Tree {
            slots: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
        }
    }

    /// Returns `true` if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        let empty = self.len() == 0;
        debug_assert_eq!(empty, self.root.is_none());
        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the handle of the root node.
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns the node behind `id`, or `None` if the handle does not name a live node.
    pub fn node(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.slots.get(id.index())?.as_ref()
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.root = None;
        self.len = 0;
    }

    /// Returns the minimum key-value pair in the tree.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let node = self.at(self.min_in_subtree(self.root?).0);
        Some((&node.key, &node.value))
    }

    /// Returns the maximum key-value pair in the tree.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let node = self.at(self.max_in_subtree(self.root?).0);
        Some((&node.key, &node.value))
    }

    /// Returns `true` if `other` has the same topology as `self`, with equal keys at every
    /// position. Values are ignored.
    pub fn same_shape<W>(&self, other: &Tree<K, W>) -> bool
    where
        K: PartialEq,
    {
        if self.len() != other.len() {
            return false;
        }

        let mut stack = vec![(self.root, other.root)];

        while let Some(pair) = stack.pop() {
            match pair {
                (None, None) => (),
                (Some(a), Some(b)) => {
                    let (a, b) = (self.at(a), other.at(b));
                    if a.key != b.key {
                        return false;
                    }

                    stack.push((a.left(), b.left()));
                    stack.push((a.right(), b.right()));
                }
                _ => return false,
            }
        }

        true
    }

    // Node access ============================================================

    #[inline]
    fn at(&self, id: NodeId) -> &Node<K, V> {
        match self.slots.get(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("dangling node handle {id}"),
        }
    }

    #[inline]
    fn at_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        match self.slots.get_mut(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("dangling node handle {id}"),
        }
    }

    #[inline]
    fn parent(&self, id: NodeId) -> Link {
        self.at(id).parent
    }

    #[inline]
    fn child(&self, id: NodeId, dir: Dir) -> Link {
        self.at(id).child(dir)
    }

    #[inline]
    fn left(&self, id: NodeId) -> Link {
        self.child(id, Dir::Left)
    }

    #[inline]
    fn right(&self, id: NodeId) -> Link {
        self.child(id, Dir::Right)
    }

    #[inline]
    fn set_parent(&mut self, id: NodeId, parent: Link) -> Link {
        mem::replace(&mut self.at_mut(id).parent, parent)
    }

    #[inline]
    fn set_child(&mut self, id: NodeId, dir: Dir, child: Link) -> Link {
        mem::replace(&mut self.at_mut(id).children[dir as usize], child)
    }

    fn maybe_set_parent(&mut self, opt_node: Link, parent: Link) {
        let Some(node) = opt_node else {
            return;
        };

        self.set_parent(node, parent);
    }

    fn which_child(&self, parent: NodeId, child: NodeId) -> Dir {
        if self.left(parent) == Some(child) {
            Dir::Left
        } else {
            debug_assert_eq!(self.right(parent), Some(child), "not a child of `parent`");
            Dir::Right
        }
    }

    // Replaces the child link of `parent` pointing at `old_child` with `new_child`, or replaces the
    // root if `parent` is `None`.
    //
    // `new_child`'s parent link is not updated.
    fn replace_child_or_set_root(&mut self, parent: Link, old_child: NodeId, new_child: Link) {
        match parent {
            Some(parent) => {
                let dir = self.which_child(parent, old_child);
                self.set_child(parent, dir, new_child);
            }
            None => self.root = new_child,
        }
    }

    // Returns the minimum node in the subtree.
    //
    // If the subtree root is not the minimum, also returns the minimum node's parent.
    fn min_in_subtree(&self, root: NodeId) -> (NodeId, Link) {
        self.extreme_in_subtree(root, Dir::Left)
    }

    // Returns the maximum node in the subtree.
    //
    // If the subtree root is not the maximum, also returns the maximum node's parent.
    fn max_in_subtree(&self, root: NodeId) -> (NodeId, Link) {
        self.extreme_in_subtree(root, Dir::Right)
    }

    fn extreme_in_subtree(&self, root: NodeId, dir: Dir) -> (NodeId, Link) {
        let mut parent = None;
        let mut cur = root;

        while let Some(next) = self.child(cur, dir) {
            parent = Some(cur);
            cur = next;
        }

        (cur, parent)
    }

    // Returns every node of the tree in post-order, children before parents and left before right.
    fn post_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();

        // Root-right-left preorder, reversed.
        while let Some(cur) = stack.pop() {
            out.push(cur);
            stack.extend(self.left(cur));
            stack.extend(self.right(cur));
        }

        out.reverse();
        out
    }

    // Arena ==================================================================

    fn alloc(&mut self, key: K, value: V, parent: Link) -> NodeId {
        let node = Node::new(key, value, parent);

        match self.free.pop() {
            Some(id) => {
                debug_assert!(self.slots[id.index()].is_none());
                self.slots[id.index()] = Some(node);
                id
            }
            None => {
                let id = NodeId(u32::try_from(self.slots.len()).expect("node arena exhausted"));
                self.slots.push(Some(node));
                id
            }
        }
    }

    fn dealloc(&mut self, id: NodeId) -> Node<K, V> {
        let node = self.slots[id.index()]
            .take()
            .unwrap_or_else(|| panic!("dangling node handle {id}"));
        self.free.push(id);
        node
    }

    // Removes `node` from the tree, returning it along with the lowest node whose subtree changed
    // shape. Heights are not updated.
    fn remove_at(&mut self, node: NodeId) -> (Node<K, V>, Link) {
        // There are three possible cases:
        //
        // 1. `node` has two children.
        //
        //    `node`'s predecessor (the greatest node in its left subtree) is unlinked and assumes
        //    `node`'s place. The predecessor has no right child by definition, so unlinking it is
        //    case 2 or 3.
        //
        // 2. `node` has one child, which is elevated to replace it.
        //
        // 3. `node` is a leaf, and its parent's link to it is cleared.
        let parent = self.parent(node);
        let left = self.left(node);
        let right = self.right(node);

        let lowest_changed = match (left, right) {
            (Some(left), Some(right)) => {
                let (predecessor, predecessor_parent) = self.max_in_subtree(left);

                if let Some(predecessor_parent) = predecessor_parent {
                    // Elevate the predecessor's left child to replace it.
                    let predecessor_left = self.left(predecessor);
                    self.set_child(predecessor_parent, Dir::Right, predecessor_left);
                    self.maybe_set_parent(predecessor_left, Some(predecessor_parent));

                    self.set_child(predecessor, Dir::Left, Some(left));
                    self.set_parent(left, Some(predecessor));
                }
                // Otherwise the predecessor is `left` and keeps its own left subtree.

                self.replace_child_or_set_root(parent, node, Some(predecessor));
                self.set_parent(predecessor, parent);
                self.set_child(predecessor, Dir::Right, Some(right));
                self.set_parent(right, Some(predecessor));

                Some(predecessor_parent.unwrap_or(predecessor))
            }

            (Some(child), None) | (None, Some(child)) => {
                self.replace_child_or_set_root(parent, node, Some(child));
                self.set_parent(child, parent);
                parent
            }

            (None, None) => {
                self.replace_child_or_set_root(parent, node, None);
                parent
            }
        };

        self.len -= 1;

        (self.dealloc(node), lowest_changed)
    }
}

impl<K: Ord, V> Tree<K, V> {
    /// Inserts a key-value pair into the tree.
    ///
    /// If the key is already present, its value is replaced and the old value is returned; no new
    /// node is created.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.insert_node(key, value).1
    }

    // Places `key` by ordered descent. Returns the node holding `key` and the replaced value, if
    // the key was already present.
    fn insert_node(&mut self, key: K, value: V) -> (NodeId, Option<V>) {
        let Some(mut cur) = self.root else {
            // Tree is empty. Make the new node the root and return.
            let id = self.alloc(key, value, None);
            self.root = Some(id);
            self.len += 1;
            return (id, None);
        };

        loop {
            let dir = match key.cmp(&self.at(cur).key) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => {
                    let old = mem::replace(&mut self.at_mut(cur).value, value);
                    return (cur, Some(old));
                }
                Ordering::Greater => Dir::Right,
            };

            match self.child(cur, dir) {
                // Descend.
                Some(child) => cur = child,

                // Attach as a new leaf.
                None => {
                    let id = self.alloc(key, value, Some(cur));
                    self.set_child(cur, dir, Some(id));
                    self.len += 1;
                    return (id, None);
                }
            }
        }
    }

    /// Removes `key` from the tree, returning its value. Absent keys leave the tree unchanged.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.find(key)?;
        Some(self.remove_at(node).0.value)
    }

    /// Returns the handle of the node holding `key`.
    pub fn find<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut opt_cur = self.root;

        loop {
            let cur = opt_cur?;

            match key.cmp(self.at(cur).key.borrow()) {
                Ordering::Less => opt_cur = self.left(cur),
                Ordering::Equal => return Some(cur),
                Ordering::Greater => opt_cur = self.right(cur),
            }
        }
    }

    /// Returns `true` if the tree contains `key`.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Returns a reference to the value associated with `key`.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|id| &self.at(id).value)
    }

    /// Returns a mutable reference to the value associated with `key`.
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.find(key)?;
        Some(&mut self.at_mut(id).value)
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        assert_eq!(self.slots.len() - self.free.len(), self.len, "arena occupancy mismatch");

        let Some(root) = self.root else {
            assert_eq!(self.len, 0);
            return;
        };

        assert_eq!(self.parent(root), None, "root node has a parent");

        let mut reachable = 0;
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            reachable += 1;

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = self.child(node, dir) {
                    // Ensure child's parent link points to this node.
                    assert_eq!(
                        self.parent(child),
                        Some(node),
                        "{dir} child parent link not set"
                    );

                    stack.push(child);
                }
            }
        }

        assert_eq!(reachable, self.len, "unreachable nodes in arena");

        // Ensure the in-order sequence is strictly ascending.
        let mut keys = self.keys();
        if let Some(mut prev) = keys.next() {
            for key in keys {
                assert!(prev < key, "in-order keys are not strictly ascending");
                prev = key;
            }
        }
    }
}

impl<K, V> Default for Tree<K, V> {
    fn default() -> Self {
        Tree::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Tree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> Extend<(K, V)> for Tree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for Tree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Tree::new();
        tree.extend(iter);
        tree
    }
}
