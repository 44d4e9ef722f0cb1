use core::{borrow::Borrow, cmp, fmt};

use tracing::debug;

use crate::{Dir, Iter, Keys, Link, Node, NodeId, Tree, TransformError, Values};

/// A height-balanced binary search tree.
///
/// After every insertion and removal, the heights of a node's two subtrees differ by at most one.
/// Balance is restored with the rotations of [`Tree::rotate_left`] and [`Tree::rotate_right`].
pub struct AvlTree<K, V> {
    tree: Tree<K, V>,
}

impl<K, V> AvlTree<K, V> {
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<K, V> {
        AvlTree { tree: Tree::new() }
    }

    /// Returns `true` if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the handle of the root node.
    pub const fn root(&self) -> Option<NodeId> {
        self.tree.root()
    }

    /// Returns the node behind `id`, or `None` if the handle does not name a live node.
    pub fn node(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.tree.node(id)
    }

    /// Returns the cached height of the subtree rooted at `id`.
    pub fn height(&self, id: NodeId) -> Option<u32> {
        self.tree.node(id).map(|node| node.height)
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Returns the underlying search tree.
    pub fn as_tree(&self) -> &Tree<K, V> {
        &self.tree
    }

    /// Unwraps the underlying search tree.
    pub fn into_tree(self) -> Tree<K, V> {
        self.tree
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        self.tree.iter()
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        self.tree.keys()
    }

    pub fn values(&self) -> Values<'_, K, V> {
        self.tree.values()
    }

    /// Returns `true` if no node's subtree heights differ by more than one.
    ///
    /// Heights are recomputed from scratch; the cached heights are not consulted.
    pub fn is_height_balanced(&self) -> bool {
        self.tree.is_height_balanced()
    }

    /// Returns the deepest node whose subtree heights differ by more than one.
    ///
    /// Heights are recomputed from scratch. Outside of a bug, this is always `None`.
    pub fn find_pivot(&self) -> Option<NodeId> {
        self.tree.find_pivot()
    }

    /// Returns `true` if `other` has the same topology and keys as `self`.
    pub fn same_shape<W>(&self, other: &AvlTree<K, W>) -> bool
    where
        K: PartialEq,
    {
        self.tree.same_shape(&other.tree)
    }

    #[inline]
    fn height_of(&self, link: Link) -> u32 {
        link.map_or(0, |id| self.tree.at(id).height)
    }

    fn update_height(&mut self, id: NodeId) {
        let node = self.tree.at(id);
        let height = 1 + cmp::max(self.height_of(node.left()), self.height_of(node.right()));
        self.tree.at_mut(id).height = height;
    }

    #[inline]
    fn balance_factor(&self, id: NodeId) -> i64 {
        let node = self.tree.at(id);
        i64::from(self.height_of(node.right())) - i64::from(self.height_of(node.left()))
    }

    // Recomputes every cached height, children before parents.
    fn recompute_heights(&mut self) {
        for id in self.tree.post_order() {
            self.update_height(id);
        }
    }

    // Walks from `start` to the root, refreshing heights and fixing every pivot on the way.
    //
    // Only the path from the modified position to the root can hold stale heights, so the first
    // pivot met on the way up is the deepest one in the tree. After an insertion, fixing it
    // restores the subtree's previous height and no further pivot is found. After a removal, the
    // fixed subtree may still be one shorter than before and an ancestor can become a pivot too.
    fn rebalance_from(&mut self, start: Link) {
        let mut opt_cur = start;

        while let Some(cur) = opt_cur {
            self.update_height(cur);

            let top = if self.balance_factor(cur).abs() > 1 {
                self.fix_pivot(cur)
            } else {
                cur
            };

            opt_cur = self.tree.parent(top);
        }
    }

    // Applies a single or double rotation at `pivot`, returning the new root of its subtree.
    //
    // Invariants:
    // - The subtrees of `pivot`'s children are balanced and their cached heights are correct.
    // - `pivot`'s subtree heights differ by exactly two.
    fn fix_pivot(&mut self, pivot: NodeId) -> NodeId {
        let heavy = if self.balance_factor(pivot) > 0 {
            Dir::Right
        } else {
            Dir::Left
        };

        let child = self
            .tree
            .child(pivot, heavy)
            .expect("heavy side of a pivot is never empty");

        let outer = self.height_of(self.tree.child(child, heavy));
        let inner = self.height_of(self.tree.child(child, !heavy));

        // Ties take the single rotation; a double rotation would leave `child` unbalanced.
        let double = inner > outer;

        let case = match (heavy, double) {
            (Dir::Right, false) => "right-right",
            (Dir::Right, true) => "right-left",
            (Dir::Left, false) => "left-left",
            (Dir::Left, true) => "left-right",
        };
        debug!(%pivot, case, "rebalancing");

        if double {
            self.tree
                .rotate(child, heavy)
                .expect("inner grandchild of a double rotation exists");
        }

        let up = self
            .tree
            .rotate(pivot, !heavy)
            .expect("heavy side of a pivot is never empty");

        self.update_height(pivot);
        if double {
            self.update_height(child);
        }
        self.update_height(up);

        up
    }
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Inserts a key-value pair into the tree, rebalancing if necessary.
    ///
    /// If the key is already present, its value is replaced and the old value is returned; the
    /// shape of the tree is unchanged.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (node, old) = self.tree.insert_node(key, value);

        if old.is_none() {
            // The new leaf already has height 1.
            self.rebalance_from(self.tree.parent(node));
        }

        old
    }

    /// Removes `key` from the tree, returning its value and rebalancing if necessary.
    ///
    /// Absent keys leave the tree unchanged.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.tree.find(key)?;
        let (removed, lowest_changed) = self.tree.remove_at(node);

        self.rebalance_from(lowest_changed);

        Some(removed.value)
    }

    /// Returns the handle of the node holding `key`.
    #[inline]
    pub fn find<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.find(key)
    }

    /// Returns `true` if the tree contains `key`.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains_key(key)
    }

    /// Returns a reference to the value associated with `key`.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get(key)
    }

    /// Returns a mutable reference to the value associated with `key`.
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get_mut(key)
    }

    /// Returns the minimum key-value pair in the tree.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first_key_value()
    }

    /// Returns the maximum key-value pair in the tree.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last_key_value()
    }

    /// Returns `true` if `other` holds exactly the keys of `self`.
    pub fn same_key_set<W>(&self, other: &AvlTree<K, W>) -> bool {
        self.tree.same_key_set(&other.tree)
    }

    /// Rotates `source` until its shape matches `self`. See [`Tree::transform`].
    ///
    /// Since `self` is balanced, `source` is balanced afterwards too, and its cached heights are
    /// recomputed.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::KeySetMismatch`] and leaves `source` untouched if the trees hold
    /// different keys.
    pub fn transform<W>(&self, source: &mut AvlTree<K, W>) -> Result<(), TransformError> {
        self.tree.transform(&mut source.tree)?;
        source.recompute_heights();
        Ok(())
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        self.tree.assert_invariants();

        for id in self.tree.post_order() {
            let node = self.tree.at(id);
            let (left, right) = (self.height_of(node.left()), self.height_of(node.right()));

            // Ensure the cached height is correct.
            assert_eq!(node.height, 1 + cmp::max(left, right), "stale height at {id}");

            // Ensure the subtree heights differ by at most one.
            assert!(left.abs_diff(right) <= 1, "unbalanced node {id}: {left} vs {right}");
        }
    }
}

impl<K, V> Tree<K, V> {
    /// Returns `true` if no node's subtree heights differ by more than one.
    pub fn is_height_balanced(&self) -> bool {
        self.find_pivot().is_none()
    }

    /// Returns the deepest node whose subtree heights differ by more than one.
    ///
    /// Subtrees are searched children first, left before right, and the first such node found is
    /// returned.
    pub fn find_pivot(&self) -> Option<NodeId> {
        let mut heights = vec![0u32; self.slots.len()];
        let height = |heights: &[u32], link: Link| link.map_or(0, |id| heights[id.index()]);

        for id in self.post_order() {
            let node = self.at(id);
            let (left, right) = (height(&heights, node.left()), height(&heights, node.right()));

            if left.abs_diff(right) > 1 {
                return Some(id);
            }

            heights[id.index()] = 1 + cmp::max(left, right);
        }

        None
    }
}

impl<K: Ord, V> TryFrom<Tree<K, V>> for AvlTree<K, V> {
    type Error = Tree<K, V>;

    /// Adopts an already height-balanced tree, or hands it back if it is not balanced.
    fn try_from(tree: Tree<K, V>) -> Result<Self, Self::Error> {
        if !tree.is_height_balanced() {
            return Err(tree);
        }

        let mut avl = AvlTree { tree };
        avl.recompute_heights();
        Ok(avl)
    }
}

impl<K, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        AvlTree::new()
    }
}

impl<K: Clone, V: Clone> Clone for AvlTree<K, V> {
    fn clone(&self) -> Self {
        AvlTree {
            tree: self.tree.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = AvlTree::new();
        tree.extend(iter);
        tree
    }
}
