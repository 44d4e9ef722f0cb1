use tracing::trace;

use crate::{Dir, NodeId, RotateError, Tree};

impl<K, V> Tree<K, V> {
    /// Rotates left at `pivot`, lifting its right child into its place.
    ///
    /// Returns the new root of the rotated subtree. The in-order sequence of the tree is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RotateError::MissingChild`] and leaves the tree untouched if `pivot` has no right
    /// child.
    ///
    /// # Panics
    ///
    /// Panics if `pivot` does not name a live node of this tree.
    pub fn rotate_left(&mut self, pivot: NodeId) -> Result<NodeId, RotateError> {
        self.rotate(pivot, Dir::Left)
            .ok_or(RotateError::MissingChild(Dir::Right))
    }

    /// Rotates right at `pivot`, lifting its left child into its place.
    ///
    /// Returns the new root of the rotated subtree. The in-order sequence of the tree is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RotateError::MissingChild`] and leaves the tree untouched if `pivot` has no left
    /// child.
    ///
    /// # Panics
    ///
    /// Panics if `pivot` does not name a live node of this tree.
    pub fn rotate_right(&mut self, pivot: NodeId) -> Result<NodeId, RotateError> {
        self.rotate(pivot, Dir::Right)
            .ok_or(RotateError::MissingChild(Dir::Left))
    }

    // Performs a single rotation in direction `dir`, moving `pivot` down and its `!dir` child `up`
    // into its place. Returns `up`, or `None` if `pivot` has no `!dir` child.
    //
    // Heights of affected nodes are not updated.
    pub(crate) fn rotate(&mut self, pivot: NodeId, dir: Dir) -> Option<NodeId> {
        let up = self.child(pivot, !dir)?;

        // - `pivot` becomes the `dir` child of `up`.
        // - `across` goes from the `dir` child of `up` to the `!dir` child of `pivot`.
        let across = self.child(up, dir);
        self.set_child(pivot, !dir, across);
        self.maybe_set_parent(across, Some(pivot));

        self.set_child(up, dir, Some(pivot));
        let parent = self.set_parent(pivot, Some(up));
        self.set_parent(up, parent);

        self.replace_child_or_set_root(parent, pivot, Some(up));

        trace!(%pivot, %up, %dir, "rotated");

        Some(up)
    }
}
