use tracing::debug;

use crate::{Dir, TransformError, Tree};

impl<K: Ord, V> Tree<K, V> {
    /// Returns `true` if `other` holds exactly the keys of `self`. Values and shape are ignored.
    ///
    /// This operation completes in _O(n)_ time.
    pub fn same_key_set<W>(&self, other: &Tree<K, W>) -> bool {
        self.len() == other.len() && self.keys().eq(other.keys())
    }

    /// Rotates `source` until its shape matches `self`.
    ///
    /// Afterwards every key of `source` sits at the position the same key holds in `self`. Only
    /// rotations are used, so `source` keeps its nodes and its key-value mapping.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::KeySetMismatch`] and leaves `source` untouched if the trees hold
    /// different keys.
    pub fn transform<W>(&self, source: &mut Tree<K, W>) -> Result<(), TransformError> {
        if !self.same_key_set(source) {
            return Err(TransformError::KeySetMismatch {
                target_len: self.len(),
                source_len: source.len(),
            });
        }

        if self.same_shape(source) {
            return Ok(());
        }

        debug!(len = self.len(), "flattening source into a vine");
        source.flatten_to_vine();

        debug!(len = self.len(), "rebuilding source from target shape");
        self.rebuild_from_vine(source);

        debug_assert!(self.same_shape(source));

        Ok(())
    }

    // Right-rotates until the tree is a single chain of right children in ascending key order.
    fn flatten_to_vine(&mut self) {
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            opt_cur = match self.rotate(cur, Dir::Right) {
                // Climb to the lifted node and keep rotating.
                Some(up) => Some(up),
                None => self.right(cur),
            };
        }
    }

    // Walks `self` and the vine `source` in lockstep, rotating `source` into shape top-down.
    //
    // Every pending subtree of `source` is a chain: a right chain in ascending order, or a left
    // chain in descending order. Rotating the chain's top away from the chain's direction lifts
    // the next key, until the key wanted at this position is on top. What remains below is again
    // a right chain on the right and a left chain on the left.
    fn rebuild_from_vine<W>(&self, source: &mut Tree<K, W>) {
        let (Some(target_root), Some(source_root)) = (self.root, source.root) else {
            return;
        };

        let mut stack = vec![(target_root, source_root, Dir::Left)];

        while let Some((want, mut cur, dir)) = stack.pop() {
            let want_key = &self.at(want).key;

            while source.at(cur).key != *want_key {
                cur = source
                    .rotate(cur, dir)
                    .expect("chain holds the wanted key below its top");
            }

            if let (Some(want), Some(cur)) = (self.right(want), source.right(cur)) {
                stack.push((want, cur, Dir::Left));
            }

            if let (Some(want), Some(cur)) = (self.left(want), source.left(cur)) {
                stack.push((want, cur, Dir::Right));
            }
        }
    }
}
