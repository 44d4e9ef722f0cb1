use core::iter::FusedIterator;

use crate::{Dir, Link, Tree};

enum CameFrom {
    Parent,
    LeftChild,
    Here,
    RightChild,
}

/// An iterator over the key-value pairs of a tree, in ascending key order.
pub struct Iter<'tree, K, V> {
    tree: &'tree Tree<K, V>,

    front_cur: Link,
    front_from: CameFrom,

    len: usize,
}

impl<'tree, K, V> Iter<'tree, K, V> {
    pub(crate) fn new(tree: &'tree Tree<K, V>) -> Self {
        Iter {
            tree,

            front_cur: tree.root,
            front_from: CameFrom::Parent,
            len: tree.len(),
        }
    }
}

impl<'tree, K, V> Iterator for Iter<'tree, K, V> {
    type Item = (&'tree K, &'tree V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let tree = self.tree;
        let mut cur = self.front_cur?;

        loop {
            match self.front_from {
                CameFrom::Parent => {
                    // Upon entering a new subtree, find the minimum element.
                    cur = tree.min_in_subtree(cur).0;

                    // Once the minimum is found, its (empty) left subtree has been exhausted.
                    self.front_from = CameFrom::LeftChild;
                }

                CameFrom::LeftChild => {
                    // The left subtree has been exhausted, so this node is up next. Save off the
                    // iterator state and return it.
                    self.front_cur = Some(cur);
                    self.front_from = CameFrom::Here;
                    self.len -= 1;

                    let node = tree.at(cur);
                    return Some((&node.key, &node.value));
                }

                CameFrom::Here => {
                    // The current node was just yielded.
                    if let Some(right) = tree.right(cur) {
                        // If the right subtree is not empty, go there.
                        self.front_from = CameFrom::Parent;

                        cur = right;
                    } else if let Some(parent) = tree.parent(cur) {
                        // Otherwise, ascend one level.
                        self.front_from = match tree.which_child(parent, cur) {
                            Dir::Left => CameFrom::LeftChild,
                            Dir::Right => CameFrom::RightChild,
                        };

                        cur = parent;
                    } else {
                        unreachable!("remaining elements but no successor")
                    }
                }

                CameFrom::RightChild => {
                    // Ascend until we find the successor element.
                    while let Some(parent) = tree.parent(cur) {
                        match tree.which_child(parent, cur) {
                            Dir::Left => break,
                            Dir::Right => cur = parent,
                        }
                    }

                    // `cur` is now a left child, and its parent is the successor.
                    cur = tree
                        .parent(cur)
                        .expect("remaining elements but no successor");
                    self.front_from = CameFrom::LeftChild;
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// An iterator over the keys of a tree, in ascending order.
pub struct Keys<'tree, K, V>(Iter<'tree, K, V>);

impl<'tree, K, V> Iterator for Keys<'tree, K, V> {
    type Item = &'tree K;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

/// An iterator over the values of a tree, in ascending key order.
pub struct Values<'tree, K, V>(Iter<'tree, K, V>);

impl<'tree, K, V> Iterator for Values<'tree, K, V> {
    type Item = &'tree V;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V> Tree<K, V> {
    /// Returns an iterator over the key-value pairs of the tree, in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self)
    }

    /// Returns an iterator over the keys of the tree, in ascending order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    /// Returns an iterator over the values of the tree, in ascending key order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }
}

impl<'tree, K, V> IntoIterator for &'tree Tree<K, V> {
    type Item = (&'tree K, &'tree V);
    type IntoIter = Iter<'tree, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::Tree;

    #[test]
    fn yields_in_order() {
        let tree: Tree<u32, char> = [(5, 'e'), (2, 'b'), (8, 'h'), (1, 'a'), (3, 'c'), (9, 'i')]
            .into_iter()
            .collect();

        let pairs: Vec<_> = tree.iter().map(|(&k, &v)| (k, v)).collect();
        assert_eq!(pairs, [(1, 'a'), (2, 'b'), (3, 'c'), (5, 'e'), (8, 'h'), (9, 'i')]);
        assert_eq!(tree.values().copied().collect::<String>(), "abcehi");
    }

    #[test]
    fn chains_in_both_directions() {
        let right: Tree<u32, ()> = (0..6).map(|k| (k, ())).collect();
        let left: Tree<u32, ()> = (0..6).rev().map(|k| (k, ())).collect();

        assert_eq!(right.keys().copied().collect::<Vec<_>>(), [0, 1, 2, 3, 4, 5]);
        assert_eq!(left.keys().copied().collect::<Vec<_>>(), [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn empty_and_exact_size() {
        let empty: Tree<u32, ()> = Tree::new();
        assert_eq!(empty.iter().next(), None);

        let tree: Tree<u32, ()> = [(2, ()), (1, ())].into_iter().collect();
        let mut iter = tree.iter();
        assert_eq!(iter.len(), 2);
        iter.next();
        assert_eq!(iter.len(), 1);
    }
}
