use std::ops::Range;

use proptest::prelude::*;

use crate::model;

use super::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn key_at<V>(tree: &AvlTree<u32, V>, link: Option<NodeId>) -> Option<u32> {
    link.and_then(|id| tree.node(id)).map(|node| *node.key())
}

fn insert_find_all(keys: &[u32]) {
    let mut tree: AvlTree<u32, u32> = AvlTree::new();

    for &key in keys {
        tree.insert(key, key * 2);
        tree.assert_invariants();
    }

    for key in keys {
        let node = tree.find(key).expect("item not found");
        assert_eq!(tree.node(node).map(Node::key), Some(key));
        assert_eq!(tree.get(key), Some(&(key * 2)));
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

#[test]
fn four_elems_find() {
    insert_find_all(&[0, 1, 2, 3]);
    insert_find_all(&[0, 3, 1, 2]);
    insert_find_all(&[1, 3, 2, 0]);
    insert_find_all(&[2, 0, 3, 1]);
    insert_find_all(&[3, 0, 2, 1]);
    insert_find_all(&[3, 2, 1, 0]);
}

fn assert_three_node_shape(tree: &AvlTree<u32, ()>) {
    let root = tree.root().expect("tree is not empty");
    let node = tree.node(root).unwrap();

    assert_eq!(*node.key(), 20);
    assert_eq!(key_at(tree, node.left()), Some(10));
    assert_eq!(key_at(tree, node.right()), Some(30));

    assert_eq!(tree.height(root), Some(2));
    assert_eq!(tree.height(node.left().unwrap()), Some(1));
    assert_eq!(tree.height(node.right().unwrap()), Some(1));
}

#[test]
fn ascending_inserts_rotate_left() {
    init_tracing();
    let tree: AvlTree<u32, ()> = [10, 20, 30].into_iter().map(|k| (k, ())).collect();
    assert_three_node_shape(&tree);
}

#[test]
fn descending_inserts_rotate_right() {
    init_tracing();
    let tree: AvlTree<u32, ()> = [30, 20, 10].into_iter().map(|k| (k, ())).collect();
    assert_three_node_shape(&tree);
}

#[test]
fn zigzag_inserts_rotate_twice() {
    init_tracing();
    let right_left: AvlTree<u32, ()> = [10, 30, 20].into_iter().map(|k| (k, ())).collect();
    assert_three_node_shape(&right_left);

    let left_right: AvlTree<u32, ()> = [30, 10, 20].into_iter().map(|k| (k, ())).collect();
    assert_three_node_shape(&left_right);
}

#[test]
fn duplicate_insert_overwrites_value() {
    let mut tree: AvlTree<u32, &str> = AvlTree::new();

    assert_eq!(tree.insert(1, "a"), None);
    assert_eq!(tree.insert(1, "b"), Some("a"));
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.get(&1), Some(&"b"));
}

#[test]
fn remove_round_trip() {
    let mut tree: AvlTree<u32, u32> = (0..32).map(|k| (k, k)).collect();

    for key in (0..32).step_by(3) {
        assert_eq!(tree.remove(&key), Some(key));
        assert_eq!(tree.find(&key), None);
        tree.assert_invariants();
    }

    // Absent keys are a no-op.
    let snapshot = tree.clone();
    assert_eq!(tree.remove(&0), None);
    assert_eq!(tree.remove(&100), None);
    assert!(tree.same_shape(&snapshot));
}

#[test]
fn remove_binary_node_promotes_predecessor() {
    let mut tree: AvlTree<u32, ()> = [20, 10, 30, 5, 15, 25, 35]
        .into_iter()
        .map(|k| (k, ()))
        .collect();
    let predecessor = tree.find(&15).unwrap();

    tree.remove(&20);
    tree.assert_invariants();

    assert_eq!(tree.root(), Some(predecessor));
    assert_eq!(tree.keys().copied().collect::<Vec<_>>(), [5, 10, 15, 25, 30, 35]);
}

// A Fibonacci tree of height 5 over the keys 1..=12, in preorder. Every internal node is
// left-heavy, which is the sparsest shape the balance invariant allows.
const FIBONACCI_PREORDER: [u32; 12] = [8, 5, 3, 2, 1, 4, 7, 6, 11, 10, 9, 12];

#[test]
fn removal_rebalances_every_ancestor() {
    init_tracing();

    let tree: Tree<u32, ()> = FIBONACCI_PREORDER.into_iter().map(|k| (k, ())).collect();
    let mut tree = AvlTree::try_from(tree).expect("fibonacci trees are balanced");
    tree.assert_invariants();
    assert_eq!(tree.height(tree.root().unwrap()), Some(5));

    // Removing 12 makes 11 a pivot. Fixing it shortens the right subtree of the root, which
    // makes the root a pivot as well.
    tree.remove(&12);

    tree.assert_invariants();
    assert!(tree.is_height_balanced());
    assert_eq!(key_at(&tree, tree.root()), Some(5));
    assert_eq!(tree.height(tree.root().unwrap()), Some(4));
}

#[test]
fn unbalanced_tree_is_not_adopted() {
    let chain: Tree<u32, ()> = (1..=4).map(|k| (k, ())).collect();
    assert!(!chain.is_height_balanced());

    let chain = AvlTree::try_from(chain).expect_err("chains are unbalanced");
    assert_eq!(chain.len(), 4);
}

#[test]
fn pivot_is_deepest_imbalance() {
    // 1 -> 2 -> ... -> 7 as a right chain; 5 is the deepest node with a height difference of 2.
    let chain: Tree<u32, ()> = (1..=7).map(|k| (k, ())).collect();
    let pivot = chain.find_pivot().expect("chain is unbalanced");
    assert_eq!(chain.node(pivot).map(Node::key), Some(&5));

    let balanced: AvlTree<u32, ()> = (1..=7).map(|k| (k, ())).collect();
    assert_eq!(balanced.find_pivot(), None);
}

#[test]
fn transform_avl_trees_built_differently() {
    init_tracing();

    let ascending: AvlTree<u32, u32> = (1..=7).map(|k| (k, k)).collect();
    // Settles with 5 at the root rather than 4.
    let mut other: AvlTree<u32, u32> = [2, 1, 5, 4, 6, 7, 3]
        .into_iter()
        .map(|k| (k, k * 10))
        .collect();

    assert!(ascending.same_key_set(&other));
    assert!(!ascending.same_shape(&other));

    ascending.transform(&mut other).unwrap();

    other.assert_invariants();
    assert!(ascending.same_shape(&other));
    assert!(ascending.same_key_set(&other));
    for key in 1..=7 {
        assert_eq!(other.get(&key), Some(&(key * 10)));
    }
}

#[test]
fn transform_plain_trees_built_differently() {
    let sorted: Tree<u32, ()> = (1..=7).map(|k| (k, ())).collect();
    let balanced: Tree<u32, ()> = [4, 2, 6, 1, 3, 5, 7].into_iter().map(|k| (k, ())).collect();

    assert!(sorted.same_key_set(&balanced));

    let mut source = balanced.clone();
    sorted.transform(&mut source).unwrap();
    assert!(sorted.same_shape(&source));

    let mut source = sorted.clone();
    balanced.transform(&mut source).unwrap();
    assert!(balanced.same_shape(&source));
    assert!(source.is_height_balanced());
}

#[test]
fn transform_mismatched_avl_trees() {
    let a: AvlTree<u32, ()> = (1..=7).map(|k| (k, ())).collect();
    let mut b: AvlTree<u32, ()> = (2..=8).map(|k| (k, ())).collect();
    let snapshot = b.clone();

    assert!(!a.same_key_set(&b));
    assert!(matches!(
        a.transform(&mut b),
        Err(TransformError::KeySetMismatch { .. })
    ));
    assert!(b.same_shape(&snapshot));
    b.assert_invariants();
}

#[test]
fn transform_is_idempotent() {
    let a: AvlTree<u32, ()> = (0..50).map(|k| ((k * 37) % 101, ())).collect();
    let mut b = a.clone();

    a.transform(&mut b).unwrap();
    a.transform(&mut b).unwrap();

    assert!(a.same_shape(&b));
    b.assert_invariants();
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn transform_equivalence(input in model::transform_input_strategy()) {
        model::run_transform_equivalence(input);
    }

    #[test]
    fn rotation_preserves_order(
        keys in proptest::collection::vec(0u32..200, 1..64),
        picks in proptest::collection::vec((0usize..64, proptest::bool::ANY), 0..32),
    ) {
        let mut tree: Tree<u32, ()> = keys.iter().map(|&k| (k, ())).collect();
        let before: Vec<u32> = tree.keys().copied().collect();

        for (pick, left) in picks {
            let key = before[pick % before.len()];
            let id = tree.find(&key).unwrap();
            let _ = if left { tree.rotate_left(id) } else { tree.rotate_right(id) };

            tree.assert_invariants();
            prop_assert_eq!(tree.keys().copied().collect::<Vec<_>>(), before.clone());
        }
    }

    #[test]
    fn removal_keeps_balance(
        keys in proptest::collection::vec(0u32..300, 0..200),
        removals in proptest::collection::vec(0u32..300, 0..200),
    ) {
        let mut tree: AvlTree<u32, ()> = keys.iter().map(|&k| (k, ())).collect();

        for key in removals {
            tree.remove(&key);
            tree.assert_invariants();
            prop_assert!(tree.is_height_balanced());
        }
    }
}
