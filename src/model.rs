//! Equivalence models shared by the property tests and the fuzz targets.

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::{AvlTree, Tree};

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

// Resolves an item to a key, preferring keys already present so that hits are common.
fn resolve(sorted: &[u32], item: ItemValue) -> u32 {
    match item {
        ItemValue::Index(idx) => {
            if sorted.is_empty() {
                idx as u32
            } else {
                sorted[idx % sorted.len()]
            }
        }
        ItemValue::Random(v) => v,
    }
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue, u32),
    Get(ItemValue),
    Remove(ItemValue),
    First,
    Last,
    Clear,
}

impl Op {
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        match self {
            Op::Insert(item, value) => FinalOp::Insert(resolve(sorted, item), value),
            Op::Get(item) => FinalOp::Get(resolve(sorted, item)),
            Op::Remove(item) => FinalOp::Remove(resolve(sorted, item)),
            Op::First => FinalOp::First,
            Op::Last => FinalOp::Last,
            Op::Clear => FinalOp::Clear,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32, u32),
    Get(u32),
    Remove(u32),
    First,
    Last,
    Clear,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        40 => (value_strategy(), proptest::num::u32::ANY).prop_map(|(k, v)| Op::Insert(k, v)),
        10 => value_strategy().prop_map(Op::Get),
        25 => value_strategy().prop_map(Op::Remove),
        2 => Just(Op::First),
        2 => Just(Op::Last),
        // Rare, so that trees grow large enough to need rebalancing at several levels.
        1 => Just(Op::Clear),
    ]
}

/// Runs `ops` against both an [`AvlTree`] and a [`BTreeMap`], asserting identical results and
/// intact tree invariants after every operation.
pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut sorted_keys = Vec::with_capacity(ops.len());
    let mut btree = BTreeMap::new();
    let mut avl: AvlTree<u32, u32> = AvlTree::new();

    fn insert_sorted(v: &mut Vec<u32>, key: u32) {
        if let Err(idx) = v.binary_search(&key) {
            v.insert(idx, key);
        }
    }

    fn remove_sorted(v: &mut Vec<u32>, key: u32) {
        if let Ok(idx) = v.binary_search(&key) {
            v.remove(idx);
        }
    }

    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&sorted_keys);

        match final_op {
            FinalOp::Insert(key, value) => {
                insert_sorted(&mut sorted_keys, key);

                let from_btree = btree.insert(key, value);
                let from_avl = avl.insert(key, value);

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
                assert_eq!(avl.get(&key), Some(&value), "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Get(key) => {
                let from_btree = btree.get(&key);
                let from_avl = avl.get(&key);

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Remove(key) => {
                remove_sorted(&mut sorted_keys, key);

                let from_btree = btree.remove(&key);
                let from_avl = avl.remove(&key);

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
                assert_eq!(avl.find(&key), None, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::First => {
                let from_btree = btree.first_key_value();
                let from_avl = avl.first_key_value();

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Last => {
                let from_btree = btree.last_key_value();
                let from_avl = avl.last_key_value();

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Clear => {
                sorted_keys.clear();
                btree.clear();
                avl.clear();
            }
        }

        avl.assert_invariants();
        assert!(avl.is_height_balanced(), "FinalOp #{op_id}: {final_op:?}");
        assert_eq!(btree.len(), avl.len());
        assert!(btree.iter().eq(avl.iter()));
    }
}

/// Input for [`run_transform_equivalence`]: a target insertion order, and rotations that scramble
/// a copy of the target into the source.
#[derive(Clone, Debug, Arbitrary)]
pub struct TransformInput {
    pub keys: Vec<u32>,
    pub rotations: Vec<(ItemValue, bool)>,
}

pub fn transform_input_strategy() -> impl Strategy<Value = TransformInput> {
    (
        proptest::collection::vec(0u32..500, 0..64),
        proptest::collection::vec((value_strategy(), proptest::bool::ANY), 0..128),
    )
        .prop_map(|(keys, rotations)| TransformInput { keys, rotations })
}

/// Builds a target tree from `input.keys`, scrambles a copy of it with random rotations, then
/// checks that transforming the copy restores the target's shape without disturbing its values.
pub fn run_transform_equivalence(input: TransformInput) {
    let target: Tree<u32, ()> = input.keys.iter().map(|&k| (k, ())).collect();
    let mut source: Tree<u32, u64> = input.keys.iter().map(|&k| (k, u64::from(k) * 3)).collect();

    let sorted: Vec<u32> = target.keys().copied().collect();

    for (item, left) in input.rotations {
        let key = resolve(&sorted, item);
        let Some(id) = source.find(&key) else {
            continue;
        };

        let rotated = if left {
            source.rotate_left(id)
        } else {
            source.rotate_right(id)
        };

        // Rotations without a qualifying child are rejected and change nothing.
        if rotated.is_err() {
            let node = source.node(id).expect("rotated node is live");
            assert_eq!(if left { node.right() } else { node.left() }, None);
        }

        source.assert_invariants();
    }

    assert!(target.same_key_set(&source));
    target
        .transform(&mut source)
        .expect("key sets are identical");

    source.assert_invariants();
    assert!(target.same_shape(&source));
    assert_eq!(
        target.is_height_balanced(),
        source.is_height_balanced()
    );
    for &key in &sorted {
        assert_eq!(source.get(&key), Some(&(u64::from(key) * 3)));
    }

    // Balanced trees transform into balanced trees.
    let balanced: AvlTree<u32, ()> = input.keys.iter().rev().map(|&k| (k, ())).collect();
    let mut scrambled: AvlTree<u32, u64> = sorted.iter().map(|&k| (k, u64::from(k))).collect();
    balanced
        .transform(&mut scrambled)
        .expect("key sets are identical");
    scrambled.assert_invariants();
    assert!(balanced.same_shape(&scrambled));
}
