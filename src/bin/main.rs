use avl_rotate::{AvlTree, Tree};
use tracing_subscriber::EnvFilter;

fn print_dot<K: std::fmt::Display, V>(name: &str, tree: &Tree<K, V>) {
    let mut out = String::new();
    match tree.dotgraph(name, &mut out) {
        Ok(()) => println!("{out}"),
        Err(err) => eprintln!("failed to render {name}: {err}"),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut avl: AvlTree<u32, &str> = AvlTree::new();

    for (key, value) in [(2, "b"), (0, "z"), (3, "c"), (4, "d"), (5, "e"), (1, "a"), (6, "f")] {
        avl.insert(key, value);
        avl.assert_invariants();
        println!("{:?}", avl.keys().collect::<Vec<_>>());
    }

    avl.remove(&0);
    avl.assert_invariants();
    println!("{avl:?}");

    // Reshape a sorted chain holding the same keys into the balanced tree's shape.
    let mut chain: Tree<u32, &str> = avl.iter().map(|(&k, &v)| (k, v)).collect();
    print_dot("chain", &chain);

    match avl.as_tree().transform(&mut chain) {
        Ok(()) => print_dot("transformed", &chain),
        Err(err) => eprintln!("{err}"),
    }

    assert!(avl.as_tree().same_shape(&chain));
}
