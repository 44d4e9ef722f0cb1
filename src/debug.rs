use std::{collections::VecDeque, fmt};

use crate::{AvlTree, Node, Tree};

impl<K: fmt::Display, V> Tree<K, V> {
    /// Writes the shape of the tree as a Graphviz digraph, one rank per depth.
    pub fn dotgraph<W: fmt::Write>(&self, name: &str, w: W) -> fmt::Result {
        self.write_dot(name, w, |node, w| write!(w, "{}", node.key))
    }

    fn write_dot<W, F>(&self, name: &str, mut w: W, mut label: F) -> fmt::Result
    where
        W: fmt::Write,
        F: FnMut(&Node<K, V>, &mut W) -> fmt::Result,
    {
        let Some(root) = self.root else {
            return write!(w, "digraph \"graph-{name}\" {{}}");
        };

        let mut queue = VecDeque::new();
        queue.push_back(Some(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut links = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let Some(item) = queue.pop_front() else {
                    break;
                };

                let Some(id) = item else {
                    continue;
                };

                write!(w, "\"graph{name}-{}\" [label=\"", id.0)?;
                label(self.at(id), &mut w)?;
                write!(w, "\"]; ")?;

                for child in [self.left(id), self.right(id)] {
                    let child_name = match child {
                        Some(child) => {
                            queue.push_back(Some(child));
                            format!("{}", child.0)
                        }
                        None => {
                            write!(w, "\"graph{name}-missing{missing}\" [shape=point]; ")?;
                            missing += 1;
                            format!("missing{}", missing - 1)
                        }
                    };

                    writeln!(
                        links,
                        "\"graph{name}-{}\" -> \"graph{name}-{child_name}\";",
                        id.0
                    )?;
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}

impl<K: fmt::Display, V> AvlTree<K, V> {
    /// Writes the shape of the tree as a Graphviz digraph, labelling each node `key:height`.
    pub fn dotgraph<W: fmt::Write>(&self, name: &str, w: W) -> fmt::Result {
        self.as_tree()
            .write_dot(name, w, |node, w| write!(w, "{}:{}", node.key, node.height))
    }
}
