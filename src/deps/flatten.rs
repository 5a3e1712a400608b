use crate::deps::types::{DependencyGraph, FlattenedEntry, NodeId};

/// Flattened traversal plus any cycle warnings raised along the way.
#[derive(Debug, Clone, Default)]
pub struct Flattened {
    pub entries: Vec<FlattenedEntry>,
    pub warnings: Vec<String>,
}

enum Step {
    Enter { node: NodeId, depth: i32, parent: Option<NodeId> },
    Exit,
}

/// Depth-first pre-order expansion of the graph from its root.
///
/// Every path is walked independently: a node reachable through two
/// different parents is recorded once per path, and tiers grow with depth.
/// In parents mode the tier is negated, so prerequisites sort ahead of the
/// root. The only pruning is cycle truncation: a child already on the
/// current ancestor chain is not descended into, a warning is recorded,
/// and traversal continues with its siblings.
pub fn flatten(graph: &DependencyGraph, parents: bool) -> Flattened {
    let sign: i32 = if parents { -1 } else { 1 };
    let mut out = Flattened::default();
    if graph.is_empty() {
        return out;
    }

    let mut ancestors: Vec<NodeId> = Vec::new();
    let mut work = vec![Step::Enter {
        node: graph.root,
        depth: 0,
        parent: None,
    }];

    while let Some(step) = work.pop() {
        match step {
            Step::Enter { node, depth, parent } => {
                out.entries.push(FlattenedEntry {
                    node,
                    tier: sign * depth,
                    parent,
                    sequence: out.entries.len(),
                });
                ancestors.push(node);
                work.push(Step::Exit);
                // Reverse keeps the (schema, name) child order on pop.
                for &child in graph.children[node].iter().rev() {
                    if ancestors.contains(&child) {
                        out.warnings.push(cycle_warning(graph, &ancestors, child));
                        continue;
                    }
                    work.push(Step::Enter {
                        node: child,
                        depth: depth + 1,
                        parent: Some(node),
                    });
                }
            }
            Step::Exit => {
                ancestors.pop();
            }
        }
    }

    out
}

fn cycle_warning(graph: &DependencyGraph, ancestors: &[NodeId], repeated: NodeId) -> String {
    let mut path: Vec<String> = ancestors
        .iter()
        .map(|&id| graph.node(id).qualified_name())
        .collect();
    path.push(graph.node(repeated).qualified_name());
    format!("circular dependency truncated: {}", path.join(" -> "))
}
