//! Strongly connected components (Tarjan), reported only when they form a real cycle.
//!
//! The DFS keeps its own call stack so deep chains (tens of thousands of nodes) cannot overflow
//! the thread stack.

use crate::graph::Graph;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Members in caller node order.
    pub member_ids: Vec<String>,
}

impl Component {
    pub fn len(&self) -> usize {
        self.member_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.member_ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.member_ids.iter().any(|m| m == id)
    }
}

/// Components with at least two members. A node whose only cycle is a self-loop is not reported.
pub fn find_components(graph: &Graph) -> Vec<Component> {
    find_component_indices(graph)
        .into_iter()
        .map(|members| Component {
            member_ids: members
                .into_iter()
                .map(|idx| graph.id(idx).to_string())
                .collect(),
        })
        .collect()
}

/// Index-based variant used inside the pipeline. Members are sorted ascending and components are
/// ordered by their first member.
pub(crate) fn find_component_indices(graph: &Graph) -> Vec<Vec<usize>> {
    const UNVISITED: usize = usize::MAX;

    let n = graph.node_count();
    let mut index: Vec<usize> = vec![UNVISITED; n];
    let mut lowlink: Vec<usize> = vec![0; n];
    let mut on_stack: Vec<bool> = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    // (node, position of the next successor to explore)
    let mut call: Vec<(usize, usize)> = Vec::new();
    let mut next_index = 0usize;
    let mut components: Vec<Vec<usize>> = Vec::new();

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        index[root] = next_index;
        lowlink[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;
        call.push((root, 0));

        while let Some(frame) = call.last_mut() {
            let v = frame.0;
            let succ = graph.successors(v);
            if frame.1 < succ.len() {
                let w = succ[frame.1].node;
                frame.1 += 1;
                if index[w] == UNVISITED {
                    index[w] = next_index;
                    lowlink[w] = next_index;
                    next_index += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    call.push((w, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
                continue;
            }

            call.pop();
            if let Some(&(parent, _)) = call.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[v]);
            }
            if lowlink[v] != index[v] {
                continue;
            }

            let mut members: Vec<usize> = Vec::new();
            while let Some(w) = stack.pop() {
                on_stack[w] = false;
                members.push(w);
                if w == v {
                    break;
                }
            }
            if members.len() > 1 {
                members.sort_unstable();
                components.push(members);
            }
        }
    }

    components.sort_by_key(|c| c[0]);
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};

    fn graph(ids: &[&str], edges: &[(&str, &str)]) -> Graph {
        let nodes: Vec<Node> = ids.iter().map(|id| Node::activity(*id)).collect();
        let edges: Vec<Edge> = edges.iter().map(|(s, t)| Edge::new(*s, *t)).collect();
        Graph::build(&nodes, &edges).unwrap()
    }

    #[test]
    fn figure_eight_is_a_single_component() {
        let g = graph(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("b", "a"), ("b", "c"), ("c", "d"), ("d", "b")],
        );
        assert_eq!(find_component_indices(&g), vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn disjoint_cycles_are_ordered_by_first_member() {
        let g = graph(
            &["x", "y", "p", "q", "r"],
            &[("p", "q"), ("q", "p"), ("x", "y"), ("y", "x"), ("r", "p")],
        );
        assert_eq!(find_component_indices(&g), vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn self_loop_alone_is_not_cyclic() {
        let g = graph(&["a", "b"], &[("a", "a"), ("a", "b")]);
        assert!(find_components(&g).is_empty());
    }

    #[test]
    fn long_cycle_does_not_overflow_the_stack() {
        let n = 50_000;
        let nodes: Vec<Node> = (0..n).map(|i| Node::activity(format!("n{i}"))).collect();
        let edges: Vec<Edge> = (0..n)
            .map(|i| Edge::new(format!("n{i}"), format!("n{}", (i + 1) % n)))
            .collect();
        let g = Graph::build(&nodes, &edges).unwrap();
        let comps = find_component_indices(&g);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].len(), n);
    }
}
