//! Caller-facing node/edge records and the adjacency graph built from them.

use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Passive container (a place / stock).
    StateHolder,
    /// Transient event (a transition / flow).
    Activity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn state_holder(id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::StateHolder)
    }

    pub fn activity(id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Activity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

impl Edge {
    /// Unit-weight edge.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::weighted(source, target, 1.0)
    }

    pub fn weighted(source: impl Into<String>, target: impl Into<String>, weight: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One adjacency-list entry: the neighbor's index and the weight of the connecting edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjacent {
    pub node: usize,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphEdge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

impl GraphEdge {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Read-only adjacency view over one layout call's nodes and edges.
///
/// Nodes are addressed by their position in the caller's node list; every per-node vector in the
/// pipeline (masses, positions, velocities) shares that indexing.
#[derive(Debug, Clone)]
pub struct Graph {
    ids: Vec<String>,
    kinds: Vec<NodeKind>,
    id_to_idx: FxHashMap<String, usize>,
    edges: Vec<GraphEdge>,
    forward: Vec<Vec<Adjacent>>,
    reverse: Vec<Vec<Adjacent>>,
}

impl Graph {
    /// Validates `nodes`/`edges` and builds forward and reverse adjacency lists in O(N + E).
    pub fn build(nodes: &[Node], edges: &[Edge]) -> Result<Self> {
        let mut id_to_idx: FxHashMap<String, usize> = FxHashMap::default();
        id_to_idx.reserve(nodes.len());
        let mut ids: Vec<String> = Vec::with_capacity(nodes.len());
        let mut kinds: Vec<NodeKind> = Vec::with_capacity(nodes.len());
        for (idx, n) in nodes.iter().enumerate() {
            if id_to_idx.insert(n.id.clone(), idx).is_some() {
                return Err(Error::DuplicateNode { id: n.id.clone() });
            }
            ids.push(n.id.clone());
            kinds.push(n.kind);
        }

        let mut graph_edges: Vec<GraphEdge> = Vec::with_capacity(edges.len());
        let mut forward: Vec<Vec<Adjacent>> = vec![Vec::new(); nodes.len()];
        let mut reverse: Vec<Vec<Adjacent>> = vec![Vec::new(); nodes.len()];
        for (edge_idx, e) in edges.iter().enumerate() {
            let lookup = |id: &str| {
                id_to_idx
                    .get(id)
                    .copied()
                    .ok_or_else(|| Error::UnknownNodeReference {
                        edge: edge_idx,
                        from: e.source.clone(),
                        to: e.target.clone(),
                        missing: id.to_string(),
                    })
            };
            let source = lookup(&e.source)?;
            let target = lookup(&e.target)?;
            if !(e.weight.is_finite() && e.weight > 0.0) {
                return Err(Error::InvalidWeight {
                    edge: edge_idx,
                    weight: e.weight,
                });
            }

            forward[source].push(Adjacent {
                node: target,
                weight: e.weight,
            });
            reverse[target].push(Adjacent {
                node: source,
                weight: e.weight,
            });
            graph_edges.push(GraphEdge {
                source,
                target,
                weight: e.weight,
            });
        }

        Ok(Self {
            ids,
            kinds,
            id_to_idx,
            edges: graph_edges,
            forward,
            reverse,
        })
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id(&self, idx: usize) -> &str {
        &self.ids[idx]
    }

    pub fn ids(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.ids.iter().map(String::as_str)
    }

    pub fn kind(&self, idx: usize) -> NodeKind {
        self.kinds[idx]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.id_to_idx.get(id).copied()
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn successors(&self, idx: usize) -> &[Adjacent] {
        &self.forward[idx]
    }

    pub fn predecessors(&self, idx: usize) -> &[Adjacent] {
        &self.reverse[idx]
    }

    /// In-degree plus out-degree, counting parallel edges; a self-loop counts twice.
    pub fn degree(&self, idx: usize) -> usize {
        self.forward[idx].len() + self.reverse[idx].len()
    }
}
