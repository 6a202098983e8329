#![forbid(unsafe_code)]

//! Headless mass-weighted force layout for bipartite process graphs.
//!
//! Callers hand over a flat list of state-holder/activity nodes and weighted directed edges and
//! get a position per node back. The pipeline runs synchronously on the calling thread and keeps
//! no state between calls:
//!
//! 1. [`Graph::build`] validates the input and builds forward/reverse adjacency.
//! 2. [`algo::scc::find_components`] finds feedback cycles.
//! 3. [`algo::mass`] turns cycle membership and degree into a per-node mass.
//! 4. [`algo::physics::Simulation`] runs the damped force simulation.
//! 5. [`algo::refine`] optionally tidies the result.
//!
//! ```
//! use narwhal::{Edge, LayoutConfig, Node, apply_layout};
//!
//! let nodes = vec![Node::state_holder("p1"), Node::activity("t1"), Node::state_holder("p2")];
//! let edges = vec![Edge::new("p1", "t1"), Edge::new("t1", "p2")];
//! let result = apply_layout(&nodes, &edges, &LayoutConfig::default()).unwrap();
//! assert_eq!(result.positions.len(), 3);
//! ```

pub mod algo;
pub mod error;
pub mod graph;
pub mod layout;

pub use algo::mass::{MassMap, MassTier, TierCounts, assign_masses};
pub use algo::physics::{RunOutcome, Simulation, simulate};
pub use algo::scc::{Component, find_components};
pub use algo::{ForceParams, HubThresholds, LayoutConfig, LayoutPhase, MassTiers, Refinement};
pub use error::{Error, Result};
pub use graph::{Edge, Graph, Node, NodeKind, Point};
pub use layout::{
    LayoutParameters, LayoutResult, LayoutStatistics, apply_layout, apply_layout_with_progress,
};
