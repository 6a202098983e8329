//! Pipeline orchestration: graph -> components -> masses -> simulation -> optional refinement.

use crate::algo::mass::{MassAssignment, TierCounts};
use crate::algo::physics::{RunOutcome, Simulation};
use crate::algo::{ForceParams, HubThresholds, LayoutConfig, LayoutPhase, MassTiers, refine, scc};
use crate::error::Result;
use crate::graph::{Edge, Graph, Node, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

/// Parameters a run actually used, echoed back for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutParameters {
    pub iterations: usize,
    pub forces: ForceParams,
    pub hubs: HubThresholds,
    pub mass_tiers: MassTiers,
    pub random_seed: u64,
}

impl LayoutParameters {
    fn from_config(config: &LayoutConfig) -> Self {
        Self {
            iterations: config.iterations,
            forces: config.forces.clone(),
            hubs: config.hubs.clone(),
            mass_tiers: config.mass_tiers.clone(),
            random_seed: config.random_seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    pub component_count: usize,
    pub nodes_in_components: usize,
    pub free_nodes: usize,
    pub tier_counts: TierCounts,
    /// Centroid of each component's final positions, in component order.
    pub component_centroids: Vec<Point>,
    pub iterations_run: usize,
    pub cancelled: bool,
    pub converged_early: bool,
    pub numerical_instabilities: usize,
    pub refined_nodes: usize,
    pub parameters: LayoutParameters,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    pub positions: BTreeMap<String, Point>,
    pub statistics: LayoutStatistics,
}

/// Lays out `nodes`/`edges` with no progress reporting.
pub fn apply_layout(nodes: &[Node], edges: &[Edge], config: &LayoutConfig) -> Result<LayoutResult> {
    apply_layout_with_progress(nodes, edges, config, &mut |_: LayoutPhase, _: f64| true)
}

/// Lays out `nodes`/`edges`, reporting progress through `progress`.
///
/// All validation happens before any simulation step. Returning `false` from `progress` stops the
/// pipeline; the positions returned are then those of the last completed step (the initial
/// placement if the simulation never started) and `statistics.cancelled` is set.
///
/// `progress` is only called at checkpoints: once per finished phase, and during the simulation
/// every `max(1, iterations / 100)` steps plus after the last one. A cancel request therefore
/// takes effect at the next checkpoint, up to `iterations / 100` steps after the host decided to
/// stop. A `false` from the final `Refinement` report still returns the refined positions but
/// marks the result cancelled.
pub fn apply_layout_with_progress(
    nodes: &[Node],
    edges: &[Edge],
    config: &LayoutConfig,
    progress: &mut dyn FnMut(LayoutPhase, f64) -> bool,
) -> Result<LayoutResult> {
    let _span = tracing::debug_span!("layout", nodes = nodes.len(), edges = edges.len()).entered();
    config.validate()?;

    let start = Instant::now();
    let graph = Graph::build(nodes, edges)?;
    tracing::debug!(elapsed = ?start.elapsed(), "graph built");
    let mut cancelled = !progress(LayoutPhase::Graph, 1.0);

    let start = Instant::now();
    let components = scc::find_component_indices(&graph);
    let nodes_in_components: usize = components.iter().map(Vec::len).sum();
    tracing::debug!(
        components = components.len(),
        nodes_in_components,
        elapsed = ?start.elapsed(),
        "components detected"
    );
    cancelled = cancelled || !progress(LayoutPhase::Components, 1.0);

    let masses = MassAssignment::compute(&graph, &components, &config.hubs, &config.mass_tiers);
    let tier_counts = masses.tier_counts();
    tracing::debug!(?tier_counts, "masses assigned");
    cancelled = cancelled || !progress(LayoutPhase::Masses, 1.0);

    let mut sim = Simulation::new(&graph, &masses.masses, config);
    let outcome = if cancelled || graph.is_empty() {
        RunOutcome {
            cancelled,
            ..Default::default()
        }
    } else {
        sim.run(config.iterations, config.convergence_threshold, progress)
    };
    cancelled = outcome.cancelled;

    let mut points = sim.points();
    let refined_nodes = if cancelled || !config.refinement.is_enabled() {
        0
    } else {
        let moved = refine::refine(&mut points, &config.refinement);
        tracing::debug!(moved, "refinement applied");
        if !progress(LayoutPhase::Refinement, 1.0) {
            tracing::debug!("layout cancelled after refinement");
            cancelled = true;
        }
        moved
    };

    let component_centroids = components
        .iter()
        .map(|members| {
            let n = members.len() as f64;
            let (sx, sy) = members
                .iter()
                .fold((0.0, 0.0), |(sx, sy), &idx| (sx + points[idx].x, sy + points[idx].y));
            Point::new(sx / n, sy / n)
        })
        .collect();

    let positions: BTreeMap<String, Point> = graph
        .ids()
        .zip(points)
        .map(|(id, p)| (id.to_string(), p))
        .collect();

    let statistics = LayoutStatistics {
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        component_count: components.len(),
        nodes_in_components,
        free_nodes: graph.node_count() - nodes_in_components,
        tier_counts,
        component_centroids,
        iterations_run: outcome.iterations_run,
        cancelled,
        converged_early: outcome.converged_early,
        numerical_instabilities: outcome.numerical_instabilities,
        refined_nodes,
        parameters: LayoutParameters::from_config(config),
    };

    Ok(LayoutResult {
        positions,
        statistics,
    })
}
