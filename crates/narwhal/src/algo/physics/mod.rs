//! Damped multi-force simulation over a mass-weighted graph.
//!
//! Each step sums three terms into one net force per node:
//!
//! - an edge force that attracts (inverse-square) beyond the edge's equilibrium distance and
//!   repels (linear spring) inside it,
//! - all-pairs proximity repulsion, with an extra mass-product term when either node is a hub,
//! - a weak tension toward the layout centroid, equal for every node regardless of mass.
//!
//! The net force is capped, then integrated semi-implicitly:
//! `v = v * damping + F / m * dt; p += v * dt`.
//!
//! Proximity repulsion visits every pair, so a step is O(N^2). Graphs well beyond a few hundred
//! nodes need spatial partitioning, which this module does not do.

mod rng;

use crate::algo::mass::MassMap;
use crate::algo::{ForceParams, LayoutConfig, LayoutPhase};
use crate::graph::{Graph, Point};
use nalgebra::Vector2;
use rng::XorShift64Star;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

type Vec2 = Vector2<f64>;

/// Window (in steps) of the optional early-stop displacement check.
pub const CONVERGENCE_CHECK_PERIOD: usize = 100;

/// How a simulation run ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub iterations_run: usize,
    pub cancelled: bool,
    pub converged_early: bool,
    pub numerical_instabilities: usize,
}

#[derive(Debug, Clone)]
pub struct Simulation<'g> {
    graph: &'g Graph,
    params: ForceParams,
    masses: Vec<f64>,
    is_hub: Vec<bool>,
    // One entry per graph edge.
    equilibrium: Vec<f64>,
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    forces: Vec<Vec2>,
    iteration: usize,
    instabilities: usize,
    last_displacement: f64,
}

impl<'g> Simulation<'g> {
    /// `masses` is indexed like `graph`'s nodes.
    ///
    /// Nodes listed in `config.initial_positions` start there; the rest are scattered uniformly in
    /// `[-initial_extent, initial_extent]^2` from `config.random_seed`.
    pub fn new(graph: &'g Graph, masses: &[f64], config: &LayoutConfig) -> Self {
        debug_assert_eq!(masses.len(), graph.node_count());
        let params = config.forces.clone();

        let mut rng = XorShift64Star::new(config.random_seed);
        let extent = config.initial_extent;
        let positions: Vec<Vec2> = graph
            .ids()
            .map(|id| match config.initial_positions.get(id) {
                Some(p) => Vec2::new(p.x, p.y),
                None => Vec2::new(
                    rng.next_f64_signed() * extent,
                    rng.next_f64_signed() * extent,
                ),
            })
            .collect();

        let is_hub = masses
            .iter()
            .map(|&m| m > params.proximity_threshold)
            .collect();
        let equilibrium = graph
            .edges()
            .iter()
            .map(|e| params.equilibrium_distance(masses[e.source], masses[e.target], e.weight))
            .collect();

        let n = graph.node_count();
        Self {
            graph,
            params,
            masses: masses.to_vec(),
            is_hub,
            equilibrium,
            positions,
            velocities: vec![Vec2::zeros(); n],
            forces: vec![Vec2::zeros(); n],
            iteration: 0,
            instabilities: 0,
            last_displacement: 0.0,
        }
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn instabilities(&self) -> usize {
        self.instabilities
    }

    pub fn position(&self, idx: usize) -> Point {
        let p = self.positions[idx];
        Point::new(p.x, p.y)
    }

    pub fn velocity(&self, idx: usize) -> Point {
        let v = self.velocities[idx];
        Point::new(v.x, v.y)
    }

    pub fn points(&self) -> Vec<Point> {
        self.positions.iter().map(|p| Point::new(p.x, p.y)).collect()
    }

    pub fn position_map(&self) -> BTreeMap<String, Point> {
        self.graph
            .ids()
            .zip(self.positions.iter())
            .map(|(id, p)| (id.to_string(), Point::new(p.x, p.y)))
            .collect()
    }

    /// Equilibrium distance of the `edge_idx`-th graph edge.
    pub fn equilibrium_distance(&self, edge_idx: usize) -> f64 {
        self.equilibrium[edge_idx]
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.velocities
            .iter()
            .zip(&self.masses)
            .map(|(v, m)| 0.5 * m * v.norm_squared())
            .sum()
    }

    /// Advances one full step. Node state is always a complete post-step snapshot afterwards.
    pub fn step(&mut self) {
        self.forces.fill(Vec2::zeros());
        self.accumulate_edge_forces();
        self.accumulate_proximity_forces();
        self.accumulate_tension();
        self.integrate();
        self.iteration += 1;
    }

    /// Runs up to `iterations` steps.
    ///
    /// `progress` is called every 1% of `iterations` (and after the last step) with the completed
    /// fraction; returning `false` stops the run at that step boundary. Steps between checkpoints
    /// are not interruptible, so a stop lands at most `iterations / 100` steps late.
    pub fn run(
        &mut self,
        iterations: usize,
        convergence_threshold: Option<f64>,
        progress: &mut dyn FnMut(LayoutPhase, f64) -> bool,
    ) -> RunOutcome {
        let start = std::time::Instant::now();
        let checkpoint = (iterations / 100).max(1);
        let node_count = self.positions.len().max(1) as f64;
        let mut outcome = RunOutcome::default();
        let mut window_displacement = 0.0f64;

        for step in 1..=iterations {
            self.step();
            outcome.iterations_run = step;
            window_displacement += self.last_displacement;

            if let Some(threshold) = convergence_threshold {
                if step % CONVERGENCE_CHECK_PERIOD == 0 {
                    let mean = window_displacement / (CONVERGENCE_CHECK_PERIOD as f64 * node_count);
                    window_displacement = 0.0;
                    if mean < threshold {
                        tracing::debug!(step, mean, threshold, "simulation converged early");
                        outcome.converged_early = true;
                        break;
                    }
                }
            }

            if step % checkpoint == 0 || step == iterations {
                let fraction = step as f64 / iterations as f64;
                tracing::trace!(step, fraction, "simulation checkpoint");
                if !progress(LayoutPhase::Simulation, fraction) {
                    tracing::debug!(step, "simulation cancelled by progress callback");
                    outcome.cancelled = true;
                    break;
                }
            }
        }

        outcome.numerical_instabilities = self.instabilities;
        tracing::debug!(
            iterations = outcome.iterations_run,
            instabilities = outcome.numerical_instabilities,
            elapsed = ?start.elapsed(),
            "simulation finished"
        );
        outcome
    }

    /// Unit vector from `a` towards `b` and their distance, floored at `min_distance`.
    ///
    /// Coincident nodes get a fixed direction so the floored force stays finite and deterministic.
    fn separation(&self, a: usize, b: usize) -> (Vec2, f64) {
        let delta = self.positions[b] - self.positions[a];
        let dist = delta.norm();
        let dir = if dist > 0.0 && dist.is_finite() {
            delta / dist
        } else {
            Vec2::new(1.0, 0.0)
        };
        (dir, dist.max(self.params.min_distance))
    }

    fn accumulate_edge_forces(&mut self) {
        let p = &self.params;
        let graph = self.graph;
        for (e, &r_eq) in graph.edges().iter().zip(&self.equilibrium) {
            // Equal and opposite on the same node.
            if e.is_self_loop() {
                continue;
            }
            let (dir, r) = self.separation(e.source, e.target);
            let (mu, mv) = (self.masses[e.source], self.masses[e.target]);

            // Positive pulls the endpoints together.
            let magnitude = if r > r_eq {
                let gravity = p.gravity_constant * e.weight * mu * mv / (r * r);
                // Near equilibrium the spring is the smaller of the two, so the force fades to zero
                // at r_eq instead of jumping.
                let spring = if p.spring_constant > 0.0 {
                    p.spring_constant * (r - r_eq)
                } else {
                    f64::INFINITY
                };
                gravity.min(spring)
            } else if r < r_eq {
                -p.spring_constant * (r_eq - r)
            } else {
                0.0
            };

            self.forces[e.source] += dir * magnitude;
            self.forces[e.target] -= dir * magnitude;
        }
    }

    fn accumulate_proximity_forces(&mut self) {
        let n = self.positions.len();
        let ambient = self.params.ambient_constant * self.params.ambient_scale;
        let proximity = self.params.proximity_constant;
        for i in 0..n {
            for j in (i + 1)..n {
                let (dir, r) = self.separation(i, j);
                let inv_sq = 1.0 / (r * r);
                let mut magnitude = ambient * inv_sq;
                if self.is_hub[i] || self.is_hub[j] {
                    magnitude += proximity * self.masses[i] * self.masses[j] * inv_sq;
                }
                self.forces[i] -= dir * magnitude;
                self.forces[j] += dir * magnitude;
            }
        }
    }

    fn accumulate_tension(&mut self) {
        let k = self.params.tension_constant;
        let n = self.positions.len();
        if k <= 0.0 || n < 2 {
            return;
        }
        let centroid = self.positions.iter().fold(Vec2::zeros(), |acc, p| acc + p) / n as f64;
        for (f, p) in self.forces.iter_mut().zip(&self.positions) {
            *f += (centroid - p) * k;
        }
    }

    fn integrate(&mut self) {
        let ForceParams {
            damping,
            time_step: dt,
            max_force,
            ..
        } = self.params;
        let mut displacement = 0.0f64;

        for idx in 0..self.positions.len() {
            let mut force = self.forces[idx];
            let norm = force.norm();
            if norm > max_force {
                force *= max_force / norm;
            }

            let prev = self.positions[idx];
            let velocity = self.velocities[idx] * damping + force / self.masses[idx] * dt;
            let next = prev + velocity * dt;
            if velocity.iter().all(|c| c.is_finite()) && next.iter().all(|c| c.is_finite()) {
                self.velocities[idx] = velocity;
                self.positions[idx] = next;
                displacement += (next - prev).norm();
            } else {
                tracing::warn!(
                    node = self.graph.id(idx),
                    iteration = self.iteration,
                    "non-finite node state contained; velocity reset"
                );
                self.velocities[idx] = Vec2::zeros();
                self.instabilities += 1;
            }
        }

        self.last_displacement = displacement;
    }
}

/// Runs a full simulation from a mass map and returns final positions keyed by node id.
///
/// Ids missing from `masses` fall back to the lightest configured tier.
pub fn simulate(
    graph: &Graph,
    masses: &MassMap,
    config: &LayoutConfig,
    progress: Option<&mut dyn FnMut(LayoutPhase, f64) -> bool>,
) -> (BTreeMap<String, Point>, RunOutcome) {
    let fallback = config.mass_tiers.min();
    let masses: Vec<f64> = graph
        .ids()
        .map(|id| masses.get(id).copied().unwrap_or(fallback))
        .collect();
    let mut sim = Simulation::new(graph, &masses, config);
    let mut keep_going = |_: LayoutPhase, _: f64| true;
    let progress: &mut dyn FnMut(LayoutPhase, f64) -> bool = match progress {
        Some(p) => p,
        None => &mut keep_going,
    };
    let outcome = sim.run(config.iterations, config.convergence_threshold, progress);
    (sim.position_map(), outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};

    fn pinned(config: &mut LayoutConfig, id: &str, x: f64, y: f64) {
        config.initial_positions.insert(id.to_string(), Point::new(x, y));
    }

    #[test]
    fn same_seed_scatters_identically() {
        let nodes: Vec<Node> = (0..8).map(|i| Node::activity(format!("n{i}"))).collect();
        let g = Graph::build(&nodes, &[]).unwrap();
        let masses = vec![10.0; 8];
        let cfg = LayoutConfig {
            random_seed: 7,
            ..Default::default()
        };
        let a = Simulation::new(&g, &masses, &cfg).points();
        let b = Simulation::new(&g, &masses, &cfg).points();
        assert_eq!(a, b);
        for p in &a {
            assert!(p.x.abs() <= cfg.initial_extent && p.y.abs() <= cfg.initial_extent);
        }
    }

    #[test]
    fn coincident_nodes_are_pushed_apart_with_finite_force() {
        let nodes = vec![Node::activity("a"), Node::activity("b")];
        let g = Graph::build(&nodes, &[]).unwrap();
        let mut cfg = LayoutConfig::default();
        pinned(&mut cfg, "a", 5.0, 5.0);
        pinned(&mut cfg, "b", 5.0, 5.0);
        let mut sim = Simulation::new(&g, &[10.0, 10.0], &cfg);
        sim.step();
        let (a, b) = (sim.position(0), sim.position(1));
        assert!(a.is_finite() && b.is_finite());
        assert!(a.distance(&b) > 0.0);
        assert_eq!(sim.instabilities(), 0);
    }

    #[test]
    fn net_force_is_capped() {
        let nodes = vec![Node::activity("a"), Node::activity("b")];
        let g = Graph::build(&nodes, &[]).unwrap();
        let mut cfg = LayoutConfig::default();
        cfg.forces.ambient_constant = 1.0e9;
        cfg.forces.tension_constant = 0.0;
        cfg.forces.max_force = 5.0;
        pinned(&mut cfg, "a", 0.0, 0.0);
        pinned(&mut cfg, "b", 2.0, 0.0);
        let mut sim = Simulation::new(&g, &[10.0, 10.0], &cfg);
        sim.step();
        // From rest, |v| = |F| / m * dt.
        let v = sim.velocity(0);
        assert!((v.x.hypot(v.y) - 0.5).abs() < 1e-12, "{v:?}");
    }

    #[test]
    fn non_finite_state_is_contained() {
        let nodes = vec![Node::activity("a"), Node::activity("b")];
        let g = Graph::build(&nodes, &[]).unwrap();
        let mut cfg = LayoutConfig::default();
        cfg.forces.ambient_constant = 1.0e300;
        cfg.forces.max_force = f64::MAX;
        pinned(&mut cfg, "a", 0.0, 0.0);
        pinned(&mut cfg, "b", 1.0, 0.0);
        let mut sim = Simulation::new(&g, &[1.0e-300, 1.0e-300], &cfg);
        sim.step();

        assert_eq!(sim.instabilities(), 2);
        assert_eq!(sim.position(0), Point::new(0.0, 0.0));
        assert_eq!(sim.position(1), Point::new(1.0, 0.0));
        assert_eq!(sim.velocity(0), Point::new(0.0, 0.0));
    }

    #[test]
    fn edge_inside_equilibrium_pushes_endpoints_apart() {
        let nodes = vec![Node::activity("a"), Node::activity("b")];
        let g = Graph::build(&nodes, &[Edge::new("a", "b")]).unwrap();
        let mut cfg = LayoutConfig::default();
        cfg.forces.ambient_constant = 0.0;
        cfg.forces.tension_constant = 0.0;
        pinned(&mut cfg, "a", 0.0, 0.0);
        pinned(&mut cfg, "b", 10.0, 0.0);
        let mut sim = Simulation::new(&g, &[10.0, 10.0], &cfg);
        assert!(sim.equilibrium_distance(0) > 10.0);
        sim.step();
        assert!(sim.position(0).x < 0.0);
        assert!(sim.position(1).x > 10.0);
    }

    #[test]
    fn edge_beyond_equilibrium_pulls_endpoints_together() {
        let nodes = vec![Node::activity("a"), Node::activity("b")];
        let g = Graph::build(&nodes, &[Edge::new("a", "b")]).unwrap();
        let mut cfg = LayoutConfig::default();
        cfg.forces.ambient_constant = 0.0;
        cfg.forces.tension_constant = 0.0;
        pinned(&mut cfg, "a", 0.0, 0.0);
        pinned(&mut cfg, "b", 400.0, 0.0);
        let mut sim = Simulation::new(&g, &[10.0, 10.0], &cfg);
        sim.step();
        assert!(sim.position(0).x > 0.0);
        assert!(sim.position(1).x < 400.0);
    }

    #[test]
    fn progress_false_stops_at_a_step_boundary() {
        let nodes = vec![Node::activity("a"), Node::activity("b")];
        let g = Graph::build(&nodes, &[Edge::new("a", "b")]).unwrap();
        let cfg = LayoutConfig::default();
        let mut sim = Simulation::new(&g, &[10.0, 10.0], &cfg);
        let mut calls = 0;
        let outcome = sim.run(1000, None, &mut |phase: LayoutPhase, _: f64| {
            assert_eq!(phase, LayoutPhase::Simulation);
            calls += 1;
            calls < 3
        });
        assert!(outcome.cancelled);
        assert_eq!(outcome.iterations_run, 30);
        assert_eq!(sim.iteration(), 30);
    }
}
