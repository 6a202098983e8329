//! Structural mass hierarchy: cycle members and hubs are heavy, leaves are light.

use crate::algo::scc::Component;
use crate::algo::{HubThresholds, MassTiers};
use crate::graph::{Graph, NodeKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Node id -> mass, in caller node order.
pub type MassMap = IndexMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MassTier {
    Scc,
    SuperHub,
    MajorHub,
    MinorHub,
    BaseStateHolder,
    BaseActivity,
}

impl MassTier {
    pub fn mass(self, tiers: &MassTiers) -> f64 {
        match self {
            MassTier::Scc => tiers.scc,
            MassTier::SuperHub => tiers.super_hub,
            MassTier::MajorHub => tiers.major_hub,
            MassTier::MinorHub => tiers.minor_hub,
            MassTier::BaseStateHolder => tiers.base_state_holder,
            MassTier::BaseActivity => tiers.base_activity,
        }
    }

    /// First matching rule wins: component membership, then degree thresholds, then kind.
    pub fn classify(
        in_component: bool,
        degree: usize,
        kind: NodeKind,
        hubs: &HubThresholds,
    ) -> Self {
        if in_component {
            MassTier::Scc
        } else if degree >= hubs.super_hub {
            MassTier::SuperHub
        } else if degree >= hubs.major_hub {
            MassTier::MajorHub
        } else if degree >= hubs.minor_hub {
            MassTier::MinorHub
        } else {
            match kind {
                NodeKind::StateHolder => MassTier::BaseStateHolder,
                NodeKind::Activity => MassTier::BaseActivity,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub scc: usize,
    pub super_hub: usize,
    pub major_hub: usize,
    pub minor_hub: usize,
    pub base_state_holder: usize,
    pub base_activity: usize,
}

impl TierCounts {
    fn record(&mut self, tier: MassTier) {
        let slot = match tier {
            MassTier::Scc => &mut self.scc,
            MassTier::SuperHub => &mut self.super_hub,
            MassTier::MajorHub => &mut self.major_hub,
            MassTier::MinorHub => &mut self.minor_hub,
            MassTier::BaseStateHolder => &mut self.base_state_holder,
            MassTier::BaseActivity => &mut self.base_activity,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        self.scc
            + self.super_hub
            + self.major_hub
            + self.minor_hub
            + self.base_state_holder
            + self.base_activity
    }
}

/// Per-node masses and tiers, indexed like the graph's nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct MassAssignment {
    pub masses: Vec<f64>,
    pub tiers: Vec<MassTier>,
}

impl MassAssignment {
    pub fn compute(
        graph: &Graph,
        component_indices: &[Vec<usize>],
        hubs: &HubThresholds,
        mass_tiers: &MassTiers,
    ) -> Self {
        let mut in_component = vec![false; graph.node_count()];
        for &idx in component_indices.iter().flatten() {
            in_component[idx] = true;
        }

        let tiers: Vec<MassTier> = (0..graph.node_count())
            .map(|idx| {
                MassTier::classify(in_component[idx], graph.degree(idx), graph.kind(idx), hubs)
            })
            .collect();
        let masses = tiers.iter().map(|t| t.mass(mass_tiers)).collect();
        Self { masses, tiers }
    }

    pub fn to_map(&self, graph: &Graph) -> MassMap {
        graph
            .ids()
            .zip(self.masses.iter())
            .map(|(id, &m)| (id.to_string(), m))
            .collect()
    }

    pub fn tier_counts(&self) -> TierCounts {
        let mut counts = TierCounts::default();
        for &t in &self.tiers {
            counts.record(t);
        }
        counts
    }
}

pub fn assign_masses(
    graph: &Graph,
    components: &[Component],
    hubs: &HubThresholds,
    mass_tiers: &MassTiers,
) -> MassMap {
    let component_indices: Vec<Vec<usize>> = components
        .iter()
        .map(|c| {
            c.member_ids
                .iter()
                .filter_map(|id| graph.index_of(id))
                .collect()
        })
        .collect();
    MassAssignment::compute(graph, &component_indices, hubs, mass_tiers).to_map(graph)
}
