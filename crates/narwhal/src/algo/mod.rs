pub mod mass;
pub mod physics;
pub mod refine;
pub mod scc;

use crate::error::{Error, Result};
use crate::graph::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pipeline stage reported to progress callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutPhase {
    Graph,
    Components,
    Masses,
    Simulation,
    Refinement,
}

/// Force-model constants. Every term is always composed; "disabling" a term means setting its
/// constant to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceParams {
    /// Inverse-square attraction along an edge stretched beyond its equilibrium distance.
    pub gravity_constant: f64,
    /// Linear spring constant along an edge, pushing apart below equilibrium and capping the
    /// attraction just above it.
    pub spring_constant: f64,
    /// `r_eq = equilibrium_scale * (m_u + m_v)^mass_exponent * weight^weight_exponent`.
    pub equilibrium_scale: f64,
    pub mass_exponent: f64,
    pub weight_exponent: f64,
    /// Extra all-pairs repulsion applied when either node is heavier than `proximity_threshold`.
    pub proximity_constant: f64,
    /// Mass threshold (not a distance) above which a node counts as a hub for proximity repulsion.
    pub proximity_threshold: f64,
    /// Baseline all-pairs repulsion: `ambient_constant * ambient_scale / r^2`.
    pub ambient_constant: f64,
    pub ambient_scale: f64,
    /// Pull toward the centroid of all nodes, per unit of distance. Not scaled by mass, so an
    /// isolated connected pair settles at most `tension_constant / (2 * spring_constant)` short of
    /// its equilibrium distance whatever the masses.
    pub tension_constant: f64,
    /// Per-step velocity retention, strictly inside (0, 1).
    pub damping: f64,
    pub time_step: f64,
    /// Magnitude cap on the net force of a single node.
    ///
    /// Keep this well above the hub-to-hub proximity force at typical distances; a low cap
    /// flattens hub separation.
    pub max_force: f64,
    /// Pairwise distances below this are clamped before computing forces.
    pub min_distance: f64,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            gravity_constant: 50.0,
            spring_constant: 0.5,
            equilibrium_scale: 50.0,
            mass_exponent: 0.2,
            weight_exponent: -0.3,
            proximity_constant: 5.0,
            proximity_threshold: 400.0,
            ambient_constant: 1000.0,
            ambient_scale: 1.0,
            tension_constant: 0.005,
            damping: 0.9,
            time_step: 1.0,
            max_force: 1.0e6,
            min_distance: 1.0,
        }
    }
}

impl ForceParams {
    pub fn equilibrium_distance(&self, mass_u: f64, mass_v: f64, weight: f64) -> f64 {
        self.equilibrium_scale
            * (mass_u + mass_v).powf(self.mass_exponent)
            * weight.powf(self.weight_exponent)
    }

    fn validate(&self) -> Result<()> {
        non_negative("forces.gravity_constant", self.gravity_constant)?;
        non_negative("forces.spring_constant", self.spring_constant)?;
        positive("forces.equilibrium_scale", self.equilibrium_scale)?;
        finite("forces.mass_exponent", self.mass_exponent)?;
        finite("forces.weight_exponent", self.weight_exponent)?;
        non_negative("forces.proximity_constant", self.proximity_constant)?;
        non_negative("forces.proximity_threshold", self.proximity_threshold)?;
        non_negative("forces.ambient_constant", self.ambient_constant)?;
        non_negative("forces.ambient_scale", self.ambient_scale)?;
        non_negative("forces.tension_constant", self.tension_constant)?;
        ensure(
            "forces.damping",
            self.damping > 0.0 && self.damping < 1.0,
            || format!("must lie strictly inside (0, 1), got {}", self.damping),
        )?;
        positive("forces.time_step", self.time_step)?;
        positive("forces.max_force", self.max_force)?;
        positive("forces.min_distance", self.min_distance)?;
        Ok(())
    }
}

/// Total-degree thresholds for the hub mass tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubThresholds {
    pub super_hub: usize,
    pub major_hub: usize,
    pub minor_hub: usize,
}

impl Default for HubThresholds {
    fn default() -> Self {
        Self {
            super_hub: 6,
            major_hub: 4,
            minor_hub: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MassTiers {
    pub scc: f64,
    pub super_hub: f64,
    pub major_hub: f64,
    pub minor_hub: f64,
    pub base_state_holder: f64,
    pub base_activity: f64,
}

impl Default for MassTiers {
    fn default() -> Self {
        Self {
            scc: 1000.0,
            super_hub: 1000.0,
            major_hub: 500.0,
            minor_hub: 200.0,
            base_state_holder: 100.0,
            base_activity: 10.0,
        }
    }
}

impl MassTiers {
    /// Lightest configured tier; every assigned mass is at least this.
    pub fn min(&self) -> f64 {
        [
            self.scc,
            self.super_hub,
            self.major_hub,
            self.minor_hub,
            self.base_state_holder,
            self.base_activity,
        ]
        .into_iter()
        .fold(f64::INFINITY, f64::min)
    }

    fn validate(&self) -> Result<()> {
        positive("mass_tiers.scc", self.scc)?;
        positive("mass_tiers.super_hub", self.super_hub)?;
        positive("mass_tiers.major_hub", self.major_hub)?;
        positive("mass_tiers.minor_hub", self.minor_hub)?;
        positive("mass_tiers.base_state_holder", self.base_state_holder)?;
        positive("mass_tiers.base_activity", self.base_activity)?;
        Ok(())
    }
}

/// Post-simulation geometric refinement. The default performs no work, so the orchestrator
/// returns the simulator's positions untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Refinement {
    /// Translate the layout so its bounding-box center sits at the origin.
    pub recenter: bool,
    /// Push apart pairs closer than this distance.
    pub min_separation: Option<f64>,
    pub separation_passes: usize,
}

impl Default for Refinement {
    fn default() -> Self {
        Self {
            recenter: false,
            min_separation: None,
            separation_passes: 8,
        }
    }
}

impl Refinement {
    pub fn is_enabled(&self) -> bool {
        self.recenter || self.min_separation.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub iterations: usize,
    pub forces: ForceParams,
    pub hubs: HubThresholds,
    pub mass_tiers: MassTiers,
    pub random_seed: u64,
    /// Half-width of the square that unplaced nodes are scattered into.
    pub initial_extent: f64,
    pub initial_positions: BTreeMap<String, Point>,
    /// Stop early once the mean per-node displacement per step, measured over a check window,
    /// drops below this value.
    pub convergence_threshold: Option<f64>,
    pub refinement: Refinement,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            forces: ForceParams::default(),
            hubs: HubThresholds::default(),
            mass_tiers: MassTiers::default(),
            random_seed: 0,
            initial_extent: 500.0,
            initial_positions: BTreeMap::new(),
            convergence_threshold: None,
            refinement: Refinement::default(),
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<()> {
        self.forces.validate()?;
        self.mass_tiers.validate()?;
        ensure(
            "hubs",
            self.hubs.minor_hub <= self.hubs.major_hub && self.hubs.major_hub <= self.hubs.super_hub,
            || {
                format!(
                    "thresholds must satisfy minor <= major <= super, got {} / {} / {}",
                    self.hubs.minor_hub, self.hubs.major_hub, self.hubs.super_hub
                )
            },
        )?;
        positive("initial_extent", self.initial_extent)?;
        if let Some((id, _)) = self.initial_positions.iter().find(|(_, p)| !p.is_finite()) {
            return Err(Error::InvalidConfiguration {
                field: "initial_positions",
                reason: format!("position for `{id}` is not finite"),
            });
        }
        if let Some(t) = self.convergence_threshold {
            positive("convergence_threshold", t)?;
        }
        if let Some(s) = self.refinement.min_separation {
            positive("refinement.min_separation", s)?;
        }
        Ok(())
    }
}

fn ensure(field: &'static str, ok: bool, reason: impl FnOnce() -> String) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidConfiguration {
            field,
            reason: reason(),
        })
    }
}

fn finite(field: &'static str, v: f64) -> Result<()> {
    ensure(field, v.is_finite(), || format!("must be finite, got {v}"))
}

fn positive(field: &'static str, v: f64) -> Result<()> {
    ensure(field, v.is_finite() && v > 0.0, || {
        format!("must be finite and > 0, got {v}")
    })
}

fn non_negative(field: &'static str, v: f64) -> Result<()> {
    ensure(field, v.is_finite() && v >= 0.0, || {
        format!("must be finite and >= 0, got {v}")
    })
}
