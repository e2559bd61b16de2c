use crate::core::forcefield::params::ForceSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Lower bound on the spatial grid cell size, in Angstroms.
pub const MIN_CELL_SIZE: f64 = 1.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Parameter '{parameter}' = {value} is out of range (expected {expected})")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct IntegrationSettings {
    pub time_step: f64,
    /// Upper bound applied to every requested time step.
    pub max_time_step: f64,
    /// Velocity multiplier applied once per tick.
    pub damping: f64,
    /// Uniform acceleration along -y.
    pub gravity: f64,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            time_step: 0.016,
            max_time_step: 0.1,
            damping: 0.99,
            gravity: 0.0,
        }
    }
}

impl IntegrationSettings {
    /// Clamps a requested time step into `(0, max_time_step]`.
    pub fn clamp_time_step(&self, dt: f64) -> f64 {
        if dt.is_finite() && dt > 0.0 {
            dt.min(self.max_time_step)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CollisionSettings {
    pub enabled: bool,
    pub restitution: f64,
    pub friction: f64,
    /// Contact radius of an atom as a multiple of its covalent radius.
    pub radius_scale: f64,
}

impl Default for CollisionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            restitution: 0.8,
            friction: 0.1,
            radius_scale: 0.75,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryMode {
    /// Reflect the normal velocity, scaled by the wall restitution.
    #[default]
    Elastic,
    /// Stop the normal velocity at the wall.
    Absorbing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct DynamicSpaceSettings {
    pub enabled: bool,
    pub base_size: f64,
    /// Edge length added per atom.
    pub per_atom_growth: f64,
    pub min_size: f64,
    pub max_size: f64,
    /// Fraction of the gap to the target size closed each tick.
    pub adaptation_rate: f64,
}

impl Default for DynamicSpaceSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            base_size: 10.0,
            per_atom_growth: 0.99,
            min_size: 5.0,
            max_size: 100.0,
            adaptation_rate: 0.1,
        }
    }
}

impl DynamicSpaceSettings {
    pub fn target_size(&self, atom_count: usize) -> f64 {
        (self.base_size + atom_count as f64 * self.per_atom_growth).clamp(self.min_size, self.max_size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BoundarySettings {
    pub enabled: bool,
    pub mode: BoundaryMode,
    /// Edge lengths of the box centered at the origin.
    pub extents: [f64; 3],
    pub wall_restitution: f64,
    pub dynamic: DynamicSpaceSettings,
}

impl Default for BoundarySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: BoundaryMode::Elastic,
            extents: [10.0; 3],
            wall_restitution: 0.9,
            dynamic: DynamicSpaceSettings::default(),
        }
    }
}

/// Compatibility rule that decides whether two nearby atoms may bond.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "kebab-case")]
pub enum BondingPolicy {
    /// Bond when the electronegativity difference is below `max_difference`.
    Electronegativity { max_difference: f64 },
    /// Bond when the pair's combined kinetic energy exceeds `threshold`.
    ActivationEnergy { threshold: f64 },
}

impl Default for BondingPolicy {
    fn default() -> Self {
        Self::Electronegativity {
            max_difference: 2.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BondingSettings {
    pub enabled: bool,
    /// Bonding distance as a multiple of the covalent radius sum.
    pub distance_factor: f64,
    pub policy: BondingPolicy,
    /// When set, bonds longer than this multiple of the covalent radius sum break.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_stretch_factor: Option<f64>,
}

impl Default for BondingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            distance_factor: 1.2,
            policy: BondingPolicy::default(),
            break_stretch_factor: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Limits {
    pub max_atoms: usize,
    pub max_molecules: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_atoms: 1000,
            max_molecules: 100,
        }
    }
}

/// The complete configuration of one simulation instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SimulationConfig {
    pub forces: ForceSettings,
    pub integration: IntegrationSettings,
    pub collision: CollisionSettings,
    pub boundary: BoundarySettings,
    pub bonding: BondingSettings,
    pub limits: Limits,
    /// Seed for thermal noise and random placement; entropy is used when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn check(
    parameter: &'static str,
    value: f64,
    expected: &'static str,
    ok: impl Fn(f64) -> bool,
) -> Result<(), ConfigError> {
    if value.is_finite() && ok(value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            parameter,
            value,
            expected,
        })
    }
}

fn unit_interval(v: f64) -> bool {
    (0.0..=1.0).contains(&v)
}

fn positive(v: f64) -> bool {
    v > 0.0
}

fn non_negative(v: f64) -> bool {
    v >= 0.0
}

impl SimulationConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Checks every numeric parameter against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.forces;
        check("forces.lennard-jones.cutoff", f.lennard_jones.cutoff, "> 0", positive)?;
        check("forces.lennard-jones.strength", f.lennard_jones.strength, ">= 0", non_negative)?;
        check("forces.morse.strength", f.morse.strength, ">= 0", non_negative)?;
        check("forces.coulomb.strength", f.coulomb.strength, ">= 0", non_negative)?;
        check("forces.coulomb.dielectric", f.coulomb.dielectric, "> 0", positive)?;
        check("forces.coulomb.cutoff", f.coulomb.cutoff, "> 0", positive)?;
        check("forces.van-der-waals.strength", f.van_der_waals.strength, ">= 0", non_negative)?;
        check("forces.van-der-waals.range-factor", f.van_der_waals.range_factor, "> 0", positive)?;
        check("forces.hydrogen-bond.strength", f.hydrogen_bond.strength, ">= 0", non_negative)?;
        check("forces.hydrogen-bond.max-distance", f.hydrogen_bond.max_distance, "> 0", positive)?;
        check("forces.hydrogen-bond.decay", f.hydrogen_bond.decay, "> 0", positive)?;
        check("forces.thermal.strength", f.thermal.strength, ">= 0", non_negative)?;
        check("forces.thermal.temperature", f.thermal.temperature, ">= 0", non_negative)?;
        check(
            "forces.thermal.reference-temperature",
            f.thermal.reference_temperature,
            "> 0",
            positive,
        )?;
        check("forces.max-pair-force", f.max_pair_force, "> 0", positive)?;

        let i = &self.integration;
        check("integration.time-step", i.time_step, "> 0", positive)?;
        check("integration.max-time-step", i.max_time_step, "> 0", positive)?;
        check("integration.damping", i.damping, "in (0, 1]", |v| v > 0.0 && v <= 1.0)?;
        check("integration.gravity", i.gravity, "finite", |_| true)?;

        let c = &self.collision;
        check("collision.restitution", c.restitution, "in [0, 1]", unit_interval)?;
        check("collision.friction", c.friction, "in [0, 1]", unit_interval)?;
        check("collision.radius-scale", c.radius_scale, ">= 0", non_negative)?;

        let b = &self.boundary;
        for extent in b.extents {
            check("boundary.extents", extent, "> 0", positive)?;
        }
        check("boundary.wall-restitution", b.wall_restitution, "in [0, 1)", |v| (0.0..1.0).contains(&v))?;
        let d = &b.dynamic;
        check("boundary.dynamic.min-size", d.min_size, "> 0", positive)?;
        check("boundary.dynamic.max-size", d.max_size, ">= min-size", |v| v >= d.min_size)?;
        check("boundary.dynamic.base-size", d.base_size, "> 0", positive)?;
        check("boundary.dynamic.per-atom-growth", d.per_atom_growth, ">= 0", non_negative)?;
        check("boundary.dynamic.adaptation-rate", d.adaptation_rate, "in [0, 1]", unit_interval)?;

        let bond = &self.bonding;
        check("bonding.distance-factor", bond.distance_factor, "> 0", positive)?;
        match bond.policy {
            BondingPolicy::Electronegativity { max_difference } => {
                check("bonding.policy.max-difference", max_difference, ">= 0", non_negative)?
            }
            BondingPolicy::ActivationEnergy { threshold } => {
                check("bonding.policy.threshold", threshold, ">= 0", non_negative)?
            }
        }
        if let Some(factor) = bond.break_stretch_factor {
            check("bonding.break-stretch-factor", factor, "> distance-factor", |v| {
                v > bond.distance_factor
            })?;
        }

        check("limits.max-atoms", self.limits.max_atoms as f64, "> 0", positive)?;
        check("limits.max-molecules", self.limits.max_molecules as f64, "> 0", positive)?;
        Ok(())
    }

    /// Bonding distance for a pair of covalent radii.
    #[inline]
    pub fn bonding_distance(&self, covalent_a: f64, covalent_b: f64) -> f64 {
        self.bonding.distance_factor * (covalent_a + covalent_b)
    }

    /// Spatial grid cell size that covers every active interaction range.
    ///
    /// # Arguments
    ///
    /// * `max_covalent_radius` - Largest covalent radius currently in the system.
    pub fn cell_size(&self, max_covalent_radius: f64) -> f64 {
        let mut size = self.forces.interaction_range(max_covalent_radius);
        if self.bonding.enabled {
            let factor = self
                .bonding
                .break_stretch_factor
                .unwrap_or(0.0)
                .max(self.bonding.distance_factor);
            size = size.max(factor * 2.0 * max_covalent_radius);
        }
        if self.collision.enabled {
            size = size.max(self.collision.radius_scale * 2.0 * max_covalent_radius);
        }
        size.max(MIN_CELL_SIZE)
    }
}
