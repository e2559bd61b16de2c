use crate::core::models::atom::AtomOverrides;
use crate::core::models::bond::BondType;
use crate::core::models::ids::AtomId;
use crate::engine::error::EngineError;
use crate::engine::simulation::Simulation;
use nalgebra::{Point3, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Elements drawn by [`add_random_atoms`].
pub const RANDOM_ELEMENTS: [&str; 6] = ["H", "C", "N", "O", "P", "S"];

/// Fraction of the box, per axis, in which random atoms are placed.
const RANDOM_FILL_FRACTION: f64 = 0.8;

const WATER_OH_LENGTH: f64 = 0.957;
const WATER_HOH_ANGLE_DEG: f64 = 104.5;
const METHANE_CH_LENGTH: f64 = 1.09;
const BENZENE_CC_LENGTH: f64 = 1.39;
const BENZENE_CH_LENGTH: f64 = 1.09;

/// A ready-made molecule that can be dropped into a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    Water,
    Methane,
    Benzene,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Water, Preset::Methane, Preset::Benzene];

    /// Atoms and explicit bonds of the preset, with positions relative to its center.
    fn template(self) -> (Vec<(&'static str, Vector3<f64>)>, Vec<(usize, usize, BondType)>) {
        match self {
            Preset::Water => {
                let half = (WATER_HOH_ANGLE_DEG / 2.0).to_radians();
                let (dx, dy) = (WATER_OH_LENGTH * half.sin(), WATER_OH_LENGTH * half.cos());
                (
                    vec![
                        ("O", Vector3::zeros()),
                        ("H", Vector3::new(dx, dy, 0.0)),
                        ("H", Vector3::new(-dx, dy, 0.0)),
                    ],
                    vec![(0, 1, BondType::Single), (0, 2, BondType::Single)],
                )
            }
            Preset::Methane => {
                let d = METHANE_CH_LENGTH / 3f64.sqrt();
                let mut atoms = vec![("C", Vector3::zeros())];
                for (x, y, z) in [(1.0, 1.0, 1.0), (-1.0, -1.0, 1.0), (-1.0, 1.0, -1.0), (1.0, -1.0, -1.0)] {
                    atoms.push(("H", Vector3::new(x, y, z) * d));
                }
                let bonds = (1..=4).map(|h| (0, h, BondType::Single)).collect();
                (atoms, bonds)
            }
            Preset::Benzene => {
                let mut atoms = Vec::with_capacity(12);
                for i in 0..6 {
                    let angle = i as f64 * PI / 3.0;
                    let direction = Vector3::new(angle.cos(), angle.sin(), 0.0);
                    atoms.push(("C", direction * BENZENE_CC_LENGTH));
                }
                for i in 0..6 {
                    let angle = i as f64 * PI / 3.0;
                    let direction = Vector3::new(angle.cos(), angle.sin(), 0.0);
                    atoms.push(("H", direction * (BENZENE_CC_LENGTH + BENZENE_CH_LENGTH)));
                }
                let mut bonds: Vec<_> = (0..6).map(|i| (i, (i + 1) % 6, BondType::Aromatic)).collect();
                bonds.extend((0..6).map(|i| (i, i + 6, BondType::Single)));
                (atoms, bonds)
            }
        }
    }

    /// Adds the preset centered at `center`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CapacityExceeded`] if the atoms or the new molecule would not
    /// fit; nothing is added in that case.
    pub fn build(self, simulation: &mut Simulation, center: Point3<f64>) -> Result<Vec<AtomId>, EngineError> {
        let (atoms, bonds) = self.template();
        simulation.ensure_atom_capacity(atoms.len())?;
        simulation.ensure_molecule_capacity()?;

        let ids = atoms
            .into_iter()
            .map(|(element, offset)| simulation.add_atom(element, center + offset, &AtomOverrides::default()))
            .collect::<Result<Vec<_>, _>>()?;
        for (a, b, bond_type) in bonds {
            simulation.add_bond(ids[a], ids[b], bond_type)?;
        }
        info!(preset = %self, atoms = ids.len(), "Added preset molecule");
        Ok(ids)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Preset::Water => "water",
            Preset::Methane => "methane",
            Preset::Benzene => "benzene",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown preset '{0}' (expected water, methane, or benzene)")]
pub struct ParsePresetError(String);

impl FromStr for Preset {
    type Err = ParsePresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParsePresetError(s.to_string()))
    }
}

/// Scatters `count` atoms of random elements across the central part of the box.
///
/// # Errors
///
/// Returns [`EngineError::CapacityExceeded`] if `count` atoms would not fit; nothing is
/// added in that case.
pub fn add_random_atoms(simulation: &mut Simulation, count: usize) -> Result<Vec<AtomId>, EngineError> {
    simulation.ensure_atom_capacity(count)?;
    let half = simulation.space().half_extents() * RANDOM_FILL_FRACTION;

    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let rng = simulation.rng_mut();
        let element = RANDOM_ELEMENTS[rng.gen_range(0..RANDOM_ELEMENTS.len())];
        let position = Point3::new(
            (rng.r#gen::<f64>() * 2.0 - 1.0) * half.x,
            (rng.r#gen::<f64>() * 2.0 - 1.0) * half.y,
            (rng.r#gen::<f64>() * 2.0 - 1.0) * half.z,
        );
        ids.push(simulation.add_atom(element, position, &AtomOverrides::default())?);
    }
    info!(count, "Added random atoms");
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::params::ForceSettings;
    use crate::engine::config::{Limits, SimulationConfig};

    fn simulation() -> Simulation {
        Simulation::new(SimulationConfig {
            forces: ForceSettings::disabled(),
            seed: Some(11),
            ..SimulationConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn presets_build_single_named_molecules() {
        for (preset, formula, atoms, bonds) in [
            (Preset::Water, "H2O", 3, 2),
            (Preset::Methane, "CH4", 5, 4),
            (Preset::Benzene, "C6H6", 12, 12),
        ] {
            let mut sim = simulation();
            let ids = preset.build(&mut sim, Point3::origin()).unwrap();
            assert_eq!(ids.len(), atoms);
            assert_eq!(sim.system().bond_count(), bonds);
            assert_eq!(sim.system().molecule_count(), 1);
            let molecule = sim.system().molecule_of(ids[0]).unwrap();
            assert_eq!(sim.system().molecule(molecule).unwrap().formula(), formula);
        }
    }

    #[test]
    fn water_geometry_has_expected_bond_lengths() {
        let mut sim = simulation();
        let ids = Preset::Water.build(&mut sim, Point3::new(1.0, 2.0, 3.0)).unwrap();
        let o = sim.system().atom(ids[0]).unwrap();
        for &h in &ids[1..] {
            let d = o.distance_to(sim.system().atom(h).unwrap());
            assert!((d - WATER_OH_LENGTH).abs() < 1e-9);
        }
    }

    #[test]
    fn benzene_ring_is_closed_and_aromatic() {
        let mut sim = simulation();
        let ids = Preset::Benzene.build(&mut sim, Point3::origin()).unwrap();
        let ring = sim.system().bond_between(ids[5], ids[0]).unwrap();
        assert_eq!(sim.system().bond(ring).unwrap().bond_type, BondType::Aromatic);
        let molecule = sim.system().molecule_of(ids[0]).unwrap();
        assert!(sim.system().molecule(molecule).unwrap().properties().aromatic);
    }

    #[test]
    fn preset_respects_capacity_without_partial_insert() {
        let mut sim = Simulation::new(SimulationConfig {
            limits: Limits {
                max_atoms: 4,
                ..Limits::default()
            },
            ..SimulationConfig::default()
        })
        .unwrap();
        assert!(matches!(
            Preset::Methane.build(&mut sim, Point3::origin()),
            Err(EngineError::CapacityExceeded { what: "atoms", .. })
        ));
        assert_eq!(sim.system().atom_count(), 0);
    }

    #[test]
    fn preset_names_parse_case_insensitively() {
        assert_eq!("Water".parse::<Preset>().unwrap(), Preset::Water);
        assert_eq!(" benzene ".parse::<Preset>().unwrap(), Preset::Benzene);
        assert!("ethanol".parse::<Preset>().is_err());
    }

    #[test]
    fn random_atoms_land_inside_the_fill_region() {
        let mut sim = simulation();
        let ids = add_random_atoms(&mut sim, 50).unwrap();
        assert_eq!(ids.len(), 50);
        let limit = sim.space().half_extents() * RANDOM_FILL_FRACTION;
        for id in ids {
            let atom = sim.system().atom(id).unwrap();
            assert!(RANDOM_ELEMENTS.contains(&atom.element.as_str()));
            assert!(atom.position.x.abs() <= limit.x);
            assert!(atom.position.y.abs() <= limit.y);
            assert!(atom.position.z.abs() <= limit.z);
        }
    }

    #[test]
    fn random_atoms_are_reproducible_with_a_seed() {
        let positions = || {
            let mut sim = simulation();
            add_random_atoms(&mut sim, 5)
                .unwrap()
                .into_iter()
                .map(|id| sim.system().atom(id).unwrap().position)
                .collect::<Vec<_>>()
        };
        assert_eq!(positions(), positions());
    }
}
