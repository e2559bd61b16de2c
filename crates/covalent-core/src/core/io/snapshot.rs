use crate::core::models::atom::{Atom, LennardJonesParams, MorseParams};
use crate::core::models::bond::BondType;
use crate::core::models::element;
use crate::core::models::ids::AtomId;
use crate::core::models::system::MolecularSystem;
use nalgebra::{Point3, Vector3};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use slotmap::Key;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AtomRecord {
    pub id: u64,
    pub element: String,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub mass: f64,
    pub charge: f64,
    pub covalent_radius: f64,
    pub vdw_radius: f64,
    pub electronegativity: f64,
    pub lj_epsilon: f64,
    pub lj_sigma: f64,
    pub morse_well_depth: f64,
    pub morse_width: f64,
    pub morse_equilibrium: f64,
    pub max_bonds: u8,
    pub bond_count: usize,
    pub temperature: f64,
    pub fixed: bool,
    pub color: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BondRecord {
    pub id: u64,
    pub atom1: u64,
    pub atom2: u64,
    pub bond_type: BondType,
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MoleculeRecord {
    pub id: u64,
    pub atoms: Vec<u64>,
    pub bonds: Vec<u64>,
    pub formula: String,
    /// Derived properties; informational only and recomputed on restore.
    #[serde(default)]
    pub mass: f64,
    #[serde(default)]
    pub charge: f64,
    #[serde(default)]
    pub stability: f64,
    #[serde(default)]
    pub reactivity: f64,
}

/// A complete, serializable copy of a [`MolecularSystem`].
///
/// Ids are the raw slot-map key values at capture time; they are only meaningful within one
/// snapshot and are remapped on restore.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SystemSnapshot {
    pub atoms: Vec<AtomRecord>,
    pub bonds: Vec<BondRecord>,
    pub molecules: Vec<MoleculeRecord>,
}

/// What happened while restoring a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub atoms_loaded: usize,
    pub bonds_loaded: usize,
    pub dropped_atoms: usize,
    pub dropped_bonds: usize,
    /// Molecule records whose membership disagreed with the bonds; molecules are rebuilt
    /// from the bonds in that case.
    pub mismatched_molecules: usize,
    /// Maps ids stored in the snapshot to the ids assigned on restore.
    pub id_map: HashMap<u64, AtomId>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.dropped_atoms == 0 && self.dropped_bonds == 0 && self.mismatched_molecules == 0
    }
}

#[inline]
fn raw_id<K: Key>(key: K) -> u64 {
    key.data().as_ffi()
}

impl SystemSnapshot {
    /// Records every atom, bond, and molecule of `system`.
    pub fn capture(system: &MolecularSystem) -> Self {
        let atoms = system
            .atoms_iter()
            .map(|(id, atom)| AtomRecord {
                id: raw_id(id),
                element: atom.element.clone(),
                position: [atom.position.x, atom.position.y, atom.position.z],
                velocity: [atom.velocity.x, atom.velocity.y, atom.velocity.z],
                mass: atom.mass,
                charge: atom.charge,
                covalent_radius: atom.covalent_radius,
                vdw_radius: atom.vdw_radius,
                electronegativity: atom.electronegativity,
                lj_epsilon: atom.lennard_jones.epsilon,
                lj_sigma: atom.lennard_jones.sigma,
                morse_well_depth: atom.morse.well_depth,
                morse_width: atom.morse.width,
                morse_equilibrium: atom.morse.equilibrium,
                max_bonds: atom.max_bonds,
                bond_count: atom.bond_count(),
                temperature: atom.temperature,
                fixed: atom.fixed,
                color: atom.color,
            })
            .collect();

        let bonds = system
            .bonds_iter()
            .map(|(id, bond)| BondRecord {
                id: raw_id(id),
                atom1: raw_id(bond.atom1_id()),
                atom2: raw_id(bond.atom2_id()),
                bond_type: bond.bond_type,
                length: bond.length,
            })
            .collect();

        let molecules = system
            .molecules_iter()
            .map(|(id, molecule)| MoleculeRecord {
                id: raw_id(id),
                atoms: molecule.atoms().map(raw_id).collect(),
                bonds: molecule.bonds().map(raw_id).collect(),
                formula: molecule.formula().to_string(),
                mass: molecule.properties().mass,
                charge: molecule.properties().charge,
                stability: molecule.properties().stability,
                reactivity: molecule.properties().reactivity,
            })
            .collect();

        Self {
            atoms,
            bonds,
            molecules,
        }
    }

    /// Rebuilds a system from this snapshot.
    ///
    /// Atoms with an unknown element or a duplicate id are dropped. Bonds whose endpoints are
    /// missing, or that would violate a topology invariant, are dropped. Molecules are rebuilt
    /// from the surviving bonds and compared against the stored records. Every anomaly is
    /// logged with `warn!` and counted in the returned [`LoadReport`]; loading never fails.
    pub fn restore(&self) -> (MolecularSystem, LoadReport) {
        let mut system = MolecularSystem::new();
        let mut report = LoadReport::default();

        for record in &self.atoms {
            if report.id_map.contains_key(&record.id) {
                warn!(id = record.id, "Dropping atom record with duplicate id.");
                report.dropped_atoms += 1;
                continue;
            }
            let Ok(data) = element::lookup(&record.element) else {
                warn!(id = record.id, element = %record.element, "Dropping atom record with unknown element.");
                report.dropped_atoms += 1;
                continue;
            };
            let mut atom = Atom::from_element(data, Point3::from(record.position));
            atom.velocity = Vector3::from(record.velocity);
            atom.mass = record.mass;
            atom.charge = record.charge;
            atom.covalent_radius = record.covalent_radius;
            atom.vdw_radius = record.vdw_radius;
            atom.electronegativity = record.electronegativity;
            atom.lennard_jones = LennardJonesParams {
                epsilon: record.lj_epsilon,
                sigma: record.lj_sigma,
            };
            atom.morse = MorseParams {
                well_depth: record.morse_well_depth,
                width: record.morse_width,
                equilibrium: record.morse_equilibrium,
            };
            atom.max_bonds = record.max_bonds;
            atom.temperature = record.temperature;
            atom.fixed = record.fixed;
            atom.color = record.color;

            let id = system.add_atom(atom);
            report.id_map.insert(record.id, id);
            report.atoms_loaded += 1;
        }

        for record in &self.bonds {
            let endpoints = (
                report.id_map.get(&record.atom1).copied(),
                report.id_map.get(&record.atom2).copied(),
            );
            let (Some(a), Some(b)) = endpoints else {
                warn!(
                    bond = record.id,
                    atom1 = record.atom1,
                    atom2 = record.atom2,
                    "Dropping bond with a dangling atom reference."
                );
                report.dropped_bonds += 1;
                continue;
            };
            match system.form_bond(a, b, record.bond_type) {
                Ok(_) => report.bonds_loaded += 1,
                Err(e) => {
                    warn!(bond = record.id, error = %e, "Dropping bond that violates topology.");
                    report.dropped_bonds += 1;
                }
            }
        }

        for record in &self.molecules {
            let members: BTreeSet<AtomId> = record
                .atoms
                .iter()
                .filter_map(|raw| report.id_map.get(raw).copied())
                .collect();
            let dangling = record.atoms.len() - members.len();
            let owners: BTreeSet<_> = members.iter().map(|&id| system.molecule_of(id)).collect();
            let consistent = dangling == 0
                && owners.len() == 1
                && owners.iter().next().copied().flatten().is_some_and(|m| {
                    system
                        .molecule(m)
                        .is_some_and(|mol| mol.atom_count() == members.len())
                });
            if !consistent {
                warn!(
                    molecule = record.id,
                    dangling,
                    "Molecule record does not match bond connectivity; rebuilt from bonds."
                );
                report.mismatched_molecules += 1;
            }
        }

        system.refresh_bond_lengths();
        system.refresh_all_molecule_properties();
        debug!(
            atoms = report.atoms_loaded,
            bonds = report.bonds_loaded,
            molecules = system.molecule_count(),
            "Snapshot restored."
        );
        (system, report)
    }
}

/// Serializes `value` as pretty-printed JSON into the file at `path`.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), SnapshotError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

/// Deserializes a JSON value from the file at `path`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SnapshotError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::bond::BondType;

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn water_and_ion() -> MolecularSystem {
        let mut system = MolecularSystem::new();
        let o = system.add_atom(Atom::new("O", Point3::new(0.0, 0.0, 0.0)).unwrap().with_charge(-0.8));
        let h1 = system.add_atom(Atom::new("H", Point3::new(0.96, 0.0, 0.0)).unwrap().with_charge(0.4));
        let h2 = system.add_atom(Atom::new("H", Point3::new(-0.24, 0.93, 0.0)).unwrap().with_charge(0.4));
        let na = system.add_atom(
            Atom::new("Na", Point3::new(5.0, 5.0, 5.0))
                .unwrap()
                .with_velocity(Vector3::new(0.1, -0.2, 0.3)),
        );
        system.set_fixed(na, true).unwrap();
        system.form_bond(o, h1, BondType::Single).unwrap();
        system.form_bond(o, h2, BondType::Single).unwrap();
        system
    }

    #[test]
    fn capture_records_every_entity() {
        let system = water_and_ion();
        let snapshot = SystemSnapshot::capture(&system);
        assert_eq!(snapshot.atoms.len(), 4);
        assert_eq!(snapshot.bonds.len(), 2);
        assert_eq!(snapshot.molecules.len(), 1);
        assert_eq!(snapshot.molecules[0].formula, "H2O");
        assert_eq!(snapshot.molecules[0].atoms.len(), 3);
    }

    #[test]
    fn restore_reproduces_topology_and_state() {
        let system = water_and_ion();
        let snapshot = SystemSnapshot::capture(&system);
        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: SystemSnapshot = serde_json::from_str(&json).unwrap();
        let (restored, report) = decoded.restore();

        assert!(report.is_clean());
        assert_eq!(restored.atom_count(), 4);
        assert_eq!(restored.bond_count(), 2);
        assert_eq!(restored.molecule_count(), 1);
        assert!(restored.consistency_violations().is_empty());

        for original in &snapshot.atoms {
            let id = report.id_map[&original.id];
            let atom = restored.atom(id).unwrap();
            assert_eq!(atom.element, original.element);
            assert_eq!(atom.bond_count(), original.bond_count);
            assert_eq!(atom.fixed, original.fixed);
            assert!(f64_approx_equal(atom.charge, original.charge));
            assert!(f64_approx_equal(atom.position.x, original.position[0]));
        }
        let (_, molecule) = restored.molecules_iter().next().unwrap();
        assert_eq!(molecule.formula(), "H2O");
        assert_eq!(molecule.properties().name, Some("water"));
    }

    #[test]
    fn restore_drops_dangling_bonds_and_unknown_elements() {
        let system = water_and_ion();
        let mut snapshot = SystemSnapshot::capture(&system);
        snapshot.atoms[3].element = "Xx".to_string();
        snapshot.bonds.push(BondRecord {
            id: 999,
            atom1: snapshot.atoms[0].id,
            atom2: 123_456,
            bond_type: BondType::Single,
            length: 1.0,
        });
        snapshot.molecules[0].atoms.push(777);

        let (restored, report) = snapshot.restore();
        assert_eq!(report.dropped_atoms, 1);
        assert_eq!(report.dropped_bonds, 1);
        assert_eq!(report.mismatched_molecules, 1);
        assert_eq!(restored.atom_count(), 3);
        assert_eq!(restored.bond_count(), 2);
        assert!(restored.consistency_violations().is_empty());
    }

    #[test]
    fn restore_drops_bonds_beyond_valence() {
        let system = water_and_ion();
        let mut snapshot = SystemSnapshot::capture(&system);
        let (h1, h2) = (snapshot.atoms[1].id, snapshot.atoms[2].id);
        snapshot.bonds.push(BondRecord {
            id: 1000,
            atom1: h1,
            atom2: h2,
            bond_type: BondType::Single,
            length: 1.5,
        });
        let (restored, report) = snapshot.restore();
        assert_eq!(report.dropped_bonds, 1);
        assert_eq!(restored.bond_count(), 2);
    }

    #[test]
    fn json_file_helpers_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let snapshot = SystemSnapshot::capture(&water_and_ion());
        write_json(&snapshot, &path).unwrap();
        let loaded: SystemSnapshot = read_json(&path).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn read_json_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<SystemSnapshot, _> = read_json(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(SnapshotError::Io(_))));
    }
}
