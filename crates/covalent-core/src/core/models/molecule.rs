use super::atom::Atom;
use super::bond::Bond;
use super::element::DEFAULT_COLOR;
use super::ids::{AtomId, BondId};
use nalgebra::{Matrix3, Point3, Vector3};
use phf::{Map, phf_map};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::f64::consts::PI;

const FILLED_SHELL_BONUS: f64 = 10.0;
const BOND_STRENGTH_WEIGHT: f64 = 5.0;
const UNFILLED_VALENCE_WEIGHT: f64 = 2.0;
const CHARGE_REACTIVITY_WEIGHT: f64 = 3.0;
const POLARIZABILITY_SCALE: f64 = 0.1;
const AROMATIC_RING_SIZE: usize = 6;

static COMMON_NAMES: Map<&'static str, &'static str> = phf_map! {
    "H2O" => "water",
    "CH4" => "methane",
    "C6H6" => "benzene",
    "H3N" => "ammonia",
    "CO2" => "carbon dioxide",
    "C2H6" => "ethane",
    "C2H4" => "ethylene",
    "C2H2" => "acetylene",
    "CH4O" => "methanol",
    "C2H6O" => "ethanol",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hybridization {
    Sp,
    Sp2,
    Sp3,
}

/// Composite properties derived from the atoms and bonds of a molecule.
///
/// These values are caches: they are recomputed by the owning system on every structural change
/// and after positions move, and are never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MolecularProperties {
    /// Formula with carbon first, hydrogen second, and the remaining elements alphabetically.
    pub formula: String,
    pub name: Option<&'static str>,
    pub mass: f64,
    pub charge: f64,
    pub center_of_mass: Point3<f64>,
    /// Inertia tensor about the center of mass.
    pub inertia_tensor: Matrix3<f64>,
    /// Charge-weighted displacement from the center of mass.
    pub dipole_moment: Vector3<f64>,
    pub stability: f64,
    pub reactivity: f64,
    pub average_electronegativity: f64,
    pub polarizability: f64,
    pub hybridization: BTreeMap<AtomId, Hybridization>,
    pub aromatic: bool,
    pub chiral: bool,
    pub color: u32,
}

impl Default for MolecularProperties {
    fn default() -> Self {
        Self {
            formula: "Unknown".to_string(),
            name: None,
            mass: 0.0,
            charge: 0.0,
            center_of_mass: Point3::origin(),
            inertia_tensor: Matrix3::zeros(),
            dipole_moment: Vector3::zeros(),
            stability: 0.0,
            reactivity: 0.0,
            average_electronegativity: 0.0,
            polarizability: 0.0,
            hybridization: BTreeMap::new(),
            aromatic: false,
            chiral: false,
            color: DEFAULT_COLOR,
        }
    }
}

impl MolecularProperties {
    /// Derives every property from the member atoms and bonds.
    ///
    /// # Arguments
    ///
    /// * `atoms` - The member atoms with their ids.
    /// * `bonds` - The member bonds; both endpoints are expected among `atoms`.
    pub fn derive(atoms: &[(AtomId, &Atom)], bonds: &[&Bond]) -> Self {
        if atoms.is_empty() {
            return Self::default();
        }

        let formula = formula(atoms.iter().map(|(_, a)| a.element.as_str()));
        let name = COMMON_NAMES.get(formula.as_str()).copied();
        let mass: f64 = atoms.iter().map(|(_, a)| a.mass).sum();
        let charge: f64 = atoms.iter().map(|(_, a)| a.charge).sum();

        let center_of_mass = if mass > 0.0 {
            let weighted = atoms
                .iter()
                .fold(Vector3::<f64>::zeros(), |acc, (_, a)| acc + a.position.coords * a.mass);
            Point3::from(weighted / mass)
        } else {
            Point3::origin()
        };

        let mut inertia_tensor = Matrix3::<f64>::zeros();
        let mut dipole_moment = Vector3::<f64>::zeros();
        for (_, atom) in atoms {
            let r = atom.position - center_of_mass;
            inertia_tensor +=
                (Matrix3::identity() * r.norm_squared() - r * r.transpose()) * atom.mass;
            dipole_moment += r * atom.charge;
        }

        let element_of: HashMap<AtomId, &str> = atoms
            .iter()
            .map(|(id, a)| (*id, a.element.as_str()))
            .collect();

        let hybridization = atoms
            .iter()
            .filter(|(_, a)| a.element == "C")
            .map(|(id, a)| {
                let h = match a.bond_count() {
                    2 => Hybridization::Sp,
                    3 => Hybridization::Sp2,
                    _ => Hybridization::Sp3,
                };
                (*id, h)
            })
            .collect();

        let chiral = atoms.iter().any(|(_, a)| {
            if a.element != "C" || a.bond_count() != 4 {
                return false;
            }
            let distinct: BTreeSet<&str> = a
                .bonded_atoms()
                .iter()
                .filter_map(|n| element_of.get(n).copied())
                .collect();
            distinct.len() == 4
        });

        Self {
            formula,
            name,
            mass,
            charge,
            center_of_mass,
            inertia_tensor,
            dipole_moment,
            stability: stability(atoms, bonds),
            reactivity: reactivity(atoms),
            average_electronegativity: atoms.iter().map(|(_, a)| a.electronegativity).sum::<f64>()
                / atoms.len() as f64,
            polarizability: atoms
                .iter()
                .map(|(_, a)| 4.0 / 3.0 * PI * a.vdw_radius.powi(3) * POLARIZABILITY_SCALE)
                .sum(),
            hybridization,
            aromatic: has_carbon_ring(atoms, &element_of),
            chiral,
            color: average_color(atoms.iter().map(|(_, a)| a.color)),
        }
    }

    #[inline]
    pub fn dipole_magnitude(&self) -> f64 {
        self.dipole_moment.norm()
    }
}

/// A connected set of bonded atoms.
///
/// Membership is managed by [`MolecularSystem`](super::system::MolecularSystem); a molecule
/// always holds at least two atoms and its bonds always connect all of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    pub(crate) atoms: BTreeSet<AtomId>,
    pub(crate) bonds: BTreeSet<BondId>,
    pub(crate) properties: MolecularProperties,
}

impl Molecule {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn atoms(&self) -> impl Iterator<Item = AtomId> + '_ {
        self.atoms.iter().copied()
    }

    pub fn bonds(&self) -> impl Iterator<Item = BondId> + '_ {
        self.bonds.iter().copied()
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    #[inline]
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    #[inline]
    pub fn contains_atom(&self, atom_id: AtomId) -> bool {
        self.atoms.contains(&atom_id)
    }

    #[inline]
    pub fn contains_bond(&self, bond_id: BondId) -> bool {
        self.bonds.contains(&bond_id)
    }

    #[inline]
    pub fn properties(&self) -> &MolecularProperties {
        &self.properties
    }

    #[inline]
    pub fn formula(&self) -> &str {
        &self.properties.formula
    }
}

/// Builds a formula string from element symbols: carbon first, hydrogen second, then the
/// remaining elements alphabetically, with counts appended when greater than one.
pub fn formula<'a>(elements: impl IntoIterator<Item = &'a str>) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for element in elements {
        *counts.entry(element).or_insert(0) += 1;
    }
    if counts.is_empty() {
        return "Unknown".to_string();
    }

    let mut ordered: Vec<(&str, usize)> = Vec::with_capacity(counts.len());
    for leading in ["C", "H"] {
        if let Some(count) = counts.remove(leading) {
            ordered.push((leading, count));
        }
    }
    ordered.extend(counts);

    ordered
        .into_iter()
        .map(|(element, count)| {
            if count > 1 {
                format!("{element}{count}")
            } else {
                element.to_string()
            }
        })
        .collect()
}

fn stability(atoms: &[(AtomId, &Atom)], bonds: &[&Bond]) -> f64 {
    let shell_score: f64 = atoms
        .iter()
        .map(|(_, atom)| {
            let ideal = if atom.element == "H" { 2 } else { 8 };
            let valence = atom.valence_electrons();
            if valence == ideal {
                FILLED_SHELL_BONUS
            } else {
                -((valence - ideal).abs() as f64)
            }
        })
        .sum();
    let bond_score: f64 = bonds.iter().map(|b| b.strength * BOND_STRENGTH_WEIGHT).sum();
    (shell_score + bond_score).max(0.0)
}

fn reactivity(atoms: &[(AtomId, &Atom)]) -> f64 {
    atoms
        .iter()
        .map(|(_, atom)| {
            let unfilled = (atom.max_bonds as usize).saturating_sub(atom.bond_count()) as f64;
            unfilled * UNFILLED_VALENCE_WEIGHT + atom.charge.abs() * CHARGE_REACTIVITY_WEIGHT
        })
        .sum()
}

fn average_color(colors: impl Iterator<Item = u32>) -> u32 {
    let mut sums = [0u64; 3];
    let mut n = 0u64;
    for color in colors {
        sums[0] += ((color >> 16) & 0xff) as u64;
        sums[1] += ((color >> 8) & 0xff) as u64;
        sums[2] += (color & 0xff) as u64;
        n += 1;
    }
    if n == 0 {
        return DEFAULT_COLOR;
    }
    (((sums[0] / n) as u32) << 16) | (((sums[1] / n) as u32) << 8) | (sums[2] / n) as u32
}

/// Detects a simple cycle of exactly six carbons joined by carbon-carbon bonds.
fn has_carbon_ring(atoms: &[(AtomId, &Atom)], element_of: &HashMap<AtomId, &str>) -> bool {
    let carbons: Vec<(AtomId, &Atom)> = atoms
        .iter()
        .filter(|(_, a)| a.element == "C")
        .map(|(id, a)| (*id, *a))
        .collect();
    if carbons.len() < AROMATIC_RING_SIZE {
        return false;
    }

    let carbon_neighbors: HashMap<AtomId, Vec<AtomId>> = carbons
        .iter()
        .map(|(id, a)| {
            let neighbors = a
                .bonded_atoms()
                .iter()
                .copied()
                .filter(|n| element_of.get(n) == Some(&"C"))
                .collect();
            (*id, neighbors)
        })
        .collect();

    fn search(
        start: AtomId,
        current: AtomId,
        path: &mut Vec<AtomId>,
        neighbors: &HashMap<AtomId, Vec<AtomId>>,
    ) -> bool {
        let Some(next) = neighbors.get(&current) else {
            return false;
        };
        for &n in next {
            if n == start && path.len() == AROMATIC_RING_SIZE {
                return true;
            }
            // Only extend through ids greater than the start so each ring is found from its
            // smallest member.
            if path.len() < AROMATIC_RING_SIZE && n > start && !path.contains(&n) {
                path.push(n);
                if search(start, n, path, neighbors) {
                    return true;
                }
                path.pop();
            }
        }
        false
    }

    carbons.iter().any(|(id, _)| {
        let mut path = vec![*id];
        search(*id, *id, &mut path, &carbon_neighbors)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::bond::BondType;
    use slotmap::KeyData;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    fn atom(element: &str, x: f64, y: f64, z: f64) -> Atom {
        Atom::new(element, Point3::new(x, y, z)).unwrap()
    }

    fn link(atoms: &mut [(AtomId, Atom)], i: usize, j: usize) -> Bond {
        let (id_i, id_j) = (atoms[i].0, atoms[j].0);
        atoms[i].1.bonded.push(id_j);
        atoms[j].1.bonded.push(id_i);
        let delta = atoms[i].1.electronegativity - atoms[j].1.electronegativity;
        Bond::new(id_i, id_j, BondType::Single, delta, 1.0)
    }

    fn as_refs(atoms: &[(AtomId, Atom)]) -> Vec<(AtomId, &Atom)> {
        atoms.iter().map(|(id, a)| (*id, a)).collect()
    }

    #[test]
    fn formula_orders_carbon_then_hydrogen_then_alphabetical() {
        assert_eq!(formula(["O", "H", "H"]), "H2O");
        assert_eq!(formula(["H", "O"]), "HO");
        assert_eq!(formula(["O", "C", "H", "H", "H", "H"]), "CH4O");
        assert_eq!(formula(["Cl", "Na"]), "ClNa");
        assert_eq!(formula(["N", "H", "H", "H"]), "H3N");
        assert_eq!(formula(std::iter::empty()), "Unknown");
    }

    #[test]
    fn derive_on_empty_input_returns_defaults() {
        let props = MolecularProperties::derive(&[], &[]);
        assert_eq!(props.formula, "Unknown");
        assert_eq!(props.mass, 0.0);
    }

    #[test]
    fn derive_computes_mass_charge_and_center_of_mass() {
        let mut atoms = vec![
            (dummy_atom_id(1), atom("H", 0.0, 0.0, 0.0)),
            (dummy_atom_id(2), atom("O", 1.0, 0.0, 0.0)),
        ];
        let bond = link(&mut atoms, 0, 1);
        let props = MolecularProperties::derive(&as_refs(&atoms), &[&bond]);

        assert_eq!(props.formula, "HO");
        assert!(f64_approx_equal(props.mass, 17.007));
        assert!(f64_approx_equal(props.charge, 0.0));
        assert!(f64_approx_equal(props.center_of_mass.x, 15.999 / 17.007));
        assert_eq!(props.name, None);
    }

    #[test]
    fn derive_names_water_and_computes_dipole() {
        let mut atoms = vec![
            (dummy_atom_id(1), atom("O", 0.0, 0.0, 0.0).with_charge(-0.8)),
            (dummy_atom_id(2), atom("H", 0.8, 0.6, 0.0).with_charge(0.4)),
            (dummy_atom_id(3), atom("H", -0.8, 0.6, 0.0).with_charge(0.4)),
        ];
        let b1 = link(&mut atoms, 0, 1);
        let b2 = link(&mut atoms, 0, 2);
        let props = MolecularProperties::derive(&as_refs(&atoms), &[&b1, &b2]);

        assert_eq!(props.formula, "H2O");
        assert_eq!(props.name, Some("water"));
        assert!(f64_approx_equal(props.dipole_moment.x, 0.0));
        assert!(props.dipole_moment.y > 0.0);
        assert!(f64_approx_equal(props.charge, 0.0));
    }

    #[test]
    fn inertia_tensor_of_linear_pair_has_no_axial_component() {
        let mut atoms = vec![
            (dummy_atom_id(1), atom("He", -1.0, 0.0, 0.0)),
            (dummy_atom_id(2), atom("He", 1.0, 0.0, 0.0)),
        ];
        let bond = link(&mut atoms, 0, 1);
        let props = MolecularProperties::derive(&as_refs(&atoms), &[&bond]);
        let expected = 2.0 * 4.0026;
        assert!(f64_approx_equal(props.inertia_tensor[(0, 0)], 0.0));
        assert!(f64_approx_equal(props.inertia_tensor[(1, 1)], expected));
        assert!(f64_approx_equal(props.inertia_tensor[(2, 2)], expected));
    }

    #[test]
    fn stability_counts_bonds_and_is_never_negative() {
        let mut atoms = vec![
            (dummy_atom_id(1), atom("H", 0.0, 0.0, 0.0)),
            (dummy_atom_id(2), atom("O", 1.0, 0.0, 0.0)),
        ];
        let bond = link(&mut atoms, 0, 1);
        let props = MolecularProperties::derive(&as_refs(&atoms), &[&bond]);
        // H: 1 vs 2 -> -1, O: 6 vs 8 -> -2, bond: 5 * 1.124
        assert!(f64_approx_equal(props.stability, -3.0 + 5.0 * bond.strength));

        let lone = vec![(dummy_atom_id(3), atom("N", 0.0, 0.0, 0.0))];
        let props = MolecularProperties::derive(&as_refs(&lone), &[]);
        assert_eq!(props.stability, 0.0);
    }

    #[test]
    fn reactivity_counts_unfilled_valence_and_charge() {
        let mut atoms = vec![
            (dummy_atom_id(1), atom("H", 0.0, 0.0, 0.0)),
            (dummy_atom_id(2), atom("O", 1.0, 0.0, 0.0).with_charge(-1.0)),
        ];
        let bond = link(&mut atoms, 0, 1);
        let props = MolecularProperties::derive(&as_refs(&atoms), &[&bond]);
        // H saturated; O has one free slot (2) and |charge| 1 (3).
        assert!(f64_approx_equal(props.reactivity, 5.0));
    }

    #[test]
    fn benzene_ring_is_aromatic_and_carbons_are_sp2() {
        let mut atoms: Vec<(AtomId, Atom)> = (0..6)
            .map(|i| {
                let angle = i as f64 * PI / 3.0;
                (
                    dummy_atom_id(i as u64 + 1),
                    atom("C", 1.4 * angle.cos(), 1.4 * angle.sin(), 0.0),
                )
            })
            .collect();
        for i in 0..6 {
            atoms.push((
                dummy_atom_id(i as u64 + 10),
                atom("H", 0.0, 0.0, i as f64),
            ));
        }
        let mut bonds = Vec::new();
        for i in 0..6 {
            bonds.push(link(&mut atoms, i, (i + 1) % 6));
            bonds.push(link(&mut atoms, i, i + 6));
        }
        let bond_refs: Vec<&Bond> = bonds.iter().collect();
        let props = MolecularProperties::derive(&as_refs(&atoms), &bond_refs);

        assert_eq!(props.formula, "C6H6");
        assert_eq!(props.name, Some("benzene"));
        assert!(props.aromatic);
        assert!(props.hybridization.values().all(|h| *h == Hybridization::Sp2));
        assert!(!props.chiral);
    }

    #[test]
    fn open_chain_of_six_carbons_is_not_aromatic() {
        let mut atoms: Vec<(AtomId, Atom)> = (0..6)
            .map(|i| (dummy_atom_id(i as u64 + 1), atom("C", i as f64, 0.0, 0.0)))
            .collect();
        let bonds: Vec<Bond> = (0..5).map(|i| link(&mut atoms, i, i + 1)).collect();
        let bond_refs: Vec<&Bond> = bonds.iter().collect();
        let props = MolecularProperties::derive(&as_refs(&atoms), &bond_refs);
        assert!(!props.aromatic);
    }

    #[test]
    fn carbon_with_four_distinct_substituents_is_chiral() {
        let mut atoms = vec![
            (dummy_atom_id(1), atom("C", 0.0, 0.0, 0.0)),
            (dummy_atom_id(2), atom("H", 1.0, 0.0, 0.0)),
            (dummy_atom_id(3), atom("F", -1.0, 0.0, 0.0)),
            (dummy_atom_id(4), atom("Cl", 0.0, 1.0, 0.0)),
            (dummy_atom_id(5), atom("O", 0.0, -1.0, 0.0)),
        ];
        let bonds: Vec<Bond> = (1..5).map(|i| link(&mut atoms, 0, i)).collect();
        let bond_refs: Vec<&Bond> = bonds.iter().collect();
        let props = MolecularProperties::derive(&as_refs(&atoms), &bond_refs);
        assert!(props.chiral);
        assert_eq!(
            props.hybridization.get(&dummy_atom_id(1)),
            Some(&Hybridization::Sp3)
        );
    }

    #[test]
    fn average_color_blends_channels() {
        assert_eq!(average_color([0xff0000, 0x0000ff].into_iter()), 0x7f007f);
        assert_eq!(average_color(std::iter::empty()), DEFAULT_COLOR);
    }
}
