use super::atom::Atom;
use super::bond::{Bond, BondType, normalize_pair};
use super::graph::{self, MoleculeChange, SplitOutcome};
use super::ids::{AtomId, BondId, MoleculeId};
use super::molecule::{MolecularProperties, Molecule};
use slotmap::SlotMap;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TopologyError {
    #[error("Atom not found: {0:?}")]
    AtomNotFound(AtomId),
    #[error("Bond not found: {0:?}")]
    BondNotFound(BondId),
    #[error("Molecule not found: {0:?}")]
    MoleculeNotFound(MoleculeId),
    #[error("Cannot bond atom {0:?} to itself")]
    SelfBond(AtomId),
    #[error("Atoms {0:?} and {1:?} are already bonded")]
    AlreadyBonded(AtomId, AtomId),
    #[error("Atoms {0:?} and {1:?} are not bonded")]
    NotBonded(AtomId, AtomId),
    #[error("Atom {0:?} has reached its maximum bond count")]
    ValenceSaturated(AtomId),
    #[error("Bonded atom {0:?} is not part of any molecule")]
    Unaffiliated(AtomId),
    #[error("Atom {atom:?} already has {bonds} bonds, more than the requested maximum of {max_bonds}")]
    MaxBondsBelowBondCount {
        atom: AtomId,
        max_bonds: u8,
        bonds: usize,
    },
}

/// A bond that was removed, together with its effect on the molecule partition.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenBond {
    pub id: BondId,
    pub bond: Bond,
    pub outcome: SplitOutcome,
}

/// An atom that was removed from the system and the bonds that went with it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedAtom {
    pub atom: Atom,
    pub broken_bonds: Vec<BrokenBond>,
}

/// Arena that owns every atom, bond, and molecule of a simulation.
///
/// All structural mutations go through this type so that three invariants always hold:
/// an atom's bond count equals the number of bonds that reference it and never exceeds its
/// maximum, every atom belongs to at most one molecule, and every molecule is exactly one
/// connected component of the bond graph with at least two atoms.
#[derive(Debug, Clone, Default)]
pub struct MolecularSystem {
    /// Primary storage for atoms.
    atoms: SlotMap<AtomId, Atom>,
    /// Primary storage for bonds.
    bonds: SlotMap<BondId, Bond>,
    /// Primary storage for molecules; each one lists its member atoms and bonds.
    molecules: SlotMap<MoleculeId, Molecule>,
    /// Lookup from a normalized atom pair to the bond joining it.
    bond_index: HashMap<(AtomId, AtomId), BondId>,
}

impl MolecularSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves an immutable reference to an atom by its ID.
    ///
    /// # Arguments
    ///
    /// * `id` - The atom ID to look up.
    ///
    /// # Return
    ///
    /// Returns `Some(&Atom)` if the atom exists, otherwise `None`.
    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    /// Retrieves a mutable reference to an atom by its ID.
    ///
    /// Bond lists, molecule membership, and the maximum bond count cannot be changed through
    /// this reference.
    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atoms.iter()
    }

    pub fn atoms_iter_mut(&mut self) -> impl Iterator<Item = (AtomId, &mut Atom)> {
        self.atoms.iter_mut()
    }

    pub fn atom_ids(&self) -> Vec<AtomId> {
        self.atoms.keys().collect()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond(&self, id: BondId) -> Option<&Bond> {
        self.bonds.get(id)
    }

    pub fn bonds_iter(&self) -> impl Iterator<Item = (BondId, &Bond)> {
        self.bonds.iter()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn molecule(&self, id: MoleculeId) -> Option<&Molecule> {
        self.molecules.get(id)
    }

    pub fn molecules_iter(&self) -> impl Iterator<Item = (MoleculeId, &Molecule)> {
        self.molecules.iter()
    }

    pub fn molecule_count(&self) -> usize {
        self.molecules.len()
    }

    /// Returns the molecule an atom belongs to, if any.
    pub fn molecule_of(&self, atom_id: AtomId) -> Option<MoleculeId> {
        self.atoms.get(atom_id).and_then(|a| a.molecule)
    }

    /// Finds the bond between two atoms, in either order.
    pub fn bond_between(&self, a: AtomId, b: AtomId) -> Option<BondId> {
        self.bond_index.get(&normalize_pair(a, b)).copied()
    }

    /// Adds an atom to the system. Any bond or molecule references it carries are discarded.
    ///
    /// # Return
    ///
    /// The stable ID assigned to the new atom.
    pub fn add_atom(&mut self, mut atom: Atom) -> AtomId {
        atom.bonded.clear();
        atom.molecule = None;
        self.atoms.insert(atom)
    }

    /// Removes an atom, breaking every bond incident to it first.
    ///
    /// Each broken bond re-evaluates the molecule it belonged to, so removing a bridging atom
    /// splits its molecule and removing the last partner of an atom releases it.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::AtomNotFound`] if the atom does not exist; nothing is mutated.
    pub fn remove_atom(&mut self, id: AtomId) -> Result<RemovedAtom, TopologyError> {
        let partners = self
            .atoms
            .get(id)
            .ok_or(TopologyError::AtomNotFound(id))?
            .bonded
            .clone();

        let mut broken_bonds = Vec::with_capacity(partners.len());
        for partner in partners {
            if let Some(bond_id) = self.bond_between(id, partner) {
                broken_bonds.push(self.break_bond(bond_id)?);
            }
        }

        let atom = self
            .atoms
            .remove(id)
            .ok_or(TopologyError::AtomNotFound(id))?;
        Ok(RemovedAtom { atom, broken_bonds })
    }

    /// Checks whether a new bond between `a` and `b` is allowed.
    ///
    /// # Errors
    ///
    /// Returns the first violated precondition: both atoms must exist, be distinct, not already
    /// be bonded, and both have free valence.
    pub fn can_bond(&self, a: AtomId, b: AtomId) -> Result<(), TopologyError> {
        if a == b {
            return Err(TopologyError::SelfBond(a));
        }
        let atom_a = self.atoms.get(a).ok_or(TopologyError::AtomNotFound(a))?;
        let atom_b = self.atoms.get(b).ok_or(TopologyError::AtomNotFound(b))?;
        if self.bond_index.contains_key(&normalize_pair(a, b)) {
            return Err(TopologyError::AlreadyBonded(a, b));
        }
        if !atom_a.has_free_valence() {
            return Err(TopologyError::ValenceSaturated(a));
        }
        if !atom_b.has_free_valence() {
            return Err(TopologyError::ValenceSaturated(b));
        }
        Ok(())
    }

    /// Returns `true` if bonding `a` and `b` would create a brand-new molecule.
    pub fn would_create_molecule(&self, a: AtomId, b: AtomId) -> bool {
        self.molecule_of(a).is_none() && self.molecule_of(b).is_none()
    }

    /// Forms a bond and updates the molecule partition.
    ///
    /// # Arguments
    ///
    /// * `a`, `b` - The endpoints, in any order.
    /// * `bond_type` - The bond type; strength and energy follow from it and the
    ///   electronegativity difference of the endpoints.
    ///
    /// # Return
    ///
    /// The new bond ID and a description of how the molecule partition changed.
    ///
    /// # Errors
    ///
    /// See [`MolecularSystem::can_bond`]. On error nothing is mutated.
    pub fn form_bond(
        &mut self,
        a: AtomId,
        b: AtomId,
        bond_type: BondType,
    ) -> Result<(BondId, MoleculeChange), TopologyError> {
        self.can_bond(a, b)?;

        let (atom_a, atom_b) = (&self.atoms[a], &self.atoms[b]);
        let bond = Bond::new(
            a,
            b,
            bond_type,
            atom_a.electronegativity - atom_b.electronegativity,
            atom_a.distance_to(atom_b),
        );
        let bond_id = self.bonds.insert(bond);
        self.bond_index.insert(bond.key(), bond_id);
        self.atoms[a].bonded.push(b);
        self.atoms[b].bonded.push(a);

        let change = self.attach_bond(a, b, bond_id);
        self.refresh_molecule_properties(change.molecule());
        Ok((bond_id, change))
    }

    fn attach_bond(&mut self, a: AtomId, b: AtomId, bond_id: BondId) -> MoleculeChange {
        match (self.atoms[a].molecule, self.atoms[b].molecule) {
            (None, None) => {
                let mut molecule = Molecule::new();
                molecule.atoms.extend([a, b]);
                molecule.bonds.insert(bond_id);
                let molecule_id = self.molecules.insert(molecule);
                self.atoms[a].molecule = Some(molecule_id);
                self.atoms[b].molecule = Some(molecule_id);
                MoleculeChange::Created {
                    molecule: molecule_id,
                }
            }
            (Some(molecule_id), None) | (None, Some(molecule_id)) => {
                let newcomer = if self.atoms[a].molecule.is_none() { a } else { b };
                let molecule = &mut self.molecules[molecule_id];
                molecule.atoms.insert(newcomer);
                molecule.bonds.insert(bond_id);
                self.atoms[newcomer].molecule = Some(molecule_id);
                MoleculeChange::Extended {
                    molecule: molecule_id,
                    atom: newcomer,
                }
            }
            (Some(ma), Some(mb)) if ma == mb => {
                self.molecules[ma].bonds.insert(bond_id);
                MoleculeChange::RingClosed { molecule: ma }
            }
            (Some(ma), Some(mb)) => {
                let (survivor, absorbed) = graph::merge_survivor(
                    (ma, self.molecules[ma].atom_count()),
                    (mb, self.molecules[mb].atom_count()),
                );
                let absorbed_molecule = self.molecules.remove(absorbed).unwrap_or_default();
                for &atom_id in &absorbed_molecule.atoms {
                    if let Some(atom) = self.atoms.get_mut(atom_id) {
                        atom.molecule = Some(survivor);
                    }
                }
                let target = &mut self.molecules[survivor];
                target.atoms.extend(absorbed_molecule.atoms);
                target.bonds.extend(absorbed_molecule.bonds);
                target.bonds.insert(bond_id);
                MoleculeChange::Merged { survivor, absorbed }
            }
        }
    }

    /// Breaks a bond and re-evaluates the connectivity of the molecule that held it.
    ///
    /// Only the atoms of the touched molecule are traversed. Components with a single atom
    /// release that atom; if exactly one multi-atom component remains it keeps the molecule
    /// ID, otherwise each multi-atom component becomes a new molecule.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::BondNotFound`] if the bond does not exist; nothing is mutated.
    pub fn break_bond(&mut self, bond_id: BondId) -> Result<BrokenBond, TopologyError> {
        let bond = *self
            .bonds
            .get(bond_id)
            .ok_or(TopologyError::BondNotFound(bond_id))?;
        let (a, b) = bond.key();
        let molecule_id = self
            .molecule_of(a)
            .ok_or(TopologyError::Unaffiliated(a))?;

        self.bonds.remove(bond_id);
        self.bond_index.remove(&bond.key());
        for (owner, partner) in [(a, b), (b, a)] {
            if let Some(atom) = self.atoms.get_mut(owner) {
                atom.bonded.retain(|&n| n != partner);
            }
        }

        let outcome = self.split_molecule(molecule_id, bond_id);
        Ok(BrokenBond {
            id: bond_id,
            bond,
            outcome,
        })
    }

    /// Breaks the bond between two atoms.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NotBonded`] if no bond joins them.
    pub fn break_bond_between(&mut self, a: AtomId, b: AtomId) -> Result<BrokenBond, TopologyError> {
        let bond_id = self
            .bond_between(a, b)
            .ok_or(TopologyError::NotBonded(a, b))?;
        self.break_bond(bond_id)
    }

    fn split_molecule(&mut self, molecule_id: MoleculeId, removed_bond: BondId) -> SplitOutcome {
        let members = match self.molecules.get_mut(molecule_id) {
            Some(molecule) => {
                molecule.bonds.remove(&removed_bond);
                molecule.atoms.clone()
            }
            None => BTreeSet::new(),
        };

        let atoms = &self.atoms;
        let components = graph::connected_components(&members, |id| {
            atoms.get(id).map(|a| a.bonded.as_slice()).unwrap_or(&[])
        });

        if components.len() <= 1 {
            self.refresh_molecule_properties(molecule_id);
            return SplitOutcome::Intact {
                molecule: molecule_id,
            };
        }

        let (fragments, singles): (Vec<_>, Vec<_>) =
            components.into_iter().partition(|c| c.len() > 1);
        let released: Vec<AtomId> = singles.into_iter().flatten().collect();
        for &atom_id in &released {
            if let Some(atom) = self.atoms.get_mut(atom_id) {
                atom.molecule = None;
            }
        }

        match fragments.len() {
            0 => {
                self.molecules.remove(molecule_id);
                SplitOutcome::Dissolved {
                    molecule: molecule_id,
                    released,
                }
            }
            1 => {
                if let Some(molecule) = self.molecules.get_mut(molecule_id) {
                    molecule.atoms.retain(|id| !released.contains(id));
                }
                self.refresh_molecule_properties(molecule_id);
                SplitOutcome::Shrunk {
                    molecule: molecule_id,
                    released,
                }
            }
            _ => {
                let original = self.molecules.remove(molecule_id).unwrap_or_default();
                let mut fragment_ids = Vec::with_capacity(fragments.len());
                for component in fragments {
                    let bonds: BTreeSet<BondId> = original
                        .bonds
                        .iter()
                        .copied()
                        .filter(|&bid| {
                            self.bonds
                                .get(bid)
                                .is_some_and(|bond| component.contains(&bond.atom1_id()))
                        })
                        .collect();
                    let mut molecule = Molecule::new();
                    molecule.atoms = component;
                    molecule.bonds = bonds;
                    let members: Vec<AtomId> = molecule.atoms.iter().copied().collect();
                    let fragment_id = self.molecules.insert(molecule);
                    for atom_id in members {
                        if let Some(atom) = self.atoms.get_mut(atom_id) {
                            atom.molecule = Some(fragment_id);
                        }
                    }
                    self.refresh_molecule_properties(fragment_id);
                    fragment_ids.push(fragment_id);
                }
                SplitOutcome::Split {
                    original: molecule_id,
                    fragments: fragment_ids,
                    released,
                }
            }
        }
    }

    /// Dissolves a molecule by breaking all of its bonds; every member becomes unaffiliated.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::MoleculeNotFound`] if the molecule does not exist.
    pub fn fragment_molecule(&mut self, id: MoleculeId) -> Result<Vec<BrokenBond>, TopologyError> {
        let bond_ids: Vec<BondId> = self
            .molecules
            .get(id)
            .ok_or(TopologyError::MoleculeNotFound(id))?
            .bonds()
            .collect();
        bond_ids
            .into_iter()
            .map(|bond_id| self.break_bond(bond_id))
            .collect()
    }

    /// Pins or releases an atom. Pinning also zeroes its velocity.
    pub fn set_fixed(&mut self, id: AtomId, fixed: bool) -> Result<(), TopologyError> {
        let atom = self
            .atoms
            .get_mut(id)
            .ok_or(TopologyError::AtomNotFound(id))?;
        atom.fixed = fixed;
        if fixed {
            atom.velocity = nalgebra::Vector3::zeros();
        }
        Ok(())
    }

    /// Changes an atom's maximum bond count.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::MaxBondsBelowBondCount`] if the atom already has more bonds
    /// than `max_bonds`; the atom is left unchanged.
    pub fn set_max_bonds(&mut self, id: AtomId, max_bonds: u8) -> Result<(), TopologyError> {
        let atom = self
            .atoms
            .get_mut(id)
            .ok_or(TopologyError::AtomNotFound(id))?;
        let bonds = atom.bond_count();
        if bonds > max_bonds as usize {
            return Err(TopologyError::MaxBondsBelowBondCount {
                atom: id,
                max_bonds,
                bonds,
            });
        }
        atom.max_bonds = max_bonds;
        Ok(())
    }

    /// Recomputes every bond's length from the current atom positions.
    pub fn refresh_bond_lengths(&mut self) {
        let atoms = &self.atoms;
        for (_, bond) in self.bonds.iter_mut() {
            if let (Some(a), Some(b)) = (atoms.get(bond.atom1_id()), atoms.get(bond.atom2_id())) {
                bond.length = a.distance_to(b);
            }
        }
    }

    /// Re-derives the cached properties of one molecule.
    pub fn refresh_molecule_properties(&mut self, id: MoleculeId) {
        let Some(molecule) = self.molecules.get(id) else {
            return;
        };
        let atoms: Vec<(AtomId, &Atom)> = molecule
            .atoms
            .iter()
            .filter_map(|&aid| self.atoms.get(aid).map(|a| (aid, a)))
            .collect();
        let bonds: Vec<&Bond> = molecule
            .bonds
            .iter()
            .filter_map(|&bid| self.bonds.get(bid))
            .collect();
        let properties = MolecularProperties::derive(&atoms, &bonds);
        if let Some(molecule) = self.molecules.get_mut(id) {
            molecule.properties = properties;
        }
    }

    /// Re-derives the cached properties of every molecule.
    pub fn refresh_all_molecule_properties(&mut self) {
        let ids: Vec<MoleculeId> = self.molecules.keys().collect();
        for id in ids {
            self.refresh_molecule_properties(id);
        }
    }

    /// Removes every atom, bond, and molecule.
    pub fn clear(&mut self) {
        self.atoms.clear();
        self.bonds.clear();
        self.molecules.clear();
        self.bond_index.clear();
    }

    /// Lists every violated structural invariant. An empty list means the system is consistent.
    pub fn consistency_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for (id, atom) in &self.atoms {
            if atom.bond_count() > atom.max_bonds as usize {
                violations.push(format!(
                    "atom {id:?} has {} bonds but allows {}",
                    atom.bond_count(),
                    atom.max_bonds
                ));
            }
            for &partner in &atom.bonded {
                match self.atoms.get(partner) {
                    Some(other) if other.bonded.contains(&id) => {}
                    Some(_) => violations.push(format!("bond {id:?}-{partner:?} is one-sided")),
                    None => violations.push(format!("atom {id:?} references missing {partner:?}")),
                }
                if self.bond_between(id, partner).is_none() {
                    violations.push(format!("no bond record for {id:?}-{partner:?}"));
                }
            }
            if let Some(molecule_id) = atom.molecule {
                if !self
                    .molecules
                    .get(molecule_id)
                    .is_some_and(|m| m.contains_atom(id))
                {
                    violations.push(format!("atom {id:?} claims molecule {molecule_id:?}"));
                }
            } else if !atom.bonded.is_empty() {
                violations.push(format!("bonded atom {id:?} has no molecule"));
            }
        }

        if self.bond_index.len() != self.bonds.len() {
            violations.push(format!(
                "bond index has {} entries for {} bonds",
                self.bond_index.len(),
                self.bonds.len()
            ));
        }
        for (id, bond) in &self.bonds {
            if self.bond_index.get(&bond.key()) != Some(&id) {
                violations.push(format!("bond {id:?} is not indexed"));
            }
            let (ma, mb) = (self.molecule_of(bond.atom1_id()), self.molecule_of(bond.atom2_id()));
            if ma.is_none() || ma != mb {
                violations.push(format!("bond {id:?} spans molecules {ma:?} and {mb:?}"));
            } else if let Some(molecule) = ma.and_then(|m| self.molecules.get(m)) {
                if !molecule.contains_bond(id) {
                    violations.push(format!("bond {id:?} missing from its molecule"));
                }
            }
        }

        let mut seen = BTreeSet::new();
        for (id, molecule) in &self.molecules {
            if molecule.atom_count() < 2 {
                violations.push(format!("molecule {id:?} has fewer than two atoms"));
            }
            for atom_id in molecule.atoms() {
                if !seen.insert(atom_id) {
                    violations.push(format!("atom {atom_id:?} is in two molecules"));
                }
                if self.molecule_of(atom_id) != Some(id) {
                    violations.push(format!("molecule {id:?} lists foreign atom {atom_id:?}"));
                }
            }
            for bond_id in molecule.bonds() {
                if !self
                    .bonds
                    .get(bond_id)
                    .is_some_and(|b| molecule.contains_atom(b.atom1_id()))
                {
                    violations.push(format!("molecule {id:?} lists foreign bond {bond_id:?}"));
                }
            }
            let components = graph::connected_components(&molecule.atoms, |aid| {
                self.atoms
                    .get(aid)
                    .map(|a| a.bonded.as_slice())
                    .unwrap_or(&[])
            });
            if components.len() != 1 {
                violations.push(format!(
                    "molecule {id:?} has {} connected components",
                    components.len()
                ));
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn add(system: &mut MolecularSystem, element: &str, x: f64) -> AtomId {
        system.add_atom(Atom::new(element, Point3::new(x, 0.0, 0.0)).unwrap())
    }

    fn assert_consistent(system: &MolecularSystem) {
        let violations = system.consistency_violations();
        assert!(violations.is_empty(), "violations: {violations:?}");
    }

    #[test]
    fn bonding_two_free_atoms_creates_a_molecule() {
        let mut system = MolecularSystem::new();
        let h = add(&mut system, "H", 0.0);
        let o = add(&mut system, "O", 0.3);

        let (bond_id, change) = system.form_bond(h, o, BondType::Single).unwrap();
        let MoleculeChange::Created { molecule } = change else {
            panic!("expected a new molecule, got {change:?}");
        };

        let mol = system.molecule(molecule).unwrap();
        assert_eq!(mol.atom_count(), 2);
        assert!(mol.contains_bond(bond_id));
        assert_eq!(mol.formula(), "HO");
        assert!(f64_approx_equal(mol.properties().mass, 17.007));
        assert_eq!(system.atom(h).unwrap().bond_count(), 1);
        assert!(f64_approx_equal(system.bond(bond_id).unwrap().length, 0.3));
        assert_consistent(&system);
    }

    #[test]
    fn bonding_a_free_atom_to_a_molecule_extends_it() {
        let mut system = MolecularSystem::new();
        let o = add(&mut system, "O", 0.0);
        let h1 = add(&mut system, "H", 1.0);
        let h2 = add(&mut system, "H", -1.0);
        let (_, created) = system.form_bond(o, h1, BondType::Single).unwrap();
        let (_, change) = system.form_bond(h2, o, BondType::Single).unwrap();

        assert_eq!(
            change,
            MoleculeChange::Extended {
                molecule: created.molecule(),
                atom: h2
            }
        );
        let mol = system.molecule(created.molecule()).unwrap();
        assert_eq!(mol.formula(), "H2O");
        assert_eq!(mol.properties().name, Some("water"));
        assert_consistent(&system);
    }

    #[test]
    fn bonding_two_molecules_merges_smaller_into_larger() {
        let mut system = MolecularSystem::new();
        let c1 = add(&mut system, "C", 0.0);
        let c2 = add(&mut system, "C", 1.5);
        let c3 = add(&mut system, "C", 3.0);
        let n1 = add(&mut system, "N", 10.0);
        let n2 = add(&mut system, "N", 11.0);
        let (_, large) = system.form_bond(c1, c2, BondType::Single).unwrap();
        system.form_bond(c2, c3, BondType::Single).unwrap();
        let (_, small) = system.form_bond(n1, n2, BondType::Single).unwrap();

        let (_, change) = system.form_bond(n1, c3, BondType::Single).unwrap();
        assert_eq!(
            change,
            MoleculeChange::Merged {
                survivor: large.molecule(),
                absorbed: small.molecule()
            }
        );
        assert_eq!(system.molecule_count(), 1);
        assert!(system.molecule(small.molecule()).is_none());
        let mol = system.molecule(large.molecule()).unwrap();
        assert_eq!(mol.atom_count(), 5);
        assert_eq!(mol.bond_count(), 4);
        assert_eq!(system.molecule_of(n2), Some(large.molecule()));
        assert_consistent(&system);
    }

    #[test]
    fn bonding_within_a_molecule_closes_a_ring() {
        let mut system = MolecularSystem::new();
        let ids: Vec<AtomId> = (0..3).map(|i| add(&mut system, "C", i as f64)).collect();
        let (_, created) = system.form_bond(ids[0], ids[1], BondType::Single).unwrap();
        system.form_bond(ids[1], ids[2], BondType::Single).unwrap();
        let (_, change) = system.form_bond(ids[2], ids[0], BondType::Single).unwrap();
        assert_eq!(
            change,
            MoleculeChange::RingClosed {
                molecule: created.molecule()
            }
        );
        assert_eq!(system.molecule(created.molecule()).unwrap().bond_count(), 3);
        assert_consistent(&system);
    }

    #[test]
    fn form_bond_rejects_invalid_requests_without_mutation() {
        let mut system = MolecularSystem::new();
        let h1 = add(&mut system, "H", 0.0);
        let h2 = add(&mut system, "H", 1.0);
        let h3 = add(&mut system, "H", 2.0);

        assert_eq!(
            system.form_bond(h1, h1, BondType::Single),
            Err(TopologyError::SelfBond(h1))
        );
        system.form_bond(h1, h2, BondType::Single).unwrap();
        assert_eq!(
            system.form_bond(h2, h1, BondType::Single),
            Err(TopologyError::AlreadyBonded(h2, h1))
        );
        assert_eq!(
            system.form_bond(h3, h1, BondType::Single),
            Err(TopologyError::ValenceSaturated(h1))
        );

        let removed = system.remove_atom(h3).unwrap();
        assert!(removed.broken_bonds.is_empty());
        assert_eq!(
            system.form_bond(h1, h3, BondType::Single),
            Err(TopologyError::AtomNotFound(h3))
        );
        assert_eq!(system.bond_count(), 1);
        assert_consistent(&system);
    }

    #[test]
    fn breaking_the_only_bond_dissolves_the_molecule() {
        let mut system = MolecularSystem::new();
        let h = add(&mut system, "H", 0.0);
        let o = add(&mut system, "O", 0.3);
        let (bond_id, change) = system.form_bond(h, o, BondType::Single).unwrap();

        let broken = system.break_bond(bond_id).unwrap();
        let SplitOutcome::Dissolved { molecule, released } = broken.outcome else {
            panic!("expected dissolution, got {:?}", broken.outcome);
        };
        assert_eq!(molecule, change.molecule());
        assert_eq!(released.len(), 2);
        assert_eq!(system.molecule_count(), 0);
        assert_eq!(system.atom(h).unwrap().bond_count(), 0);
        assert_eq!(system.molecule_of(o), None);
        assert_consistent(&system);
    }

    #[test]
    fn breaking_a_chain_end_releases_the_single_atom() {
        let mut system = MolecularSystem::new();
        let a = add(&mut system, "C", 0.0);
        let b = add(&mut system, "C", 1.5);
        let c = add(&mut system, "C", 3.0);
        let (_, change) = system.form_bond(a, b, BondType::Single).unwrap();
        system.form_bond(b, c, BondType::Single).unwrap();

        let broken = system.break_bond_between(c, b).unwrap();
        assert_eq!(
            broken.outcome,
            SplitOutcome::Shrunk {
                molecule: change.molecule(),
                released: vec![c]
            }
        );
        let mol = system.molecule(change.molecule()).unwrap();
        assert_eq!(mol.atom_count(), 2);
        assert!(mol.contains_atom(a) && mol.contains_atom(b));
        assert_eq!(system.molecule_of(c), None);
        assert_consistent(&system);
    }

    #[test]
    fn breaking_a_bridge_splits_into_new_molecules() {
        let mut system = MolecularSystem::new();
        let ids: Vec<AtomId> = (0..4).map(|i| add(&mut system, "C", i as f64)).collect();
        let (_, change) = system.form_bond(ids[0], ids[1], BondType::Single).unwrap();
        system.form_bond(ids[1], ids[2], BondType::Single).unwrap();
        system.form_bond(ids[2], ids[3], BondType::Single).unwrap();

        let broken = system.break_bond_between(ids[1], ids[2]).unwrap();
        let SplitOutcome::Split {
            original,
            fragments,
            released,
        } = broken.outcome
        else {
            panic!("expected a split");
        };
        assert_eq!(original, change.molecule());
        assert!(released.is_empty());
        assert_eq!(fragments.len(), 2);
        assert!(system.molecule(original).is_none());
        assert_eq!(system.molecule_count(), 2);
        assert_ne!(system.molecule_of(ids[0]), system.molecule_of(ids[3]));
        assert_eq!(system.molecule_of(ids[0]), system.molecule_of(ids[1]));
        for fragment in fragments {
            assert_eq!(system.molecule(fragment).unwrap().bond_count(), 1);
        }
        assert_consistent(&system);
    }

    #[test]
    fn breaking_a_ring_bond_leaves_molecule_intact() {
        let mut system = MolecularSystem::new();
        let ids: Vec<AtomId> = (0..3).map(|i| add(&mut system, "C", i as f64)).collect();
        let (_, change) = system.form_bond(ids[0], ids[1], BondType::Single).unwrap();
        system.form_bond(ids[1], ids[2], BondType::Single).unwrap();
        system.form_bond(ids[2], ids[0], BondType::Single).unwrap();

        let broken = system.break_bond_between(ids[0], ids[2]).unwrap();
        assert_eq!(
            broken.outcome,
            SplitOutcome::Intact {
                molecule: change.molecule()
            }
        );
        assert_eq!(system.molecule(change.molecule()).unwrap().bond_count(), 2);
        assert_consistent(&system);
    }

    #[test]
    fn break_bond_between_unbonded_atoms_is_rejected() {
        let mut system = MolecularSystem::new();
        let a = add(&mut system, "C", 0.0);
        let b = add(&mut system, "C", 1.0);
        assert_eq!(
            system.break_bond_between(a, b),
            Err(TopologyError::NotBonded(a, b))
        );
    }

    #[test]
    fn removing_a_central_atom_cascades_to_bonds_and_molecules() {
        let mut system = MolecularSystem::new();
        let o = add(&mut system, "O", 0.0);
        let h1 = add(&mut system, "H", 1.0);
        let h2 = add(&mut system, "H", -1.0);
        system.form_bond(o, h1, BondType::Single).unwrap();
        system.form_bond(o, h2, BondType::Single).unwrap();

        let removed = system.remove_atom(o).unwrap();
        assert_eq!(removed.atom.element, "O");
        assert_eq!(removed.broken_bonds.len(), 2);
        assert_eq!(system.atom_count(), 2);
        assert_eq!(system.bond_count(), 0);
        assert_eq!(system.molecule_count(), 0);
        assert_eq!(system.atom(h1).unwrap().bond_count(), 0);
        assert_consistent(&system);
    }

    #[test]
    fn remove_missing_atom_is_rejected() {
        let mut system = MolecularSystem::new();
        let a = add(&mut system, "C", 0.0);
        system.remove_atom(a).unwrap();
        assert_eq!(system.remove_atom(a), Err(TopologyError::AtomNotFound(a)));
    }

    #[test]
    fn fragment_molecule_releases_every_atom() {
        let mut system = MolecularSystem::new();
        let c = add(&mut system, "C", 0.0);
        let hs: Vec<AtomId> = (1..=4).map(|i| add(&mut system, "H", i as f64)).collect();
        let mut molecule = None;
        for &h in &hs {
            let (_, change) = system.form_bond(c, h, BondType::Single).unwrap();
            molecule = Some(change.molecule());
        }
        let molecule = molecule.unwrap();
        assert_eq!(system.molecule(molecule).unwrap().formula(), "CH4");

        let broken = system.fragment_molecule(molecule).unwrap();
        assert_eq!(broken.len(), 4);
        assert_eq!(system.molecule_count(), 0);
        assert_eq!(system.bond_count(), 0);
        assert!(hs.iter().all(|&h| system.molecule_of(h).is_none()));
        assert_eq!(
            system.fragment_molecule(molecule),
            Err(TopologyError::MoleculeNotFound(molecule))
        );
        assert_consistent(&system);
    }

    #[test]
    fn set_fixed_zeroes_velocity() {
        let mut system = MolecularSystem::new();
        let a = system.add_atom(
            Atom::new("C", Point3::origin())
                .unwrap()
                .with_velocity(nalgebra::Vector3::new(1.0, 0.0, 0.0)),
        );
        system.set_fixed(a, true).unwrap();
        let atom = system.atom(a).unwrap();
        assert!(atom.fixed);
        assert_eq!(atom.velocity, nalgebra::Vector3::zeros());
    }

    #[test]
    fn max_bonds_cannot_drop_below_current_bond_count() {
        let mut system = MolecularSystem::new();
        let c = add(&mut system, "C", 0.0);
        let h1 = add(&mut system, "H", 1.0);
        let h2 = add(&mut system, "H", -1.0);
        system.form_bond(c, h1, BondType::Single).unwrap();
        system.form_bond(c, h2, BondType::Single).unwrap();

        assert_eq!(
            system.set_max_bonds(c, 1),
            Err(TopologyError::MaxBondsBelowBondCount {
                atom: c,
                max_bonds: 1,
                bonds: 2,
            })
        );
        assert_eq!(system.atom(c).unwrap().max_bonds(), 4);

        system.set_max_bonds(c, 2).unwrap();
        assert_eq!(system.atom(c).unwrap().max_bonds(), 2);
        assert!(!system.atom(c).unwrap().has_free_valence());
        assert_consistent(&system);
    }

    #[test]
    fn refresh_bond_lengths_tracks_positions() {
        let mut system = MolecularSystem::new();
        let a = add(&mut system, "C", 0.0);
        let b = add(&mut system, "C", 1.5);
        let (bond_id, _) = system.form_bond(a, b, BondType::Single).unwrap();
        system.atom_mut(b).unwrap().position.x = 2.0;
        system.refresh_bond_lengths();
        assert!(f64_approx_equal(system.bond(bond_id).unwrap().length, 2.0));
    }

    #[test]
    fn add_atom_discards_foreign_topology() {
        let mut system = MolecularSystem::new();
        let a = add(&mut system, "C", 0.0);
        let b = add(&mut system, "C", 1.0);
        system.form_bond(a, b, BondType::Single).unwrap();
        let copy = system.atom(a).unwrap().clone();
        let c = system.add_atom(copy);
        assert_eq!(system.atom(c).unwrap().bond_count(), 0);
        assert_eq!(system.molecule_of(c), None);
        assert_consistent(&system);
    }
}
