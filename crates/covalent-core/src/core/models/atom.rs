use super::element::{self, ElementData, ElementError};
use super::ids::{AtomId, MoleculeId};
use nalgebra::{Point3, Vector3};

/// Default per-atom temperature in Kelvin.
pub const DEFAULT_TEMPERATURE: f64 = 300.0;

/// Lennard-Jones parameters of a single atom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LennardJonesParams {
    /// Well depth in kcal/mol.
    pub epsilon: f64,
    /// Zero-crossing distance in Angstroms.
    pub sigma: f64,
}

/// Morse parameters of a single atom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorseParams {
    /// Dissociation energy in kcal/mol.
    pub well_depth: f64,
    /// Width parameter in inverse Angstroms.
    pub width: f64,
    /// Per-atom equilibrium distance in Angstroms.
    pub equilibrium: f64,
}

/// Optional per-atom values that replace the element defaults when an atom is added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomOverrides {
    pub mass: Option<f64>,
    pub charge: Option<f64>,
    pub max_bonds: Option<u8>,
    pub velocity: Option<Vector3<f64>>,
    pub temperature: Option<f64>,
    pub fixed: Option<bool>,
}

/// A point particle with kinematic state and the chemical parameters used by the force field.
///
/// The bond list and molecule membership are maintained exclusively by
/// [`MolecularSystem`](super::system::MolecularSystem), so that the bond count of an atom
/// always equals the number of bonds that reference it.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Element symbol, e.g. `"C"` or `"Cl"`.
    pub element: String,
    pub atomic_number: u8,
    pub position: Point3<f64>,
    pub velocity: Vector3<f64>,
    /// Force accumulated during the current tick; reset by the integrator.
    pub force: Vector3<f64>,
    pub mass: f64,
    /// Partial charge in elementary charges.
    pub charge: f64,
    pub covalent_radius: f64,
    pub vdw_radius: f64,
    pub electronegativity: f64,
    pub lennard_jones: LennardJonesParams,
    pub morse: MorseParams,
    pub(crate) max_bonds: u8,
    /// Local temperature in Kelvin, used to scale thermal noise.
    pub temperature: f64,
    /// Fixed atoms never move but still act as force sources.
    pub fixed: bool,
    /// Display color key.
    pub color: u32,
    pub(crate) bonded: Vec<AtomId>,
    pub(crate) molecule: Option<MoleculeId>,
}

impl Atom {
    /// Creates an atom of the given element at rest at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::Unknown`] if the element symbol is not known.
    pub fn new(element: &str, position: Point3<f64>) -> Result<Self, ElementError> {
        Ok(Self::from_element(element::lookup(element)?, position))
    }

    /// Creates an atom from element constants.
    pub fn from_element(data: &ElementData, position: Point3<f64>) -> Self {
        Self {
            element: data.symbol.to_string(),
            atomic_number: data.atomic_number,
            position,
            velocity: Vector3::zeros(),
            force: Vector3::zeros(),
            mass: data.mass,
            charge: 0.0,
            covalent_radius: data.covalent_radius,
            vdw_radius: data.vdw_radius,
            electronegativity: data.electronegativity,
            lennard_jones: LennardJonesParams {
                epsilon: data.lj_epsilon,
                sigma: data.lj_sigma,
            },
            morse: MorseParams {
                well_depth: data.morse_well_depth,
                width: data.morse_width,
                equilibrium: data.morse_equilibrium(),
            },
            max_bonds: data.max_bonds,
            temperature: DEFAULT_TEMPERATURE,
            fixed: false,
            color: data.color,
            bonded: Vec::new(),
            molecule: None,
        }
    }

    /// Replaces element defaults with any values present in `overrides`.
    pub fn with_overrides(mut self, overrides: &AtomOverrides) -> Self {
        if let Some(mass) = overrides.mass {
            self.mass = mass;
        }
        if let Some(charge) = overrides.charge {
            self.charge = charge;
        }
        if let Some(max_bonds) = overrides.max_bonds {
            self.max_bonds = max_bonds;
        }
        if let Some(velocity) = overrides.velocity {
            self.velocity = velocity;
        }
        if let Some(temperature) = overrides.temperature {
            self.temperature = temperature;
        }
        if let Some(fixed) = overrides.fixed {
            self.fixed = fixed;
        }
        self
    }

    pub fn with_velocity(mut self, velocity: Vector3<f64>) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_charge(mut self, charge: f64) -> Self {
        self.charge = charge;
        self
    }

    #[inline]
    pub fn bond_count(&self) -> usize {
        self.bonded.len()
    }

    #[inline]
    pub fn bonded_atoms(&self) -> &[AtomId] {
        &self.bonded
    }

    #[inline]
    pub fn is_bonded_to(&self, other: AtomId) -> bool {
        self.bonded.contains(&other)
    }

    #[inline]
    pub fn has_free_valence(&self) -> bool {
        self.bond_count() < self.max_bonds as usize
    }

    /// Maximum number of bonds; changed only through
    /// [`MolecularSystem::set_max_bonds`](super::system::MolecularSystem::set_max_bonds).
    #[inline]
    pub fn max_bonds(&self) -> u8 {
        self.max_bonds
    }

    #[inline]
    pub fn molecule(&self) -> Option<MoleculeId> {
        self.molecule
    }

    /// Inverse mass used by impulse resolution; zero for fixed atoms.
    #[inline]
    pub fn inverse_mass(&self) -> f64 {
        if self.fixed || self.mass <= 0.0 {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.norm_squared()
    }

    #[inline]
    pub fn reset_force(&mut self) {
        self.force = Vector3::zeros();
    }

    #[inline]
    pub fn distance_to(&self, other: &Atom) -> f64 {
        nalgebra::distance(&self.position, &other.position)
    }

    /// Electrons in the outermost shell after removing the net charge.
    pub fn valence_electrons(&self) -> i32 {
        let electrons = self.atomic_number as i32 - self.charge.round() as i32;
        match electrons {
            e if e <= 2 => e,
            e if e <= 10 => e - 2,
            e if e <= 18 => e - 10,
            e => e - 18,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn new_copies_element_constants() {
        let atom = Atom::new("C", Point3::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(atom.element, "C");
        assert_eq!(atom.atomic_number, 6);
        assert!(f64_approx_equal(atom.mass, 12.011));
        assert_eq!(atom.max_bonds, 4);
        assert_eq!(atom.bond_count(), 0);
        assert_eq!(atom.molecule(), None);
        assert_eq!(atom.velocity, Vector3::zeros());
        assert!(f64_approx_equal(atom.morse.equilibrium, 1.52));
    }

    #[test]
    fn new_rejects_unknown_element() {
        let result = Atom::new("Qq", Point3::origin());
        assert!(matches!(result, Err(ElementError::Unknown(s)) if s == "Qq"));
    }

    #[test]
    fn overrides_replace_only_present_fields() {
        let overrides = AtomOverrides {
            charge: Some(-1.0),
            fixed: Some(true),
            ..Default::default()
        };
        let atom = Atom::new("Cl", Point3::origin())
            .unwrap()
            .with_overrides(&overrides);
        assert!(f64_approx_equal(atom.charge, -1.0));
        assert!(atom.fixed);
        assert!(f64_approx_equal(atom.mass, 35.45));
        assert_eq!(atom.max_bonds, 1);
    }

    #[test]
    fn fixed_atoms_have_zero_inverse_mass() {
        let mut atom = Atom::new("O", Point3::origin()).unwrap();
        assert!(f64_approx_equal(atom.inverse_mass(), 1.0 / 15.999));
        atom.fixed = true;
        assert_eq!(atom.inverse_mass(), 0.0);
    }

    #[test]
    fn kinetic_energy_is_half_m_v_squared() {
        let atom = Atom::new("He", Point3::origin())
            .unwrap()
            .with_velocity(Vector3::new(1.0, 2.0, 2.0));
        assert!(f64_approx_equal(atom.kinetic_energy(), 0.5 * 4.0026 * 9.0));
    }

    #[test]
    fn valence_electrons_follow_shell_filling() {
        let hydrogen = Atom::new("H", Point3::origin()).unwrap();
        let oxygen = Atom::new("O", Point3::origin()).unwrap();
        let chloride = Atom::new("Cl", Point3::origin()).unwrap().with_charge(-1.0);
        let sodium_ion = Atom::new("Na", Point3::origin()).unwrap().with_charge(1.0);
        assert_eq!(hydrogen.valence_electrons(), 1);
        assert_eq!(oxygen.valence_electrons(), 6);
        assert_eq!(chloride.valence_electrons(), 8);
        assert_eq!(sodium_ion.valence_electrons(), 8);
    }
}
