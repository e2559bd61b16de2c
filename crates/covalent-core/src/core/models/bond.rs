use super::ids::AtomId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Electronegativity difference above which a bond is classified as ionic.
pub const IONIC_THRESHOLD: f64 = 1.7;
/// Electronegativity difference above which a bond is classified as polar covalent.
pub const POLAR_THRESHOLD: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BondType {
    #[default]
    Single,
    Double,
    Triple,
    Aromatic,
    Ionic,
    Hydrogen,
    VanDerWaals,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BondTypeData {
    order: f64,
    strength: f64,
    /// kJ/mol
    energy: f64,
    color: u32,
}

#[rustfmt::skip]
const BOND_TYPE_TABLE: [BondTypeData; 7] = [
    BondTypeData { order: 1.0, strength: 1.0, energy: 350.0, color: 0x888888 }, // Single
    BondTypeData { order: 2.0, strength: 2.0, energy: 600.0, color: 0xffaa00 }, // Double
    BondTypeData { order: 3.0, strength: 3.0, energy: 835.0, color: 0xff0000 }, // Triple
    BondTypeData { order: 1.5, strength: 1.5, energy: 450.0, color: 0x00ff00 }, // Aromatic
    BondTypeData { order: 1.0, strength: 0.8, energy: 400.0, color: 0x0000ff }, // Ionic
    BondTypeData { order: 0.5, strength: 0.3, energy: 20.0,  color: 0x00ffff }, // Hydrogen
    BondTypeData { order: 0.1, strength: 0.1, energy: 5.0,   color: 0xff00ff }, // VanDerWaals
];

impl BondType {
    pub const ALL: [BondType; 7] = [
        BondType::Single,
        BondType::Double,
        BondType::Triple,
        BondType::Aromatic,
        BondType::Ionic,
        BondType::Hydrogen,
        BondType::VanDerWaals,
    ];

    #[inline]
    fn data(self) -> &'static BondTypeData {
        &BOND_TYPE_TABLE[self as usize]
    }

    #[inline]
    pub fn order(self) -> f64 {
        self.data().order
    }

    #[inline]
    pub fn base_strength(self) -> f64 {
        self.data().strength
    }

    /// Tabulated bond energy in kJ/mol.
    #[inline]
    pub fn base_energy(self) -> f64 {
        self.data().energy
    }

    #[inline]
    pub fn color(self) -> u32 {
        self.data().color
    }

    /// Bond strength scaled up by the electronegativity difference of the endpoints.
    pub fn strength(self, electronegativity_difference: f64) -> f64 {
        self.base_strength() * (1.0 + 0.1 * electronegativity_difference.abs())
    }
}

#[derive(Debug, Error)]
#[error("Invalid bond type string")]
pub struct ParseBondTypeError;

impl FromStr for BondType {
    type Err = ParseBondTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "s" | "single" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            "ar" | "aromatic" => Ok(Self::Aromatic),
            "ionic" => Ok(Self::Ionic),
            "hb" | "hydrogen" => Ok(Self::Hydrogen),
            "vdw" | "van_der_waals" => Ok(Self::VanDerWaals),
            _ => Err(ParseBondTypeError),
        }
    }
}

impl fmt::Display for BondType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Single => "Single",
                Self::Double => "Double",
                Self::Triple => "Triple",
                Self::Aromatic => "Aromatic",
                Self::Ionic => "Ionic",
                Self::Hydrogen => "Hydrogen",
                Self::VanDerWaals => "VanDerWaals",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Covalent,
    PolarCovalent,
    Ionic,
}

impl Polarity {
    pub fn classify(electronegativity_difference: f64) -> Self {
        let delta = electronegativity_difference.abs();
        if delta > IONIC_THRESHOLD {
            Self::Ionic
        } else if delta > POLAR_THRESHOLD {
            Self::PolarCovalent
        } else {
            Self::Covalent
        }
    }
}

/// A bond between two distinct atoms.
///
/// The endpoints are stored in ascending id order, so two bonds over the same pair of atoms
/// always compare equal on [`Bond::key`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bond {
    atom1_id: AtomId,
    atom2_id: AtomId,
    pub bond_type: BondType,
    pub polarity: Polarity,
    pub strength: f64,
    /// kJ/mol
    pub energy: f64,
    /// Current endpoint separation in Angstroms, refreshed every tick.
    pub length: f64,
}

impl Bond {
    pub fn new(
        atom1_id: AtomId,
        atom2_id: AtomId,
        bond_type: BondType,
        electronegativity_difference: f64,
        length: f64,
    ) -> Self {
        let (atom1_id, atom2_id) = normalize_pair(atom1_id, atom2_id);
        Self {
            atom1_id,
            atom2_id,
            bond_type,
            polarity: Polarity::classify(electronegativity_difference),
            strength: bond_type.strength(electronegativity_difference),
            energy: bond_type.base_energy(),
            length,
        }
    }

    #[inline]
    pub fn atom1_id(&self) -> AtomId {
        self.atom1_id
    }

    #[inline]
    pub fn atom2_id(&self) -> AtomId {
        self.atom2_id
    }

    #[inline]
    pub fn key(&self) -> (AtomId, AtomId) {
        (self.atom1_id, self.atom2_id)
    }

    pub fn contains(&self, atom_id: AtomId) -> bool {
        self.atom1_id == atom_id || self.atom2_id == atom_id
    }

    /// Returns the endpoint opposite to `atom_id`, or `None` if it is not an endpoint.
    pub fn partner(&self, atom_id: AtomId) -> Option<AtomId> {
        if self.atom1_id == atom_id {
            Some(self.atom2_id)
        } else if self.atom2_id == atom_id {
            Some(self.atom1_id)
        } else {
            None
        }
    }
}

#[inline]
pub fn normalize_pair(a: AtomId, b: AtomId) -> (AtomId, AtomId) {
    if a <= b { (a, b) } else { (b, a) }
}
