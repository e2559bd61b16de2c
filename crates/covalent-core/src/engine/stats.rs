use crate::core::forcefield::term::EnergyTerm;
use crate::core::models::system::MolecularSystem;
use serde::{Deserialize, Serialize};

/// Boltzmann constant in kcal/(mol*K).
pub const BOLTZMANN: f64 = 0.0019872041;

/// Aggregate observables of one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Statistics {
    pub tick: u64,
    /// Simulated time elapsed since the last reset.
    pub time: f64,
    pub atom_count: usize,
    pub bond_count: usize,
    pub molecule_count: usize,
    pub kinetic_energy: f64,
    pub potential_energy: EnergyTerm,
    pub total_energy: f64,
    pub temperature: f64,
    pub pressure: f64,
    pub density: f64,
    pub volume: f64,
    pub collisions: usize,
    pub bonds_formed: usize,
    pub bonds_broken: usize,
}

pub fn kinetic_energy(system: &MolecularSystem) -> f64 {
    system.atoms_iter().map(|(_, atom)| atom.kinetic_energy()).sum()
}

/// Instantaneous temperature from the equipartition theorem, `2 KE / (3 N k_B)`.
pub fn temperature(kinetic_energy: f64, atom_count: usize) -> f64 {
    if atom_count == 0 {
        0.0
    } else {
        2.0 * kinetic_energy / (3.0 * atom_count as f64 * BOLTZMANN)
    }
}

/// Ideal-gas pressure proxy, `2 KE / (3 V)`.
pub fn pressure(kinetic_energy: f64, volume: f64) -> f64 {
    if volume > 0.0 {
        2.0 * kinetic_energy / (3.0 * volume)
    } else {
        0.0
    }
}

/// Atoms per cubic Angstrom.
pub fn density(atom_count: usize, volume: f64) -> f64 {
    if volume > 0.0 {
        atom_count as f64 / volume
    } else {
        0.0
    }
}

impl Statistics {
    /// Measures the system. Tick, time, and the event counters are left at zero.
    pub fn measure(system: &MolecularSystem, potential_energy: EnergyTerm, volume: f64) -> Self {
        let kinetic = kinetic_energy(system);
        let atom_count = system.atom_count();
        Self {
            atom_count,
            bond_count: system.bond_count(),
            molecule_count: system.molecule_count(),
            kinetic_energy: kinetic,
            potential_energy,
            total_energy: kinetic + potential_energy.total(),
            temperature: temperature(kinetic, atom_count),
            pressure: pressure(kinetic, volume),
            density: density(atom_count, volume),
            volume,
            ..Self::default()
        }
    }
}
