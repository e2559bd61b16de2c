//! Pairwise potentials.
//!
//! Every function returns `(force, energy)`, where `force` is the scalar component of the
//! force on the first atom along the unit vector pointing from the second atom to the first.
//! Positive values push the atoms apart. Distances below [`MIN_DISTANCE`] contribute nothing.

use crate::core::models::atom::{LennardJonesParams, MorseParams};

pub const COULOMB_CONSTANT: f64 = 332.0637; // In kcal·Å/(mol·e²)
pub const MIN_DISTANCE: f64 = 1e-6;

const VAN_DER_WAALS_COEFFICIENT: f64 = 0.1;
const HYDROGEN_BOND_AMPLITUDE: f64 = 0.5;

#[inline]
pub fn combine_lennard_jones(a: &LennardJonesParams, b: &LennardJonesParams) -> LennardJonesParams {
    LennardJonesParams {
        epsilon: (a.epsilon * b.epsilon).sqrt(),
        sigma: 0.5 * (a.sigma + b.sigma),
    }
}

#[inline]
pub fn combine_morse(a: &MorseParams, b: &MorseParams) -> MorseParams {
    MorseParams {
        well_depth: (a.well_depth * b.well_depth).sqrt(),
        width: 0.5 * (a.width + b.width),
        equilibrium: 0.5 * (a.equilibrium + b.equilibrium),
    }
}

#[inline]
pub fn lennard_jones(dist: f64, params: &LennardJonesParams, cutoff: f64) -> (f64, f64) {
    if dist < MIN_DISTANCE || dist > cutoff {
        return (0.0, 0.0);
    }
    let rho = params.sigma / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    let force = 24.0 * params.epsilon * (2.0 * rho12 - rho6) / dist;
    let energy = 4.0 * params.epsilon * (rho12 - rho6);
    (force, energy)
}

#[inline]
pub fn morse(dist: f64, params: &MorseParams) -> (f64, f64) {
    if dist < MIN_DISTANCE {
        return (0.0, 0.0);
    }
    let decay = (-params.width * (dist - params.equilibrium)).exp();
    let x = 1.0 - decay;
    let force = -2.0 * params.well_depth * params.width * x * decay;
    let energy = params.well_depth * (x * x - 1.0);
    (force, energy)
}

#[inline]
pub fn coulomb(dist: f64, q1: f64, q2: f64, dielectric: f64, cutoff: f64) -> (f64, f64) {
    if dist < MIN_DISTANCE || dist > cutoff || q1 == 0.0 || q2 == 0.0 {
        return (0.0, 0.0);
    }
    let energy = COULOMB_CONSTANT * q1 * q2 / (dielectric * dist);
    (energy / dist, energy)
}

/// Weak attraction proportional to the product of van der Waals radii, active only within
/// `range_factor` times the contact distance.
#[inline]
pub fn van_der_waals(
    dist: f64,
    vdw_radius_a: f64,
    vdw_radius_b: f64,
    contact_distance: f64,
    range_factor: f64,
) -> (f64, f64) {
    if dist < MIN_DISTANCE || dist > range_factor * contact_distance {
        return (0.0, 0.0);
    }
    let c = VAN_DER_WAALS_COEFFICIENT * vdw_radius_a * vdw_radius_b;
    (-c / (dist * dist), -c / dist)
}

/// Exponentially decaying attraction between a hydrogen and an O, N, or F partner.
#[inline]
pub fn hydrogen_bond(dist: f64, max_distance: f64, decay: f64) -> (f64, f64) {
    if dist < MIN_DISTANCE || dist > max_distance {
        return (0.0, 0.0);
    }
    let magnitude = HYDROGEN_BOND_AMPLITUDE * (-decay * dist).exp();
    let energy = if decay > 0.0 { -magnitude / decay } else { 0.0 };
    (-magnitude, energy)
}

#[inline]
pub fn is_hydrogen_bond_pair(element_a: &str, element_b: &str) -> bool {
    fn acceptor(e: &str) -> bool {
        matches!(e, "O" | "N" | "F")
    }
    (element_a == "H" && acceptor(element_b)) || (element_b == "H" && acceptor(element_a))
}
