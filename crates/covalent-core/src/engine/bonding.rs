//! Automatic bond formation and breaking.
//!
//! Each tick, candidate pairs from the spatial grid are filtered by distance, free valence,
//! and the configured [`BondingPolicy`]. Accepted candidates are committed nearest first, and
//! every commit re-checks valence against the live system so that a single tick can never
//! push an atom past its maximum bond count.

use super::config::{BondingPolicy, BondingSettings, Limits};
use crate::core::models::atom::Atom;
use crate::core::models::bond::{BondType, IONIC_THRESHOLD, Polarity};
use crate::core::models::graph::MoleculeChange;
use crate::core::models::ids::{AtomId, BondId};
use crate::core::models::system::{BrokenBond, MolecularSystem};
use tracing::{debug, instrument};

/// A bond committed by [`detect_bonds`].
#[derive(Debug, Clone, PartialEq)]
pub struct FormedBond {
    pub id: BondId,
    pub a: AtomId,
    pub b: AtomId,
    pub bond_type: BondType,
    pub polarity: Polarity,
    pub change: MoleculeChange,
}

/// Bond type assigned to an automatically formed bond.
pub fn auto_bond_type(electronegativity_difference: f64) -> BondType {
    if electronegativity_difference.abs() > IONIC_THRESHOLD {
        BondType::Ionic
    } else {
        BondType::Single
    }
}

/// Returns `true` if the bonding policy admits the pair.
pub fn policy_allows(policy: &BondingPolicy, a: &Atom, b: &Atom) -> bool {
    match *policy {
        BondingPolicy::Electronegativity { max_difference } => {
            (a.electronegativity - b.electronegativity).abs() < max_difference
        }
        BondingPolicy::ActivationEnergy { threshold } => {
            a.kinetic_energy() + b.kinetic_energy() > threshold
        }
    }
}

/// Distance, valence, and policy test for one pair of unbonded atoms.
///
/// # Return
///
/// The pair distance if the pair qualifies.
pub fn bonding_candidate(a: &Atom, b: &Atom, settings: &BondingSettings) -> Option<f64> {
    if !a.has_free_valence() || !b.has_free_valence() {
        return None;
    }
    let dist = a.distance_to(b);
    let limit = settings.distance_factor * (a.covalent_radius + b.covalent_radius);
    if dist > limit || !policy_allows(&settings.policy, a, b) {
        return None;
    }
    Some(dist)
}

/// Forms bonds between qualifying pairs.
///
/// # Arguments
///
/// * `system` - The system to bond; its molecule partition is updated for every bond.
/// * `pairs` - Candidate pairs, typically from the spatial grid.
/// * `settings` - Distance factor and compatibility policy.
/// * `limits` - A pair whose bond would create a new molecule is skipped once
///   `max_molecules` exist.
///
/// # Return
///
/// The committed bonds in commit order. Running detection again on the resulting state
/// forms nothing new unless atoms move.
#[instrument(level = "debug", skip_all, name = "detect_bonds")]
pub fn detect_bonds(
    system: &mut MolecularSystem,
    pairs: &[(AtomId, AtomId)],
    settings: &BondingSettings,
    limits: &Limits,
) -> Vec<FormedBond> {
    let mut formed = Vec::new();
    if !settings.enabled {
        return formed;
    }

    let mut candidates: Vec<(f64, AtomId, AtomId)> = pairs
        .iter()
        .filter_map(|&(id_a, id_b)| {
            let a = system.atom(id_a)?;
            let b = system.atom(id_b)?;
            if a.is_bonded_to(id_b) {
                return None;
            }
            bonding_candidate(a, b, settings).map(|dist| (dist, id_a, id_b))
        })
        .collect();
    candidates.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)).then(x.2.cmp(&y.2)));

    for (_, id_a, id_b) in candidates {
        if system.can_bond(id_a, id_b).is_err() {
            continue;
        }
        if system.would_create_molecule(id_a, id_b) && system.molecule_count() >= limits.max_molecules {
            debug!(
                limit = limits.max_molecules,
                "Skipping bond that would exceed the molecule limit"
            );
            continue;
        }
        let (Some(a), Some(b)) = (system.atom(id_a), system.atom(id_b)) else {
            continue;
        };
        let delta = a.electronegativity - b.electronegativity;
        let bond_type = auto_bond_type(delta);
        match system.form_bond(id_a, id_b, bond_type) {
            Ok((id, change)) => formed.push(FormedBond {
                id,
                a: id_a,
                b: id_b,
                bond_type,
                polarity: Polarity::classify(delta),
                change,
            }),
            Err(e) => debug!(error = %e, "Bond candidate rejected"),
        }
    }
    formed
}

/// Breaks every bond stretched beyond `break_stretch_factor` times the covalent radius sum
/// of its atoms. Does nothing when no break factor is configured.
#[instrument(level = "debug", skip_all, name = "break_overstretched")]
pub fn break_overstretched(system: &mut MolecularSystem, settings: &BondingSettings) -> Vec<BrokenBond> {
    let Some(factor) = settings.break_stretch_factor else {
        return Vec::new();
    };
    let overstretched: Vec<BondId> = system
        .bonds_iter()
        .filter_map(|(id, bond)| {
            let a = system.atom(bond.atom1_id())?;
            let b = system.atom(bond.atom2_id())?;
            (a.distance_to(b) > factor * (a.covalent_radius + b.covalent_radius)).then_some(id)
        })
        .collect();
    overstretched
        .into_iter()
        .filter_map(|id| system.break_bond(id).ok())
        .collect()
}
