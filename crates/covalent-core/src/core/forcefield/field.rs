use super::params::ForceSettings;
use super::potentials;
use super::term::EnergyTerm;
use crate::core::models::atom::Atom;
use crate::core::models::ids::AtomId;
use crate::core::models::system::MolecularSystem;
use nalgebra::Vector3;
use rand::Rng;

/// The result of evaluating every enabled term for one pair of atoms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairInteraction {
    /// Force on the first atom; the second atom receives exactly the negation.
    pub force: Vector3<f64>,
    pub energy: EnergyTerm,
}

/// Evaluates the pairwise potentials and thermal noise for a set of atoms.
///
/// Bonded pairs interact only through the Morse term; every other pairwise term applies
/// only to unbonded pairs. Each term is scaled by its strength multiplier, and the total
/// force within a pair is clamped to `max_pair_force`.
pub struct ForceField<'a> {
    settings: &'a ForceSettings,
}

impl<'a> ForceField<'a> {
    pub fn new(settings: &'a ForceSettings) -> Self {
        Self { settings }
    }

    /// Evaluates the interaction between `a` and `b`.
    ///
    /// # Return
    ///
    /// `None` when no term applies to this pair or the atoms coincide.
    pub fn pair(&self, a: &Atom, b: &Atom, bonded: bool) -> Option<PairInteraction> {
        let s = self.settings;
        let applicable = if bonded {
            s.morse.enabled
        } else {
            s.lennard_jones.enabled
                || s.coulomb.enabled
                || s.van_der_waals.enabled
                || s.hydrogen_bond.enabled
        };
        if !applicable {
            return None;
        }

        let delta = a.position - b.position;
        let dist = delta.norm();
        if dist < potentials::MIN_DISTANCE {
            return None;
        }

        let mut scalar = 0.0;
        let mut energy = EnergyTerm::default();

        if bonded {
            let params = potentials::combine_morse(&a.morse, &b.morse);
            let (f, u) = potentials::morse(dist, &params);
            scalar += f * s.morse.strength;
            energy.morse = u * s.morse.strength;
        } else {
            if s.lennard_jones.enabled {
                let params = potentials::combine_lennard_jones(&a.lennard_jones, &b.lennard_jones);
                let (f, u) = potentials::lennard_jones(dist, &params, s.lennard_jones.cutoff);
                scalar += f * s.lennard_jones.strength;
                energy.lennard_jones = u * s.lennard_jones.strength;
            }
            if s.coulomb.enabled {
                let (f, u) = potentials::coulomb(
                    dist,
                    a.charge,
                    b.charge,
                    s.coulomb.dielectric,
                    s.coulomb.cutoff,
                );
                scalar += f * s.coulomb.strength;
                energy.coulomb = u * s.coulomb.strength;
            }
            if s.van_der_waals.enabled {
                let (f, u) = potentials::van_der_waals(
                    dist,
                    a.vdw_radius,
                    b.vdw_radius,
                    a.covalent_radius + b.covalent_radius,
                    s.van_der_waals.range_factor,
                );
                scalar += f * s.van_der_waals.strength;
                energy.van_der_waals = u * s.van_der_waals.strength;
            }
            if s.hydrogen_bond.enabled && potentials::is_hydrogen_bond_pair(&a.element, &b.element)
            {
                let (f, u) = potentials::hydrogen_bond(
                    dist,
                    s.hydrogen_bond.max_distance,
                    s.hydrogen_bond.decay,
                );
                scalar += f * s.hydrogen_bond.strength;
                energy.hydrogen_bond = u * s.hydrogen_bond.strength;
            }
        }

        let scalar = scalar.clamp(-s.max_pair_force, s.max_pair_force);
        Some(PairInteraction {
            force: delta * (scalar / dist),
            energy,
        })
    }

    /// Evaluates every interaction once and accumulates the forces onto both atoms.
    ///
    /// Unbonded terms are evaluated over `pairs`; bonded pairs among them are skipped. The
    /// Morse term is evaluated over every bond of `system`, so a bond acts however far it is
    /// stretched.
    ///
    /// # Arguments
    ///
    /// * `system` - The system whose atom force accumulators are updated.
    /// * `pairs` - Distinct unordered pairs; each must appear only once.
    ///
    /// # Return
    ///
    /// The potential energy summed over all evaluated interactions.
    pub fn accumulate(&self, system: &mut MolecularSystem, pairs: &[(AtomId, AtomId)]) -> EnergyTerm {
        let mut total = EnergyTerm::default();
        for (id_a, id_b, interaction) in self.interactions(system, pairs) {
            if let Some(atom) = system.atom_mut(id_a) {
                atom.force += interaction.force;
            }
            if let Some(atom) = system.atom_mut(id_b) {
                atom.force -= interaction.force;
            }
            total += interaction.energy;
        }
        total
    }

    /// Sums the potential energy of the unbonded `pairs` and of every bond without touching
    /// any force.
    pub fn potential_energy(&self, system: &MolecularSystem, pairs: &[(AtomId, AtomId)]) -> EnergyTerm {
        let mut total = EnergyTerm::default();
        for (_, _, interaction) in self.interactions(system, pairs) {
            total += interaction.energy;
        }
        total
    }

    fn interactions(
        &self,
        system: &MolecularSystem,
        pairs: &[(AtomId, AtomId)],
    ) -> Vec<(AtomId, AtomId, PairInteraction)> {
        let mut result = Vec::new();
        if !self.settings.any_pairwise_enabled() {
            return result;
        }

        for &(id_a, id_b) in pairs {
            let (Some(a), Some(b)) = (system.atom(id_a), system.atom(id_b)) else {
                continue;
            };
            if a.is_bonded_to(id_b) {
                continue;
            }
            if let Some(interaction) = self.pair(a, b, false) {
                result.push((id_a, id_b, interaction));
            }
        }

        if self.settings.morse.enabled {
            for (_, bond) in system.bonds_iter() {
                let (id_a, id_b) = (bond.atom1_id(), bond.atom2_id());
                let (Some(a), Some(b)) = (system.atom(id_a), system.atom(id_b)) else {
                    continue;
                };
                if let Some(interaction) = self.pair(a, b, true) {
                    result.push((id_a, id_b, interaction));
                }
            }
        }
        result
    }

    /// Adds a random per-axis force to every free atom, scaled by the square root of the
    /// atom's temperature relative to the reference temperature.
    pub fn apply_thermal_noise<R: Rng + ?Sized>(&self, system: &mut MolecularSystem, rng: &mut R) {
        let thermal = &self.settings.thermal;
        if !thermal.enabled || thermal.reference_temperature <= 0.0 {
            return;
        }
        for (_, atom) in system.atoms_iter_mut() {
            if atom.fixed {
                continue;
            }
            let scale = thermal.strength * (atom.temperature.max(0.0) / thermal.reference_temperature).sqrt();
            let noise = Vector3::new(
                rng.r#gen::<f64>() - 0.5,
                rng.r#gen::<f64>() - 0.5,
                rng.r#gen::<f64>() - 0.5,
            );
            atom.force += noise * scale;
        }
    }
}
