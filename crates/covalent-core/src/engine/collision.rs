use super::config::CollisionSettings;
use crate::core::forcefield::potentials::MIN_DISTANCE;
use crate::core::models::ids::AtomId;
use crate::core::models::system::MolecularSystem;
use nalgebra::Vector3;
use tracing::instrument;

/// A resolved contact between two atoms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: AtomId,
    pub b: AtomId,
    /// Normal impulse magnitude; zero when the atoms were already separating.
    pub impulse: f64,
    pub overlap: f64,
}

/// Contact radius of an atom for collision purposes.
#[inline]
pub fn contact_radius(covalent_radius: f64, settings: &CollisionSettings) -> f64 {
    settings.radius_scale * covalent_radius
}

/// Separates overlapping atoms and exchanges impulse between approaching ones.
///
/// Overlap is removed by moving the atoms apart along the contact normal, in equal halves
/// when both are free or entirely by the free atom when the other is fixed. An
/// approaching pair then receives an impulse with coefficient
/// of restitution `restitution`, followed by a Coulomb friction impulse bounded by
/// `friction` times the normal impulse.
///
/// # Return
///
/// One [`Contact`] per overlapping pair that was processed.
#[instrument(level = "debug", skip_all, name = "resolve_collisions")]
pub fn resolve_collisions(
    system: &mut MolecularSystem,
    pairs: &[(AtomId, AtomId)],
    settings: &CollisionSettings,
) -> Vec<Contact> {
    let mut contacts = Vec::new();
    if !settings.enabled {
        return contacts;
    }
    for &(id_a, id_b) in pairs {
        if let Some(contact) = resolve_pair(system, id_a, id_b, settings) {
            contacts.push(contact);
        }
    }
    contacts
}

fn resolve_pair(
    system: &mut MolecularSystem,
    id_a: AtomId,
    id_b: AtomId,
    settings: &CollisionSettings,
) -> Option<Contact> {
    let a = system.atom(id_a)?;
    let b = system.atom(id_b)?;

    let delta = a.position - b.position;
    let dist = delta.norm();
    let contact = contact_radius(a.covalent_radius, settings) + contact_radius(b.covalent_radius, settings);
    if dist >= contact || dist < MIN_DISTANCE {
        return None;
    }
    let (inv_a, inv_b) = (a.inverse_mass(), b.inverse_mass());
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return None;
    }

    // Normal points from b to a.
    let normal = delta / dist;
    let overlap = contact - dist;
    let (share_a, share_b) = match (inv_a > 0.0, inv_b > 0.0) {
        (true, true) => (0.5, 0.5),
        (true, false) => (1.0, 0.0),
        _ => (0.0, 1.0),
    };

    let relative = a.velocity - b.velocity;
    let normal_speed = relative.dot(&normal);
    let mut impulse_a = Vector3::zeros();
    let mut impulse = 0.0;
    if normal_speed < 0.0 {
        impulse = -(1.0 + settings.restitution) * normal_speed / inv_sum;
        impulse_a += normal * impulse;

        let tangential = relative - normal * normal_speed;
        let tangential_speed = tangential.norm();
        if tangential_speed > MIN_DISTANCE {
            let friction = (settings.friction * impulse).min(tangential_speed / inv_sum);
            impulse_a -= tangential * (friction / tangential_speed);
        }
    }

    if let Some(atom) = system.atom_mut(id_a) {
        atom.position += normal * (overlap * share_a);
        atom.velocity += impulse_a * inv_a;
    }
    if let Some(atom) = system.atom_mut(id_b) {
        atom.position -= normal * (overlap * share_b);
        atom.velocity -= impulse_a * inv_b;
    }

    Some(Contact {
        a: id_a,
        b: id_b,
        impulse,
        overlap,
    })
}
