use super::config::{BoundaryMode, BoundarySettings, CollisionSettings, DynamicSpaceSettings};
use super::collision::contact_radius;
use crate::core::models::system::MolecularSystem;
use nalgebra::Vector3;
use tracing::{debug, instrument};

/// The axis-aligned simulation box, centered at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationBox {
    extents: Vector3<f64>,
}

impl SimulationBox {
    pub fn new(extents: [f64; 3]) -> Self {
        Self {
            extents: Vector3::from(extents),
        }
    }

    pub fn from_settings(settings: &BoundarySettings) -> Self {
        Self::new(settings.extents)
    }

    #[inline]
    pub fn extents(&self) -> Vector3<f64> {
        self.extents
    }

    #[inline]
    pub fn half_extents(&self) -> Vector3<f64> {
        self.extents * 0.5
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.extents.x * self.extents.y * self.extents.z
    }

    /// Moves every edge of the box a fraction of the way toward the size suggested by the
    /// atom count.
    pub fn adapt(&mut self, atom_count: usize, settings: &DynamicSpaceSettings) {
        let target = settings.target_size(atom_count);
        for extent in self.extents.iter_mut() {
            *extent += (target - *extent) * settings.adaptation_rate;
        }
        debug!(target, size = self.extents.x, "Adapted simulation box");
    }
}

/// Keeps every free atom inside the box.
///
/// An atom whose contact sphere crosses a wall is clamped back to the wall. In elastic mode
/// the velocity component along that axis is reflected inward and scaled by
/// `wall_restitution`; in absorbing mode it is zeroed.
///
/// # Return
///
/// The number of wall contacts handled.
#[instrument(level = "debug", skip_all, name = "enforce_boundaries")]
pub fn enforce_boundaries(
    system: &mut MolecularSystem,
    space: &SimulationBox,
    settings: &BoundarySettings,
    collision: &CollisionSettings,
) -> usize {
    if !settings.enabled {
        return 0;
    }
    let half = space.half_extents();
    let mut hits = 0;
    for (_, atom) in system.atoms_iter_mut() {
        if atom.fixed {
            continue;
        }
        let radius = contact_radius(atom.covalent_radius, collision);
        for axis in 0..3 {
            let limit = (half[axis] - radius).max(0.0);
            let coordinate = atom.position[axis];
            let (clamped, inward) = if coordinate < -limit {
                (-limit, 1.0)
            } else if coordinate > limit {
                (limit, -1.0)
            } else {
                continue;
            };
            atom.position[axis] = clamped;
            let speed = atom.velocity[axis].abs();
            atom.velocity[axis] = match settings.mode {
                BoundaryMode::Elastic => inward * speed * settings.wall_restitution,
                BoundaryMode::Absorbing => 0.0,
            };
            hits += 1;
        }
    }
    hits
}
