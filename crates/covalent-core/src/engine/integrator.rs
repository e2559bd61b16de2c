use super::config::IntegrationSettings;
use crate::core::models::system::MolecularSystem;
use nalgebra::Vector3;
use tracing::instrument;

/// Advances every free atom by one semi-implicit Euler step and clears its force.
///
/// The velocity update uses the force accumulated this tick plus gravity along -y, is
/// damped once, and the position then moves with the updated velocity. Fixed atoms keep
/// their position and have their velocity zeroed.
///
/// # Arguments
///
/// * `system` - The atoms to advance.
/// * `settings` - Damping and gravity.
/// * `dt` - The time step, already clamped by the caller.
#[instrument(level = "debug", skip_all, name = "integrate")]
pub fn integrate(system: &mut MolecularSystem, settings: &IntegrationSettings, dt: f64) {
    let gravity = Vector3::new(0.0, -settings.gravity, 0.0);
    for (_, atom) in system.atoms_iter_mut() {
        if atom.fixed {
            atom.velocity = Vector3::zeros();
            atom.reset_force();
            continue;
        }
        let acceleration = atom.force * atom.inverse_mass() + gravity;
        atom.velocity += acceleration * dt;
        atom.velocity *= settings.damping;
        atom.position += atom.velocity * dt;
        atom.reset_force();
    }
}
