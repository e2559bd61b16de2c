//! # Force Field Module
//!
//! This module computes the interactions between atoms: the pure pairwise potentials, the
//! settings that switch and scale them, and the evaluator that accumulates forces and energies
//! over a set of neighbor pairs.
//!
//! ## Overview
//!
//! The force field supports:
//!
//! - **Lennard-Jones** 12-6 repulsion and dispersion with a distance cutoff
//! - **Morse** bond stretching, applied only to bonded pairs
//! - **Coulomb** electrostatics with a uniform dielectric
//! - **Van der Waals** weak attraction scaled by the radii product
//! - **Hydrogen bonding** between H and O, N, or F
//! - **Thermal noise** as a random per-atom force
//!
//! ## Key Components
//!
//! - [`potentials`] - Pure functions returning force and energy for a single distance
//! - [`params`] - Enable flags, strengths, and ranges for every term
//! - [`field`] - The [`field::ForceField`] evaluator
//! - [`term`] - Energy breakdown by interaction type
//!
//! ## Usage
//!
//! ```ignore
//! use covalent::core::forcefield::{field::ForceField, params::ForceSettings};
//!
//! let settings = ForceSettings::default();
//! let field = ForceField::new(&settings);
//! let energy = field.accumulate(&mut system, &pairs);
//! ```

pub mod field;
pub mod params;
pub mod potentials;
pub mod term;
