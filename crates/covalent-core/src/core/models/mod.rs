//! # Core Models Module
//!
//! This module contains the data structures used to represent a reacting particle system.
//!
//! ## Overview
//!
//! Atoms live in an arena owned by [`system::MolecularSystem`]. Bonds and molecules refer to
//! atoms by [`ids::AtomId`] and never own them, so removing an atom is a single arena operation
//! followed by the cleanup of its incident bonds and a re-evaluation of its molecule.
//!
//! ## Key Components
//!
//! - [`element`] - Static per-element constants (mass, radii, electronegativity, potentials)
//! - [`atom`] - A single particle with kinematic state and chemical parameters
//! - [`bond`] - Bond types with their constant table, polarity, and the bond record
//! - [`molecule`] - A connected set of bonded atoms and its derived properties
//! - [`system`] - The arena that owns atoms, bonds, and molecules and enforces their invariants
//! - [`graph`] - Partition bookkeeping: merging on bond formation and splitting on bond loss
//! - [`ids`] - Unique identifier types for atoms, bonds, and molecules
//!
//! ## Usage
//!
//! ```ignore
//! use covalent::core::models::{atom::Atom, bond::BondType, system::MolecularSystem};
//! use nalgebra::Point3;
//!
//! let mut system = MolecularSystem::new();
//! let o = system.add_atom(Atom::new("O", Point3::origin())?);
//! let h = system.add_atom(Atom::new("H", Point3::new(0.96, 0.0, 0.0))?);
//! let (bond, change) = system.form_bond(o, h, BondType::Single)?;
//! ```

pub mod atom;
pub mod bond;
pub mod element;
pub mod graph;
pub mod ids;
pub mod molecule;
pub mod system;
