//! # Core Module
//!
//! This module provides the fundamental building blocks of the engine: the molecular data
//! model, the pairwise potentials, and the snapshot format.
//!
//! ## Overview
//!
//! Everything in `core` is free of per-tick state. The models describe what exists (atoms,
//! bonds, molecules), the force field describes how pairs of atoms interact, and the I/O layer
//! describes how a system is written to and read back from disk.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Elements, atoms, bonds, molecules, and the
//!   arena-backed `MolecularSystem` that keeps the molecule partition consistent
//! - **Interactions** ([`forcefield`]) - Lennard-Jones, Morse, Coulomb, van der Waals, hydrogen-bond
//!   and thermal-noise terms plus the evaluator that accumulates them
//! - **Persistence** ([`io`]) - Serializable snapshots with tolerant loading
//!
//! ## Key Capabilities
//!
//! - **Stable identifiers** for atoms, bonds, and molecules backed by slot maps
//! - **Exact action/reaction pairs** for every pairwise potential
//! - **Incremental molecule maintenance** with merge-on-bond and split-on-break
//! - **Derived chemistry** such as formula, stability, reactivity, and dipole moment

pub mod forcefield;
pub mod io;
pub mod models;
