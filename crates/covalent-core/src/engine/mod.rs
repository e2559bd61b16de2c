//! # Engine Module
//!
//! This module implements the time-stepping engine that advances a molecular system through
//! simulated time while bonds form and break.
//!
//! ## Overview
//!
//! The engine owns a [`MolecularSystem`](crate::core::models::system::MolecularSystem) and
//! drives it one tick at a time. Each tick buckets atoms into a spatial grid, accumulates
//! pairwise forces and thermal noise, integrates motion, resolves contacts and wall hits,
//! and finally lets nearby compatible atoms bond. Every structural change is reported as an
//! event so that hosts can follow the chemistry without diffing snapshots.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Force, integration, collision, boundary, bonding, and
//!   capacity settings, loadable from TOML
//! - **Simulation** ([`simulation`]) - The tick loop, structural commands, and persistence
//! - **Neighbor Search** ([`spatial_grid`]) - Uniform hash grid producing candidate pairs
//! - **Physics Phases** ([`integrator`], [`collision`], [`boundary`]) - Motion, contacts,
//!   and walls
//! - **Bonding** ([`bonding`]) - Distance and policy based bond formation and breaking
//! - **Observables** ([`stats`], [`events`]) - Per-tick statistics and the event stream
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Engine-level error type
//!
//! ## Key Capabilities
//!
//! - **Dynamic bonding** with valence limits enforced even within a single tick
//! - **Molecule tracking** that merges, splits, and dissolves molecules as bonds change
//! - **Deterministic runs** when a seed is configured
//! - **Full state export and import** as JSON

pub mod bonding;
pub mod boundary;
pub mod collision;
pub mod config;
pub mod error;
pub mod events;
pub mod integrator;
pub mod progress;
pub mod simulation;
pub mod spatial_grid;
pub mod stats;
