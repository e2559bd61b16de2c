//! # Covalent Core Library
//!
//! A molecular dynamics engine in which point particles interact through several pairwise
//! potentials, collide, and form or break chemical bonds on the fly. Atoms that are joined
//! by bonds are tracked as molecules whose composite properties are derived from their members.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture to keep the pure math apart from
//! the stateful stepping machinery.
//!
//! - **[`core`]: The Foundation.** Contains the data models (`Atom`, `Bond`, `Molecule`, and the
//!   `MolecularSystem` arena that owns them), the pure pairwise potentials and the `ForceField`
//!   evaluator, and snapshot persistence.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer advances the system one tick at a time.
//!   It includes the `SpatialGrid` for neighbor search, the integrator, the collision resolver,
//!   the boundary handler, the bond detector, and the `Simulation` orchestrator that sequences them
//!   and returns statistics and a batched list of events.
//!
//! - **[`workflows`]: The Public API.** The highest-level layer. It seeds standard scenes
//!   (water, methane, benzene, random gases) and runs a simulation for a number of ticks while
//!   reporting progress.

pub mod core;
pub mod engine;
pub mod workflows;
