//! # I/O Module
//!
//! Serialization of molecular systems.
//!
//! - [`snapshot`] - A self-contained JSON-friendly record of every atom, bond, and molecule.
//!   Loading tolerates inconsistent input: dangling references are dropped and logged, and
//!   molecules are always rebuilt from bond connectivity.

pub mod snapshot;
