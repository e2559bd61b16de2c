//! # Workflows Module
//!
//! High-level entry points that combine engine operations into complete tasks.
//!
//! ## Overview
//!
//! Workflows sit on top of the [`Simulation`](crate::engine::simulation::Simulation) API.
//! They populate scenes from ready-made molecules and drive multi-tick runs with progress
//! reporting and checkpointing, so that front ends only have to supply options and a
//! progress callback.
//!
//! ## Architecture
//!
//! - **Presets** ([`presets`]) - Water, methane, and benzene templates plus random atom
//!   scattering
//! - **Run Workflow** ([`run`]) - Multi-tick execution with progress events, temperature
//!   tracking, and optional checkpoints

pub mod presets;
pub mod run;
