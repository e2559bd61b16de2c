use super::bonding;
use super::boundary::{self, SimulationBox};
use super::collision;
use super::config::SimulationConfig;
use super::error::EngineError;
use super::events::{BreakReason, SimulationEvent};
use super::integrator;
use super::spatial_grid::SpatialGrid;
use super::stats::Statistics;
use crate::core::forcefield::field::ForceField;
use crate::core::io::snapshot::{self, LoadReport, SystemSnapshot};
use crate::core::models::atom::{Atom, AtomOverrides};
use crate::core::models::bond::{BondType, Polarity};
use crate::core::models::ids::{AtomId, BondId, MoleculeId};
use crate::core::models::system::{BrokenBond, MolecularSystem, RemovedAtom};
use nalgebra::Point3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Format version written into every exported state.
pub const STATE_VERSION: &str = "1";

/// Everything needed to resume a simulation: configuration, clock, box, and topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimulationState {
    pub version: String,
    pub tick: u64,
    pub time: f64,
    pub extents: [f64; 3],
    pub config: SimulationConfig,
    pub system: SystemSnapshot,
}

/// The outcome of one call to [`Simulation::step`].
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// `false` when the simulation was paused and nothing moved.
    pub advanced: bool,
    pub statistics: Statistics,
    /// Events produced since the previous report, including those of commands issued in
    /// between, in the order they happened.
    pub events: Vec<SimulationEvent>,
}

/// A single simulation instance: the system, its configuration, and the tick loop.
///
/// Each tick runs a fixed sequence of phases: spatial grid rebuild, force accumulation and
/// thermal noise, integration, collision resolution, boundary enforcement, bond breaking and
/// detection, and finally statistics. Structural commands may be issued between ticks; their
/// events are delivered with the next [`StepReport`].
pub struct Simulation {
    config: SimulationConfig,
    system: MolecularSystem,
    grid: SpatialGrid,
    space: SimulationBox,
    rng: StdRng,
    tick: u64,
    time: f64,
    paused: bool,
    statistics: Statistics,
    pending: Vec<SimulationEvent>,
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

impl Simulation {
    /// Creates an empty simulation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the configuration fails validation.
    pub fn new(config: SimulationConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let space = SimulationBox::from_settings(&config.boundary);
        let statistics = Statistics {
            volume: space.volume(),
            ..Statistics::default()
        };
        info!(
            seed = ?config.seed,
            max_atoms = config.limits.max_atoms,
            "Created simulation"
        );
        Ok(Self {
            grid: SpatialGrid::new(config.cell_size(0.0)),
            rng: make_rng(config.seed),
            space,
            config,
            system: MolecularSystem::new(),
            tick: 0,
            time: 0.0,
            paused: false,
            statistics,
            pending: Vec::new(),
        })
    }

    #[inline]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[inline]
    pub fn system(&self) -> &MolecularSystem {
        &self.system
    }

    #[inline]
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    #[inline]
    pub fn space(&self) -> &SimulationBox {
        &self.space
    }

    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// How many more atoms may be added before reaching the atom limit.
    pub fn atom_capacity_left(&self) -> usize {
        self.config
            .limits
            .max_atoms
            .saturating_sub(self.system.atom_count())
    }

    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Replaces the configuration after validating it.
    ///
    /// A changed box size takes effect immediately; a changed seed reseeds the generator.
    pub fn set_config(&mut self, config: SimulationConfig) -> Result<(), EngineError> {
        config.validate()?;
        if config.boundary.extents != self.config.boundary.extents {
            self.space = SimulationBox::from_settings(&config.boundary);
        }
        if config.seed != self.config.seed {
            self.rng = make_rng(config.seed);
        }
        self.config = config;
        debug!("Configuration updated");
        Ok(())
    }

    /// Sets the global temperature and applies it to every atom.
    pub fn set_temperature(&mut self, temperature: f64) -> Result<(), EngineError> {
        let mut config = self.config.clone();
        config.forces.thermal.temperature = temperature;
        self.set_config(config)?;
        for (_, atom) in self.system.atoms_iter_mut() {
            atom.temperature = temperature;
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Advances one tick with the configured time step, unless paused.
    pub fn step(&mut self) -> StepReport {
        self.step_with(self.config.integration.time_step)
    }

    /// Advances one tick with time step `dt`, clamped to the configured maximum.
    pub fn step_with(&mut self, dt: f64) -> StepReport {
        if self.paused {
            return StepReport {
                advanced: false,
                statistics: self.statistics.clone(),
                events: Vec::new(),
            };
        }
        self.advance(dt)
    }

    /// Advances exactly one tick even while paused; the pause state is unchanged.
    pub fn step_once(&mut self) -> StepReport {
        self.advance(self.config.integration.time_step)
    }

    fn max_covalent_radius(&self) -> f64 {
        self.system
            .atoms_iter()
            .map(|(_, atom)| atom.covalent_radius)
            .fold(0.0, f64::max)
    }

    #[instrument(level = "debug", skip_all, name = "tick", fields(tick = self.tick + 1))]
    fn advance(&mut self, dt: f64) -> StepReport {
        let dt = self.config.integration.clamp_time_step(dt);
        let mut events = std::mem::take(&mut self.pending);

        if self.config.boundary.dynamic.enabled {
            self.space
                .adapt(self.system.atom_count(), &self.config.boundary.dynamic);
        }

        let cell_size = self.config.cell_size(self.max_covalent_radius());
        self.grid.set_cell_size(cell_size);
        self.grid.rebuild(&self.system);
        let pairs = self.grid.candidate_pairs();

        let field = ForceField::new(&self.config.forces);
        let potential = field.accumulate(&mut self.system, &pairs);
        field.apply_thermal_noise(&mut self.system, &mut self.rng);

        integrator::integrate(&mut self.system, &self.config.integration, dt);

        let contacts = collision::resolve_collisions(&mut self.system, &pairs, &self.config.collision);
        let mut collisions = 0;
        for contact in contacts.iter().filter(|c| c.impulse > 0.0) {
            collisions += 1;
            events.push(SimulationEvent::Collision {
                a: contact.a,
                b: contact.b,
                impulse: contact.impulse,
            });
        }

        boundary::enforce_boundaries(
            &mut self.system,
            &self.space,
            &self.config.boundary,
            &self.config.collision,
        );

        let mut bonds_broken = 0;
        if self.config.bonding.enabled {
            for broken in bonding::break_overstretched(&mut self.system, &self.config.bonding) {
                bonds_broken += 1;
                events.extend(SimulationEvent::from_broken_bond(&broken, BreakReason::Overstretched));
            }
        }
        if bonds_broken > 0 {
            self.warn_if_over_molecule_limit();
        }
        let formed = bonding::detect_bonds(
            &mut self.system,
            &pairs,
            &self.config.bonding,
            &self.config.limits,
        );
        let bonds_formed = formed.len();
        for bond in formed {
            events.push(SimulationEvent::BondFormed {
                bond: bond.id,
                a: bond.a,
                b: bond.b,
                bond_type: bond.bond_type,
                polarity: bond.polarity,
            });
            events.push(bond.change.into());
        }

        self.system.refresh_bond_lengths();
        self.system.refresh_all_molecule_properties();

        self.tick += 1;
        self.time += dt;
        self.statistics = Statistics {
            tick: self.tick,
            time: self.time,
            collisions,
            bonds_formed,
            bonds_broken,
            ..Statistics::measure(&self.system, potential, self.space.volume())
        };
        debug!(
            atoms = self.statistics.atom_count,
            molecules = self.statistics.molecule_count,
            collisions,
            bonds_formed,
            bonds_broken,
            temperature = self.statistics.temperature,
            "Tick complete"
        );

        StepReport {
            advanced: true,
            statistics: self.statistics.clone(),
            events,
        }
    }

    pub(crate) fn ensure_atom_capacity(&self, additional: usize) -> Result<(), EngineError> {
        let limit = self.config.limits.max_atoms;
        if additional > self.atom_capacity_left() {
            return Err(EngineError::CapacityExceeded { what: "atoms", limit });
        }
        Ok(())
    }

    pub(crate) fn ensure_molecule_capacity(&self) -> Result<(), EngineError> {
        let limit = self.config.limits.max_molecules;
        if self.system.molecule_count() >= limit {
            return Err(EngineError::CapacityExceeded {
                what: "molecules",
                limit,
            });
        }
        Ok(())
    }

    fn warn_if_over_molecule_limit(&self) {
        let limit = self.config.limits.max_molecules;
        let count = self.system.molecule_count();
        if count > limit {
            warn!(count, limit, "Molecule count exceeds the limit after a split");
        }
    }

    /// Adds an atom of `element` at `position`.
    ///
    /// The atom starts at the configured global temperature unless `overrides` says
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CapacityExceeded`] at the atom limit, or
    /// [`EngineError::Element`] for an unknown element symbol.
    pub fn add_atom(
        &mut self,
        element: &str,
        position: Point3<f64>,
        overrides: &AtomOverrides,
    ) -> Result<AtomId, EngineError> {
        self.ensure_atom_capacity(1)?;
        let mut atom = Atom::new(element, position)?;
        atom.temperature = self.config.forces.thermal.temperature;
        self.insert_atom(atom.with_overrides(overrides))
    }

    /// Adds a fully constructed atom. Any bond or molecule state on it is discarded.
    pub fn insert_atom(&mut self, atom: Atom) -> Result<AtomId, EngineError> {
        self.ensure_atom_capacity(1)?;
        let element = atom.element.clone();
        let id = self.system.add_atom(atom);
        debug!(atom = ?id, element = %element, "Added atom");
        self.pending.push(SimulationEvent::AtomAdded { atom: id });
        Ok(id)
    }

    /// Removes an atom together with its bonds; molecules split accordingly.
    pub fn remove_atom(&mut self, id: AtomId) -> Result<RemovedAtom, EngineError> {
        let removed = self.system.remove_atom(id)?;
        for broken in &removed.broken_bonds {
            self.pending
                .extend(SimulationEvent::from_broken_bond(broken, BreakReason::AtomRemoved));
        }
        self.pending.push(SimulationEvent::AtomRemoved { atom: id });
        self.warn_if_over_molecule_limit();
        debug!(atom = ?id, bonds = removed.broken_bonds.len(), "Removed atom");
        Ok(removed)
    }

    /// Bonds two atoms explicitly, regardless of distance or policy.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Topology`] if the atoms cannot bond, or
    /// [`EngineError::CapacityExceeded`] if the bond would create a molecule beyond the
    /// molecule limit.
    pub fn add_bond(&mut self, a: AtomId, b: AtomId, bond_type: BondType) -> Result<BondId, EngineError> {
        self.system.can_bond(a, b)?;
        if self.system.would_create_molecule(a, b) {
            self.ensure_molecule_capacity()?;
        }
        let (bond, change) = self.system.form_bond(a, b, bond_type)?;
        let polarity = self
            .system
            .bond(bond)
            .map(|record| record.polarity)
            .unwrap_or(Polarity::Covalent);
        self.pending.push(SimulationEvent::BondFormed {
            bond,
            a,
            b,
            bond_type,
            polarity,
        });
        self.pending.push(change.into());
        Ok(bond)
    }

    /// Removes the bond between two atoms.
    pub fn remove_bond(&mut self, a: AtomId, b: AtomId) -> Result<BrokenBond, EngineError> {
        let broken = self.system.break_bond_between(a, b)?;
        self.pending
            .extend(SimulationEvent::from_broken_bond(&broken, BreakReason::Requested));
        self.warn_if_over_molecule_limit();
        Ok(broken)
    }

    /// Breaks every bond of a molecule, releasing all of its atoms.
    pub fn fragment_molecule(&mut self, id: MoleculeId) -> Result<Vec<BrokenBond>, EngineError> {
        let broken = self.system.fragment_molecule(id)?;
        for bond in &broken {
            self.pending
                .extend(SimulationEvent::from_broken_bond(bond, BreakReason::Fragmented));
        }
        info!(molecule = ?id, bonds = broken.len(), "Fragmented molecule");
        Ok(broken)
    }

    pub fn set_fixed(&mut self, id: AtomId, fixed: bool) -> Result<(), EngineError> {
        self.system.set_fixed(id, fixed)?;
        Ok(())
    }

    /// Changes an atom's maximum bond count; rejected if the atom already has more bonds.
    pub fn set_max_bonds(&mut self, id: AtomId, max_bonds: u8) -> Result<(), EngineError> {
        self.system.set_max_bonds(id, max_bonds)?;
        Ok(())
    }

    /// Removes every atom, bond, and molecule; the clock keeps running.
    pub fn clear(&mut self) {
        self.system.clear();
        self.grid.rebuild(&self.system);
        self.pending.clear();
        self.statistics = Statistics {
            tick: self.tick,
            time: self.time,
            volume: self.space.volume(),
            ..Statistics::default()
        };
        info!("Cleared simulation");
    }

    /// Clears the system and rewinds the clock, box, and random generator.
    pub fn reset(&mut self) {
        self.tick = 0;
        self.time = 0.0;
        self.space = SimulationBox::from_settings(&self.config.boundary);
        self.rng = make_rng(self.config.seed);
        self.clear();
    }

    /// Captures the full state for persistence.
    pub fn export_state(&self) -> SimulationState {
        let extents = self.space.extents();
        SimulationState {
            version: STATE_VERSION.to_string(),
            tick: self.tick,
            time: self.time,
            extents: [extents.x, extents.y, extents.z],
            config: self.config.clone(),
            system: SystemSnapshot::capture(&self.system),
        }
    }

    /// Replaces the current state with `state`.
    ///
    /// Invalid atoms and bonds in the snapshot are dropped and reported rather than failing
    /// the import. Pending events are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] for an invalid configuration or
    /// [`EngineError::CapacityExceeded`] if the snapshot holds more atoms than allowed. The
    /// current state is untouched on error.
    #[instrument(skip_all, name = "import_state")]
    pub fn import_state(&mut self, state: SimulationState) -> Result<LoadReport, EngineError> {
        state.config.validate()?;
        let limit = state.config.limits.max_atoms;
        if state.system.atoms.len() > limit {
            return Err(EngineError::CapacityExceeded { what: "atoms", limit });
        }
        if state.version != STATE_VERSION {
            warn!(
                found = %state.version,
                expected = STATE_VERSION,
                "State version differs; loading anyway"
            );
        }

        let (system, report) = state.system.restore();
        self.rng = make_rng(state.config.seed);
        self.config = state.config;
        self.system = system;
        self.space = SimulationBox::new(state.extents);
        self.tick = state.tick;
        self.time = state.time;
        self.pending.clear();
        self.grid.rebuild(&self.system);
        self.statistics = Statistics {
            tick: self.tick,
            time: self.time,
            ..Statistics::measure(&self.system, Default::default(), self.space.volume())
        };
        info!(
            atoms = report.atoms_loaded,
            bonds = report.bonds_loaded,
            clean = report.is_clean(),
            "Imported state"
        );
        Ok(report)
    }

    /// Creates a simulation directly from a saved state.
    pub fn from_state(state: SimulationState) -> Result<(Self, LoadReport), EngineError> {
        let mut simulation = Self::new(state.config.clone())?;
        let report = simulation.import_state(state)?;
        Ok((simulation, report))
    }

    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        snapshot::write_json(&self.export_state(), path)?;
        info!(path = %path.display(), "Saved state");
        Ok(())
    }

    pub fn load(&mut self, path: &Path) -> Result<LoadReport, EngineError> {
        let state: SimulationState = snapshot::read_json(path)?;
        self.import_state(state)
    }
}
