use crate::core::models::bond::{BondType, Polarity};
use crate::core::models::graph::{MoleculeChange, SplitOutcome};
use crate::core::models::ids::{AtomId, BondId, MoleculeId};
use crate::core::models::system::BrokenBond;

/// Why a bond disappeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakReason {
    /// The bond was stretched past the break threshold.
    Overstretched,
    /// The bond was removed by a command.
    Requested,
    /// One of its atoms was removed.
    AtomRemoved,
    /// Its molecule was fragmented.
    Fragmented,
}

/// A structural or physical event produced by a tick or a command.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationEvent {
    AtomAdded {
        atom: AtomId,
    },
    AtomRemoved {
        atom: AtomId,
    },
    Collision {
        a: AtomId,
        b: AtomId,
        impulse: f64,
    },
    BondFormed {
        bond: BondId,
        a: AtomId,
        b: AtomId,
        bond_type: BondType,
        polarity: Polarity,
    },
    BondBroken {
        bond: BondId,
        a: AtomId,
        b: AtomId,
        reason: BreakReason,
    },
    MoleculeCreated {
        molecule: MoleculeId,
    },
    MoleculeExtended {
        molecule: MoleculeId,
        atom: AtomId,
    },
    MoleculesMerged {
        survivor: MoleculeId,
        absorbed: MoleculeId,
    },
    RingClosed {
        molecule: MoleculeId,
    },
    MoleculeShrunk {
        molecule: MoleculeId,
        released: Vec<AtomId>,
    },
    MoleculeSplit {
        original: MoleculeId,
        fragments: Vec<MoleculeId>,
    },
    MoleculeDissolved {
        molecule: MoleculeId,
    },
}

impl From<MoleculeChange> for SimulationEvent {
    fn from(change: MoleculeChange) -> Self {
        match change {
            MoleculeChange::Created { molecule } => Self::MoleculeCreated { molecule },
            MoleculeChange::Extended { molecule, atom } => Self::MoleculeExtended { molecule, atom },
            MoleculeChange::Merged { survivor, absorbed } => Self::MoleculesMerged { survivor, absorbed },
            MoleculeChange::RingClosed { molecule } => Self::RingClosed { molecule },
        }
    }
}

impl SimulationEvent {
    /// The molecule event for a split outcome; an intact molecule produces none.
    pub fn from_split(outcome: &SplitOutcome) -> Option<Self> {
        match outcome {
            SplitOutcome::Intact { .. } => None,
            SplitOutcome::Shrunk { molecule, released } => Some(Self::MoleculeShrunk {
                molecule: *molecule,
                released: released.clone(),
            }),
            SplitOutcome::Split {
                original,
                fragments,
                ..
            } => Some(Self::MoleculeSplit {
                original: *original,
                fragments: fragments.clone(),
            }),
            SplitOutcome::Dissolved { molecule, .. } => Some(Self::MoleculeDissolved {
                molecule: *molecule,
            }),
        }
    }

    /// The bond event and, if the partition changed, the molecule event for a broken bond.
    pub fn from_broken_bond(broken: &BrokenBond, reason: BreakReason) -> Vec<Self> {
        let (a, b) = broken.bond.key();
        let mut events = vec![Self::BondBroken {
            bond: broken.id,
            a,
            b,
            reason,
        }];
        events.extend(Self::from_split(&broken.outcome));
        events
    }
}

/// Running totals of the events seen over a number of ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventTally {
    pub collisions: usize,
    pub bonds_formed: usize,
    pub bonds_broken: usize,
    pub molecules_created: usize,
    pub molecules_merged: usize,
    pub molecules_split: usize,
    pub molecules_dissolved: usize,
}

impl EventTally {
    pub fn record(&mut self, event: &SimulationEvent) {
        match event {
            SimulationEvent::Collision { .. } => self.collisions += 1,
            SimulationEvent::BondFormed { .. } => self.bonds_formed += 1,
            SimulationEvent::BondBroken { .. } => self.bonds_broken += 1,
            SimulationEvent::MoleculeCreated { .. } => self.molecules_created += 1,
            SimulationEvent::MoleculesMerged { .. } => self.molecules_merged += 1,
            SimulationEvent::MoleculeSplit { .. } => self.molecules_split += 1,
            SimulationEvent::MoleculeDissolved { .. } => self.molecules_dissolved += 1,
            _ => {}
        }
    }

    pub fn record_all<'a>(&mut self, events: impl IntoIterator<Item = &'a SimulationEvent>) {
        for event in events {
            self.record(event);
        }
    }
}
