use super::ids::{AtomId, MoleculeId};
use std::collections::{BTreeSet, VecDeque};

/// How the molecule partition changed when a bond was added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoleculeChange {
    /// Two unaffiliated atoms formed a new molecule.
    Created { molecule: MoleculeId },
    /// An unaffiliated atom joined an existing molecule.
    Extended { molecule: MoleculeId, atom: AtomId },
    /// Two molecules were joined; `absorbed` no longer exists.
    Merged {
        survivor: MoleculeId,
        absorbed: MoleculeId,
    },
    /// The bond connected two atoms of the same molecule.
    RingClosed { molecule: MoleculeId },
}

impl MoleculeChange {
    /// The molecule that holds the new bond.
    pub fn molecule(&self) -> MoleculeId {
        match self {
            Self::Created { molecule }
            | Self::Extended { molecule, .. }
            | Self::RingClosed { molecule } => *molecule,
            Self::Merged { survivor, .. } => *survivor,
        }
    }
}

/// How the molecule partition changed when a bond was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitOutcome {
    /// The molecule is still connected.
    Intact { molecule: MoleculeId },
    /// Single atoms broke away and were released; the rest stays in `molecule`.
    Shrunk {
        molecule: MoleculeId,
        released: Vec<AtomId>,
    },
    /// The molecule fell apart into several multi-atom fragments, each a new molecule.
    Split {
        original: MoleculeId,
        fragments: Vec<MoleculeId>,
        released: Vec<AtomId>,
    },
    /// No multi-atom component remains; every atom was released.
    Dissolved {
        molecule: MoleculeId,
        released: Vec<AtomId>,
    },
}

impl SplitOutcome {
    pub fn released(&self) -> &[AtomId] {
        match self {
            Self::Intact { .. } => &[],
            Self::Shrunk { released, .. }
            | Self::Split { released, .. }
            | Self::Dissolved { released, .. } => released,
        }
    }
}

/// Picks the molecule that survives a merge: the one with more atoms, or `first` on a tie.
#[inline]
pub fn merge_survivor(
    first: (MoleculeId, usize),
    second: (MoleculeId, usize),
) -> (MoleculeId, MoleculeId) {
    if second.1 > first.1 {
        (second.0, first.0)
    } else {
        (first.0, second.0)
    }
}

/// Computes the connected components of `members` using breadth-first search.
///
/// Only edges between members are followed, so the cost is bounded by the size of the
/// molecule being re-evaluated rather than by the whole system. Components are returned
/// largest first, ties broken by their smallest atom id.
///
/// # Arguments
///
/// * `members` - The atoms to partition.
/// * `neighbors` - Returns the bonded partners of an atom.
pub fn connected_components<'a, F>(members: &BTreeSet<AtomId>, neighbors: F) -> Vec<BTreeSet<AtomId>>
where
    F: Fn(AtomId) -> &'a [AtomId],
{
    let mut unvisited = members.clone();
    let mut components = Vec::new();

    while let Some(seed) = unvisited.pop_first() {
        let mut component = BTreeSet::from([seed]);
        let mut queue = VecDeque::from([seed]);

        while let Some(current) = queue.pop_front() {
            for &next in neighbors(current) {
                if unvisited.remove(&next) {
                    component.insert(next);
                    queue.push_back(next);
                }
            }
        }
        components.push(component);
    }

    components.sort_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then_with(|| a.iter().next().cmp(&b.iter().next()))
    });
    components
}
