use crate::core::models::ids::AtomId;
use crate::core::models::system::MolecularSystem;
use nalgebra::Point3;
use std::collections::HashMap;

type CellKey = (i64, i64, i64);

/// Uniform hash grid that buckets atoms by position for neighbor queries.
///
/// The grid is rebuilt from scratch every tick. As long as the cell size is at least the
/// largest interaction range, every pair of atoms within that range lies in the same or
/// an adjacent cell, so the 27-cell neighborhood never misses an interacting pair.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<AtomId>>,
    atom_cells: HashMap<AtomId, CellKey>,
}

impl SpatialGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            atom_cells: HashMap::new(),
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Changes the cell size. Takes effect at the next rebuild.
    pub fn set_cell_size(&mut self, cell_size: f64) {
        self.cell_size = cell_size;
    }

    #[inline]
    pub fn cell_of(&self, position: &Point3<f64>) -> CellKey {
        (
            (position.x / self.cell_size).floor() as i64,
            (position.y / self.cell_size).floor() as i64,
            (position.z / self.cell_size).floor() as i64,
        )
    }

    /// Re-buckets every atom of `system` by its current position.
    pub fn rebuild(&mut self, system: &MolecularSystem) {
        self.cells.clear();
        self.atom_cells.clear();
        for (id, atom) in system.atoms_iter() {
            let key = self.cell_of(&atom.position);
            self.cells.entry(key).or_default().push(id);
            self.atom_cells.insert(id, key);
        }
    }

    pub fn len(&self) -> usize {
        self.atom_cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atom_cells.is_empty()
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    fn neighborhood(key: CellKey) -> impl Iterator<Item = CellKey> {
        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| (-1..=1).map(move |dz| (key.0 + dx, key.1 + dy, key.2 + dz)))
        })
    }

    /// Atoms in the 27 cells around `id`, excluding `id` itself.
    ///
    /// Returns an empty list for atoms that were not present at the last rebuild.
    pub fn neighbors(&self, id: AtomId) -> Vec<AtomId> {
        let Some(&key) = self.atom_cells.get(&id) else {
            return Vec::new();
        };
        let mut result: Vec<AtomId> = Self::neighborhood(key)
            .filter_map(|cell| self.cells.get(&cell))
            .flatten()
            .copied()
            .filter(|&other| other != id)
            .collect();
        result.sort_unstable();
        result
    }

    /// Every unordered pair of atoms in the same or adjacent cells, each listed once as
    /// `(a, b)` with `a < b`, in ascending order.
    pub fn candidate_pairs(&self) -> Vec<(AtomId, AtomId)> {
        let mut pairs = Vec::new();
        for (&key, members) in &self.cells {
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    pairs.push(if a < b { (a, b) } else { (b, a) });
                }
            }
            for neighbor in Self::neighborhood(key).filter(|&cell| cell > key) {
                let Some(others) = self.cells.get(&neighbor) else {
                    continue;
                };
                for &a in members {
                    for &b in others {
                        pairs.push(if a < b { (a, b) } else { (b, a) });
                    }
                }
            }
        }
        pairs.sort_unstable();
        pairs
    }
}
