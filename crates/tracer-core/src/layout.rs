use glam::IVec3;

use crate::geometry::IndexBox;

/// Decomposition of the domain into disjoint tiles, each owned by one rank.
///
/// Fields and particle levels built on equal layouts are "on the same grids":
/// tile `i` of one lines up with tile `i` of the other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileLayout {
    boxes: Vec<IndexBox>,
    owners: Vec<i32>,
}

impl TileLayout {
    /// Chop `domain` into tiles of at most `max_tile_size` cells per axis,
    /// all owned by rank 0.
    pub fn chop(domain: IndexBox, max_tile_size: IVec3) -> Self {
        Self::from_boxes(domain.chop(max_tile_size))
    }

    pub fn from_boxes(boxes: Vec<IndexBox>) -> Self {
        let owners = vec![0; boxes.len()];
        Self { boxes, owners }
    }

    /// Round-robin ownership over `n_ranks` processes.
    pub fn distribute(mut self, n_ranks: i32) -> Self {
        let n_ranks = n_ranks.max(1);
        for (i, owner) in self.owners.iter_mut().enumerate() {
            *owner = i as i32 % n_ranks;
        }
        self
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn boxes(&self) -> &[IndexBox] {
        &self.boxes
    }

    pub fn tile_box(&self, tile: usize) -> IndexBox {
        self.boxes[tile]
    }

    pub fn owner(&self, tile: usize) -> i32 {
        self.owners[tile]
    }

    pub fn is_local(&self, tile: usize, rank: i32) -> bool {
        self.owners[tile] == rank
    }

    /// Indices of the tiles owned by `rank`.
    pub fn local_tiles(&self, rank: i32) -> impl Iterator<Item = usize> + '_ {
        self.owners
            .iter()
            .enumerate()
            .filter(move |(_, &o)| o == rank)
            .map(|(i, _)| i)
    }
}
