use std::sync::atomic::{AtomicI64, Ordering};

use crate::layout::TileLayout;
use crate::real::Real;

/// A massless tracer.
///
/// `rdata` is scratch shared by the two advection passes. After the
/// predictor it holds the position at the start of the step; after the
/// corrector it holds the velocity sampled at the midpoint. A freshly seeded
/// particle has its position there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle<R> {
    /// Global id, `<= 0` marks an inactive particle.
    pub id: i64,
    /// Rank that created the particle.
    pub cpu: i32,
    pub pos: [R; 3],
    pub rdata: [R; 3],
    /// Terrain-following layer the particle is in.
    pub k: i32,
}

impl<R: Real> Particle<R> {
    pub fn new(id: i64, cpu: i32, pos: [R; 3], k: i32) -> Self {
        Self {
            id,
            cpu,
            pos,
            rdata: pos,
            k,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.id > 0
    }

    /// Meaningful between the predictor and the corrector.
    pub fn old_position(&self) -> [R; 3] {
        self.rdata
    }

    /// Meaningful after the corrector.
    pub fn last_velocity(&self) -> [R; 3] {
        self.rdata
    }
}

/// Particles stored with one tile.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParticleTile<R> {
    particles: Vec<Particle<R>>,
}

impl<R: Real> ParticleTile<R> {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
        }
    }

    /// Grow the tile and bulk-copy `host` into the new tail.
    pub fn append(&mut self, host: &[Particle<R>]) {
        let old_size = self.particles.len();
        self.particles
            .resize(old_size + host.len(), Particle::new(0, 0, [R::ZERO; 3], 0));
        self.particles[old_size..].copy_from_slice(host);
    }

    pub fn push(&mut self, p: Particle<R>) {
        self.particles.push(p);
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn num_valid(&self) -> usize {
        self.particles.iter().filter(|p| p.is_valid()).count()
    }

    pub fn as_slice(&self) -> &[Particle<R>] {
        &self.particles
    }

    pub fn as_mut_slice(&mut self) -> &mut [Particle<R>] {
        &mut self.particles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle<R>> {
        self.particles.iter()
    }
}

/// All tiles of one refinement level.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleLevel<R> {
    layout: TileLayout,
    tiles: Vec<ParticleTile<R>>,
}

impl<R: Real> ParticleLevel<R> {
    pub fn new(layout: TileLayout) -> Self {
        let tiles = (0..layout.len()).map(|_| ParticleTile::new()).collect();
        Self { layout, tiles }
    }

    pub fn layout(&self) -> &TileLayout {
        &self.layout
    }

    pub fn tile(&self, tile: usize) -> &ParticleTile<R> {
        &self.tiles[tile]
    }

    pub fn tile_mut(&mut self, tile: usize) -> &mut ParticleTile<R> {
        &mut self.tiles[tile]
    }

    pub fn tiles(&self) -> &[ParticleTile<R>] {
        &self.tiles
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut [ParticleTile<R>] {
        &mut self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.iter().map(ParticleTile::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.iter().all(ParticleTile::is_empty)
    }

    pub fn num_valid(&self) -> usize {
        self.tiles.iter().map(ParticleTile::num_valid).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle<R>> + '_ {
        self.tiles.iter().flat_map(ParticleTile::iter)
    }
}

/// Process-wide source of unique particle ids, starting at 1.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicI64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first.max(1)),
        }
    }

    pub fn next_id(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The id the next call to [`next_id`](Self::next_id) would return.
    pub fn peek(&self) -> i64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_append_keeps_existing_particles() {
        let mut tile = ParticleTile::<f64>::new();
        tile.push(Particle::new(7, 0, [1.0, 2.0, 3.0], 2));
        let fresh = [
            Particle::new(8, 0, [4.0, 5.0, 6.0], 0),
            Particle::new(9, 0, [7.0, 8.0, 9.0], 1),
        ];
        tile.append(&fresh);
        assert_eq!(tile.len(), 3);
        assert_eq!(tile.as_slice()[0].id, 7);
        assert_eq!(&tile.as_slice()[1..], &fresh);
    }

    #[test]
    fn test_sentinel_is_invalid() {
        let mut tile = ParticleTile::<f32>::new();
        tile.push(Particle::new(0, 0, [0.0; 3], 0));
        tile.push(Particle::new(-3, 0, [0.0; 3], 0));
        tile.push(Particle::new(1, 0, [0.0; 3], 0));
        assert_eq!(tile.num_valid(), 1);
    }

    #[test]
    fn test_seeded_scratch_holds_position() {
        let p = Particle::new(1, 0, [0.5_f64, 1.5, 2.5], 3);
        assert_eq!(p.old_position(), p.pos);
    }

    #[test]
    fn test_id_allocator_unique_across_threads() {
        let ids = IdAllocator::new();
        let all: Vec<i64> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| (0..250).map(|_| ids.next_id()).collect::<Vec<_>>()))
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });
        let unique: HashSet<i64> = all.iter().copied().collect();
        assert_eq!(unique.len(), 1000);
        assert!(all.iter().all(|&id| id > 0));
        assert_eq!(ids.peek(), 1001);
    }
}
