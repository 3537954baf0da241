//! Data-parallel loops over tiles and particles.
//!
//! With the `parallel` feature each tile is a rayon task and the particles of
//! a tile are split across workers as well. Without it the same closures run
//! in order. Every call returns only after all of its work has finished,
//! which is the barrier the two advection passes rely on.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::layout::TileLayout;
use crate::particle::{Particle, ParticleTile};
use crate::real::Real;

/// `f(tile_index, tile)` for every tile owned by `rank`, results in tile order.
pub(crate) fn map_local_tiles<R, T, F>(
    tiles: &mut [ParticleTile<R>],
    layout: &TileLayout,
    rank: i32,
    f: F,
) -> Vec<T>
where
    R: Real,
    T: Send,
    F: Fn(usize, &mut ParticleTile<R>) -> T + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        tiles
            .par_iter_mut()
            .enumerate()
            .filter(|(t, _)| layout.is_local(*t, rank))
            .map(|(t, tile)| f(t, tile))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        tiles
            .iter_mut()
            .enumerate()
            .filter(|(t, _)| layout.is_local(*t, rank))
            .map(|(t, tile)| f(t, tile))
            .collect()
    }
}

/// Apply `f` to every particle and sum what it returns.
pub(crate) fn map_reduce_particles<R, T, F>(particles: &mut [Particle<R>], f: F) -> T
where
    R: Real,
    T: Default + std::ops::Add<Output = T> + Send,
    F: Fn(&mut Particle<R>) -> T + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        particles.par_iter_mut().map(f).reduce(T::default, |a, b| a + b)
    }

    #[cfg(not(feature = "parallel"))]
    {
        particles.iter_mut().map(f).fold(T::default(), |a, b| a + b)
    }
}
