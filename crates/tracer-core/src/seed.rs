use glam::IVec3;

use crate::field::FabView;
use crate::geometry::{Geometry, IndexBox};
use crate::particle::{IdAllocator, Particle};
use crate::real::Real;

/// Particles for one tile.
///
/// Only cells whose first index equals `column` are seeded, giving one
/// vertical column of tracers per tile that contains it. Each particle sits
/// at `offset` within its cell horizontally and at the same fraction of the
/// terrain layer `[z(i, j, k), z(i, j, k + 1)]` vertically, and starts in
/// layer `k`.
///
/// `z_height` must be host readable.
pub fn seed_tile<R: Real>(
    tile_box: IndexBox,
    geom: &Geometry<R>,
    z_height: FabView<'_, R>,
    column: i32,
    offset: [R; 3],
    ids: &IdAllocator,
    rank: i32,
) -> Vec<Particle<R>> {
    tile_box
        .cells()
        .filter(|iv| iv.x == column)
        .map(|iv| {
            let [x, y, _] = geom.physical_position(iv, offset);
            let z_lo = z_height.get(iv);
            let z_hi = z_height.get(iv + IVec3::Z);
            let z = z_lo + offset[2] * (z_hi - z_lo);
            Particle::new(ids.next_id(), rank, [x, y, z], iv.z)
        })
        .collect()
}
