use glam::IVec3;

use crate::field::{MemoryLocation, TiledField};
use crate::geometry::{Centering, Geometry};
use crate::layout::TileLayout;
use crate::real::Real;

/// Face-centered velocity with component `d` equal to `f(d, x)` at the
/// center of each face normal to axis `d`.
pub fn face_velocity<R: Real>(
    geom: &Geometry<R>,
    layout: &TileLayout,
    n_grow: i32,
    location: MemoryLocation,
    f: impl Fn(usize, [R; 3]) -> R,
) -> [TiledField<R>; 3] {
    let component = |d: usize| {
        let mut offset = [R::HALF; 3];
        offset[d] = R::ZERO;
        TiledField::from_fn(layout, Centering::Face(d), n_grow, location, |iv: IVec3| {
            f(d, geom.physical_position(iv, offset))
        })
    };
    [component(0), component(1), component(2)]
}

pub fn uniform<R: Real>(
    geom: &Geometry<R>,
    layout: &TileLayout,
    n_grow: i32,
    location: MemoryLocation,
    v: [R; 3],
) -> [TiledField<R>; 3] {
    face_velocity(geom, layout, n_grow, location, |d, _| v[d])
}
