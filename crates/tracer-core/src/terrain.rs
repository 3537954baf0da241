//! Node-centered layer-height fields.
//!
//! `z(i, j, k)` is the physical height of the bottom of layer `k` in column
//! `(i, j)`; the top of the layer is `z(i, j, k + 1)`. With terrain-following
//! layers the spacing stretches with the local water depth:
//!
//! ```text
//! z = b + (s - b) * (k - k_lo) / n_z
//! ```
//!
//! for bottom elevation `b`, surface `s` and `n_z` layers.

use glam::IVec3;

use crate::field::{MemoryLocation, TiledField};
use crate::geometry::{Centering, Geometry};
use crate::layout::TileLayout;
use crate::real::Real;

/// Terrain-following layers between `bottom(x, y)` and a flat `surface`.
pub fn sigma_heights<R: Real>(
    geom: &Geometry<R>,
    layout: &TileLayout,
    n_grow: i32,
    location: MemoryLocation,
    bottom: impl Fn(R, R) -> R,
    surface: R,
) -> TiledField<R> {
    let lo = geom.domain().lo;
    let n_z = R::of_i32(geom.domain().size().z);
    TiledField::from_fn(layout, Centering::Node, n_grow, location, |iv: IVec3| {
        let [x, y, _] = geom.physical_position(iv, [R::ZERO; 3]);
        let b = bottom(x, y);
        let sigma = R::of_i32(iv.z - lo.z) / n_z;
        b + (surface - b) * sigma
    })
}

/// Layers that coincide with the mesh cells.
pub fn flat_heights<R: Real>(
    geom: &Geometry<R>,
    layout: &TileLayout,
    n_grow: i32,
    location: MemoryLocation,
) -> TiledField<R> {
    TiledField::from_fn(layout, Centering::Node, n_grow, location, |iv: IVec3| {
        geom.physical_position(iv, [R::ZERO; 3])[2]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::IndexBox;

    #[test]
    fn test_sigma_layers_span_bottom_to_surface() {
        let domain = IndexBox::from_size(IVec3::new(4, 1, 5));
        let geom = Geometry::<f64>::new(domain, [0.0; 3], [4.0, 1.0, 10.0]).unwrap();
        let layout = TileLayout::chop(domain, IVec3::splat(8));
        let z = sigma_heights(&geom, &layout, 0, MemoryLocation::Host, |x, _| -2.0 - x, 0.0);
        let v = z.fab(0).view();
        assert_eq!(v.get(IVec3::new(0, 0, 0)), -2.0);
        assert_eq!(v.get(IVec3::new(2, 0, 0)), -4.0);
        assert_eq!(v.get(IVec3::new(2, 0, 5)), 0.0);
        let thickness = v.get(IVec3::new(2, 0, 1)) - v.get(IVec3::new(2, 0, 0));
        assert!((thickness - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_flat_heights_follow_cells() {
        let domain = IndexBox::from_size(IVec3::new(2, 2, 4));
        let geom = Geometry::<f32>::new(domain, [0.0, 0.0, 1.0], [1.0, 1.0, 3.0]).unwrap();
        let layout = TileLayout::chop(domain, IVec3::splat(8));
        let z = flat_heights(&geom, &layout, 1, MemoryLocation::Host);
        let v = z.fab(0).view();
        assert_eq!(v.get(IVec3::new(0, 0, 0)), 1.0);
        assert_eq!(v.get(IVec3::new(1, 1, 2)), 2.0);
        assert_eq!(v.get(IVec3::new(0, 0, -1)), 0.5);
    }
}
