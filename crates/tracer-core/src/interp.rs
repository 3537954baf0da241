use glam::IVec3;

use crate::field::FabView;
use crate::real::Real;

/// Trilinear sample of a face-centered (MAC) velocity at `pos`.
///
/// Component `d` lives on the faces normal to axis `d`, so along `d` its
/// samples sit on cell boundaries and along the other two axes on cell
/// centers. Each component is interpolated from its own array over the eight
/// surrounding samples. `lo` is the lower corner of the index domain that
/// `plo` maps to.
///
/// The stencil reaches half a cell past the particle's cell, so the views
/// need one ghost layer for particles inside their tile.
#[inline]
pub fn mac_interpolate<R: Real>(
    pos: [R; 3],
    plo: [R; 3],
    dxi: [R; 3],
    lo: IVec3,
    umac: &[FabView<'_, R>; 3],
) -> [R; 3] {
    let mut v = [R::ZERO; 3];
    for d in 0..3 {
        let mut base = IVec3::ZERO;
        let mut frac = [R::ZERO; 3];
        for a in 0..3 {
            let shift = if a == d { R::ZERO } else { R::HALF };
            let x = (pos[a] - plo[a]) * dxi[a] - shift;
            let i = x.floor_index();
            frac[a] = x - R::of_i32(i);
            base[a] = i + lo[a];
        }

        let mut sum = R::ZERO;
        for kk in 0..2 {
            let wz = if kk == 0 { R::ONE - frac[2] } else { frac[2] };
            for jj in 0..2 {
                let wy = if jj == 0 { R::ONE - frac[1] } else { frac[1] };
                for ii in 0..2 {
                    let wx = if ii == 0 { R::ONE - frac[0] } else { frac[0] };
                    sum += wx * wy * wz * umac[d].get(base + IVec3::new(ii, jj, kk));
                }
            }
        }
        v[d] = sum;
    }
    v
}
