//! Midpoint (RK2) advection of tracers through a staggered velocity field.
//!
//! One step is two full sweeps over every local tile:
//!
//! | pass      | samples `v` at   | `pos` becomes          | `rdata` becomes |
//! |-----------|------------------|------------------------|-----------------|
//! | predictor | `pos`            | `pos + dt/2 * v`       | start position  |
//! | corrector | half-step `pos`  | `rdata + dt * v`       | `v`             |
//!
//! The corrector then moves the layer index `k` by at most one. The first
//! sweep finishes on every tile before the second starts.

use std::ops::Add;

use glam::IVec3;
use serde::Serialize;

use crate::error::{Result, TracerError};
use crate::exec::{map_local_tiles, map_reduce_particles};
use crate::field::{FabView, TiledField};
use crate::geometry::{Centering, Geometry};
use crate::interp::mac_interpolate;
use crate::particle::{Particle, ParticleLevel};
use crate::real::Real;

/// How layer bounds are found when updating a particle's `k`.
#[derive(Clone, Copy, Debug)]
pub enum VerticalCoordinate<'a, R: Real> {
    /// Uniform layers: layer `k` spans `[k * dz, (k + 1) * dz]`.
    Flat,
    /// Terrain-following layers: layer `k` spans `[z(i, j, k), z(i, j, k + 1)]`
    /// of this node-centered height field.
    Terrain(&'a TiledField<R>),
}

impl<'a, R: Real> VerticalCoordinate<'a, R> {
    pub fn from_flag(use_terrain: bool, z_height: &'a TiledField<R>) -> Self {
        if use_terrain {
            VerticalCoordinate::Terrain(z_height)
        } else {
            VerticalCoordinate::Flat
        }
    }
}

/// Per-step counts, summed over the local tiles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AdvectStats {
    /// Valid particles moved.
    pub advected: usize,
    pub moved_up: usize,
    pub moved_down: usize,
    /// Particles still outside their layer after the one-layer adjustment.
    /// Only counted with `check_layer_crossings`.
    pub multi_layer: usize,
}

impl Add for AdvectStats {
    type Output = AdvectStats;

    fn add(self, rhs: AdvectStats) -> AdvectStats {
        AdvectStats {
            advected: self.advected + rhs.advected,
            moved_up: self.moved_up + rhs.moved_up,
            moved_down: self.moved_down + rhs.moved_down,
            multi_layer: self.multi_layer + rhs.multi_layer,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pass {
    Predictor,
    Corrector,
}

/// Field views and constants one tile's particles need.
struct TileKernel<'a, R: Real> {
    geom: &'a Geometry<R>,
    dt: R,
    umac: [FabView<'a, R>; 3],
    z_height: Option<FabView<'a, R>>,
    check_layer_crossings: bool,
}

impl<'a, R: Real> TileKernel<'a, R> {
    #[inline]
    fn velocity(&self, pos: [R; 3]) -> [R; 3] {
        let geom = self.geom;
        mac_interpolate(
            pos,
            geom.prob_lo(),
            geom.inv_cell_size(),
            geom.domain().lo,
            &self.umac,
        )
    }

    fn predict(&self, p: &mut Particle<R>) {
        let v = self.velocity(p.pos);
        let half_dt = R::HALF * self.dt;
        for d in 0..3 {
            p.rdata[d] = p.pos[d];
            p.pos[d] += half_dt * v[d];
        }
    }

    fn correct(&self, p: &mut Particle<R>) -> AdvectStats {
        let v = self.velocity(p.pos);
        for d in 0..3 {
            p.pos[d] = p.rdata[d] + self.dt * v[d];
            p.rdata[d] = v[d];
        }

        let mut stats = AdvectStats {
            advected: 1,
            ..AdvectStats::default()
        };
        let mut iv = self.geom.cell_index(p.pos);
        iv.z = p.k;
        let (z_lo, z_hi) = self.layer_bounds(iv);
        let z = p.pos[2];
        // A particle exactly on the top face stays; one exactly on the bottom
        // face drops a layer.
        if z > z_hi {
            p.k += 1;
            stats.moved_up = 1;
        } else if z <= z_lo {
            p.k -= 1;
            stats.moved_down = 1;
        }

        if self.check_layer_crossings && p.k != iv.z {
            iv.z = p.k;
            if self.has_layer(iv) {
                let (z_lo, z_hi) = self.layer_bounds(iv);
                if z > z_hi || z <= z_lo {
                    stats.multi_layer = 1;
                }
            }
        }
        stats
    }

    #[inline]
    fn layer_bounds(&self, iv: IVec3) -> (R, R) {
        match &self.z_height {
            Some(z) => (z.get(iv), z.get(iv + IVec3::Z)),
            None => {
                let dz = self.geom.cell_size()[2];
                (R::of_i32(iv.z) * dz, R::of_i32(iv.z + 1) * dz)
            }
        }
    }

    fn has_layer(&self, iv: IVec3) -> bool {
        match &self.z_height {
            Some(z) => {
                let bx = z.index_box();
                bx.contains(iv) && bx.contains(iv + IVec3::Z)
            }
            None => true,
        }
    }
}

/// Reject inputs the advection kernels cannot run on.
pub fn check_advect_inputs<R: Real>(
    level: &ParticleLevel<R>,
    umac: [&TiledField<R>; 3],
    dt: R,
    vertical: VerticalCoordinate<'_, R>,
) -> Result<()> {
    const NAMES: [&str; 3] = ["umac[0]", "umac[1]", "umac[2]"];

    for d in 0..3 {
        if !umac[d].is_on(level.layout()) {
            return Err(TracerError::LayoutMismatch { field: NAMES[d] });
        }
        if umac[d].centering() != Centering::Face(d) {
            return Err(TracerError::CenteringMismatch {
                field: NAMES[d],
                expected: Centering::Face(d).to_string(),
                found: umac[d].centering().to_string(),
            });
        }
        if umac[d].n_grow() < 1 {
            return Err(TracerError::InsufficientGhostCells {
                field: NAMES[d],
                n_grow: umac[d].n_grow(),
                required: 1,
            });
        }
    }
    for d in 0..3 {
        if umac[d].contains_non_finite() {
            return Err(TracerError::NonFiniteField { field: NAMES[d] });
        }
    }
    if !dt.is_finite() {
        return Err(TracerError::InvalidTimeStep { dt: dt.as_f64() });
    }
    if let VerticalCoordinate::Terrain(z_height) = vertical {
        if !z_height.is_on(level.layout()) {
            return Err(TracerError::LayoutMismatch { field: "z_height" });
        }
        if z_height.centering() != Centering::Node {
            return Err(TracerError::CenteringMismatch {
                field: "z_height",
                expected: Centering::Node.to_string(),
                found: z_height.centering().to_string(),
            });
        }
        // A particle may end the step one cell outside its tile.
        if z_height.n_grow() < 1 {
            return Err(TracerError::InsufficientGhostCells {
                field: "z_height",
                n_grow: z_height.n_grow(),
                required: 1,
            });
        }
    }
    Ok(())
}

/// Advance every valid particle of `level` owned by `rank` by `dt`.
///
/// The layer index moves by at most one per call, so `dt` must be small
/// enough that no particle crosses more than one layer in a step. That is
/// not enforced; `check_layer_crossings` only counts violations.
pub fn advect_level<R: Real>(
    level: &mut ParticleLevel<R>,
    geom: &Geometry<R>,
    umac: [&TiledField<R>; 3],
    dt: R,
    vertical: VerticalCoordinate<'_, R>,
    rank: i32,
    check_layer_crossings: bool,
) -> Result<AdvectStats> {
    check_advect_inputs(level, umac, dt, vertical)?;

    let layout = level.layout().clone();

    let mut stats = AdvectStats::default();
    for pass in [Pass::Predictor, Pass::Corrector] {
        let per_tile = map_local_tiles(level.tiles_mut(), &layout, rank, |t, tile| {
            let kernel = TileKernel {
                geom,
                dt,
                umac: [umac[0].fab(t).view(), umac[1].fab(t).view(), umac[2].fab(t).view()],
                z_height: match vertical {
                    VerticalCoordinate::Terrain(z) => Some(z.fab(t).view()),
                    VerticalCoordinate::Flat => None,
                },
                check_layer_crossings,
            };
            map_reduce_particles(tile.as_mut_slice(), |p| {
                if !p.is_valid() {
                    return AdvectStats::default();
                }
                match pass {
                    Pass::Predictor => {
                        kernel.predict(p);
                        AdvectStats::default()
                    }
                    Pass::Corrector => kernel.correct(p),
                }
            })
        });
        stats = per_tile.into_iter().fold(stats, Add::add);
    }
    Ok(stats)
}
