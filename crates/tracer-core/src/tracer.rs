use std::time::Instant;

use crate::advect::{advect_level, AdvectStats, VerticalCoordinate};
use crate::comm::{Communicator, SerialComm};
use crate::config::TracerConfig;
use crate::error::{Result, TracerError};
use crate::exec::map_local_tiles;
use crate::field::TiledField;
use crate::geometry::{Centering, Geometry};
use crate::layout::TileLayout;
use crate::particle::{IdAllocator, ParticleLevel};
use crate::real::Real;
use crate::seed::seed_tile;

/// Tracer particles on a single-level tiled mesh.
pub struct TracerContainer<R: Real, C: Communicator = SerialComm> {
    pub config: TracerConfig,
    geom: Geometry<R>,
    levels: Vec<ParticleLevel<R>>,
    ids: IdAllocator,
    comm: C,
}

impl<R: Real> TracerContainer<R, SerialComm> {
    pub fn new(geom: Geometry<R>, layout: TileLayout, config: TracerConfig) -> Result<Self> {
        Self::with_comm(geom, layout, config, SerialComm)
    }
}

impl<R: Real, C: Communicator> TracerContainer<R, C> {
    pub fn with_comm(
        geom: Geometry<R>,
        layout: TileLayout,
        config: TracerConfig,
        comm: C,
    ) -> Result<Self> {
        config.validate()?;
        let domain = geom.domain();
        if let Some(b) = layout.boxes().iter().find(|b| domain.intersection(b) != Some(**b)) {
            return Err(TracerError::InvalidGeometry(format!(
                "tile {b} is not inside domain {domain}"
            )));
        }
        Ok(Self {
            config,
            geom,
            levels: vec![ParticleLevel::new(layout)],
            ids: IdAllocator::new(),
            comm,
        })
    }

    pub fn geometry(&self) -> &Geometry<R> {
        &self.geom
    }

    pub fn layout(&self) -> &TileLayout {
        self.levels[0].layout()
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, lev: usize) -> &ParticleLevel<R> {
        &self.levels[lev]
    }

    pub fn level_mut(&mut self, lev: usize) -> &mut ParticleLevel<R> {
        &mut self.levels[lev]
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    /// Total particles stored on this process, sentinels included.
    pub fn num_particles(&self) -> usize {
        self.levels.iter().map(ParticleLevel::len).sum()
    }

    /// Seed one column of tracers per local tile from a node-centered
    /// layer-height field and return how many were added here.
    ///
    /// Existing particles are kept. Height data that is not host readable is
    /// staged to host memory for the duration of each tile's seeding.
    pub fn init_particles(&mut self, z_height: &TiledField<R>) -> Result<usize> {
        const LEV: usize = 0;

        let level = &mut self.levels[LEV];
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

        let geom = &self.geom;
        let ids = &self.ids;
        let rank = self.comm.rank();
        let column = self.config.seed_column;
        let offset = self.config.seed_offset.map(R::of_f64);
        let layout = level.layout().clone();

        let counts = map_local_tiles(level.tiles_mut(), &layout, rank, |t, tile| {
            let height = z_height.fab(t).host_view();
            let host = seed_tile(
                layout.tile_box(t),
                geom,
                height.view(),
                column,
                offset,
                ids,
                rank,
            );
            tile.append(&host);
            host.len()
        });

        let seeded: usize = counts.iter().sum();
        if self.config.verbose > 0 {
            log::info!(
                "TracerContainer::init_particles() seeded {} particles in column i = {} on rank {} of {}",
                seeded,
                column,
                rank,
                self.comm.size()
            );
        }
        Ok(seeded)
    }

    /// Advance all tracers of level `lev` by one midpoint step of length `dt`
    /// through the face-centered velocity `umac`.
    ///
    /// Inputs are validated before any particle moves. See
    /// [`advect_level`] for the one-layer-per-step requirement on `dt`.
    pub fn advect_with_umac(
        &mut self,
        umac: [&TiledField<R>; 3],
        lev: usize,
        dt: R,
        vertical: VerticalCoordinate<'_, R>,
    ) -> Result<AdvectStats> {
        let start = Instant::now();
        let levels = self.levels.len();
        let level = self
            .levels
            .get_mut(lev)
            .ok_or(TracerError::LevelOutOfRange { level: lev, levels })?;

        let stats = advect_level(
            level,
            &self.geom,
            umac,
            dt,
            vertical,
            self.comm.rank(),
            self.config.check_layer_crossings,
        )?;

        if stats.multi_layer > 0 {
            log::warn!(
                "{} tracer(s) crossed more than one layer in a step of dt = {}; reduce dt",
                stats.multi_layer,
                dt
            );
        }

        if self.config.verbose > 1 {
            let elapsed = self.comm.max_f64(start.elapsed().as_secs_f64());
            if self.comm.is_io_rank() {
                log::info!("TracerContainer::advect_with_umac() time: {elapsed}");
            }
        }
        Ok(stats)
    }
}
