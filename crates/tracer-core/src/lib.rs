//! Lagrangian tracer particles for a structured-mesh solver with a
//! terrain-following vertical coordinate.
//!
//! [`TracerContainer::init_particles`] seeds one vertical column of tracers
//! per tile from a layer-height field, and
//! [`TracerContainer::advect_with_umac`] moves them through a face-centered
//! velocity field with a midpoint step while tracking the terrain layer each
//! tracer is in.

pub mod advect;
pub mod comm;
pub mod config;
pub mod error;
mod exec;
pub mod field;
pub mod geometry;
pub mod interp;
pub mod layout;
pub mod math;
pub mod particle;
pub mod real;
pub mod seed;
pub mod terrain;
pub mod tracer;
pub mod velocity;

pub use advect::{AdvectStats, VerticalCoordinate};
pub use config::TracerConfig;
pub use error::{Result, TracerError};
pub use field::{MemoryLocation, TiledField};
pub use geometry::{Centering, Geometry, IndexBox};
pub use layout::TileLayout;
pub use particle::Particle;
pub use real::Real;
pub use tracer::TracerContainer;
