//! Seed a column of terrain-following tracers and advect them through a
//! prescribed velocity field.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use glam::{DVec3, IVec3};
use log::info;
use serde::Serialize;
use tracer_core::field::MemoryLocation;
use tracer_core::math::LinearTable;
use tracer_core::terrain::{flat_heights, sigma_heights};
use tracer_core::velocity::face_velocity;
use tracer_core::{
    AdvectStats, Geometry, IndexBox, Real, TileLayout, TracerConfig, TracerContainer,
    VerticalCoordinate,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Terrain-following tracer seeding and advection", long_about = None)]
struct Args {
    /// Cells along x, y and z
    #[arg(long, num_args = 3, value_names = ["NX", "NY", "NZ"], default_values_t = [16, 8, 10])]
    cells: Vec<i32>,

    /// Largest tile edge, in cells
    #[arg(long, default_value_t = 8)]
    max_tile: i32,

    /// Physical extent along x, y and z [m]
    #[arg(long, num_args = 3, default_values_t = [1600.0, 800.0, 50.0])]
    extent: Vec<f64>,

    /// Water depth at x = 0 and at the far end; the bottom is linear in between [m]
    #[arg(long, num_args = 2, default_values_t = [50.0, 20.0])]
    depth: Vec<f64>,

    /// Cell-aligned layers instead of terrain-following ones
    #[arg(long)]
    flat: bool,

    /// Velocity u, v, w [m/s]
    #[arg(long, num_args = 3, allow_negative_numbers = true, default_values_t = [1.0, 0.0, 0.0])]
    velocity: Vec<f64>,

    /// Extra horizontal velocity per metre of height above the bottom of the domain [1/s]
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    shear: f64,

    #[arg(long, default_value_t = 20)]
    steps: usize,

    /// Time step [s]
    #[arg(long, default_value_t = 10.0)]
    dt: f64,

    /// Where the mesh fields live
    #[arg(long, value_enum, default_value_t = Memory::Host)]
    memory: Memory,

    /// Tracer settings (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run in single precision
    #[arg(long)]
    f32: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Raise tracer verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Memory {
    Host,
    Pinned,
    Device,
    Managed,
}

impl From<Memory> for MemoryLocation {
    fn from(m: Memory) -> Self {
        match m {
            Memory::Host => MemoryLocation::Host,
            Memory::Pinned => MemoryLocation::Pinned,
            Memory::Device => MemoryLocation::Device,
            Memory::Managed => MemoryLocation::Managed,
        }
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    seeded: usize,
    steps: usize,
    time: f64,
    mean_displacement: [f64; 3],
    max_displacement: f64,
    layers: Option<(i32, i32)>,
    totals: AdvectStats,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<TracerConfig>(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => TracerConfig::default(),
    };
    config.verbose = config.verbose.max(u32::from(args.verbose));

    let summary = if args.f32 {
        run::<f32>(&args, config)?
    } else {
        run::<f64>(&args, config)?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let [dx, dy, dz] = summary.mean_displacement;
        println!(
            "{} tracers, {} steps to t = {} s: mean displacement ({dx:.3}, {dy:.3}, {dz:.3}) m, max {:.3} m",
            summary.seeded, summary.steps, summary.time, summary.max_displacement
        );
        println!(
            "layer changes: {} up, {} down, {} skipped a layer",
            summary.totals.moved_up, summary.totals.moved_down, summary.totals.multi_layer
        );
    }
    Ok(())
}

fn run<R: Real>(args: &Args, config: TracerConfig) -> Result<Summary> {
    let cells = IVec3::from_slice(&args.cells);
    if cells.min_element() < 1 || args.max_tile < 1 {
        bail!("cell counts and tile size must be positive");
    }
    let extent = DVec3::from_slice(&args.extent);
    let (near, far) = (args.depth[0], args.depth[1]);
    if near <= 0.0 || far <= 0.0 || near.max(far) > extent.z {
        bail!("depths must lie in (0, {}]", extent.z);
    }
    if !(args.dt > 0.0) {
        bail!("dt must be positive, got {}", args.dt);
    }

    let domain = IndexBox::from_size(cells);
    let geom = Geometry::new(
        domain,
        [R::ZERO; 3],
        [extent.x, extent.y, extent.z].map(R::of_f64),
    )?;
    let layout = TileLayout::chop(domain, IVec3::splat(args.max_tile));
    let location = MemoryLocation::from(args.memory);

    // Tracers stay in the tile they were seeded in, so the ghost region has
    // to hold every stencil they touch over the whole run.
    let velocity = DVec3::from_slice(&args.velocity);
    let speed = velocity.abs() + DVec3::new(args.shear.abs() * extent.z, 0.0, 0.0);
    let travel = speed * args.dt * args.steps as f64 / (extent / cells.as_dvec3());
    let n_grow = travel.max_element().ceil() as i32 + 2;

    let surface = R::of_f64(extent.z);
    let xs = [R::ZERO, R::of_f64(extent.x)];
    let bottom = [surface - R::of_f64(near), surface - R::of_f64(far)];
    let profile = LinearTable::new(&xs, &bottom)?;

    let z_height = if args.flat {
        flat_heights(&geom, &layout, n_grow, location)
    } else {
        sigma_heights(
            &geom,
            &layout,
            n_grow,
            location,
            |x, _| profile.eval(x),
            surface,
        )
    };

    let v = velocity.to_array().map(R::of_f64);
    let shear = R::of_f64(args.shear);
    let umac = face_velocity(&geom, &layout, n_grow, location, |d, x| {
        if d == 0 {
            v[0] + shear * x[2]
        } else {
            v[d]
        }
    });

    let mut tracers = TracerContainer::new(geom, layout, config)?;
    let seeded = tracers.init_particles(&z_height)?;
    info!(
        "seeded {seeded} tracers on {} tiles, {} ghost cells",
        tracers.layout().len(),
        n_grow
    );
    let start: Vec<DVec3> = tracers.level(0).iter().map(|p| to_dvec3(p.pos)).collect();

    let dt = R::of_f64(args.dt);
    let vertical = VerticalCoordinate::from_flag(!args.flat, &z_height);
    let mut totals = AdvectStats::default();
    for step in 0..args.steps {
        let stats = tracers.advect_with_umac([&umac[0], &umac[1], &umac[2]], 0, dt, vertical)?;
        log::debug!("step {step}: {stats:?}");
        totals = totals + stats;
    }

    let displacement: Vec<DVec3> = tracers
        .level(0)
        .iter()
        .zip(&start)
        .map(|(p, s)| to_dvec3(p.pos) - *s)
        .collect();
    let mean = if displacement.is_empty() {
        DVec3::ZERO
    } else {
        displacement.iter().sum::<DVec3>() / displacement.len() as f64
    };
    let max_displacement = displacement.iter().map(|d| d.length()).fold(0.0, f64::max);
    let layers = tracers
        .level(0)
        .iter()
        .map(|p| p.k)
        .fold(None, |acc: Option<(i32, i32)>, k| match acc {
            None => Some((k, k)),
            Some((lo, hi)) => Some((lo.min(k), hi.max(k))),
        });

    Ok(Summary {
        seeded,
        steps: args.steps,
        time: args.dt * args.steps as f64,
        mean_displacement: mean.to_array(),
        max_displacement,
        layers,
        totals,
    })
}

fn to_dvec3<R: Real>(pos: [R; 3]) -> DVec3 {
    DVec3::new(pos[0].as_f64(), pos[1].as_f64(), pos[2].as_f64())
}
