use std::collections::HashSet;

use glam::IVec3;
use tracer_core::field::{MemoryLocation, TiledField};
use tracer_core::geometry::{Centering, Geometry, IndexBox};
use tracer_core::layout::TileLayout;
use tracer_core::terrain::sigma_heights;
use tracer_core::{TracerConfig, TracerContainer, TracerError};

const H: f64 = -3.0;
const T: f64 = 0.5;

fn flat_terrain(layout: &TileLayout, location: MemoryLocation) -> TiledField<f64> {
    TiledField::from_fn(layout, Centering::Node, 1, location, |iv| H + iv.z as f64 * T)
}

fn container(size: IVec3, max_tile: IVec3) -> TracerContainer<f64> {
    let domain = IndexBox::from_size(size);
    let hi = [size.x as f64, size.y as f64, size.z as f64];
    let geom = Geometry::new(domain, [0.0; 3], hi).unwrap();
    let layout = TileLayout::chop(domain, max_tile);
    TracerContainer::new(geom, layout, TracerConfig::default()).unwrap()
}

#[test]
fn test_seed_flat_terrain_placement() {
    let mut tracers = container(IVec3::new(6, 4, 5), IVec3::splat(8));
    let z = flat_terrain(tracers.layout(), MemoryLocation::Host);
    tracers.init_particles(&z).unwrap();

    for p in tracers.level(0).iter() {
        let j = (p.pos[1] - 0.5).round() as i32;
        assert_eq!(p.pos[0], 3.5, "x must be the center of column i = 3");
        assert_eq!(p.pos[1], j as f64 + 0.5, "y must be a cell center");
        let expected_z = H + p.k as f64 * T + 0.5 * T;
        assert!(
            (p.pos[2] - expected_z).abs() < 1e-12,
            "z = {} for layer {}, expected {}",
            p.pos[2],
            p.k,
            expected_z
        );
        assert_eq!(p.rdata, p.pos, "scratch starts as the seed position");
        assert_eq!(p.cpu, 0);
    }
}

#[test]
fn test_seed_single_column_count() {
    let mut tracers = container(IVec3::new(6, 1, 5), IVec3::splat(8));
    let z = flat_terrain(tracers.layout(), MemoryLocation::Host);
    let seeded = tracers.init_particles(&z).unwrap();

    assert_eq!(seeded, 5, "one particle per layer of the single column");
    let mut layers: Vec<i32> = tracers.level(0).iter().map(|p| p.k).collect();
    layers.sort();
    assert_eq!(layers, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_seed_tiles_without_column_get_nothing() {
    // Tiles span i in [0, 1], [2, 3], [4, 5]; only the middle one holds i = 3.
    let mut tracers = container(IVec3::new(6, 2, 3), IVec3::new(2, 2, 3));
    let z = flat_terrain(tracers.layout(), MemoryLocation::Host);
    let seeded = tracers.init_particles(&z).unwrap();

    let level = tracers.level(0);
    assert_eq!(level.tile(0).len(), 0);
    assert_eq!(level.tile(1).len(), 2 * 3);
    assert_eq!(level.tile(2).len(), 0);
    assert_eq!(seeded, 6);
}

#[test]
fn test_seed_column_outside_domain_is_not_an_error() {
    let mut tracers = container(IVec3::new(3, 3, 3), IVec3::splat(8));
    let z = flat_terrain(tracers.layout(), MemoryLocation::Host);
    assert_eq!(tracers.init_particles(&z).unwrap(), 0);
    assert_eq!(tracers.num_particles(), 0);
}

#[test]
fn test_reseed_appends_with_fresh_ids() {
    let mut tracers = container(IVec3::new(6, 2, 4), IVec3::splat(8));
    let z = flat_terrain(tracers.layout(), MemoryLocation::Host);
    tracers.init_particles(&z).unwrap();
    let first: Vec<_> = tracers.level(0).tile(0).as_slice().to_vec();

    tracers.init_particles(&z).unwrap();
    let tile = tracers.level(0).tile(0);
    assert_eq!(tile.len(), 2 * first.len());
    assert_eq!(&tile.as_slice()[..first.len()], &first[..], "earlier particles untouched");

    let ids: HashSet<i64> = tile.iter().map(|p| p.id).collect();
    assert_eq!(ids.len(), tile.len(), "ids must be unique");
    assert!(ids.iter().all(|&id| id > 0));
}

#[test]
fn test_seed_from_device_terrain_matches_host() {
    let mut on_host = container(IVec3::new(6, 3, 4), IVec3::new(4, 2, 4));
    let mut on_device = container(IVec3::new(6, 3, 4), IVec3::new(4, 2, 4));
    let host_z = flat_terrain(on_host.layout(), MemoryLocation::Host);
    let device_z = flat_terrain(on_device.layout(), MemoryLocation::Device);
    let managed_z = flat_terrain(on_device.layout(), MemoryLocation::Managed);

    on_host.init_particles(&host_z).unwrap();
    on_device.init_particles(&device_z).unwrap();

    let a: Vec<_> = on_host.level(0).iter().map(|p| (p.pos, p.k)).collect();
    let b: Vec<_> = on_device.level(0).iter().map(|p| (p.pos, p.k)).collect();
    assert_eq!(a, b);

    on_device.init_particles(&managed_z).unwrap();
    assert_eq!(on_device.num_particles(), 2 * a.len());
}

#[test]
fn test_seed_follows_sloped_terrain() {
    let domain = IndexBox::from_size(IVec3::new(8, 1, 4));
    let geom = Geometry::new(domain, [0.0; 3], [8.0, 1.0, 4.0]).unwrap();
    let layout = TileLayout::chop(domain, IVec3::splat(8));
    let z = sigma_heights(&geom, &layout, 1, MemoryLocation::Host, |x, _| -4.0 - x, 0.0);
    let mut tracers = TracerContainer::new(geom, layout, TracerConfig::default()).unwrap();
    tracers.init_particles(&z).unwrap();

    // Column bottom node sits at x = 3: depth 7, four layers of 1.75.
    for p in tracers.level(0).iter() {
        let expected = -7.0 + 1.75 * (p.k as f64 + 0.5);
        assert!((p.pos[2] - expected).abs() < 1e-12, "layer {} at {}", p.k, p.pos[2]);
    }
}

#[test]
fn test_seed_custom_column_and_offset() {
    let domain = IndexBox::from_size(IVec3::new(4, 1, 2));
    let geom = Geometry::new(domain, [0.0; 3], [4.0, 1.0, 2.0]).unwrap();
    let layout = TileLayout::chop(domain, IVec3::splat(8));
    let config = TracerConfig {
        seed_column: 1,
        seed_offset: [0.25, 0.5, 0.0],
        ..TracerConfig::default()
    };
    let z = flat_terrain(&layout, MemoryLocation::Host);
    let mut tracers = TracerContainer::new(geom, layout, config).unwrap();
    tracers.init_particles(&z).unwrap();

    for p in tracers.level(0).iter() {
        assert_eq!(p.pos[0], 1.25);
        assert_eq!(p.pos[2], H + p.k as f64 * T, "offset 0 puts z on the layer bottom");
    }
}

#[test]
fn test_seed_rejects_cell_centered_heights() {
    let mut tracers = container(IVec3::new(6, 2, 2), IVec3::splat(8));
    let z = TiledField::<f64>::new(tracers.layout(), Centering::Cell, 1, MemoryLocation::Host);
    assert!(matches!(
        tracers.init_particles(&z),
        Err(TracerError::CenteringMismatch { field: "z_height", .. })
    ));
}

#[test]
fn test_seed_rejects_foreign_layout() {
    let mut tracers = container(IVec3::new(6, 2, 2), IVec3::splat(8));
    let other = TileLayout::chop(IndexBox::from_size(IVec3::new(6, 2, 2)), IVec3::splat(2));
    let z = flat_terrain(&other, MemoryLocation::Host);
    assert!(matches!(
        tracers.init_particles(&z),
        Err(TracerError::LayoutMismatch { .. })
    ));
    assert_eq!(tracers.num_particles(), 0);
}
