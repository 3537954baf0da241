use glam::IVec3;
use tracer_core::field::MemoryLocation;
use tracer_core::geometry::{Geometry, IndexBox};
use tracer_core::interp::mac_interpolate;
use tracer_core::layout::TileLayout;
use tracer_core::math::interpolate_1d;
use tracer_core::velocity::face_velocity;
use tracer_core::TracerError;

fn affine(d: usize, x: [f64; 3]) -> f64 {
    match d {
        0 => 1.0 + 2.0 * x[0] - x[1] + 0.5 * x[2],
        1 => -0.5 + 0.25 * x[0] + 3.0 * x[2],
        _ => 0.75 * x[1] - x[2],
    }
}

#[test]
fn test_mac_interpolation_reproduces_affine_field() {
    // Offset index domain and anisotropic cells.
    let domain = IndexBox::new(IVec3::new(2, -1, 3), IVec3::new(9, 4, 8));
    let geom = Geometry::new(domain, [1.0, -2.0, 0.5], [5.0, 4.0, 2.0]).unwrap();
    let layout = TileLayout::chop(domain, IVec3::splat(16));
    let umac = face_velocity(&geom, &layout, 1, MemoryLocation::Host, affine);
    let views = [umac[0].fab(0).view(), umac[1].fab(0).view(), umac[2].fab(0).view()];

    for pos in [[1.1, -1.9, 0.55], [2.3, 0.7, 1.2], [4.95, 3.95, 1.99], [3.0, 1.0, 1.25]] {
        let v = mac_interpolate(pos, geom.prob_lo(), geom.inv_cell_size(), domain.lo, &views);
        for d in 0..3 {
            assert!(
                (v[d] - affine(d, pos)).abs() < 1e-12,
                "component {d} at {pos:?}: {} vs {}",
                v[d],
                affine(d, pos)
            );
        }
    }
}

#[test]
fn test_mac_interpolation_single_precision() {
    let domain = IndexBox::from_size(IVec3::splat(4));
    let geom = Geometry::<f32>::new(domain, [0.0; 3], [4.0; 3]).unwrap();
    let layout = TileLayout::chop(domain, IVec3::splat(4));
    let umac = face_velocity(&geom, &layout, 1, MemoryLocation::Host, |d, x| x[d]);
    let views = [umac[0].fab(0).view(), umac[1].fab(0).view(), umac[2].fab(0).view()];

    let pos = [1.25_f32, 2.5, 3.75];
    let v = mac_interpolate(pos, geom.prob_lo(), geom.inv_cell_size(), domain.lo, &views);
    for d in 0..3 {
        assert!((v[d] - pos[d]).abs() < 1e-5);
    }
}

#[test]
#[should_panic(expected = "outside field box")]
fn test_mac_stencil_past_ghost_cells_panics() {
    let domain = IndexBox::from_size(IVec3::splat(4));
    let geom = Geometry::<f64>::new(domain, [0.0; 3], [4.0; 3]).unwrap();
    let layout = TileLayout::chop(domain, IVec3::splat(4));
    let umac = face_velocity(&geom, &layout, 0, MemoryLocation::Host, |_, _| 1.0);
    let views = [umac[0].fab(0).view(), umac[1].fab(0).view(), umac[2].fab(0).view()];
    // Cell-centered directions need x - 0.5 >= 0 without ghosts.
    mac_interpolate([0.25, 1.5, 1.5], geom.prob_lo(), geom.inv_cell_size(), domain.lo, &views);
}

#[test]
fn test_interpolate_1d_exact_and_interior() {
    let alpha = [0.0_f64, 1.0, 3.0];
    let beta = [10.0_f64, 20.0, 0.0];
    assert_eq!(interpolate_1d(&alpha, &beta, 1.0).unwrap(), 20.0);
    assert_eq!(interpolate_1d(&alpha, &beta, 3.0).unwrap(), 0.0);
    assert!((interpolate_1d(&alpha, &beta, 0.5).unwrap() - 15.0).abs() < 1e-12);
    assert!((interpolate_1d(&alpha, &beta, 2.0).unwrap() - 10.0).abs() < 1e-12);
}

#[test]
fn test_interpolate_1d_extrapolates_from_end_segments() {
    let alpha = [0.0_f64, 1.0, 3.0];
    let beta = [10.0_f64, 20.0, 0.0];
    assert!((interpolate_1d(&alpha, &beta, -1.0).unwrap() - 0.0).abs() < 1e-12);
    assert!((interpolate_1d(&alpha, &beta, 4.0).unwrap() + 10.0).abs() < 1e-12);
}

#[test]
fn test_interpolate_1d_rejects_unsorted_table() {
    let err = interpolate_1d(&[0.0_f64, 2.0, 1.0], &[0.0, 1.0, 2.0], 0.5).unwrap_err();
    assert!(matches!(err, TracerError::InterpolationTable(_)));
    assert!(interpolate_1d(&[0.0_f64, 0.0], &[0.0, 1.0], 0.0).is_err());
}
