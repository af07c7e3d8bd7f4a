//! End-to-end tests of the voxscope pipeline.
//!
//! Each test builds a synthetic volume, classifies it, and checks the queries
//! and outputs that depend on the classification.

use proptest::prelude::*;
use voxscope::*;

/// 10³ dark volume with a bright 6³ cube at `[2, 7]` on every axis.
fn cube_grid() -> VoxelGrid {
    VoxelGrid::from_fn(10, 10, 10, |p| {
        if p.min_element() >= 2 && p.max_element() <= 7 {
            400
        } else {
            0
        }
    })
    .unwrap()
}

#[test]
fn test_cube_classification() {
    let grid = cube_grid();
    let result = classify(&grid).expect("non-empty grid");

    // Shell of the cube is border, the 4³ core is inside
    assert_eq!(result.border_voxels().len(), 6 * 6 * 6 - 4 * 4 * 4);
    assert_eq!(result.segment_sizes(), &[64]);
    assert_eq!(result.largest_segment(), Some(0));
    assert_eq!(result.class_at(grid.index(0, 0, 0)), VoxelClass::Outside);
    assert_eq!(result.class_at(grid.index(2, 4, 4)), VoxelClass::Border);
    assert_eq!(result.class_at(grid.index(4, 4, 4)), VoxelClass::Inside);

    // Cube corners only touch the core diagonally and stay unassigned
    assert_eq!(result.border_voxels_of_largest_segment().len(), 152 - 8);
    assert!(result.segments_of(grid.index(2, 2, 2)).is_empty());
    assert_eq!(result.segments_of(grid.index(2, 4, 4)), &[0]);

    let bounds = result.bounds().unwrap();
    assert!((bounds.min - Vec3::splat(0.2)).abs().max_element() < 1e-6);
    assert!((bounds.max - Vec3::splat(0.7)).abs().max_element() < 1e-6);
}

#[test]
fn test_volume_queries() {
    let mut volume = Volume::new(cube_grid());
    assert!(matches!(
        volume.nearest_border_voxel(IVec3::ZERO),
        Err(VoxscopeError::NotClassified)
    ));
    volume.classify();

    assert_eq!(
        volume.nearest_border_voxel(IVec3::new(0, 5, 5)).unwrap(),
        UVec3::new(2, 5, 5)
    );
    assert_eq!(
        volume
            .nearest_border_of_largest_segment(IVec3::new(0, 5, 5))
            .unwrap(),
        UVec3::new(2, 5, 5)
    );
    assert_eq!(
        volume
            .nearest_voxel_beyond_threshold(IVec3::new(3, 4, 4), 0, 1000)
            .unwrap(),
        Some(IVec3::new(2, 4, 4))
    );
}

#[test]
fn test_exit_distance() {
    let grid = cube_grid();
    let d = minimum_distance_to_exit(&grid, Vec3::splat(0.45), 10).unwrap();
    assert!((d - 12.75_f32.sqrt()).abs() < 1e-4);

    let (_, position) = nearest_exit(&grid, Vec3::splat(0.45), 10).unwrap();
    assert_eq!(position, Vec3::new(0.4, 0.4, 0.1));

    let bright = VoxelGrid::filled(3, 3, 3, 500).unwrap();
    assert!(minimum_distance_to_exit(&bright, Vec3::ZERO, 10).is_none());
}

#[test]
fn test_surface_and_slices() {
    let grid = cube_grid();
    let chunks = extract_surface(&grid, 100, 1000).unwrap();
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].num_triangles() > 0);
    assert_eq!(chunks[0].origin(), Vec3::splat(-5.0));
    assert!(chunks[0]
        .normals()
        .iter()
        .all(|n| n.length() < 1e-6 || (n.length() - 1.0).abs() < 1e-4));

    let volume = Volume::new(grid);
    let slice = volume.slice(SliceAxis::Xy, 5).unwrap();
    assert_eq!((slice.width(), slice.height()), (10, 10));
    // Default window [0, 1500]: 400 / 1500 * 255 = 68
    assert_eq!(slice.pixel(5, 5), 68);
    assert_eq!(slice.pixel(0, 0), 0);
    assert!(volume.slice(SliceAxis::Xy, 10).is_none());

    let bytes = volume.byte_volume();
    assert_eq!(bytes.len(), 1000);
    assert_eq!(bytes[volume.grid().index(4, 4, 4)], 68);
}

#[test]
fn test_options_from_json() {
    let options = Options::from_json_str(
        r#"{
            "classification": { "tolerance": 500 },
            "extraction": { "mode": "Tetrahedra", "low": 100, "high": 1000 }
        }"#,
    )
    .unwrap();
    assert_eq!(options.classification.noise_threshold, 8);
    assert_eq!(options.extraction.mode, ExtractionMode::Tetrahedra);

    let mut volume = Volume::with_options(cube_grid(), options).unwrap();
    // Nothing reaches a tolerance of 500
    let result = volume.classify().unwrap();
    assert!(result.border_voxels().is_empty());
    assert_eq!(result.segment_count(), 0);
    assert!(!volume.extract_surface().unwrap().is_empty());

    let bad = Options::from_json_str(r#"{ "extraction": { "max_vertices_per_chunk": 10 } }"#);
    assert!(matches!(bad, Err(VoxscopeError::InvalidOptions(_))));
}

#[test]
fn test_init_logging_is_idempotent() {
    init_logging();
    init_logging();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_nearest_border_is_closest(x in -4_i32..14, y in -4_i32..14, z in -4_i32..14) {
        let grid = cube_grid();
        let result = classify(&grid).unwrap();
        let query = ProximityQuery::new(&grid, &result).unwrap();
        let point = IVec3::new(x, y, z);
        let found = query.nearest_border_voxel(point).unwrap();
        let best = result
            .border_voxels()
            .iter()
            .map(|v| v.as_vec3().distance(point.as_vec3()))
            .fold(f32::MAX, f32::min);
        prop_assert!((found.as_vec3().distance(point.as_vec3()) - best).abs() < 1e-5);
    }
}
