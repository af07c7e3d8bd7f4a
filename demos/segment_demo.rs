#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
//! Demo of the voxscope pipeline on a synthetic scan.
//!
//! Demonstrates:
//! - Region classification and segmentation of two bright blobs
//! - Nearest-border and threshold-window queries
//! - Marching cubes surface extraction
//! - Writing an axial slice as a PNG
//!
//! Run with `RUST_LOG=info` to see the pipeline log.

use voxscope::{
    ExtractionMode, ExtractionOptions, IVec3, Options, SliceAxis, Vec3, VoxelGrid, Volume,
};

fn main() -> voxscope::Result<()> {
    voxscope::init_logging();

    // --- Synthetic scan: a large sphere, a small sphere and speckle noise ---
    let n = 48u32;
    let big = Vec3::new(18.0, 24.0, 24.0);
    let small = Vec3::new(36.0, 24.0, 24.0);
    let mut rng = fastrand::Rng::with_seed(7);
    let grid = VoxelGrid::from_fn(n, n, n, |p| {
        let q = p.as_vec3();
        let tissue = if q.distance(big) < 12.0 {
            900 - (q.distance(big) * 30.0) as u32
        } else if q.distance(small) < 5.0 {
            600
        } else {
            0
        };
        // Speckle stays below the classification tolerance
        tissue + rng.u32(0..8)
    })?;

    let options = Options {
        extraction: ExtractionOptions {
            mode: ExtractionMode::Cubes,
            low: 300,
            high: 2000,
            ..ExtractionOptions::default()
        },
        ..Options::default()
    };
    let mut volume = Volume::with_options(grid, options)?;

    // --- Classification ---
    if let Some(result) = volume.classify() {
        println!(
            "{} border voxels, segment sizes {:?}, largest {:?}",
            result.border_voxels().len(),
            result.segment_sizes(),
            result.largest_segment()
        );
        if let Some(bounds) = result.bounds() {
            println!("border bounds {:?} .. {:?}", bounds.min, bounds.max);
        }
    }

    // --- Queries ---
    let probe = IVec3::new(0, 24, 24);
    println!(
        "nearest border voxel to {probe}: {}",
        volume.nearest_border_voxel(probe)?
    );
    println!(
        "nearest border voxel of the largest segment: {}",
        volume.nearest_border_of_largest_segment(probe)?
    );
    let hit = volume.nearest_voxel_beyond_threshold(IVec3::new(18, 24, 24), 700, 2000)?;
    println!("first voxel outside (700, 2000) from the big sphere center: {hit:?}");

    // --- Surface ---
    let chunks = volume.extract_surface()?;
    let triangles: usize = chunks.iter().map(voxscope::MeshChunk::num_triangles).sum();
    println!("{triangles} triangles in {} chunks", chunks.len());

    // --- Slice ---
    if let Some(slice) = volume.slice(SliceAxis::Xy, n / 2) {
        let path = std::env::temp_dir().join("voxscope_slice.png");
        slice.save(&path)?;
        println!("wrote {}", path.display());
    }

    Ok(())
}
