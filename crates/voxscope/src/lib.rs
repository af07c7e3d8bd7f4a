//! voxscope: analysis of dense scalar volumes such as CT and MR scans.
//!
//! A [`VoxelGrid`] holds one unsigned value per voxel. On top of it voxscope
//! classifies voxels as inside, outside or border relative to a brightness
//! tolerance, splits the inside into connected segments, answers
//! nearest-border and threshold-window queries, and extracts iso-surfaces as
//! chunked triangle meshes.
//!
//! # Quick Start
//!
//! ```no_run
//! use voxscope::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     // A bright cube in a dark 16³ volume
//!     let grid = VoxelGrid::from_fn(16, 16, 16, |p| {
//!         if p.min_element() >= 4 && p.max_element() < 12 { 400 } else { 0 }
//!     })?;
//!
//!     let mut volume = Volume::new(grid);
//!     if let Some(result) = volume.classify() {
//!         println!("{} segments", result.segment_count());
//!     }
//!     let border = volume.nearest_border_voxel(IVec3::new(0, 8, 8))?;
//!     println!("nearest border voxel: {border}");
//!
//!     let chunks = volume.extract_surface()?;
//!     println!("{} mesh chunks", chunks.len());
//!     Ok(())
//! }
//! ```
//!
//! # Pipeline
//!
//! - [`RegionClassifier`] - inside / outside / border labels and segments
//! - [`ProximityQuery`] - nearest border voxel and threshold searches
//! - [`SurfaceExtractor`] - marching cubes or tetrahedra into [`MeshChunk`]s
//! - [`SliceSampler`], [`byte_volume`], [`TransferFunction`] - presentation
//!   outputs
//! - [`Volume`] - a grid with its options and cached classification

mod init;

pub use init::init_logging;

// Re-export core types
pub use voxscope_core::{
    error::{Result, VoxscopeError},
    grid::{VoxelGrid, VoxelSpacing},
    marching_cubes::{marching_cubes, IsoMesh},
    neighborhood::{neighbors, Connectivity, Neighbor},
    options::{
        ClassificationOptions, ExtractionMode, ExtractionOptions, Options, TextureOptions,
    },
    scalar_field::{MarchingCubes, Polygonizer, ScalarField},
    MarchingTetrahedra,
};

// Re-export volume algorithms
pub use voxscope_structures::{
    byte_volume, byte_volume_with, exit_distance_table, minimum_distance_to_exit, nearest_exit,
    stipple_volume, ClassificationResult, ColorStop, ExitCandidate, MeshChunk, MeshVertex,
    NormalizedBounds, ProximityQuery, RegionClassifier, SliceAxis, SliceImage, SliceMapping,
    SliceSampler, StippleVolume, SurfaceExtractor, TransferFunction, Volume, VoxelClass,
};

pub use glam::{IVec3, UVec3, Vec3};

/// Classifies `grid` with default options.
///
/// Shorthand for `RegionClassifier::default().classify(grid)`.
pub fn classify(grid: &VoxelGrid) -> Option<ClassificationResult> {
    RegionClassifier::default().classify(grid)
}

/// Extracts the surface of voxels valued within `[low, high]` with marching
/// cubes and default chunking.
pub fn extract_surface(grid: &VoxelGrid, low: u32, high: u32) -> Result<Vec<MeshChunk>> {
    let extractor = SurfaceExtractor::new(ExtractionOptions {
        low,
        high,
        ..ExtractionOptions::default()
    })?;
    Ok(extractor.extract(grid))
}
