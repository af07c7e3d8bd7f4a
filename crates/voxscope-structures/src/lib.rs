//! Volume processing for voxscope.
//!
//! This crate builds on the grid and polygonizers in `voxscope-core`:
//! - Region classification (inside / outside / border) and segmentation
//! - Proximity queries against border voxels and threshold windows
//! - Iso-surface extraction into chunked meshes
//! - Byte textures, slice images, and transfer functions
//! - [`Volume`], a grid bundled with its options and cached classification

// Voxel code intentionally casts between index, coordinate and value types
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod proximity;
pub mod segmentation;
pub mod surface;
pub mod texture;
pub mod transfer;
pub mod volume;

pub use proximity::{
    exit_distance_table, minimum_distance_to_exit, nearest_exit, ExitCandidate, ProximityQuery,
    MIN_EXIT_DISTANCE,
};
pub use segmentation::{ClassificationResult, NormalizedBounds, RegionClassifier, VoxelClass};
pub use surface::{MeshChunk, MeshVertex, SurfaceExtractor};
pub use texture::{
    byte_volume, byte_volume_with, SliceAxis, SliceImage, SliceMapping, SliceSampler,
    MAX_SLICE_WIDTH,
};
pub use transfer::{
    stipple_volume, ColorStop, ShaderArrays, StippleVolume, TransferFunction, CLEAR,
    MAX_COLOR_STOPS, SHADER_ARRAY_LEN,
};
pub use volume::Volume;
