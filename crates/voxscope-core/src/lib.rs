//! Core abstractions for voxscope.
//!
//! This crate provides the fundamental types used throughout voxscope:
//! - [`VoxelGrid`] dense scalar volume with x-fastest storage
//! - Fixed neighborhood tables for 6, 12 and 18 connectivity
//! - [`ScalarField`] and the [`Polygonizer`] seam with marching cubes and
//!   marching tetrahedra implementations
//! - Configuration options and the error type

// Voxel code converts between index, coordinate and float spaces constantly
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
#![allow(clippy::many_single_char_names)]

pub mod error;
pub mod grid;
pub mod marching_cubes;
pub mod marching_tetrahedra;
pub mod neighborhood;
pub mod options;
pub mod scalar_field;

pub use error::{Result, VoxscopeError};
pub use grid::{VoxelGrid, VoxelSpacing};
pub use marching_cubes::{marching_cubes, IsoMesh};
pub use marching_tetrahedra::MarchingTetrahedra;
pub use neighborhood::{neighbors, Connectivity, Neighbor, EDGE_18, FACE_6, FACE_DIAGONAL_12};
pub use options::{
    ClassificationOptions, ExtractionMode, ExtractionOptions, Options, TextureOptions,
    DEFAULT_MAX_VERTICES_PER_CHUNK,
};
pub use scalar_field::{MarchingCubes, Polygonizer, ScalarField};

// Re-export glam types for convenience
pub use glam::{IVec3, UVec3, Vec3};
