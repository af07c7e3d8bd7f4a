//! Error types for voxscope.

use thiserror::Error;

/// The main error type for voxscope operations.
#[derive(Error, Debug)]
pub enum VoxscopeError {
    /// Buffer length does not match the declared grid dimensions.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Grid dimensions overflow the addressable index range.
    #[error("grid dimensions {width}x{height}x{depth} are too large")]
    DimensionOverflow { width: u32, height: u32, depth: u32 },

    /// A voxel coordinate lies outside the grid.
    #[error("voxel ({x}, {y}, {z}) is outside the grid")]
    OutOfBounds { x: i64, y: i64, z: i64 },

    /// A classification was paired with a grid of a different shape.
    #[error("classification was computed for a {expected:?} grid, got {actual:?}")]
    DimensionMismatch { expected: [u32; 3], actual: [u32; 3] },

    /// A segmentation-dependent query ran before the grid was classified.
    #[error("grid has not been classified - call classify() first")]
    NotClassified,

    /// The classification produced no border voxels to search.
    #[error("classification produced no border voxels")]
    NoBorderVoxels,

    /// Options failed validation.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image encoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized Result type for voxscope operations.
pub type Result<T> = std::result::Result<T, VoxscopeError>;
