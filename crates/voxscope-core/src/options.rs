//! Configuration options for voxscope.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VoxscopeError};

/// Largest vertex count a single extracted mesh chunk may hold.
///
/// Must stay divisible by 3 so a chunk never splits a triangle.
pub const DEFAULT_MAX_VERTICES_PER_CHUNK: usize = 30_000;

/// Top-level configuration for the voxel pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Region classification settings.
    pub classification: ClassificationOptions,

    /// Iso-surface extraction settings.
    pub extraction: ExtractionOptions,

    /// Byte texture and slice image settings.
    pub texture: TextureOptions,
}

impl Options {
    /// Parses options from JSON text. Missing fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Reads options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serializes the options as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        self.extraction.validate()
    }
}

/// Settings for inside/outside/border classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationOptions {
    /// Voxels at or above this value are candidate inside material.
    pub tolerance: u32,

    /// Segments with this many voxels or fewer are discarded as noise.
    pub noise_threshold: usize,
}

impl Default for ClassificationOptions {
    fn default() -> Self {
        Self {
            tolerance: 10,
            noise_threshold: 8,
        }
    }
}

/// Triangulation algorithm used by the surface extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExtractionMode {
    /// Classic 256-case marching cubes.
    #[default]
    Cubes,
    /// Six tetrahedra per cube.
    Tetrahedra,
}

/// Settings for iso-surface extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionOptions {
    /// Triangulation algorithm.
    pub mode: ExtractionMode,

    /// Lower bound of the solid value window (inclusive).
    pub low: u32,

    /// Upper bound of the solid value window (inclusive).
    pub high: u32,

    /// Maximum vertex count per output chunk (must be a positive multiple of 3).
    pub max_vertices_per_chunk: usize,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::Cubes,
            low: 10,
            high: u32::MAX,
            max_vertices_per_chunk: DEFAULT_MAX_VERTICES_PER_CHUNK,
        }
    }
}

impl ExtractionOptions {
    /// Checks that the chunk size can hold whole triangles.
    pub fn validate(&self) -> Result<()> {
        if self.max_vertices_per_chunk == 0 || self.max_vertices_per_chunk % 3 != 0 {
            return Err(VoxscopeError::InvalidOptions(format!(
                "max_vertices_per_chunk must be a positive multiple of 3, got {}",
                self.max_vertices_per_chunk
            )));
        }
        if self.low > self.high {
            return Err(VoxscopeError::InvalidOptions(format!(
                "extraction window is empty: low {} > high {}",
                self.low, self.high
            )));
        }
        Ok(())
    }
}

/// Settings for byte textures and slice images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureOptions {
    /// Value mapped to 0.
    pub low: u32,

    /// Value mapped to 255.
    pub high: u32,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self { low: 0, high: 1500 }
    }
}
