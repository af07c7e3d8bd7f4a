//! Dense voxel grid over a flat scalar buffer.
//!
//! Voxels are stored x-fastest: the value at `(x, y, z)` lives at
//! `x + y * width + z * width * height`.

use glam::{IVec3, UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VoxscopeError};

/// Physical acquisition metadata supplied alongside the voxel buffer.
///
/// All distances are in millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelSpacing {
    /// Thickness of a single slice.
    pub slice_thickness: f32,
    /// Gap between consecutive slices.
    pub spacing_between_slices: f32,
    /// In-plane voxel size along X.
    pub pixel_spacing_x: f32,
    /// In-plane voxel size along Y.
    pub pixel_spacing_y: f32,
    /// Physical location of each slice, in acquisition order.
    pub slice_locations: Vec<f32>,
}

impl Default for VoxelSpacing {
    fn default() -> Self {
        Self {
            slice_thickness: 1.0,
            spacing_between_slices: 1.0,
            pixel_spacing_x: 1.0,
            pixel_spacing_y: 1.0,
            slice_locations: Vec::new(),
        }
    }
}

/// A regular 3D grid of unsigned scalar samples.
///
/// The shape is fixed at construction; individual voxel values may be
/// overwritten afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoxelGrid {
    width: u32,
    height: u32,
    depth: u32,
    buffer: Vec<u32>,
    spacing: VoxelSpacing,
    frame_of_reference: Option<String>,
}

#[derive(Deserialize)]
struct GridDescription {
    width: u32,
    height: u32,
    depth: u32,
    buffer: Vec<u32>,
    #[serde(default)]
    spacing: VoxelSpacing,
    #[serde(default)]
    frame_of_reference: Option<String>,
}

impl VoxelGrid {
    /// Wraps a voxel buffer.
    ///
    /// Fails if `buffer.len()` differs from `width * height * depth`.
    /// Zero-sized grids are accepted and behave as empty volumes.
    pub fn new(width: u32, height: u32, depth: u32, buffer: Vec<u32>) -> Result<Self> {
        let expected = Self::checked_len(width, height, depth)?;
        if buffer.len() != expected {
            return Err(VoxscopeError::SizeMismatch {
                expected,
                actual: buffer.len(),
            });
        }
        Ok(Self {
            width,
            height,
            depth,
            buffer,
            spacing: VoxelSpacing::default(),
            frame_of_reference: None,
        })
    }

    /// Creates a grid where every voxel holds `value`.
    pub fn filled(width: u32, height: u32, depth: u32, value: u32) -> Result<Self> {
        let len = Self::checked_len(width, height, depth)?;
        Self::new(width, height, depth, vec![value; len])
    }

    /// Creates a grid by evaluating `f` at every voxel coordinate.
    pub fn from_fn(
        width: u32,
        height: u32,
        depth: u32,
        mut f: impl FnMut(UVec3) -> u32,
    ) -> Result<Self> {
        let len = Self::checked_len(width, height, depth)?;
        let mut buffer = Vec::with_capacity(len);
        for z in 0..depth {
            for y in 0..height {
                for x in 0..width {
                    buffer.push(f(UVec3::new(x, y, z)));
                }
            }
        }
        Self::new(width, height, depth, buffer)
    }

    fn checked_len(width: u32, height: u32, depth: u32) -> Result<usize> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(depth as usize))
            .ok_or(VoxscopeError::DimensionOverflow {
                width,
                height,
                depth,
            })
    }

    /// Attaches physical spacing metadata.
    #[must_use]
    pub fn with_spacing(mut self, spacing: VoxelSpacing) -> Self {
        self.spacing = spacing;
        self
    }

    /// Attaches the frame-of-reference identifier shared by the source slices.
    #[must_use]
    pub fn with_frame_of_reference(mut self, id: impl Into<String>) -> Self {
        self.frame_of_reference = Some(id.into());
        self
    }

    /// Number of voxels along X.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of voxels along Y.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of voxels along Z.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Returns `(width, height, depth)`.
    #[must_use]
    pub fn dims(&self) -> UVec3 {
        UVec3::new(self.width, self.height, self.depth)
    }

    /// Total number of voxels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if the grid holds no voxels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The raw voxel buffer.
    #[must_use]
    pub fn buffer(&self) -> &[u32] {
        &self.buffer
    }

    /// Mutable access to voxel values. The length cannot change.
    pub fn buffer_mut(&mut self) -> &mut [u32] {
        &mut self.buffer
    }

    /// Physical spacing metadata.
    #[must_use]
    pub fn spacing(&self) -> &VoxelSpacing {
        &self.spacing
    }

    /// Frame-of-reference identifier, if the loader supplied one.
    #[must_use]
    pub fn frame_of_reference(&self) -> Option<&str> {
        self.frame_of_reference.as_deref()
    }

    /// Returns true if `p` addresses a voxel inside the grid.
    #[must_use]
    pub fn contains(&self, p: IVec3) -> bool {
        p.x >= 0
            && p.y >= 0
            && p.z >= 0
            && (p.x as u32) < self.width
            && (p.y as u32) < self.height
            && (p.z as u32) < self.depth
    }

    /// Flattens a 3D voxel coordinate to a linear index.
    ///
    /// The coordinate must be inside the grid.
    #[must_use]
    pub fn index(&self, x: u32, y: u32, z: u32) -> usize {
        x as usize + y as usize * self.width as usize
            + z as usize * self.width as usize * self.height as usize
    }

    /// Flattens a signed coordinate, returning `None` outside the grid.
    #[must_use]
    pub fn try_index(&self, p: IVec3) -> Option<usize> {
        self.contains(p)
            .then(|| self.index(p.x as u32, p.y as u32, p.z as u32))
    }

    /// Rounds each component of `p` and flattens it.
    #[must_use]
    pub fn index_of_rounded(&self, p: Vec3) -> Option<usize> {
        self.try_index(p.round().as_ivec3())
    }

    /// Unflattens a linear index to a 3D voxel coordinate.
    #[must_use]
    pub fn position_of(&self, index: usize) -> UVec3 {
        let w = self.width as usize;
        let h = self.height as usize;
        let x = index % w;
        let y = (index / w) % h;
        let z = index / (w * h);
        UVec3::new(x as u32, y as u32, z as u32)
    }

    /// Returns the voxel value, or 0 for any coordinate outside the grid.
    #[must_use]
    pub fn get(&self, x: i32, y: i32, z: i32) -> u32 {
        self.get_at(IVec3::new(x, y, z))
    }

    /// Returns the voxel value at `p`, or 0 outside the grid.
    #[must_use]
    pub fn get_at(&self, p: IVec3) -> u32 {
        self.try_index(p).map_or(0, |i| self.buffer[i])
    }

    /// Rounds `p` to the nearest voxel and returns its value (0 outside).
    #[must_use]
    pub fn get_rounded(&self, p: Vec3) -> u32 {
        self.get_at(p.round().as_ivec3())
    }

    /// Overwrites a voxel value.
    pub fn set(&mut self, x: i32, y: i32, z: i32, value: u32) -> Result<()> {
        let index = self
            .try_index(IVec3::new(x, y, z))
            .ok_or(VoxscopeError::OutOfBounds {
                x: i64::from(x),
                y: i64::from(y),
                z: i64::from(z),
            })?;
        self.buffer[index] = value;
        Ok(())
    }

    /// Smallest voxel value, or `None` for an empty grid.
    #[must_use]
    pub fn min(&self) -> Option<u32> {
        self.buffer.iter().copied().min()
    }

    /// Largest voxel value, or `None` for an empty grid.
    #[must_use]
    pub fn max(&self) -> Option<u32> {
        self.buffer.iter().copied().max()
    }

    /// Running estimate of the typical voxel value.
    ///
    /// This is not the arithmetic mean: every value above the current
    /// estimate pulls it halfway towards that value, so the result is biased
    /// towards the bright end of the histogram. Downstream thresholds are
    /// tuned against this estimator.
    #[must_use]
    pub fn avg(&self) -> u32 {
        let mut avg: u32 = 0;
        for &value in &self.buffer {
            if value > avg {
                avg = ((u64::from(avg) + u64::from(value)) / 2) as u32;
            }
        }
        avg
    }

    /// Maps a normalized `[0, 1]` cube position to a voxel coordinate.
    ///
    /// The mapping is mirrored on every axis: `dim - round(p * dim)`.
    /// Sampling code throughout the pipeline relies on this orientation.
    #[must_use]
    pub fn percentage_to_grid(&self, p: Vec3) -> IVec3 {
        let dims = self.dims().as_vec3();
        self.dims().as_ivec3() - (p * dims).round().as_ivec3()
    }

    /// Maps a voxel coordinate to a normalized position by dividing by the
    /// dimensions.
    #[must_use]
    pub fn grid_to_percentage(&self, v: Vec3) -> Vec3 {
        v / self.dims().as_vec3()
    }

    /// Geometric center of the grid in voxel units.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        self.dims().as_vec3() * 0.5
    }

    /// Slice thickness rounded to whole voxels.
    #[must_use]
    pub fn thickness_value(&self) -> u32 {
        self.spacing.slice_thickness.round().max(0.0) as u32
    }

    /// Extent along X in voxels.
    #[must_use]
    pub fn physical_distance_along_x(&self) -> f32 {
        self.width as f32
    }

    /// Extent along Y in voxels.
    #[must_use]
    pub fn physical_distance_along_y(&self) -> f32 {
        self.height as f32
    }

    /// Extent along Z, scaled by the rounded slice thickness.
    #[must_use]
    pub fn physical_distance_along_z(&self) -> f32 {
        self.depth as f32 * self.thickness_value() as f32
    }

    /// Serializes the grid (dimensions, buffer and metadata) as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a grid description, re-validating the buffer length.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let desc: GridDescription = serde_json::from_str(text)?;
        let grid = Self::new(desc.width, desc.height, desc.depth, desc.buffer)?
            .with_spacing(desc.spacing);
        Ok(match desc.frame_of_reference {
            Some(id) => grid.with_frame_of_reference(id),
            None => grid,
        })
    }
}
