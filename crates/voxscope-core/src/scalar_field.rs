//! Signed scalar fields and the polygonizer seam.

use glam::{UVec3, Vec3};

use crate::error::{Result, VoxscopeError};
use crate::grid::VoxelGrid;
use crate::marching_cubes::marching_cubes;

/// A dense `f32` field sampled at integer node positions, stored x-fastest.
///
/// Positive values are solid, negative values are empty; the surface is the
/// zero level set.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    dims: UVec3,
    values: Vec<f32>,
}

impl ScalarField {
    /// Wraps raw field values.
    pub fn new(dims: UVec3, values: Vec<f32>) -> Result<Self> {
        let expected = dims.x as usize * dims.y as usize * dims.z as usize;
        if values.len() != expected {
            return Err(VoxscopeError::SizeMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self { dims, values })
    }

    /// Builds the window field `min(v - low, high - v)` of a voxel grid.
    ///
    /// Voxels inside `[low, high]` are non-negative; the zero crossing sits on
    /// whichever window bound is nearer.
    #[must_use]
    pub fn from_window(grid: &VoxelGrid, low: u32, high: u32) -> Self {
        let low = f64::from(low);
        let high = f64::from(high);
        let values = grid
            .buffer()
            .iter()
            .map(|&v| {
                let v = f64::from(v);
                (v - low).min(high - v) as f32
            })
            .collect();
        Self {
            dims: grid.dims(),
            values,
        }
    }

    /// Node counts per axis.
    #[must_use]
    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    /// Raw values, x-fastest.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Returns true if the field has at least one cell on every axis.
    #[must_use]
    pub fn has_cells(&self) -> bool {
        self.dims.min_element() >= 2
    }

    /// Value at an integer node. The coordinate must be in range.
    #[must_use]
    pub fn value(&self, x: u32, y: u32, z: u32) -> f32 {
        let nx = self.dims.x as usize;
        let ny = self.dims.y as usize;
        self.values[x as usize + nx * (y as usize + ny * z as usize)]
    }

    /// Trilinearly interpolates the field at `p`, clamping to the node range.
    #[must_use]
    pub fn sample(&self, p: Vec3) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let max = (self.dims - UVec3::ONE).as_vec3();
        let p = p.clamp(Vec3::ZERO, max);
        let base = p.floor().as_uvec3();
        let t = p - base.as_vec3();
        let next = (base + UVec3::ONE).min(self.dims - UVec3::ONE);

        let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
        let c = |x: u32, y: u32, z: u32| self.value(x, y, z);

        let c00 = lerp(c(base.x, base.y, base.z), c(next.x, base.y, base.z), t.x);
        let c10 = lerp(c(base.x, next.y, base.z), c(next.x, next.y, base.z), t.x);
        let c01 = lerp(c(base.x, base.y, next.z), c(next.x, base.y, next.z), t.x);
        let c11 = lerp(c(base.x, next.y, next.z), c(next.x, next.y, next.z), t.x);
        lerp(lerp(c00, c10, t.y), lerp(c01, c11, t.y), t.z)
    }

    /// Flips triangles whose winding faces into the solid.
    ///
    /// The field is probed a quarter voxel either side of each centroid along
    /// the face normal; a normal must point towards decreasing field values.
    pub fn orient_outward(&self, soup: &mut [Vec3]) {
        for tri in soup.chunks_exact_mut(3) {
            let normal = (tri[1] - tri[0]).cross(tri[2] - tri[0]);
            let Some(n) = normal.try_normalize() else {
                continue;
            };
            let centroid = (tri[0] + tri[1] + tri[2]) / 3.0;
            let ahead = self.sample(centroid + n * 0.25);
            let behind = self.sample(centroid - n * 0.25);
            if ahead > behind {
                tri.swap(1, 2);
            }
        }
    }
}

/// Turns a scalar field into a triangle soup (three positions per triangle)
/// in node-index space.
pub trait Polygonizer {
    /// Raw triangulation; winding is unspecified.
    fn triangulate(&self, field: &ScalarField) -> Vec<Vec3>;

    /// Triangulates and orients every triangle to face out of the solid.
    fn polygonize(&self, field: &ScalarField) -> Vec<Vec3> {
        if !field.has_cells() {
            return Vec::new();
        }
        let mut soup = self.triangulate(field);
        field.orient_outward(&mut soup);
        soup
    }
}

/// Polygonizer backed by the marching cubes lookup table.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarchingCubes;

impl Polygonizer for MarchingCubes {
    fn triangulate(&self, field: &ScalarField) -> Vec<Vec3> {
        if !field.has_cells() {
            return Vec::new();
        }
        let dims = field.dims();
        marching_cubes(field.values(), 0.0, dims.x, dims.y, dims.z).unweld()
    }
}
