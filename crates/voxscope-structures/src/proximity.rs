//! Nearest-voxel queries against a classified grid.

use std::collections::VecDeque;

use bitvec::vec::BitVec;
use glam::{IVec3, UVec3, Vec3};
use voxscope_core::neighborhood::{neighbors, Connectivity};
use voxscope_core::{Result, VoxelGrid, VoxscopeError};

use crate::segmentation::{ClassificationResult, VoxelClass};

/// Smallest distance reported by the exit-distance queries.
pub const MIN_EXIT_DISTANCE: f32 = 1e-4;

/// A below-tolerance voxel and its distance from a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitCandidate {
    /// Voxel coordinate.
    pub voxel: UVec3,
    /// Voxel coordinate divided by the grid dimensions.
    pub normalized: Vec3,
    /// Euclidean distance in voxels from the query point.
    pub distance: f32,
}

/// Proximity queries over a grid and its classification.
#[derive(Debug, Clone, Copy)]
pub struct ProximityQuery<'a> {
    grid: &'a VoxelGrid,
    classification: &'a ClassificationResult,
}

impl<'a> ProximityQuery<'a> {
    /// Binds a grid to the classification computed from it.
    ///
    /// Fails if the classification was computed for a grid of other
    /// dimensions.
    pub fn new(grid: &'a VoxelGrid, classification: &'a ClassificationResult) -> Result<Self> {
        if classification.dims() != grid.dims() {
            return Err(VoxscopeError::DimensionMismatch {
                expected: classification.dims().to_array(),
                actual: grid.dims().to_array(),
            });
        }
        Ok(Self {
            grid,
            classification,
        })
    }

    /// Closest border voxel to `point`. The first voxel found wins ties.
    pub fn nearest_border_voxel(&self, point: IVec3) -> Result<UVec3> {
        nearest(self.classification.border_voxels(), point.as_vec3())
    }

    /// Closest border voxel of the largest segment to `point`.
    pub fn nearest_border_of_largest_segment(&self, point: IVec3) -> Result<UVec3> {
        nearest(
            self.classification.border_voxels_of_largest_segment(),
            point.as_vec3(),
        )
    }

    /// [`Self::nearest_border_voxel`] for a normalized position, answered as
    /// a normalized position.
    pub fn nearest_border_normalized(&self, point: Vec3) -> Result<Vec3> {
        let voxel = self.nearest_border_voxel(self.grid.percentage_to_grid(point))?;
        Ok(self.grid.grid_to_percentage(voxel.as_vec3()))
    }

    /// [`Self::nearest_border_of_largest_segment`] for a normalized position,
    /// answered as a normalized position.
    pub fn nearest_border_of_largest_segment_normalized(&self, point: Vec3) -> Result<Vec3> {
        let voxel =
            self.nearest_border_of_largest_segment(self.grid.percentage_to_grid(point))?;
        Ok(self.grid.grid_to_percentage(voxel.as_vec3()))
    }

    /// Searches outwards from `start` through inside voxels whose value lies
    /// strictly between `greater_than` and `less_than`, and returns the
    /// closest voxel that stops the search.
    pub fn nearest_voxel_beyond_threshold(
        &self,
        start: IVec3,
        greater_than: u32,
        less_than: u32,
    ) -> Option<IVec3> {
        self.nearest_voxel_beyond_threshold_corrected(start, Vec3::ONE, greater_than, less_than)
    }

    /// [`Self::nearest_voxel_beyond_threshold`] with per-axis distance
    /// scaling for anisotropic voxels.
    ///
    /// A `start` outside the grid is clamped into it. Candidates closer than
    /// half a voxel are ignored.
    pub fn nearest_voxel_beyond_threshold_corrected(
        &self,
        start: IVec3,
        correction: Vec3,
        greater_than: u32,
        less_than: u32,
    ) -> Option<IVec3> {
        let grid = self.grid;
        if grid.is_empty() {
            return None;
        }
        let start = start.clamp(IVec3::ZERO, grid.dims().as_ivec3() - IVec3::ONE);
        let distance = |p: IVec3| ((p - start).as_vec3() * correction).length();

        let mut seen: BitVec = BitVec::repeat(false, grid.count());
        let mut queue = VecDeque::new();
        let mut closest = f32::MAX;
        let mut best = None;

        if let Some(i) = grid.try_index(start) {
            seen.set(i, true);
        }
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            if distance(current) >= closest {
                continue;
            }
            for n in neighbors(grid, current, Connectivity::Six) {
                let Some(index) = n.index else { continue };
                if seen[index] {
                    continue;
                }
                let value = grid.buffer()[index];
                let passable = self.classification.class_at(index) == VoxelClass::Inside
                    && value > greater_than
                    && value < less_than;
                if passable {
                    seen.set(index, true);
                    queue.push_back(n.position);
                } else {
                    let d = distance(n.position);
                    if d > 0.5 && d < closest {
                        closest = d;
                        best = Some(n.position);
                        seen.set(index, true);
                    }
                }
            }
        }

        log::trace!("threshold search from {start:?}: {best:?} at {closest}");
        best
    }
}

fn nearest(voxels: &[UVec3], point: Vec3) -> Result<UVec3> {
    let mut best: Option<(UVec3, f32)> = None;
    for &v in voxels {
        let d = v.as_vec3().distance(point);
        if best.map_or(true, |(_, closest)| d < closest) {
            best = Some((v, d));
        }
    }
    best.map(|(v, _)| v).ok_or(VoxscopeError::NoBorderVoxels)
}

/// Distance from a normalized position to the nearest voxel below
/// `tolerance`, floored at [`MIN_EXIT_DISTANCE`].
///
/// Returns `None` when no voxel is below tolerance.
#[must_use]
pub fn minimum_distance_to_exit(grid: &VoxelGrid, position: Vec3, tolerance: u32) -> Option<f32> {
    nearest_exit(grid, position, tolerance).map(|(d, _)| d)
}

/// Distance to and normalized position of the nearest voxel below
/// `tolerance`. Earlier voxels win ties.
#[must_use]
pub fn nearest_exit(grid: &VoxelGrid, position: Vec3, tolerance: u32) -> Option<(f32, Vec3)> {
    let best = exits(grid, position, tolerance).fold(None, |best: Option<ExitCandidate>, c| {
        match best {
            Some(b) if b.distance <= c.distance => Some(b),
            _ => Some(c),
        }
    })?;
    Some((best.distance.max(MIN_EXIT_DISTANCE), best.normalized))
}

/// Every voxel below `tolerance` with its distance from a normalized
/// position, in buffer order.
#[must_use]
pub fn exit_distance_table(grid: &VoxelGrid, position: Vec3, tolerance: u32) -> Vec<ExitCandidate> {
    exits(grid, position, tolerance).collect()
}

fn exits(
    grid: &VoxelGrid,
    position: Vec3,
    tolerance: u32,
) -> impl Iterator<Item = ExitCandidate> + '_ {
    let dims = grid.dims().as_vec3();
    let target = position * dims;
    grid.buffer()
        .iter()
        .enumerate()
        .filter(move |&(_, &v)| v < tolerance)
        .map(move |(i, _)| {
            let voxel = grid.position_of(i);
            ExitCandidate {
                voxel,
                normalized: voxel.as_vec3() / dims,
                distance: voxel.as_vec3().distance(target),
            }
        })
}
