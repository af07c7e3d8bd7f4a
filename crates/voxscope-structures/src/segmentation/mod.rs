//! Region classification: labels voxels outside, inside or border relative to
//! a tolerance and groups inside voxels into segments.

mod components;
mod passes;

use bitvec::vec::BitVec;
use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};
use voxscope_core::options::ClassificationOptions;
use voxscope_core::VoxelGrid;

/// Per-voxel region label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum VoxelClass {
    /// Not reached by either sweep.
    #[default]
    Unknown = 0,
    /// Below tolerance and connected to the outside seed.
    Outside = 1,
    /// Material surrounded by material.
    Inside = 2,
    /// Material adjacent to outside voxels or to the grid edge.
    Border = 3,
}

/// Axis-aligned bounds expressed as fractions of the grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl NormalizedBounds {
    /// Midpoint of the bounds.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths of the bounds.
    #[must_use]
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Everything one classification run learned about a grid.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    dims: UVec3,
    tolerance: u32,
    classes: Vec<VoxelClass>,
    inside: BitVec,
    membership: Vec<Vec<u32>>,
    border_voxels: Vec<UVec3>,
    border_voxels_of_largest: Vec<UVec3>,
    segment_sizes: Vec<usize>,
    largest_segment: Option<u32>,
    bounds: Option<NormalizedBounds>,
}

impl ClassificationResult {
    /// Dimensions of the grid this result was computed from.
    #[must_use]
    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    /// Tolerance the grid was classified with.
    #[must_use]
    pub fn tolerance(&self) -> u32 {
        self.tolerance
    }

    /// One label per voxel, in buffer order.
    #[must_use]
    pub fn classes(&self) -> &[VoxelClass] {
        &self.classes
    }

    /// Label of the voxel at a linear index.
    #[must_use]
    pub fn class_at(&self, index: usize) -> VoxelClass {
        self.classes
            .get(index)
            .copied()
            .unwrap_or(VoxelClass::Unknown)
    }

    /// Returns true if the voxel was labelled inside.
    #[must_use]
    pub fn is_inside(&self, index: usize) -> bool {
        self.inside.get(index).is_some_and(|bit| *bit)
    }

    /// Segment ids the voxel belongs to or borders.
    #[must_use]
    pub fn segments_of(&self, index: usize) -> &[u32] {
        self.membership
            .get(index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Border voxel coordinates, highest linear index first.
    #[must_use]
    pub fn border_voxels(&self) -> &[UVec3] {
        &self.border_voxels
    }

    /// Border voxels that touch the largest segment, in the same order.
    #[must_use]
    pub fn border_voxels_of_largest_segment(&self) -> &[UVec3] {
        &self.border_voxels_of_largest
    }

    /// Id of the segment with the most voxels (first found on ties).
    #[must_use]
    pub fn largest_segment(&self) -> Option<u32> {
        self.largest_segment
    }

    /// Number of segments that survived noise filtering.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segment_sizes.len()
    }

    /// Voxel count of the largest segment, 0 if there is none.
    #[must_use]
    pub fn largest_segment_size(&self) -> usize {
        self.largest_segment
            .map_or(0, |id| self.segment_sizes[id as usize])
    }

    /// Voxel count of every segment, indexed by id.
    #[must_use]
    pub fn segment_sizes(&self) -> &[usize] {
        &self.segment_sizes
    }

    /// Bounds of all border voxels, `None` if there are none.
    #[must_use]
    pub fn bounds(&self) -> Option<NormalizedBounds> {
        self.bounds
    }
}

/// Two-sweep inside/outside/border classifier with segment labelling.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionClassifier {
    options: ClassificationOptions,
}

impl RegionClassifier {
    /// Creates a classifier from options.
    pub fn new(options: ClassificationOptions) -> Self {
        Self { options }
    }

    /// Sets the material tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: u32) -> Self {
        self.options.tolerance = tolerance;
        self
    }

    /// Sets the largest segment size that is still treated as noise.
    #[must_use]
    pub fn with_noise_threshold(mut self, noise_threshold: usize) -> Self {
        self.options.noise_threshold = noise_threshold;
        self
    }

    /// The options this classifier runs with.
    #[must_use]
    pub fn options(&self) -> &ClassificationOptions {
        &self.options
    }

    /// Classifies every voxel of `grid`.
    ///
    /// Returns `None` for an empty grid.
    #[must_use]
    pub fn classify(&self, grid: &VoxelGrid) -> Option<ClassificationResult> {
        if grid.is_empty() {
            log::warn!("skipping classification of an empty grid");
            return None;
        }
        let tolerance = self.options.tolerance;

        let labels = passes::label(grid, tolerance);
        let components =
            components::label(grid, &labels.classes, &labels.inside, self.options.noise_threshold);

        let border_voxels: Vec<UVec3> = labels
            .border
            .iter()
            .map(|&i| grid.position_of(i))
            .collect();
        let border_voxels_of_largest = match components.largest {
            Some(id) => labels
                .border
                .iter()
                .filter(|&&i| components.membership[i].contains(&id))
                .map(|&i| grid.position_of(i))
                .collect(),
            None => Vec::new(),
        };
        let bounds = normalized_bounds(&border_voxels, grid.dims());

        log::info!(
            "classified {}x{}x{} grid: {} border voxels, {} segments, largest {:?}",
            grid.width(),
            grid.height(),
            grid.depth(),
            border_voxels.len(),
            components.segment_sizes.len(),
            components.largest
        );

        Some(ClassificationResult {
            dims: grid.dims(),
            tolerance,
            classes: labels.classes,
            inside: labels.inside,
            membership: components.membership,
            border_voxels,
            border_voxels_of_largest,
            segment_sizes: components.segment_sizes,
            largest_segment: components.largest,
            bounds,
        })
    }
}

fn normalized_bounds(voxels: &[UVec3], dims: UVec3) -> Option<NormalizedBounds> {
    let first = *voxels.first()?;
    let (min, max) = voxels
        .iter()
        .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let dims = dims.as_vec3();
    Some(NormalizedBounds {
        min: min.as_vec3() / dims,
        max: max.as_vec3() / dims,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 16x8x8 dark grid holding a bright 5x5x5 cube, a 5x4x4 box and a
    /// 5-voxel cross.
    fn two_blobs() -> VoxelGrid {
        VoxelGrid::from_fn(16, 8, 8, |p| {
            let in_box = |lo: UVec3, hi: UVec3| p.cmpge(lo).all() && p.cmple(hi).all();
            let big = in_box(UVec3::new(1, 1, 1), UVec3::new(5, 5, 5));
            let small = in_box(UVec3::new(8, 1, 1), UVec3::new(12, 4, 4));
            let cross = p.z == 6
                && ((p.x == 13 && (1..=3).contains(&p.y))
                    || (p.y == 2 && (12..=14).contains(&p.x)));
            if big || small || cross {
                200
            } else {
                0
            }
        })
        .unwrap()
    }

    #[test]
    fn test_uniform_bright_grid() {
        let grid = VoxelGrid::filled(4, 4, 4, 10).unwrap();
        let result = RegionClassifier::default().classify(&grid).unwrap();
        for i in 0..grid.count() {
            let p = grid.position_of(i);
            let on_edge = p.cmpeq(UVec3::ZERO).any() || p.cmpeq(UVec3::splat(3)).any();
            let expected = if on_edge {
                VoxelClass::Border
            } else {
                VoxelClass::Inside
            };
            assert_eq!(result.class_at(i), expected, "voxel {p:?}");
        }
        assert_eq!(result.border_voxels().len(), 64 - 8);
        // 2x2x2 interior is noise under the default threshold.
        assert_eq!(result.segment_count(), 0);
        let bounds = result.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::splat(0.75));
    }

    #[test]
    fn test_two_blobs_and_noise() {
        let grid = two_blobs();
        let result = RegionClassifier::default().classify(&grid).unwrap();

        assert_eq!(result.segment_count(), 2);
        assert_eq!(result.segment_sizes(), &[27, 12]);
        assert_eq!(result.largest_segment(), Some(0));
        assert_eq!(result.largest_segment_size(), 27);

        let center = grid.index(3, 3, 3);
        assert_eq!(result.segments_of(center), &[0]);
        let cross_center = grid.index(13, 2, 6);
        assert_eq!(result.class_at(cross_center), VoxelClass::Border);
        assert!(result.segments_of(cross_center).is_empty());

        for v in result.border_voxels_of_largest_segment() {
            assert!(v.x <= 5, "{v:?} is not on the big cube");
        }
        assert!(!result.border_voxels_of_largest_segment().is_empty());
    }

    #[test]
    fn test_noise_threshold_is_configurable() {
        let grid = two_blobs();
        let result = RegionClassifier::default()
            .with_noise_threshold(11)
            .classify(&grid)
            .unwrap();
        assert_eq!(result.segment_sizes(), &[27, 12]);
        let strict = RegionClassifier::default()
            .with_noise_threshold(12)
            .classify(&grid)
            .unwrap();
        assert_eq!(strict.segment_sizes(), &[27]);
    }

    #[test]
    fn test_empty_grid_is_skipped() {
        let grid = VoxelGrid::new(0, 0, 0, Vec::new()).unwrap();
        assert!(RegionClassifier::default().classify(&grid).is_none());
    }

    #[test]
    fn test_dark_grid_has_no_bounds() {
        let grid = VoxelGrid::filled(3, 3, 3, 0).unwrap();
        let result = RegionClassifier::default().classify(&grid).unwrap();
        assert!(result.bounds().is_none());
        assert_eq!(result.largest_segment(), None);
        assert_eq!(result.largest_segment_size(), 0);
    }
}
