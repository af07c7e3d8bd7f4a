//! A voxel grid paired with its classification and pipeline options.

use glam::{IVec3, UVec3, Vec3};
use voxscope_core::{Options, Result, VoxelGrid, VoxscopeError};

use crate::proximity::ProximityQuery;
use crate::segmentation::{ClassificationResult, RegionClassifier};
use crate::surface::{MeshChunk, SurfaceExtractor};
use crate::texture::{byte_volume_with, SliceAxis, SliceImage, SliceSampler};

/// A grid, the options it is processed with, and its classification once
/// computed.
///
/// Classification runs at most once; later calls to [`Volume::classify`]
/// return the stored result until it is invalidated.
#[derive(Debug, Clone)]
pub struct Volume {
    grid: VoxelGrid,
    options: Options,
    classification: Option<ClassificationResult>,
}

impl Volume {
    /// Wraps a grid with default options.
    pub fn new(grid: VoxelGrid) -> Self {
        Self {
            grid,
            options: Options::default(),
            classification: None,
        }
    }

    /// Wraps a grid with validated options.
    pub fn with_options(grid: VoxelGrid, options: Options) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            grid,
            options,
            classification: None,
        })
    }

    /// The underlying grid.
    #[must_use]
    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    /// Mutable access to the grid. Drops any stored classification.
    pub fn grid_mut(&mut self) -> &mut VoxelGrid {
        self.invalidate_classification();
        &mut self.grid
    }

    /// Pipeline options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Replaces the options. Drops the classification if the classification
    /// settings changed.
    pub fn set_options(&mut self, options: Options) -> Result<()> {
        options.validate()?;
        if options.classification != self.options.classification {
            self.invalidate_classification();
        }
        self.options = options;
        Ok(())
    }

    /// Classifies the grid if it has not been classified yet.
    ///
    /// Returns `None` for an empty grid.
    pub fn classify(&mut self) -> Option<&ClassificationResult> {
        if self.classification.is_none() {
            self.classification =
                RegionClassifier::new(self.options.classification).classify(&self.grid);
        } else {
            log::debug!("volume already classified, reusing result");
        }
        self.classification.as_ref()
    }

    /// Forgets the stored classification so the next [`Volume::classify`]
    /// runs again.
    pub fn invalidate_classification(&mut self) {
        self.classification = None;
    }

    /// Returns true once a classification is stored.
    #[must_use]
    pub fn is_classified(&self) -> bool {
        self.classification.is_some()
    }

    /// The stored classification.
    pub fn classification(&self) -> Result<&ClassificationResult> {
        self.classification
            .as_ref()
            .ok_or(VoxscopeError::NotClassified)
    }

    /// Proximity queries against the stored classification.
    pub fn proximity(&self) -> Result<ProximityQuery<'_>> {
        ProximityQuery::new(&self.grid, self.classification()?)
    }

    /// Closest border voxel to `point`. Fails with `NotClassified` before
    /// [`Volume::classify`].
    pub fn nearest_border_voxel(&self, point: IVec3) -> Result<UVec3> {
        self.proximity()?.nearest_border_voxel(point)
    }

    /// Closest border voxel of the largest segment. Fails with
    /// `NotClassified` before [`Volume::classify`].
    pub fn nearest_border_of_largest_segment(&self, point: IVec3) -> Result<UVec3> {
        self.proximity()?.nearest_border_of_largest_segment(point)
    }

    /// Normalized-position form of [`Volume::nearest_border_voxel`]. Fails
    /// with `NotClassified` before [`Volume::classify`].
    pub fn nearest_border_normalized(&self, point: Vec3) -> Result<Vec3> {
        self.proximity()?.nearest_border_normalized(point)
    }

    /// Normalized-position form of
    /// [`Volume::nearest_border_of_largest_segment`]. Fails with
    /// `NotClassified` before [`Volume::classify`].
    pub fn nearest_border_of_largest_segment_normalized(&self, point: Vec3) -> Result<Vec3> {
        self.proximity()?
            .nearest_border_of_largest_segment_normalized(point)
    }

    /// Nearest voxel that stops a search through inside voxels valued in
    /// `(greater_than, less_than)`. Fails with `NotClassified` before
    /// [`Volume::classify`].
    pub fn nearest_voxel_beyond_threshold(
        &self,
        start: IVec3,
        greater_than: u32,
        less_than: u32,
    ) -> Result<Option<IVec3>> {
        Ok(self
            .proximity()?
            .nearest_voxel_beyond_threshold(start, greater_than, less_than))
    }

    /// Extracts the surface using the extraction options.
    pub fn extract_surface(&self) -> Result<Vec<MeshChunk>> {
        Ok(SurfaceExtractor::new(self.options.extraction)?.extract(&self.grid))
    }

    /// The grid as bytes over the texture window.
    #[must_use]
    pub fn byte_volume(&self) -> Vec<u8> {
        byte_volume_with(&self.grid, &self.options.texture)
    }

    /// A slice image over the texture window.
    #[must_use]
    pub fn slice(&self, axis: SliceAxis, index: u32) -> Option<SliceImage> {
        SliceSampler::new(&self.options.texture).slice(&self.grid, axis, index)
    }
}
