//! Byte textures and axis-aligned slice images.

use std::path::Path;

use image::{GrayImage, Luma, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use voxscope_core::options::TextureOptions;
use voxscope_core::{Result, VoxelGrid};

/// Widest slice image, in pixels, a thickness stretch may produce.
pub const MAX_SLICE_WIDTH: u32 = 16_384;

/// Maps every voxel into `[0, 255]` over the window `[low, high]`.
///
/// Values are rounded and clamped. When `high <= low` the mapping is a step:
/// voxels at or above `high` become 255, everything else 0.
#[must_use]
pub fn byte_volume(grid: &VoxelGrid, low: u32, high: u32) -> Vec<u8> {
    if high <= low {
        log::warn!("degenerate byte window [{low}, {high}], using a step at {high}");
        return grid
            .buffer()
            .iter()
            .map(|&v| if v >= high { u8::MAX } else { 0 })
            .collect();
    }
    let low = f64::from(low);
    let span = f64::from(high) - low;
    grid.buffer()
        .iter()
        .map(|&v| to_byte((f64::from(v) - low) / span * 255.0))
        .collect()
}

/// [`byte_volume`] with the window from [`TextureOptions`].
#[must_use]
pub fn byte_volume_with(grid: &VoxelGrid, options: &TextureOptions) -> Vec<u8> {
    byte_volume(grid, options.low, options.high)
}

/// Rounds and saturates into a byte. NaN maps to 0.
fn to_byte(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// The plane a slice is cut along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SliceAxis {
    /// Fixed Z; rows are Y, columns are X.
    Xy,
    /// Fixed X; rows are Y, columns are Z repeated by the slice thickness.
    Zy,
    /// Fixed Y; rows are X, columns are Z repeated by the slice thickness.
    Xz,
}

/// How voxel values inside the window become intensities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SliceMapping {
    /// The historical viewer mapping. XY slices use `(v - low) / high`; ZY and
    /// XZ slices use `(v - high) / low`, which saturates to black inside the
    /// window. Kept so existing renders stay pixel-identical.
    #[default]
    Legacy,
    /// `(v - low) / (high - low)` on every axis.
    Linear,
}

/// A grayscale slice, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl SliceImage {
    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Intensities, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Intensity at a column and row.
    #[must_use]
    pub fn pixel(&self, column: u32, row: u32) -> u8 {
        self.pixels[row as usize * self.width as usize + column as usize]
    }

    /// Packs each pixel as `(255 - v) << 24 | v << 16 | v << 8 | v`.
    #[must_use]
    pub fn to_argb(&self) -> Vec<u32> {
        self.pixels
            .iter()
            .map(|&v| {
                let v = u32::from(v);
                ((255 - v) << 24) | (v << 16) | (v << 8) | v
            })
            .collect()
    }

    /// Converts to an `image` grayscale buffer.
    #[must_use]
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| Luma([self.pixel(x, y)]))
    }

    /// Converts to RGBA with the intensity in the color channels and its
    /// complement in alpha.
    #[must_use]
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let v = self.pixel(x, y);
            Rgba([v, v, v, 255 - v])
        })
    }

    /// Writes the slice as a grayscale image; the format follows the
    /// extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_gray_image().save(path)?;
        Ok(())
    }
}

/// Cuts grayscale slices out of a grid.
#[derive(Debug, Clone, Copy)]
pub struct SliceSampler {
    low: u32,
    high: u32,
    mapping: SliceMapping,
}

impl Default for SliceSampler {
    fn default() -> Self {
        Self::new(&TextureOptions::default())
    }
}

impl SliceSampler {
    /// Creates a sampler over the texture window.
    pub fn new(options: &TextureOptions) -> Self {
        Self {
            low: options.low,
            high: options.high,
            mapping: SliceMapping::default(),
        }
    }

    /// Sets the intensity mapping.
    #[must_use]
    pub fn with_mapping(mut self, mapping: SliceMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Maps a voxel value to an intensity for the given axis.
    #[must_use]
    pub fn intensity(&self, axis: SliceAxis, value: u32) -> u8 {
        if value < self.low {
            return 0;
        }
        if value > self.high {
            return u8::MAX;
        }
        let v = f64::from(value);
        let low = f64::from(self.low);
        let high = f64::from(self.high);
        let scaled = match (self.mapping, axis) {
            (SliceMapping::Legacy, SliceAxis::Xy) => (v - low) / high,
            (SliceMapping::Legacy, SliceAxis::Zy | SliceAxis::Xz) => (v - high) / low,
            (SliceMapping::Linear, _) if high > low => (v - low) / (high - low),
            (SliceMapping::Linear, _) => 1.0,
        };
        to_byte(scaled * 255.0)
    }

    /// Cuts the slice at `index` along `axis`, or `None` if `index` is out of
    /// range.
    #[must_use]
    pub fn slice(&self, grid: &VoxelGrid, axis: SliceAxis, index: u32) -> Option<SliceImage> {
        match axis {
            SliceAxis::Xy => self.slice_xy(grid, index),
            SliceAxis::Zy => self.slice_zy(grid, index),
            SliceAxis::Xz => self.slice_xz(grid, index),
        }
    }

    /// The XY plane at depth `z`.
    #[must_use]
    pub fn slice_xy(&self, grid: &VoxelGrid, z: u32) -> Option<SliceImage> {
        if z >= grid.depth() {
            return None;
        }
        let start = grid.index(0, 0, z);
        let len = grid.width() as usize * grid.height() as usize;
        let pixels = grid.buffer()[start..start + len]
            .iter()
            .map(|&v| self.intensity(SliceAxis::Xy, v))
            .collect();
        Some(SliceImage {
            width: grid.width(),
            height: grid.height(),
            pixels,
        })
    }

    /// The ZY plane at column `x`.
    #[must_use]
    pub fn slice_zy(&self, grid: &VoxelGrid, x: u32) -> Option<SliceImage> {
        if x >= grid.width() {
            return None;
        }
        Some(self.stretched(grid, SliceAxis::Zy, grid.height(), |row, z| {
            grid.index(x, row, z)
        }))
    }

    /// The XZ plane at row `y`.
    #[must_use]
    pub fn slice_xz(&self, grid: &VoxelGrid, y: u32) -> Option<SliceImage> {
        if y >= grid.height() {
            return None;
        }
        Some(self.stretched(grid, SliceAxis::Xz, grid.width(), |row, z| {
            grid.index(row, y, z)
        }))
    }

    /// Builds a slice whose columns walk Z, each repeated by the slice
    /// thickness so the image keeps the physical aspect ratio.
    fn stretched(
        &self,
        grid: &VoxelGrid,
        axis: SliceAxis,
        rows: u32,
        index_of: impl Fn(u32, u32) -> usize,
    ) -> SliceImage {
        let mut repeat = grid.thickness_value().max(1);
        let max_repeat = (MAX_SLICE_WIDTH / grid.depth().max(1)).max(1);
        if repeat > max_repeat {
            log::warn!(
                "slice thickness {repeat} exceeds the image width limit, using {max_repeat}"
            );
            repeat = max_repeat;
        }
        let width = grid.depth().saturating_mul(repeat);
        let mut pixels = Vec::with_capacity(rows as usize * width as usize);
        for row in 0..rows {
            for z in 0..grid.depth() {
                let v = self.intensity(axis, grid.buffer()[index_of(row, z)]);
                pixels.extend(std::iter::repeat(v).take(repeat as usize));
            }
        }
        SliceImage {
            width,
            height: rows,
            pixels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxscope_core::VoxelSpacing;

    #[test]
    fn test_byte_volume_clamps() {
        let grid = VoxelGrid::new(5, 1, 1, vec![0, 50, 100, 150, 1000]).unwrap();
        assert_eq!(byte_volume(&grid, 50, 150), vec![0, 0, 128, 255, 255]);
    }

    #[test]
    fn test_byte_volume_step_window() {
        let grid = VoxelGrid::new(3, 1, 1, vec![10, 20, 30]).unwrap();
        assert_eq!(byte_volume(&grid, 20, 20), vec![0, 255, 255]);
        let options = TextureOptions { low: 0, high: 30 };
        assert_eq!(byte_volume_with(&grid, &options), vec![85, 170, 255]);
    }

    #[test]
    fn test_xy_slice_legacy_mapping() {
        let grid = VoxelGrid::from_fn(2, 2, 2, |p| 100 * (p.x + 2 * p.y + 4 * p.z)).unwrap();
        let sampler = SliceSampler::new(&TextureOptions { low: 100, high: 500 });
        let slice = sampler.slice_xy(&grid, 1).unwrap();
        // Values 400, 500, 600, 700: (v - 100) / 500 inside, 255 above.
        assert_eq!(slice.pixels(), &[153, 204, 255, 255]);
        assert!(sampler.slice_xy(&grid, 2).is_none());
    }

    #[test]
    fn test_zy_slice_repeats_by_thickness() {
        let spacing = VoxelSpacing {
            slice_thickness: 2.0,
            ..VoxelSpacing::default()
        };
        let grid = VoxelGrid::from_fn(2, 3, 2, |p| if p.z == 1 { 900 } else { 0 })
            .unwrap()
            .with_spacing(spacing);
        let sampler = SliceSampler::new(&TextureOptions { low: 10, high: 800 });
        let slice = sampler.slice_zy(&grid, 1).unwrap();
        assert_eq!((slice.width(), slice.height()), (4, 3));
        assert_eq!(&slice.pixels()[..4], &[0, 0, 255, 255]);
        assert!(sampler.slice_zy(&grid, 2).is_none());
    }

    #[test]
    fn test_huge_thickness_is_capped() {
        let spacing = VoxelSpacing {
            slice_thickness: 1.0e9,
            ..VoxelSpacing::default()
        };
        let grid = VoxelGrid::filled(2, 3, 2, 900)
            .unwrap()
            .with_spacing(spacing);
        let slice = SliceSampler::default().slice_zy(&grid, 0).unwrap();
        assert_eq!(slice.width(), MAX_SLICE_WIDTH);
        assert_eq!(slice.pixels().len(), 3 * MAX_SLICE_WIDTH as usize);
    }

    #[test]
    fn test_xz_slice_layout() {
        let grid = VoxelGrid::from_fn(3, 2, 2, |p| p.x * 100 + p.z * 10).unwrap();
        let sampler = SliceSampler::new(&TextureOptions { low: 0, high: 210 })
            .with_mapping(SliceMapping::Linear);
        let slice = sampler.slice_xz(&grid, 1).unwrap();
        assert_eq!((slice.width(), slice.height()), (2, 3));
        assert_eq!(slice.pixel(0, 2), sampler.intensity(SliceAxis::Xz, 200));
        assert_eq!(slice.pixel(1, 2), 255);
    }

    #[test]
    fn test_legacy_side_views_saturate_inside_window() {
        let sampler = SliceSampler::new(&TextureOptions { low: 100, high: 500 });
        assert_eq!(sampler.intensity(SliceAxis::Zy, 300), 0);
        assert_eq!(sampler.intensity(SliceAxis::Xy, 300), 102);
        let linear = sampler.with_mapping(SliceMapping::Linear);
        assert_eq!(linear.intensity(SliceAxis::Zy, 300), 128);
    }

    #[test]
    fn test_argb_packing() {
        let slice = SliceImage {
            width: 2,
            height: 1,
            pixels: vec![0, 255],
        };
        assert_eq!(slice.to_argb(), vec![0xFF00_0000, 0x00FF_FFFF]);
        let rgba = slice.to_rgba_image();
        assert_eq!(rgba.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(slice.to_gray_image().get_pixel(1, 0), &Luma([255]));
    }
}
