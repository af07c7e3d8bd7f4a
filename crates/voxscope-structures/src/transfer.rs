//! Density transfer functions and stipple volumes.

use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};
use voxscope_core::VoxelGrid;

/// Most color stops a transfer function carries.
pub const MAX_COLOR_STOPS: usize = 4;

/// Length of each shader-side array: a leading sentinel, the stops, and
/// trailing padding.
pub const SHADER_ARRAY_LEN: usize = MAX_COLOR_STOPS + 2;

/// Fully transparent black.
pub const CLEAR: [u8; 4] = [0, 0, 0, 0];

/// A color applied from a density upwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    /// Voxel value at which the stop begins.
    pub density: f32,
    /// RGBA color.
    pub color: [u8; 4],
    /// Opacity weight in `[0, 1]`; also the stipple probability.
    pub intensity: f32,
}

impl ColorStop {
    pub fn new(density: f32, color: [u8; 4], intensity: f32) -> Self {
        Self {
            density,
            color,
            intensity,
        }
    }
}

/// Arrays uploaded to the volume shader.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderArrays {
    pub colors: [[u8; 4]; SHADER_ARRAY_LEN],
    pub densities: [f32; SHADER_ARRAY_LEN],
    pub intensities: [f32; SHADER_ARRAY_LEN],
}

/// Up to [`MAX_COLOR_STOPS`] color stops sorted by density.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferFunction {
    stops: Vec<ColorStop>,
}

impl TransferFunction {
    /// Sorts the stops by density and keeps the lowest [`MAX_COLOR_STOPS`].
    pub fn new(mut stops: Vec<ColorStop>) -> Self {
        stops.sort_by(|a, b| a.density.total_cmp(&b.density));
        if stops.len() > MAX_COLOR_STOPS {
            log::warn!(
                "transfer function has {} stops, keeping the first {MAX_COLOR_STOPS}",
                stops.len()
            );
            stops.truncate(MAX_COLOR_STOPS);
        }
        Self { stops }
    }

    /// The stops in ascending density order.
    #[must_use]
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Builds the shader arrays: a clear sentinel at density 20 with zero
    /// intensity, the stops, then clear padding at density 257 with full
    /// intensity.
    #[must_use]
    pub fn shader_arrays(&self) -> ShaderArrays {
        let mut arrays = ShaderArrays {
            colors: [CLEAR; SHADER_ARRAY_LEN],
            densities: [257.0; SHADER_ARRAY_LEN],
            intensities: [1.0; SHADER_ARRAY_LEN],
        };
        arrays.densities[0] = 20.0;
        arrays.intensities[0] = 0.0;
        for (i, stop) in self.stops.iter().enumerate() {
            arrays.colors[i + 1] = stop.color;
            arrays.densities[i + 1] = stop.density;
            arrays.intensities[i + 1] = stop.intensity;
        }
        arrays
    }

    /// Picks the stop that governs `value`.
    ///
    /// Values below the first stop get `None`. Otherwise the stop whose
    /// density range strictly contains the value wins, falling back to the
    /// last stop.
    #[must_use]
    pub fn stop_for(&self, value: f32) -> Option<&ColorStop> {
        let first = self.stops.first()?;
        if first.density > value {
            return None;
        }
        let bracket = self
            .stops
            .windows(2)
            .position(|pair| pair[0].density < value && pair[1].density > value);
        match bracket {
            Some(i) => self.stops.get(i),
            None => self.stops.last(),
        }
    }
}

/// A cubic RGBA texture, x-fastest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StippleVolume {
    resolution: u32,
    texels: Vec<[u8; 4]>,
}

impl StippleVolume {
    /// Edge length in texels.
    #[must_use]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Texel colors.
    #[must_use]
    pub fn texels(&self) -> &[[u8; 4]] {
        &self.texels
    }

    /// Fraction of texels that are not clear.
    #[must_use]
    pub fn coverage(&self) -> f32 {
        if self.texels.is_empty() {
            return 0.0;
        }
        let filled = self.texels.iter().filter(|t| **t != CLEAR).count();
        filled as f32 / self.texels.len() as f32
    }
}

/// Samples `grid` into a `resolution`³ stipple texture.
///
/// Each texel's normalized position goes through the grid's mirrored
/// percentage mapping. A texel takes the color of the governing stop with
/// probability equal to that stop's intensity, and is clear otherwise. The
/// same `seed` always produces the same volume.
#[must_use]
pub fn stipple_volume(
    grid: &VoxelGrid,
    transfer: &TransferFunction,
    resolution: u32,
    seed: u64,
) -> StippleVolume {
    let mut rng = fastrand::Rng::with_seed(seed);
    let len = (resolution as usize).pow(3);
    let mut texels = Vec::with_capacity(len);
    let scale = resolution as f32;

    for z in 0..resolution {
        for y in 0..resolution {
            for x in 0..resolution {
                let percentage = UVec3::new(x, y, z).as_vec3() / Vec3::splat(scale);
                let value = grid.get_at(grid.percentage_to_grid(percentage));
                let texel = match transfer.stop_for(value as f32) {
                    Some(stop) if rng.f32() < stop.intensity => stop.color,
                    _ => CLEAR,
                };
                texels.push(texel);
            }
        }
    }

    log::debug!("stipple volume {resolution}^3 from {} stops", transfer.stops().len());
    StippleVolume { resolution, texels }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BONE: [u8; 4] = [240, 230, 200, 255];

    fn two_stops() -> TransferFunction {
        TransferFunction::new(vec![
            ColorStop::new(400.0, BONE, 1.0),
            ColorStop::new(100.0, RED, 0.0),
        ])
    }

    #[test]
    fn test_stops_sorted_and_capped() {
        let stops = (0..6)
            .map(|i| ColorStop::new((6 - i) as f32 * 10.0, RED, 1.0))
            .collect();
        let tf = TransferFunction::new(stops);
        let densities: Vec<f32> = tf.stops().iter().map(|s| s.density).collect();
        assert_eq!(densities, vec![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_shader_arrays_padding() {
        let arrays = two_stops().shader_arrays();
        assert_eq!(arrays.densities, [20.0, 100.0, 400.0, 257.0, 257.0, 257.0]);
        assert_eq!(arrays.intensities, [0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(arrays.colors[0], CLEAR);
        assert_eq!(arrays.colors[2], BONE);
        assert_eq!(arrays.colors[5], CLEAR);
    }

    #[test]
    fn test_stop_selection() {
        let tf = two_stops();
        assert!(tf.stop_for(50.0).is_none());
        assert_eq!(tf.stop_for(200.0).unwrap().color, RED);
        assert_eq!(tf.stop_for(900.0).unwrap().color, BONE);
        // Exactly on a boundary there is no strict bracket.
        assert_eq!(tf.stop_for(100.0).unwrap().color, BONE);
        assert!(TransferFunction::default().stop_for(1.0).is_none());
    }

    #[test]
    fn test_stipple_volume() {
        let grid = VoxelGrid::filled(8, 8, 8, 500).unwrap();
        let volume = stipple_volume(&grid, &two_stops(), 4, 7);
        assert_eq!(volume.texels().len(), 64);
        // Texels with a zero coordinate map to the grid edge and read 0.
        assert_eq!(volume.texels()[0], CLEAR);
        let inner = 1 + 4 + 16;
        assert_eq!(volume.texels()[inner], BONE);
        assert_eq!(volume.coverage(), 27.0 / 64.0);
    }

    #[test]
    fn test_stipple_is_reproducible() {
        let grid = VoxelGrid::from_fn(6, 6, 6, |p| 150 + 60 * p.x).unwrap();
        let tf = TransferFunction::new(vec![ColorStop::new(100.0, RED, 0.5)]);
        let a = stipple_volume(&grid, &tf, 6, 42);
        let b = stipple_volume(&grid, &tf, 6, 42);
        assert_eq!(a, b);
        assert!(a.coverage() > 0.0 && a.coverage() < 1.0);
    }
}
