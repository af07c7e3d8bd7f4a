//! Iso-surface extraction into render-sized mesh chunks.

use glam::Vec3;
use voxscope_core::options::{ExtractionMode, ExtractionOptions};
use voxscope_core::{
    MarchingCubes, MarchingTetrahedra, Polygonizer, Result, ScalarField, VoxelGrid,
};

/// Interleaved vertex layout for upload to a renderer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Position relative to the chunk origin.
    pub position: [f32; 3],
    /// Face normal of the triangle this vertex belongs to.
    pub normal: [f32; 3],
}

/// A piece of an extracted surface.
///
/// Vertices are not shared between triangles and indices are local to the
/// chunk, so triangle `t` is always vertices `3t..3t+3`.
#[derive(Debug, Clone, Default)]
pub struct MeshChunk {
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    indices: Vec<u32>,
    origin: Vec3,
}

impl MeshChunk {
    fn from_triangles(triangles: &[Vec3], origin: Vec3) -> Self {
        let mut normals = Vec::with_capacity(triangles.len());
        for tri in triangles.chunks_exact(3) {
            let n = (tri[1] - tri[0])
                .cross(tri[2] - tri[0])
                .normalize_or_zero();
            normals.extend([n, n, n]);
        }
        Self {
            vertices: triangles.to_vec(),
            normals,
            indices: (0..triangles.len() as u32).collect(),
            origin,
        }
    }

    /// Vertex positions in voxel units, relative to [`Self::origin`].
    #[must_use]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// One unit normal per vertex.
    #[must_use]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Local triangle indices.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Offset that centers the whole surface on the grid center.
    #[must_use]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Returns the number of triangles in the chunk.
    #[must_use]
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex positions with the chunk origin applied.
    pub fn world_vertices(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices.iter().map(move |&v| v + self.origin)
    }

    /// Interleaved position/normal records.
    #[must_use]
    pub fn interleaved(&self) -> Vec<MeshVertex> {
        self.vertices
            .iter()
            .zip(&self.normals)
            .map(|(p, n)| MeshVertex {
                position: p.to_array(),
                normal: n.to_array(),
            })
            .collect()
    }

    /// Interleaved vertices as raw bytes.
    #[must_use]
    pub fn vertex_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.interleaved()).to_vec()
    }
}

/// Extracts the surface of a value window from a voxel grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceExtractor {
    options: ExtractionOptions,
}

impl SurfaceExtractor {
    /// Creates an extractor, rejecting invalid chunk sizes and empty windows.
    pub fn new(options: ExtractionOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// The options this extractor runs with.
    #[must_use]
    pub fn options(&self) -> &ExtractionOptions {
        &self.options
    }

    fn polygonizer(&self) -> Box<dyn Polygonizer> {
        match self.options.mode {
            ExtractionMode::Cubes => Box::new(MarchingCubes),
            ExtractionMode::Tetrahedra => Box::new(MarchingTetrahedra),
        }
    }

    /// Extracts the boundary of voxels valued within `[low, high]`.
    ///
    /// Grids thinner than two voxels on any axis yield no chunks.
    #[must_use]
    pub fn extract(&self, grid: &VoxelGrid) -> Vec<MeshChunk> {
        if grid.dims().min_element() < 2 {
            log::warn!(
                "grid {}x{}x{} has no cells to polygonize",
                grid.width(),
                grid.height(),
                grid.depth()
            );
            return Vec::new();
        }
        let field = ScalarField::from_window(grid, self.options.low, self.options.high);
        self.extract_field(&field)
    }

    /// Extracts the zero level set of a prepared field.
    #[must_use]
    pub fn extract_field(&self, field: &ScalarField) -> Vec<MeshChunk> {
        let triangles = self.polygonizer().polygonize(field);
        let origin = -(field.dims() / 2).as_vec3();
        let chunks: Vec<MeshChunk> = triangles
            .chunks(self.options.max_vertices_per_chunk)
            .map(|part| MeshChunk::from_triangles(part, origin))
            .collect();

        log::info!(
            "extracted {} triangles in {} chunks ({:?})",
            triangles.len() / 3,
            chunks.len(),
            self.options.mode
        );
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec3;
    use voxscope_core::VoxscopeError;

    fn ball(n: u32, radius: f32) -> VoxelGrid {
        let center = Vec3::splat((n - 1) as f32 / 2.0);
        VoxelGrid::from_fn(n, n, n, |p| {
            let d = (p.as_vec3() - center).length();
            if d <= radius {
                500
            } else {
                0
            }
        })
        .unwrap()
    }

    fn extractor(mode: ExtractionMode) -> SurfaceExtractor {
        SurfaceExtractor::new(ExtractionOptions {
            mode,
            low: 100,
            high: 1000,
            ..ExtractionOptions::default()
        })
        .unwrap()
    }

    /// Checks that face normals point away from `center` on average and
    /// for the clear majority of triangles.
    fn assert_outward(chunks: &[MeshChunk], center: Vec3) {
        let mut outward = 0_usize;
        let mut total = 0_usize;
        let mut cosine_sum = 0.0_f32;
        for chunk in chunks {
            let triangles = chunk.vertices().chunks_exact(3);
            for (tri, normals) in triangles.zip(chunk.normals().chunks_exact(3)) {
                if normals[0] == Vec3::ZERO {
                    continue;
                }
                let centroid = (tri[0] + tri[1] + tri[2]) / 3.0;
                let cosine = normals[0].dot((centroid - center).normalize());
                total += 1;
                cosine_sum += cosine;
                if cosine > 0.0 {
                    outward += 1;
                }
            }
        }
        assert!(total > 0);
        assert!(cosine_sum / total as f32 > 0.5);
        assert!(outward * 10 >= total * 9, "only {outward} of {total} face outward");
    }

    #[test]
    fn test_ball_cubes() {
        let grid = ball(16, 5.0);
        let chunks = extractor(ExtractionMode::Cubes).extract(&grid);
        assert_eq!(chunks.len(), 1);
        let chunk = &chunks[0];
        assert!(chunk.num_triangles() > 100);
        assert_eq!(chunk.vertices().len(), chunk.indices().len());
        assert_eq!(chunk.origin(), Vec3::splat(-8.0));
        assert_outward(&chunks, Vec3::splat(7.5));
    }

    #[test]
    fn test_ball_tetrahedra() {
        let grid = ball(12, 3.5);
        let chunks = extractor(ExtractionMode::Tetrahedra).extract(&grid);
        assert!(!chunks.is_empty());
        assert_outward(&chunks, Vec3::splat(5.5));
    }

    #[test]
    fn test_distance_field_faces_outward() {
        // Value is ten times the distance from the center; the window [0, 60]
        // is the ball of radius 6.
        let center = Vec3::splat(8.0);
        let grid = VoxelGrid::from_fn(17, 17, 17, |p| {
            (p.as_vec3().distance(center) * 10.0).round() as u32
        })
        .unwrap();
        for mode in [ExtractionMode::Cubes, ExtractionMode::Tetrahedra] {
            let extractor = SurfaceExtractor::new(ExtractionOptions {
                mode,
                low: 0,
                high: 60,
                ..ExtractionOptions::default()
            })
            .unwrap();
            let chunks = extractor.extract(&grid);
            assert!(!chunks.is_empty(), "{mode:?} produced no surface");
            for v in chunks.iter().flat_map(|c| c.vertices()) {
                let r = v.distance(center);
                assert!((4.9..=7.1).contains(&r), "{mode:?} vertex at radius {r}");
            }
            assert_outward(&chunks, center);
        }
    }

    #[test]
    fn test_chunking() {
        let grid = ball(16, 5.0);
        let total = extractor(ExtractionMode::Cubes).extract(&grid)[0].vertices().len();
        let small = SurfaceExtractor::new(ExtractionOptions {
            low: 100,
            high: 1000,
            max_vertices_per_chunk: 30,
            ..ExtractionOptions::default()
        })
        .unwrap();
        let chunks = small.extract(&grid);
        assert_eq!(chunks.len(), total.div_ceil(30));
        for chunk in &chunks {
            assert!(chunk.vertices().len() <= 30);
            assert_eq!(chunk.vertices().len() % 3, 0);
            let expected: Vec<u32> = (0..chunk.vertices().len() as u32).collect();
            assert_eq!(chunk.indices(), expected.as_slice());
        }
        let recombined: usize = chunks.iter().map(|c| c.vertices().len()).sum();
        assert_eq!(recombined, total);
    }

    #[test]
    fn test_degenerate_grids() {
        let extractor = SurfaceExtractor::default();
        let thin = VoxelGrid::filled(1, 5, 5, 300).unwrap();
        assert!(extractor.extract(&thin).is_empty());
        let empty = VoxelGrid::new(0, 0, 0, Vec::new()).unwrap();
        assert!(extractor.extract(&empty).is_empty());
        let dark = VoxelGrid::filled(4, 4, 4, 0).unwrap();
        assert!(extractor.extract(&dark).is_empty());
    }

    #[test]
    fn test_rejects_bad_chunk_size() {
        let err = SurfaceExtractor::new(ExtractionOptions {
            max_vertices_per_chunk: 31,
            ..ExtractionOptions::default()
        })
        .unwrap_err();
        assert!(matches!(err, VoxscopeError::InvalidOptions(_)));
    }

    #[test]
    fn test_interleaved_vertices() {
        let grid = ball(8, 2.0);
        let chunks = extractor(ExtractionMode::Cubes).extract(&grid);
        let chunk = &chunks[0];
        let interleaved = chunk.interleaved();
        assert_eq!(interleaved.len(), chunk.vertices().len());
        assert_eq!(interleaved[0].position, chunk.vertices()[0].to_array());
        assert_eq!(
            chunk.vertex_bytes().len(),
            interleaved.len() * std::mem::size_of::<MeshVertex>()
        );
        let world: Vec<Vec3> = chunk.world_vertices().collect();
        assert_eq!(world[0], chunk.vertices()[0] - UVec3::splat(4).as_vec3());
    }
}
