//! Marching tetrahedra polygonizer.
//!
//! Each cube cell is split into six tetrahedra sharing the main diagonal
//! from corner 0 to corner 6. A tetrahedron has only three distinct cases
//! (empty, one corner cut off, two-two split), so no lookup table is needed.

use glam::{UVec3, Vec3};

use crate::scalar_field::{Polygonizer, ScalarField};

const CUBE_CORNERS: [UVec3; 8] = [
    UVec3::new(0, 0, 0),
    UVec3::new(1, 0, 0),
    UVec3::new(1, 1, 0),
    UVec3::new(0, 1, 0),
    UVec3::new(0, 0, 1),
    UVec3::new(1, 0, 1),
    UVec3::new(1, 1, 1),
    UVec3::new(0, 1, 1),
];

const TETRAHEDRA: [[usize; 4]; 6] = [
    [0, 5, 1, 6],
    [0, 1, 2, 6],
    [0, 2, 3, 6],
    [0, 3, 7, 6],
    [0, 7, 4, 6],
    [0, 4, 5, 6],
];

/// Polygonizer that decomposes every cell into tetrahedra.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarchingTetrahedra;

impl Polygonizer for MarchingTetrahedra {
    fn triangulate(&self, field: &ScalarField) -> Vec<Vec3> {
        let mut soup = Vec::new();
        if !field.has_cells() {
            return soup;
        }
        let dims = field.dims();
        let mut positions = [Vec3::ZERO; 8];
        let mut values = [0.0_f32; 8];

        for z in 0..dims.z - 1 {
            for y in 0..dims.y - 1 {
                for x in 0..dims.x - 1 {
                    let cell = UVec3::new(x, y, z);
                    for (i, corner) in CUBE_CORNERS.iter().enumerate() {
                        let p = cell + *corner;
                        positions[i] = p.as_vec3();
                        values[i] = field.value(p.x, p.y, p.z);
                    }
                    for tet in &TETRAHEDRA {
                        let p = tet.map(|c| positions[c]);
                        let v = tet.map(|c| values[c]);
                        polygonize_tetrahedron(&p, &v, &mut soup);
                    }
                }
            }
        }

        log::trace!("marching tetrahedra: {} triangles", soup.len() / 3);
        soup
    }
}

fn polygonize_tetrahedron(p: &[Vec3; 4], v: &[f32; 4], soup: &mut Vec<Vec3>) {
    let below: Vec<usize> = (0..4).filter(|&i| v[i] < 0.0).collect();
    let above: Vec<usize> = (0..4).filter(|&i| v[i] >= 0.0).collect();
    let edge = |a: usize, b: usize| crossing(p[a], p[b], v[a], v[b]);

    match (below.as_slice(), above.as_slice()) {
        ([lone], [b, c, d]) | ([b, c, d], [lone]) => {
            soup.extend([edge(*lone, *b), edge(*lone, *c), edge(*lone, *d)]);
        }
        ([a, b], [c, d]) => {
            let (ac, ad, bd, bc) = (edge(*a, *c), edge(*a, *d), edge(*b, *d), edge(*b, *c));
            soup.extend([ac, ad, bd, ac, bd, bc]);
        }
        _ => {}
    }
}

#[inline]
fn crossing(pa: Vec3, pb: Vec3, va: f32, vb: f32) -> Vec3 {
    let t = va / (va - vb);
    pa + (pb - pa) * t
}
