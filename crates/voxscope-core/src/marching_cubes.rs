//! Marching cubes iso-surface kernel.
//!
//! Walks every cell of a scalar field, builds the 8-bit corner sign
//! configuration and emits triangles from a 256-entry lookup table. Edge
//! vertices are shared between neighboring cells through a two-layer slab, so
//! the kernel output is welded; callers that need one vertex per triangle
//! corner unweld it afterwards.

#![allow(
    clippy::unreadable_literal,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]

use glam::{UVec3, Vec3};

/// Welded triangle mesh produced by [`marching_cubes`].
#[derive(Debug, Clone, Default)]
pub struct IsoMesh {
    /// Interpolated vertex positions in voxel-index space.
    pub vertices: Vec<Vec3>,
    /// Triangle indices (every 3 consecutive indices form a triangle).
    pub indices: Vec<u32>,
}

impl IsoMesh {
    /// Returns the number of triangles in the mesh.
    #[must_use]
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns true if the mesh has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Expands the indexed mesh into a triangle list with one position per
    /// corner.
    #[must_use]
    pub fn unweld(&self) -> Vec<Vec3> {
        self.indices
            .iter()
            .map(|&i| self.vertices[i as usize])
            .collect()
    }
}

/// Cube corner offsets. Bit `i` of a cell configuration refers to corner `i`.
const CORNERS: [UVec3; 8] = [
    UVec3::new(0, 0, 0),
    UVec3::new(1, 0, 0),
    UVec3::new(0, 1, 0),
    UVec3::new(1, 1, 0),
    UVec3::new(0, 0, 1),
    UVec3::new(1, 0, 1),
    UVec3::new(0, 1, 1),
    UVec3::new(1, 1, 1),
];

/// Cell edges in lookup-table order: `(corner a, corner b, axis, origin offset)`.
const EDGES: [(usize, usize, usize, UVec3); 12] = [
    (0, 1, 0, UVec3::new(0, 0, 0)),
    (2, 3, 0, UVec3::new(0, 1, 0)),
    (4, 5, 0, UVec3::new(0, 0, 1)),
    (6, 7, 0, UVec3::new(0, 1, 1)),
    (0, 2, 1, UVec3::new(0, 0, 0)),
    (1, 3, 1, UVec3::new(1, 0, 0)),
    (4, 6, 1, UVec3::new(0, 0, 1)),
    (5, 7, 1, UVec3::new(1, 0, 1)),
    (0, 4, 2, UVec3::new(0, 0, 0)),
    (1, 5, 2, UVec3::new(1, 0, 0)),
    (2, 6, 2, UVec3::new(0, 1, 0)),
    (3, 7, 2, UVec3::new(1, 1, 0)),
];

/// Extracts the isosurface of a scalar field.
///
/// # Arguments
/// * `field` - Scalar values stored x-fastest: the value for node
///   `(x, y, z)` is at `x + y * nx + z * nx * ny`.
/// * `isoval` - Surface level. Corners with `field < isoval` are outside.
/// * `nx`, `ny`, `nz` - Node counts per axis.
///
/// # Panics
/// Panics if `field.len() != nx * ny * nz` or if any dimension is less than 2.
#[must_use]
pub fn marching_cubes(field: &[f32], isoval: f32, nx: u32, ny: u32, nz: u32) -> IsoMesh {
    assert!(
        field.len() == (nx as usize) * (ny as usize) * (nz as usize),
        "Field size {} does not match dimensions {}x{}x{} = {}",
        field.len(),
        nx,
        ny,
        nz,
        (nx as usize) * (ny as usize) * (nz as usize)
    );
    assert!(nx >= 2 && ny >= 2 && nz >= 2, "All dimensions must be >= 2");

    let mut mesh = IsoMesh::default();
    let size = [nx, ny, nz];

    // Vertex index per edge axis at each (x, y) node, for the current and
    // next z layer (indexed by z % 2).
    let slab_len = (nx as usize) * (ny as usize) * 2;
    let mut slab_inds: Vec<[u32; 3]> = vec![[0; 3]; slab_len];

    let mut vs = [0.0_f32; 8];
    let mut edge_indices = [0_u32; 12];

    for z in 0..nz - 1 {
        for y in 0..ny - 1 {
            for x in 0..nx - 1 {
                let cell = UVec3::new(x, y, z);
                let mut config_n = 0_usize;
                for (i, corner) in CORNERS.iter().enumerate() {
                    let p = cell + *corner;
                    vs[i] = field[to_index_1d(p.x, p.y, p.z, &size)] - isoval;
                    if vs[i] < 0.0 {
                        config_n |= 1 << i;
                    }
                }

                // Fully inside or fully outside
                if config_n == 0 || config_n == 255 {
                    continue;
                }

                // A cell owns the edges on its far faces; edges on its near
                // faces belong to the previous cell unless it sits on the grid
                // boundary.
                for &(a, b, axis, offset) in &EDGES {
                    let owned = (0..3)
                        .filter(|&other| other != axis)
                        .all(|other| offset[other] == 1 || cell[other] == 0);
                    if owned {
                        let origin = cell + offset;
                        compute_edge(&mut slab_inds, &mut mesh, vs[a], vs[b], axis, origin, &size);
                    }
                }

                for (slot, &(_, _, axis, offset)) in edge_indices.iter_mut().zip(EDGES.iter()) {
                    let origin = cell + offset;
                    *slot = slab_inds[to_index_1d_slab(origin.x, origin.y, origin.z, &size)][axis];
                }

                let config = MC_TRIS[config_n];
                let n_indices = (config & 0xF) as usize * 3;
                let mut offset = 4;
                for _ in 0..n_indices {
                    let edge = ((config >> offset) & 0xF) as usize;
                    mesh.indices.push(edge_indices[edge]);
                    offset += 4;
                }
            }
        }
    }

    log::trace!(
        "marching cubes: {} vertices, {} triangles",
        mesh.vertices.len(),
        mesh.num_triangles()
    );
    mesh
}

/// Converts 3D node coordinates to a 1D array index.
/// Layout: `i + j * nx + k * nx * ny`
#[inline]
fn to_index_1d(i: u32, j: u32, k: u32, size: &[u32; 3]) -> usize {
    (i as usize) + (size[0] as usize) * ((j as usize) + (size[1] as usize) * (k as usize))
}

/// Converts 3D coordinates to a slab index (modular z for memory reuse).
/// Layout: `nx * ny * (k % 2) + j * nx + i`
#[inline]
fn to_index_1d_slab(i: u32, j: u32, k: u32, size: &[u32; 3]) -> usize {
    (size[0] as usize) * (size[1] as usize) * ((k as usize) % 2)
        + (j as usize) * (size[0] as usize)
        + (i as usize)
}

/// Adds the vertex where the surface crosses an edge, if the endpoint values
/// have opposite signs, and records its index in the slab.
#[inline]
fn compute_edge(
    slab_inds: &mut [[u32; 3]],
    mesh: &mut IsoMesh,
    va: f32,
    vb: f32,
    axis: usize,
    origin: UVec3,
    size: &[u32; 3],
) {
    if (va < 0.0) == (vb < 0.0) {
        return;
    }
    let mut v = origin.as_vec3();
    v[axis] += va / (va - vb);
    let idx = mesh.vertices.len() as u32;
    slab_inds[to_index_1d_slab(origin.x, origin.y, origin.z, size)][axis] = idx;
    mesh.vertices.push(v);
}

/// Look-up table for triangle configurations (256 entries, one per cube configuration).
///
/// Each entry is a `u64` encoding:
/// - Bits `[3:0]`: Number of triangles (0-5)
/// - Bits `[7:4]`, `[11:8]`, ...: Edge indices (0-11) for each triangle vertex, 4 bits each
#[rustfmt::skip]
static MC_TRIS: [u64; 256] = [
    0, 33793, 36945, 159668546,
    18961, 144771090, 5851666, 595283255635,
    20913, 67640146, 193993474, 655980856339,
    88782242, 736732689667, 797430812739, 194554754,
    26657, 104867330, 136709522, 298069416227,
    109224258, 8877909667, 318136408323, 1567994331701604,
    189884450, 350847647843, 559958167731, 3256298596865604,
    447393122899, 651646838401572, 2538311371089956, 737032694307,
    29329, 43484162, 91358498, 374810899075,
    158485010, 178117478419, 88675058979, 433581536604804,
    158486962, 649105605635, 4866906995, 3220959471609924,
    649165714851, 3184943915608436, 570691368417972, 595804498035,
    124295042, 431498018963, 508238522371, 91518530,
    318240155763, 291789778348404, 1830001131721892, 375363605923,
    777781811075, 1136111028516116, 3097834205243396, 508001629971,
    2663607373704004, 680242583802939237, 333380770766129845, 179746658,
    42545, 138437538, 93365810, 713842853011,
    73602098, 69575510115, 23964357683, 868078761575828,
    28681778, 713778574611, 250912709379, 2323825233181284,
    302080811955, 3184439127991172, 1694042660682596, 796909779811,
    176306722, 150327278147, 619854856867, 1005252473234484,
    211025400963, 36712706, 360743481544788, 150627258963,
    117482600995, 1024968212107700, 2535169275963444, 4734473194086550421,
    628107696687956, 9399128243, 5198438490361643573, 194220594,
    104474994, 566996932387, 427920028243, 2014821863433780,
    492093858627, 147361150235284, 2005882975110676, 9671606099636618005,
    777701008947, 3185463219618820, 482784926917540, 2900953068249785909,
    1754182023747364, 4274848857537943333, 13198752741767688709, 2015093490989156,
    591272318771, 2659758091419812, 1531044293118596, 298306479155,
    408509245114388, 210504348563, 9248164405801223541, 91321106,
    2660352816454484, 680170263324308757, 8333659837799955077, 482966828984116,
    4274926723105633605, 3184439197724820, 192104450, 15217,
    45937, 129205250, 129208402, 529245952323,
    169097138, 770695537027, 382310500883, 2838550742137652,
    122763026, 277045793139, 81608128403, 1991870397907988,
    362778151475, 2059003085103236, 2132572377842852, 655681091891,
    58419234, 239280858627, 529092143139, 1568257451898804,
    447235128115, 679678845236084, 2167161349491220, 1554184567314086709,
    165479003923, 1428768988226596, 977710670185060, 10550024711307499077,
    1305410032576132, 11779770265620358997, 333446212255967269, 978168444447012,
    162736434, 35596216627, 138295313843, 891861543990356,
    692616541075, 3151866750863876, 100103641866564, 6572336607016932133,
    215036012883, 726936420696196, 52433666, 82160664963,
    2588613720361524, 5802089162353039525, 214799000387, 144876322,
    668013605731, 110616894681956, 1601657732871812, 430945547955,
    3156382366321172, 7644494644932993285, 3928124806469601813, 3155990846772900,
    339991010498708, 10743689387941597493, 5103845475, 105070898,
    3928064910068824213, 156265010, 1305138421793636, 27185,
    195459938, 567044449971, 382447549283, 2175279159592324,
    443529919251, 195059004769796, 2165424908404116, 1554158691063110021,
    504228368803, 1436350466655236, 27584723588724, 1900945754488837749,
    122971970, 443829749251, 302601798803, 108558722,
    724700725875, 43570095105972, 2295263717447940, 2860446751369014181,
    2165106202149444, 69275726195, 2860543885641537797, 2165106320445780,
    2280890014640004, 11820349930268368933, 8721082628082003989, 127050770,
    503707084675, 122834978, 2538193642857604, 10129,
    801441490467, 2923200302876740, 1443359556281892, 2901063790822564949,
    2728339631923524, 7103874718248233397, 12775311047932294245, 95520290,
    2623783208098404, 1900908618382410757, 137742672547, 2323440239468964,
    362478212387, 727199575803140, 73425410, 34337,
    163101314, 668566030659, 801204361987, 73030562,
    591509145619, 162574594, 100608342969108, 5553,
    724147968595, 1436604830452292, 176259090, 42001,
    143955266, 2385, 18433, 0,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn distance_field(n: u32, radius: f32) -> (Vec<f32>, Vec3) {
        let center = Vec3::splat(n as f32 / 2.0);
        let mut field = vec![0.0_f32; (n * n * n) as usize];
        for k in 0..n {
            for j in 0..n {
                for i in 0..n {
                    let p = Vec3::new(i as f32, j as f32, k as f32);
                    field[to_index_1d(i, j, k, &[n, n, n])] = radius - (p - center).length();
                }
            }
        }
        (field, center)
    }

    #[test]
    fn test_constant_field_has_no_surface() {
        let field = vec![1.0; 3 * 3 * 3];
        assert!(marching_cubes(&field, 0.0, 3, 3, 3).is_empty());
        let field = vec![-1.0; 3 * 3 * 3];
        assert!(marching_cubes(&field, 0.0, 3, 3, 3).is_empty());
    }

    #[test]
    fn test_sphere() {
        let n = 20_u32;
        let radius = n as f32 / 4.0;
        let (field, center) = distance_field(n, radius);
        let mesh = marching_cubes(&field, 0.0, n, n, n);

        assert!(
            mesh.num_triangles() > 100,
            "Expected >100 triangles, got {}",
            mesh.num_triangles()
        );
        assert_eq!(mesh.indices.len() % 3, 0);
        for &idx in &mesh.indices {
            assert!((idx as usize) < mesh.vertices.len());
        }
        for v in &mesh.vertices {
            let dist = (*v - center).length();
            assert!(
                (dist - radius).abs() < 1.0,
                "Vertex {v:?} is {dist} from center (radius {radius})",
            );
        }
    }

    #[test]
    fn test_x_fastest_layout() {
        // Only node (1, 0, 0) is positive; the crossing on the X edge of
        // cell (0, 0, 0) must land between x = 0 and x = 1.
        let mut field = vec![-1.0_f32; 8];
        field[1] = 1.0;
        let mesh = marching_cubes(&field, 0.0, 2, 2, 2);
        assert_eq!(mesh.num_triangles(), 1);
        assert!(mesh
            .vertices
            .iter()
            .any(|v| (*v - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-6));
    }

    #[test]
    fn test_single_crossing() {
        let mut field = vec![1.0_f32; 8];
        field[0] = -1.0;
        let mesh = marching_cubes(&field, 0.0, 2, 2, 2);
        assert_eq!(mesh.num_triangles(), 1);
        assert_eq!(mesh.unweld().len(), 3);
    }

    #[test]
    fn test_shared_edges_are_welded() {
        // A slab of positive values crossing two cells shares the vertices on
        // the common face.
        let (nx, ny, nz) = (3_u32, 2_u32, 2_u32);
        let mut field = vec![-1.0_f32; (nx * ny * nz) as usize];
        for j in 0..ny {
            for i in 0..nx {
                field[to_index_1d(i, j, 0, &[nx, ny, nz])] = 1.0;
            }
        }
        let mesh = marching_cubes(&field, 0.0, nx, ny, nz);
        assert_eq!(mesh.num_triangles(), 4);
        assert_eq!(mesh.vertices.len(), 6);
    }

    #[test]
    #[should_panic(expected = "Field size")]
    fn test_wrong_field_size() {
        let field = vec![0.0; 10];
        let _ = marching_cubes(&field, 0.0, 3, 3, 3);
    }

    #[test]
    #[should_panic(expected = "dimensions must be >= 2")]
    fn test_dimension_too_small() {
        let field = vec![0.0; 1];
        let _ = marching_cubes(&field, 0.0, 1, 1, 1);
    }
}
