//! Outside/inside/border labelling sweeps.

use bitvec::vec::BitVec;
use glam::IVec3;
use voxscope_core::neighborhood::{neighbors, Connectivity};
use voxscope_core::VoxelGrid;

use super::VoxelClass;

/// Output of the two labelling sweeps.
pub(super) struct Labels {
    pub classes: Vec<VoxelClass>,
    pub inside: BitVec,
    /// Border voxel indices in the order the backward sweep found them
    /// (descending).
    pub border: Vec<usize>,
}

/// Runs the seed scan, the forward 6-neighbor sweep and the backward
/// 12-neighbor sweep.
pub(super) fn label(grid: &VoxelGrid, tolerance: u32) -> Labels {
    let len = grid.count();
    let buffer = grid.buffer();
    let mut classes = vec![VoxelClass::Unknown; len];

    // Everything before the first below-tolerance voxel is provisionally inside.
    let seed = buffer.iter().position(|&v| v < tolerance);
    let forward_start = match seed {
        Some(seed) => {
            classes[..seed].fill(VoxelClass::Inside);
            classes[seed] = VoxelClass::Outside;
            if seed > 0 {
                let p = grid.position_of(seed).as_ivec3();
                for n in neighbors(grid, p, Connectivity::Six) {
                    if let Some(i) = n.index {
                        classes[i] = VoxelClass::Border;
                    }
                }
            }
            seed + 1
        }
        None => {
            classes.fill(VoxelClass::Inside);
            len
        }
    };
    log::debug!("classification seed: {seed:?} (tolerance {tolerance})");

    for index in forward_start..len {
        let p = grid.position_of(index).as_ivec3();
        let above = buffer[index] >= tolerance;
        classes[index] = resolve(grid, &classes, p, above, Connectivity::Six, false);
    }

    let mut inside = BitVec::repeat(false, len);
    let mut border = Vec::new();
    for index in (0..len).rev() {
        let p = grid.position_of(index).as_ivec3();
        let above = buffer[index] >= tolerance;
        let class = resolve(grid, &classes, p, above, Connectivity::Twelve, true);
        classes[index] = class;
        match class {
            VoxelClass::Border => border.push(index),
            VoxelClass::Inside => inside.set(index, true),
            VoxelClass::Outside | VoxelClass::Unknown => {}
        }
    }

    log::debug!(
        "classification sweeps: {} border, {} inside of {} voxels",
        border.len(),
        inside.count_ones(),
        len
    );
    Labels {
        classes,
        inside,
        border,
    }
}

/// Derives a voxel's label from its already-labelled neighbors.
///
/// An above-tolerance voxel next to outside material is border; a
/// below-tolerance voxel next to outside material is outside. Either one next
/// to inside material (or, when above tolerance, border) becomes inside
/// unless a later neighbor settles it first. Unknown neighbors say nothing.
/// With `edge_is_border`, an above-tolerance voxel missing a face neighbor
/// sits on the grid boundary and is border.
fn resolve(
    grid: &VoxelGrid,
    classes: &[VoxelClass],
    p: IVec3,
    above: bool,
    connectivity: Connectivity,
    edge_is_border: bool,
) -> VoxelClass {
    let mut output = VoxelClass::Unknown;
    for n in neighbors(grid, p, connectivity) {
        let Some(index) = n.index else {
            if edge_is_border && above && Connectivity::is_face(n.offset) {
                return VoxelClass::Border;
            }
            continue;
        };
        match (above, classes[index]) {
            (true, VoxelClass::Outside) => return VoxelClass::Border,
            (false, VoxelClass::Outside) => return VoxelClass::Outside,
            (true, VoxelClass::Inside | VoxelClass::Border) | (false, VoxelClass::Inside) => {
                output = VoxelClass::Inside;
            }
            (_, VoxelClass::Unknown) | (false, VoxelClass::Border) => {}
        }
    }
    output
}
