//! Connected-component labelling of inside voxels.

use std::collections::VecDeque;

use bitvec::vec::BitVec;
use voxscope_core::neighborhood::{neighbors, Connectivity};
use voxscope_core::VoxelGrid;

use super::VoxelClass;

/// Segment ids per voxel plus per-segment statistics.
pub(super) struct Components {
    pub membership: Vec<Vec<u32>>,
    pub segment_sizes: Vec<usize>,
    pub largest: Option<u32>,
}

/// Floods every inside region over the 18-neighborhood.
///
/// Ids are handed out densely in discovery order. Border voxels touched by a
/// flood record that segment as well. Floods of `noise_threshold` voxels or
/// fewer are rolled back and their id is reused.
pub(super) fn label(
    grid: &VoxelGrid,
    classes: &[VoxelClass],
    inside: &BitVec,
    noise_threshold: usize,
) -> Components {
    let mut membership: Vec<Vec<u32>> = vec![Vec::new(); grid.count()];
    let mut pending = inside.clone();
    let mut segment_sizes = Vec::new();
    let mut largest: Option<(u32, usize)> = None;
    let mut discarded = 0_usize;

    let mut queue = VecDeque::new();
    let mut members = Vec::new();
    let mut touched = Vec::new();

    for start in inside.iter_ones() {
        if !pending[start] {
            continue;
        }
        let id = segment_sizes.len() as u32;
        members.clear();
        touched.clear();

        pending.set(start, false);
        membership[start].push(id);
        members.push(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            let p = grid.position_of(current).as_ivec3();
            for n in neighbors(grid, p, Connectivity::Eighteen) {
                let Some(next) = n.index else { continue };
                if pending[next] {
                    pending.set(next, false);
                    membership[next].push(id);
                    members.push(next);
                    queue.push_back(next);
                } else if classes[next] == VoxelClass::Border
                    && membership[next].last() != Some(&id)
                {
                    membership[next].push(id);
                    touched.push(next);
                }
            }
        }

        let size = members.len();
        if size <= noise_threshold {
            for &i in members.iter().chain(touched.iter()) {
                membership[i].pop();
            }
            discarded += 1;
            continue;
        }

        if largest.map_or(true, |(_, best)| size > best) {
            largest = Some((id, size));
        }
        segment_sizes.push(size);
    }

    log::debug!(
        "components: {} segments kept, {} discarded as noise",
        segment_sizes.len(),
        discarded
    );
    Components {
        membership,
        segment_sizes,
        largest: largest.map(|(id, _)| id),
    }
}
