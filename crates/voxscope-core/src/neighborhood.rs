//! Fixed neighbor-offset tables.
//!
//! Classification tie-breaks depend on the order neighbors are visited, so
//! each table is iterated front to back and never reordered.

use glam::IVec3;
use serde::{Deserialize, Serialize};

use crate::grid::VoxelGrid;

/// The six face neighbors: +X, -X, +Y, -Y, +Z, -Z.
pub const FACE_6: [IVec3; 6] = [
    IVec3::new(1, 0, 0),
    IVec3::new(-1, 0, 0),
    IVec3::new(0, 1, 0),
    IVec3::new(0, -1, 0),
    IVec3::new(0, 0, 1),
    IVec3::new(0, 0, -1),
];

/// Face neighbors followed by the six mixed-sign face diagonals.
pub const FACE_DIAGONAL_12: [IVec3; 12] = [
    IVec3::new(1, 0, 0),
    IVec3::new(-1, 0, 0),
    IVec3::new(0, 1, 0),
    IVec3::new(0, -1, 0),
    IVec3::new(0, 0, 1),
    IVec3::new(0, 0, -1),
    IVec3::new(1, -1, 0),
    IVec3::new(1, 0, -1),
    IVec3::new(-1, 1, 0),
    IVec3::new(0, 1, -1),
    IVec3::new(-1, 0, 1),
    IVec3::new(0, -1, 1),
];

/// Face neighbors followed by all twelve edge diagonals.
pub const EDGE_18: [IVec3; 18] = [
    IVec3::new(1, 0, 0),
    IVec3::new(-1, 0, 0),
    IVec3::new(0, 1, 0),
    IVec3::new(0, -1, 0),
    IVec3::new(0, 0, 1),
    IVec3::new(0, 0, -1),
    IVec3::new(1, 1, 0),
    IVec3::new(1, -1, 0),
    IVec3::new(-1, 1, 0),
    IVec3::new(-1, -1, 0),
    IVec3::new(1, 0, 1),
    IVec3::new(1, 0, -1),
    IVec3::new(-1, 0, 1),
    IVec3::new(-1, 0, -1),
    IVec3::new(0, 1, 1),
    IVec3::new(0, 1, -1),
    IVec3::new(0, -1, 1),
    IVec3::new(0, -1, -1),
];

/// Neighborhood size used by a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Connectivity {
    /// Face neighbors only.
    Six,
    /// Face neighbors plus six face diagonals.
    Twelve,
    /// Face neighbors plus every edge diagonal.
    Eighteen,
}

impl Connectivity {
    /// The offset table for this neighborhood.
    #[must_use]
    pub fn offsets(self) -> &'static [IVec3] {
        match self {
            Self::Six => &FACE_6,
            Self::Twelve => &FACE_DIAGONAL_12,
            Self::Eighteen => &EDGE_18,
        }
    }

    /// Returns true if `offset` moves along a single axis.
    #[must_use]
    pub fn is_face(offset: IVec3) -> bool {
        offset.abs().element_sum() == 1
    }
}

/// A neighbor lookup result: the offset that was applied and, when the
/// neighbor exists, its linear index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub offset: IVec3,
    pub position: IVec3,
    pub index: Option<usize>,
}

/// Iterates the neighbors of `p` in table order.
///
/// Offsets that leave the grid are still yielded, with `index == None`, so
/// callers can decide how the grid boundary behaves.
pub fn neighbors<'a>(
    grid: &'a VoxelGrid,
    p: IVec3,
    connectivity: Connectivity,
) -> impl Iterator<Item = Neighbor> + 'a {
    connectivity.offsets().iter().map(move |&offset| {
        let position = p + offset;
        Neighbor {
            offset,
            position,
            index: grid.try_index(position),
        }
    })
}
