use cubecl::prelude::*;

/// Row and column of a matrix element or of a tile origin.
pub type Coords2d = (u32, u32);

/// A rectangular region of a logical matrix.
///
/// The element coordinates are split between a `base`, shared by every unit working on
/// the same block, and an `offset` that varies per unit. The absolute coordinates of the
/// first element are [Tile::index]. Extents are comptime and travel in the
/// [TileConfig](crate::layout::TileConfig) of the layout moving the tile.
#[derive(CubeType, Clone, Copy)]
pub struct Tile {
    pub base: Coords2d,
    pub offset: Coords2d,
}

#[cube]
impl Tile {
    pub fn new(base: Coords2d, offset: Coords2d) -> Tile {
        Tile { base, offset }
    }

    /// Absolute coordinates of the first element.
    pub fn index(&self) -> Coords2d {
        let (base_row, base_col) = self.base;
        let (offset_row, offset_col) = self.offset;
        (base_row + offset_row, base_col + offset_col)
    }

    /// Shifts the offset by `delta`.
    pub fn translate(&self, delta: Coords2d) -> Tile {
        let (offset_row, offset_col) = self.offset;
        let (delta_row, delta_col) = delta;
        Tile::new(self.base, (offset_row + delta_row, offset_col + delta_col))
    }

    /// Shifts the base by `delta`.
    pub fn translate_base(&self, delta: Coords2d) -> Tile {
        let (base_row, base_col) = self.base;
        let (delta_row, delta_col) = delta;
        Tile::new((base_row + delta_row, base_col + delta_col), self.offset)
    }
}

/// Maps physical coordinates to a linear offset within a workspace.
///
/// The first coordinate varies fastest. Row-major callers swap the coordinates.
#[cube]
pub fn linearise_2d<E: CubePrimitive>(coords: Coords2d, workspace: &Tensor<E>) -> u32 {
    let (x, y) = coords;
    x + y * workspace.shape(0)
}

/// Three-dimensional [linearise_2d], for workspaces with a plane axis.
#[cube]
pub fn linearise_3d<E: CubePrimitive>(coords: (u32, u32, u32), workspace: &Tensor<E>) -> u32 {
    let (x, y, z) = coords;
    x + workspace.shape(0) * (y + workspace.shape(1) * z)
}

/// Host counterpart of [linearise_2d] for any rank, used to pack and unpack workspaces.
pub fn linearise(coords: &[usize], shape: &[usize]) -> usize {
    debug_assert_eq!(coords.len(), shape.len());

    let mut index = 0;
    let mut stride = 1;
    for (coord, dim) in coords.iter().zip(shape) {
        index += coord * stride;
        stride *= dim;
    }
    index
}

/// Strides of a contiguous workspace where the first dimension varies fastest.
pub fn contiguous_strides(shape: &[usize]) -> Vec<usize> {
    let mut stride = 1;
    shape
        .iter()
        .map(|dim| {
            let current = stride;
            stride *= dim;
            current
        })
        .collect()
}
