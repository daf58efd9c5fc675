use cubecl::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{Coords2d, Element, InvalidConfigError, MatrixSize, Tile};

use super::{Fragment, TileConfig};

/// Order of the physical dimensions of a matrix.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatrixLayout {
    /// Consecutive elements of a row are contiguous.
    RowMajor,
    /// Consecutive elements of a column are contiguous.
    ColMajor,
}

impl MatrixLayout {
    /// Physical shape of a logical `(rows, cols)` matrix.
    ///
    /// Row-major shapes are stored transposed, `(cols, rows)`, so the contiguous
    /// dimension always comes first.
    pub fn physical_shape(self, logical_size: MatrixSize) -> Vec<usize> {
        match self {
            MatrixLayout::ColMajor => vec![logical_size.0, logical_size.1],
            MatrixLayout::RowMajor => vec![logical_size.1, logical_size.0],
        }
    }

    /// Host counterpart of [physical_coords].
    pub fn physical_index(self, row: usize, col: usize) -> [usize; 2] {
        match self {
            MatrixLayout::ColMajor => [row, col],
            MatrixLayout::RowMajor => [col, row],
        }
    }
}

/// Maps logical `(row, col)` to physical coordinates, contiguous dimension first.
#[cube]
pub fn physical_coords(coords: Coords2d, #[comptime] major: MatrixLayout) -> Coords2d {
    let (row, col) = coords;
    match comptime!(major) {
        MatrixLayout::ColMajor => (row, col),
        MatrixLayout::RowMajor => (col, row),
    }
}

/// Runtime description of a [Layout], for validation and logs.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutEnum {
    /// Dense real matrix, loaded with one vector access per line.
    Aligned(MatrixLayout),
    /// Complex matrix with real and imaginary parts side by side.
    Interleaved(MatrixLayout),
    /// Complex matrix with real and imaginary parts in separate planes.
    Split(MatrixLayout),
    /// Diagonal matrix, only the diagonal is stored.
    Diagonal,
    /// Matrix known to be zero, nothing is stored.
    Zero,
}

/// Host side of a [Layout]: the shape of its workspace and the tiles it accepts.
pub trait PhysicalLayout: 'static + Send + Sync {
    /// Type of the elements stored in the workspace.
    type Elem: Element;

    /// Order of the physical dimensions, and of the registers within a fragment.
    const MAJOR: MatrixLayout;
    /// Padding added to the leading physical dimension.
    const PADDING: u32 = 0;
    /// Scalars per physical element of the workspace.
    const ENTRY_SIZE: usize = 1;

    /// Shape of the workspace holding a matrix of the given logical `(rows, cols)`.
    fn physical_size(logical_size: MatrixSize) -> Vec<usize>;

    /// Logical elements moved per access, given the line sizes the backend supports.
    fn line_size(supported: &[u8]) -> u32 {
        Self::Elem::line_size(supported)
    }

    /// Lanes of one fragment register.
    fn register_size(line_size: u32) -> u32 {
        line_size
    }

    /// Line size the workspace tensor is viewed with.
    fn vectorization(line_size: u32) -> u32 {
        line_size
    }

    /// Geometry of a `rows x cols` tile of this layout.
    fn tile_config(rows: u32, cols: u32, supported: &[u8]) -> TileConfig {
        let line_size = Self::line_size(supported);
        TileConfig::new(
            rows,
            cols,
            line_size,
            Self::register_size(line_size),
            Self::MAJOR,
        )
    }

    /// Rejects tiles this layout can't move.
    fn check(config: &TileConfig) -> Result<(), InvalidConfigError> {
        config.check_lines()
    }

    /// Rejects matrices this layout can't represent.
    fn check_logical_size(_logical_size: MatrixSize) -> Result<(), InvalidConfigError> {
        Ok(())
    }

    /// Return the layout as enum
    fn to_enum() -> LayoutEnum;
}

/// Maps the logical view of a matrix operand to its workspace.
///
/// A layout is a type-level marker, never instantiated: kernels are generic over it, so
/// each instantiation expands to exactly one load and store routine. The workspace must
/// have the shape [PhysicalLayout::physical_size] of the logical matrix, and tiles must lie
/// inside that matrix with their origin aligned to their extents. Neither is checked on the
/// device; [crate::kernels::gemm::launch] validates them once on the host.
#[cube]
pub trait Layout: PhysicalLayout {
    /// Reads the elements covered by `tile` into `fragment`.
    fn load(
        workspace: &Tensor<Line<Self::Elem>>,
        fragment: &mut Fragment<Self::Elem>,
        tile: Tile,
        #[comptime] config: TileConfig,
    );

    /// Writes `fragment` to the elements covered by `tile`.
    fn store(
        workspace: &mut Tensor<Line<Self::Elem>>,
        fragment: &Fragment<Self::Elem>,
        tile: Tile,
        #[comptime] config: TileConfig,
    );
}

/// Offset within a tile of element `within` of a segment.
#[cube]
pub(crate) fn segment_delta(segment: u32, within: u32, #[comptime] major: MatrixLayout) -> Coords2d {
    match comptime!(major) {
        MatrixLayout::ColMajor => (within, segment),
        MatrixLayout::RowMajor => (segment, within),
    }
}
