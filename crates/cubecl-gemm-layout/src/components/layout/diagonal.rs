use cubecl::prelude::*;
use std::marker::PhantomData;

use crate::components::memory::{predicated_vector_load, vector_load, vector_store};
use crate::components::{
    Element, FormattedConfigError, InvalidConfigError, MatrixSize, Tile,
};

use super::{Fragment, Layout, LayoutEnum, MatrixLayout, PhysicalLayout, TileConfig};

/// Diagonal matrix, of which only the diagonal is stored.
///
/// The workspace is the vector of diagonal entries indexed by row, so the element at
/// `(row, col)` is `workspace[row]` when `row == col` and zero everywhere else. Fragments
/// are column-major, identical to what [AlignedColMajor](super::AlignedColMajor) would
/// load from the dense matrix.
#[derive(Clone, Copy)]
pub struct Diagonal<E: Element> {
    _elem: PhantomData<E>,
}

impl<E: Element> Diagonal<E> {
    /// Whether the line starting at `(row, col)` may hold a diagonal element.
    ///
    /// Conservative: a line whose first row is less than a line size away from `col`
    /// on either side counts as on the diagonal.
    pub fn is_on_diagonal(row: u32, col: u32, line_size: u32) -> bool {
        row.abs_diff(col) < line_size
    }
}

/// Device counterpart of [Diagonal::is_on_diagonal].
#[cube]
fn near_diagonal(row: u32, col: u32, #[comptime] line_size: u32) -> bool {
    Max::max(row, col) - Min::min(row, col) < line_size
}

impl<E: Element> PhysicalLayout for Diagonal<E> {
    type Elem = E;

    const MAJOR: MatrixLayout = MatrixLayout::ColMajor;

    fn physical_size(logical_size: MatrixSize) -> Vec<usize> {
        vec![logical_size.0]
    }

    fn check_logical_size(logical_size: MatrixSize) -> Result<(), InvalidConfigError> {
        if logical_size.0 != logical_size.1 {
            return Err(FormattedConfigError::new(move || {
                format!(
                    "A diagonal matrix must be square, got {}x{}",
                    logical_size.0, logical_size.1
                )
            }));
        }
        Ok(())
    }

    fn to_enum() -> LayoutEnum {
        LayoutEnum::Diagonal
    }
}

#[cube]
impl<E: Element> Layout for Diagonal<E> {
    fn load(
        workspace: &Tensor<Line<E>>,
        fragment: &mut Fragment<E>,
        tile: Tile,
        #[comptime] config: TileConfig,
    ) {
        comptime!(config.assert_lines());
        let line_size = comptime!(config.line_size);
        let lines_per_col = comptime!(config.lines_per_segment());

        #[unroll]
        for col_in_tile in 0..comptime!(config.cols) {
            #[unroll]
            for line in 0..lines_per_col {
                let (row, col) = tile.translate((line * line_size, col_in_tile.runtime())).index();

                // Diagonal entries of rows `row..row + line_size` are contiguous. Lines away
                // from the diagonal come back as zero.
                let stored =
                    predicated_vector_load::<E>(workspace, row, near_diagonal(row, col, line_size));

                let mut value = Line::empty(line_size);
                #[unroll]
                for lane in 0..line_size {
                    value[lane] = select(row + lane == col, stored[lane], E::from_int(0));
                }
                fragment[col_in_tile * lines_per_col + line] = value;
            }
        }
    }

    fn store(
        workspace: &mut Tensor<Line<E>>,
        fragment: &Fragment<E>,
        tile: Tile,
        #[comptime] config: TileConfig,
    ) {
        comptime!(config.assert_lines());
        let line_size = comptime!(config.line_size);
        let lines_per_col = comptime!(config.lines_per_segment());

        #[unroll]
        for col_in_tile in 0..comptime!(config.cols) {
            #[unroll]
            for line in 0..lines_per_col {
                let (row, col) = tile.translate((line * line_size, col_in_tile.runtime())).index();

                // Only the diagonal is stored, everything else is structurally zero.
                if row <= col && col < row + line_size {
                    let lane = col - row;
                    let value = fragment[col_in_tile * lines_per_col + line];
                    let mut stored = vector_load::<E>(workspace, row);
                    stored[lane] = value[lane];
                    vector_store::<E>(workspace, stored, row);
                }
            }
        }
    }
}
