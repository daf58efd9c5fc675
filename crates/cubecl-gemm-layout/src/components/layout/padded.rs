use cubecl::prelude::*;
use std::marker::PhantomData;

use crate::components::{FormattedConfigError, InvalidConfigError, MatrixSize, Tile};

use super::{Fragment, Layout, LayoutEnum, MatrixLayout, PhysicalLayout, TileConfig};

/// Wraps a layout, adding `P` elements of padding to its leading physical dimension.
///
/// Padding shifts the shared memory banks hit by consecutive rows (or columns). Loads and
/// stores are forwarded unchanged, since linearisation already uses the padded workspace
/// shape; only [PhysicalLayout::physical_size] differs.
#[derive(Clone, Copy)]
pub struct Padded<L: Layout, const P: u32> {
    _layout: PhantomData<L>,
}

impl<L: Layout, const P: u32> Padded<L, P> {
    /// Shifts the logical coordinate that maps to the leading physical dimension by `P`.
    ///
    /// That is the row count for column-major layouts, and the column count for row-major ones.
    pub fn pad_logical_coord(coords: MatrixSize) -> MatrixSize {
        match L::MAJOR {
            MatrixLayout::ColMajor => (coords.0 + P as usize, coords.1),
            MatrixLayout::RowMajor => (coords.0, coords.1 + P as usize),
        }
    }

    /// Panics unless the padding keeps every line aligned. Evaluated when a kernel is expanded.
    pub fn assert_padding(config: TileConfig) {
        assert!(
            P % config.line_size == 0,
            "Padding {P} must be a multiple of the line size {} to keep lines aligned",
            config.line_size
        );
    }
}

impl<L: Layout, const P: u32> PhysicalLayout for Padded<L, P> {
    type Elem = L::Elem;

    const MAJOR: MatrixLayout = L::MAJOR;
    const PADDING: u32 = L::PADDING + P;
    const ENTRY_SIZE: usize = L::ENTRY_SIZE;

    fn physical_size(logical_size: MatrixSize) -> Vec<usize> {
        L::physical_size(Self::pad_logical_coord(logical_size))
    }

    fn line_size(supported: &[u8]) -> u32 {
        L::line_size(supported)
    }

    fn register_size(line_size: u32) -> u32 {
        L::register_size(line_size)
    }

    fn vectorization(line_size: u32) -> u32 {
        L::vectorization(line_size)
    }

    fn check(config: &TileConfig) -> Result<(), InvalidConfigError> {
        let line_size = config.line_size;
        if P % line_size != 0 {
            return Err(FormattedConfigError::new(move || {
                format!(
                    "Padding {P} must be a multiple of the line size {line_size} to keep lines aligned"
                )
            }));
        }
        L::check(config)
    }

    fn check_logical_size(logical_size: MatrixSize) -> Result<(), InvalidConfigError> {
        L::check_logical_size(logical_size)
    }

    fn to_enum() -> LayoutEnum {
        L::to_enum()
    }
}

#[cube]
impl<L: Layout, const P: u32> Layout for Padded<L, P> {
    fn load(
        workspace: &Tensor<Line<L::Elem>>,
        fragment: &mut Fragment<L::Elem>,
        tile: Tile,
        #[comptime] config: TileConfig,
    ) {
        comptime!(Padded::<L, P>::assert_padding(config));
        L::load(workspace, fragment, tile, config);
    }

    fn store(
        workspace: &mut Tensor<Line<L::Elem>>,
        fragment: &Fragment<L::Elem>,
        tile: Tile,
        #[comptime] config: TileConfig,
    ) {
        comptime!(Padded::<L, P>::assert_padding(config));
        L::store(workspace, fragment, tile, config);
    }
}
