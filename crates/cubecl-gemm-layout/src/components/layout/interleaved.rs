use cubecl::prelude::*;
use std::marker::PhantomData;

use crate::components::{Coords2d, Element, MatrixSize, Tile};

use super::{
    Fragment, Layout, LayoutEnum, MatrixLayout, PhysicalLayout, TileConfig, physical_coords,
    segment_delta,
};

/// Complex column-major matrix, each element stored as an interleaved `(re, im)` pair.
///
/// There is no vectorized path: elements are read one at a time, each as a two-lane line.
#[derive(Clone, Copy)]
pub struct InterleavedColMajor<T: Element> {
    _elem: PhantomData<T>,
}

/// Complex row-major matrix, each element stored as an interleaved `(re, im)` pair.
#[derive(Clone, Copy)]
pub struct InterleavedRowMajor<T: Element> {
    _elem: PhantomData<T>,
}

// The tensor is viewed with `(re, im)` lines, so its leading dimension counts scalars.
#[cube]
fn pair_index<T: Numeric>(
    workspace: &Tensor<Line<T>>,
    coords: Coords2d,
    #[comptime] major: MatrixLayout,
) -> u32 {
    let (x, y) = physical_coords(coords, major);
    x + y * (workspace.shape(0) / workspace.line_size())
}

#[cube]
fn load_elementwise<T: Numeric>(
    workspace: &Tensor<Line<T>>,
    fragment: &mut Fragment<T>,
    tile: Tile,
    #[comptime] config: TileConfig,
) {
    let extent = comptime!(config.contiguous_extent());

    #[unroll]
    for segment in 0..comptime!(config.num_segments()) {
        #[unroll]
        for within in 0..extent {
            let coords = tile.translate(segment_delta(segment, within, config.major)).index();
            fragment[segment * extent + within] =
                workspace[pair_index::<T>(workspace, coords, config.major)];
        }
    }
}

#[cube]
fn store_elementwise<T: Numeric>(
    workspace: &mut Tensor<Line<T>>,
    fragment: &Fragment<T>,
    tile: Tile,
    #[comptime] config: TileConfig,
) {
    let extent = comptime!(config.contiguous_extent());

    #[unroll]
    for segment in 0..comptime!(config.num_segments()) {
        #[unroll]
        for within in 0..extent {
            let coords = tile.translate(segment_delta(segment, within, config.major)).index();
            let index = pair_index::<T>(workspace, coords, config.major);
            workspace[index] = fragment[segment * extent + within];
        }
    }
}

impl<T: Element> PhysicalLayout for InterleavedColMajor<T> {
    type Elem = T;

    const MAJOR: MatrixLayout = MatrixLayout::ColMajor;
    const ENTRY_SIZE: usize = 2;

    fn physical_size(logical_size: MatrixSize) -> Vec<usize> {
        Self::MAJOR.physical_shape(logical_size)
    }

    fn line_size(_supported: &[u8]) -> u32 {
        1
    }

    fn register_size(_line_size: u32) -> u32 {
        2
    }

    fn vectorization(_line_size: u32) -> u32 {
        2
    }

    fn to_enum() -> LayoutEnum {
        LayoutEnum::Interleaved(Self::MAJOR)
    }
}

#[cube]
impl<T: Element> Layout for InterleavedColMajor<T> {
    fn load(
        workspace: &Tensor<Line<T>>,
        fragment: &mut Fragment<T>,
        tile: Tile,
        #[comptime] config: TileConfig,
    ) {
        load_elementwise::<T>(workspace, fragment, tile, config);
    }

    fn store(
        workspace: &mut Tensor<Line<T>>,
        fragment: &Fragment<T>,
        tile: Tile,
        #[comptime] config: TileConfig,
    ) {
        store_elementwise::<T>(workspace, fragment, tile, config);
    }
}

impl<T: Element> PhysicalLayout for InterleavedRowMajor<T> {
    type Elem = T;

    const MAJOR: MatrixLayout = MatrixLayout::RowMajor;
    const ENTRY_SIZE: usize = 2;

    fn physical_size(logical_size: MatrixSize) -> Vec<usize> {
        Self::MAJOR.physical_shape(logical_size)
    }

    fn line_size(_supported: &[u8]) -> u32 {
        1
    }

    fn register_size(_line_size: u32) -> u32 {
        2
    }

    fn vectorization(_line_size: u32) -> u32 {
        2
    }

    fn to_enum() -> LayoutEnum {
        LayoutEnum::Interleaved(Self::MAJOR)
    }
}

#[cube]
impl<T: Element> Layout for InterleavedRowMajor<T> {
    fn load(
        workspace: &Tensor<Line<T>>,
        fragment: &mut Fragment<T>,
        tile: Tile,
        #[comptime] config: TileConfig,
    ) {
        load_elementwise::<T>(workspace, fragment, tile, config);
    }

    fn store(
        workspace: &mut Tensor<Line<T>>,
        fragment: &Fragment<T>,
        tile: Tile,
        #[comptime] config: TileConfig,
    ) {
        store_elementwise::<T>(workspace, fragment, tile, config);
    }
}
