use cubecl::prelude::*;
use std::marker::PhantomData;

use crate::components::{Element, MatrixSize, Tile, linearise_3d};

use super::{
    Fragment, Layout, LayoutEnum, MatrixLayout, PhysicalLayout, TileConfig, physical_coords,
    segment_delta,
};

/// Complex column-major matrix stored as two real planes, `(rows, cols, 2)`.
///
/// Plane 0 holds the real parts, plane 1 the imaginary parts.
#[derive(Clone, Copy)]
pub struct SplitColMajor<T: Element> {
    _elem: PhantomData<T>,
}

/// Complex row-major matrix stored as two real planes, `(cols, rows, 2)`.
#[derive(Clone, Copy)]
pub struct SplitRowMajor<T: Element> {
    _elem: PhantomData<T>,
}

fn split_physical_size(logical_size: MatrixSize, major: MatrixLayout) -> Vec<usize> {
    let mut shape = major.physical_shape(logical_size);
    shape.push(2);
    shape
}

#[cube]
fn load_split<T: Numeric>(
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
            let (x, y) = physical_coords(coords, config.major);

            let mut value = Line::empty(config.register_size);
            value[0] = T::cast_from(workspace[linearise_3d((x, y, 0u32), workspace)]);
            value[1] = T::cast_from(workspace[linearise_3d((x, y, 1u32), workspace)]);
            fragment[segment * extent + within] = value;
        }
    }
}

#[cube]
fn store_split<T: Numeric>(
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
            let (x, y) = physical_coords(coords, config.major);
            let value = fragment[segment * extent + within];

            let real = linearise_3d((x, y, 0u32), workspace);
            let imag = linearise_3d((x, y, 1u32), workspace);
            workspace[real] = Line::cast_from(value[0]);
            workspace[imag] = Line::cast_from(value[1]);
        }
    }
}

impl<T: Element> PhysicalLayout for SplitColMajor<T> {
    type Elem = T;

    const MAJOR: MatrixLayout = MatrixLayout::ColMajor;

    fn physical_size(logical_size: MatrixSize) -> Vec<usize> {
        split_physical_size(logical_size, Self::MAJOR)
    }

    fn line_size(_supported: &[u8]) -> u32 {
        1
    }

    fn register_size(_line_size: u32) -> u32 {
        2
    }

    fn to_enum() -> LayoutEnum {
        LayoutEnum::Split(Self::MAJOR)
    }
}

#[cube]
impl<T: Element> Layout for SplitColMajor<T> {
    fn load(
        workspace: &Tensor<Line<T>>,
        fragment: &mut Fragment<T>,
        tile: Tile,
        #[comptime] config: TileConfig,
    ) {
        load_split::<T>(workspace, fragment, tile, config);
    }

    fn store(
        workspace: &mut Tensor<Line<T>>,
        fragment: &Fragment<T>,
        tile: Tile,
        #[comptime] config: TileConfig,
    ) {
        store_split::<T>(workspace, fragment, tile, config);
    }
}

impl<T: Element> PhysicalLayout for SplitRowMajor<T> {
    type Elem = T;

    const MAJOR: MatrixLayout = MatrixLayout::RowMajor;

    fn physical_size(logical_size: MatrixSize) -> Vec<usize> {
        split_physical_size(logical_size, Self::MAJOR)
    }

    fn line_size(_supported: &[u8]) -> u32 {
        1
    }

    fn register_size(_line_size: u32) -> u32 {
        2
    }

    fn to_enum() -> LayoutEnum {
        LayoutEnum::Split(Self::MAJOR)
    }
}

#[cube]
impl<T: Element> Layout for SplitRowMajor<T> {
    fn load(
        workspace: &Tensor<Line<T>>,
        fragment: &mut Fragment<T>,
        tile: Tile,
        #[comptime] config: TileConfig,
    ) {
        load_split::<T>(workspace, fragment, tile, config);
    }

    fn store(
        workspace: &mut Tensor<Line<T>>,
        fragment: &Fragment<T>,
        tile: Tile,
        #[comptime] config: TileConfig,
    ) {
        store_split::<T>(workspace, fragment, tile, config);
    }
}
