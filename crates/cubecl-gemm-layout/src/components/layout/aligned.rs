use cubecl::prelude::*;
use std::marker::PhantomData;

use crate::components::memory::{vector_load, vector_store};
use crate::components::{Coords2d, Element, MatrixSize, Tile, linearise_2d};

use super::{
    Fragment, Layout, LayoutEnum, MatrixLayout, PhysicalLayout, TileConfig, physical_coords,
    segment_delta,
};

/// Dense real column-major matrix, moved with one vector access per line.
#[derive(Clone, Copy)]
pub struct AlignedColMajor<E: Element> {
    _elem: PhantomData<E>,
}

/// Dense real row-major matrix, moved with one vector access per line.
#[derive(Clone, Copy)]
pub struct AlignedRowMajor<E: Element> {
    _elem: PhantomData<E>,
}

/// Element index of the line at `delta` within `tile`.
///
/// The shared base and the per-unit offset are linearised separately.
#[cube]
fn line_index<E: Numeric>(
    workspace: &Tensor<Line<E>>,
    tile: Tile,
    delta: Coords2d,
    #[comptime] major: MatrixLayout,
) -> u32 {
    let tile = tile.translate(delta);
    linearise_2d(physical_coords(tile.base, major), workspace)
        + linearise_2d(physical_coords(tile.offset, major), workspace)
}

#[cube]
fn load_aligned<E: Numeric>(
    workspace: &Tensor<Line<E>>,
    fragment: &mut Fragment<E>,
    tile: Tile,
    #[comptime] config: TileConfig,
) {
    comptime!(config.assert_lines());
    let line_size = comptime!(config.line_size);
    let lines_per_segment = comptime!(config.lines_per_segment());

    #[unroll]
    for segment in 0..comptime!(config.num_segments()) {
        #[unroll]
        for line in 0..lines_per_segment {
            let delta = segment_delta(segment, line * line_size, config.major);
            let index = line_index::<E>(workspace, tile, delta, config.major);
            fragment[segment * lines_per_segment + line] = vector_load::<E>(workspace, index);
        }
    }
}

#[cube]
fn store_aligned<E: Numeric>(
    workspace: &mut Tensor<Line<E>>,
    fragment: &Fragment<E>,
    tile: Tile,
    #[comptime] config: TileConfig,
) {
    comptime!(config.assert_lines());
    let line_size = comptime!(config.line_size);
    let lines_per_segment = comptime!(config.lines_per_segment());

    #[unroll]
    for segment in 0..comptime!(config.num_segments()) {
        #[unroll]
        for line in 0..lines_per_segment {
            let delta = segment_delta(segment, line * line_size, config.major);
            let index = line_index::<E>(workspace, tile, delta, config.major);
            vector_store::<E>(workspace, fragment[segment * lines_per_segment + line], index);
        }
    }
}

impl<E: Element> PhysicalLayout for AlignedColMajor<E> {
    type Elem = E;

    const MAJOR: MatrixLayout = MatrixLayout::ColMajor;

    fn physical_size(logical_size: MatrixSize) -> Vec<usize> {
        Self::MAJOR.physical_shape(logical_size)
    }

    fn to_enum() -> LayoutEnum {
        LayoutEnum::Aligned(Self::MAJOR)
    }
}

#[cube]
impl<E: Element> Layout for AlignedColMajor<E> {
    fn load(
        workspace: &Tensor<Line<E>>,
        fragment: &mut Fragment<E>,
        tile: Tile,
        #[comptime] config: TileConfig,
    ) {
        load_aligned::<E>(workspace, fragment, tile, config);
    }

    fn store(
        workspace: &mut Tensor<Line<E>>,
        fragment: &Fragment<E>,
        tile: Tile,
        #[comptime] config: TileConfig,
    ) {
        store_aligned::<E>(workspace, fragment, tile, config);
    }
}

impl<E: Element> PhysicalLayout for AlignedRowMajor<E> {
    type Elem = E;

    const MAJOR: MatrixLayout = MatrixLayout::RowMajor;

    fn physical_size(logical_size: MatrixSize) -> Vec<usize> {
        Self::MAJOR.physical_shape(logical_size)
    }

    fn to_enum() -> LayoutEnum {
        LayoutEnum::Aligned(Self::MAJOR)
    }
}

#[cube]
impl<E: Element> Layout for AlignedRowMajor<E> {
    fn load(
        workspace: &Tensor<Line<E>>,
        fragment: &mut Fragment<E>,
        tile: Tile,
        #[comptime] config: TileConfig,
    ) {
        load_aligned::<E>(workspace, fragment, tile, config);
    }

    fn store(
        workspace: &mut Tensor<Line<E>>,
        fragment: &Fragment<E>,
        tile: Tile,
        #[comptime] config: TileConfig,
    ) {
        store_aligned::<E>(workspace, fragment, tile, config);
    }
}
