use cubecl::prelude::*;
use std::marker::PhantomData;

use crate::components::{Element, MatrixSize, Tile};

use super::{Fragment, Layout, LayoutEnum, MatrixLayout, PhysicalLayout, TileConfig};

/// A matrix that is identically zero, such as `C` when `beta` is zero.
///
/// Nothing is stored: loads produce zero lines without touching memory, stores are dropped.
#[derive(Clone, Copy)]
pub struct Zero<E: Element> {
    _elem: PhantomData<E>,
}

impl<E: Element> PhysicalLayout for Zero<E> {
    type Elem = E;

    const MAJOR: MatrixLayout = MatrixLayout::ColMajor;

    fn physical_size(_logical_size: MatrixSize) -> Vec<usize> {
        vec![0, 0]
    }

    fn to_enum() -> LayoutEnum {
        LayoutEnum::Zero
    }
}

#[cube]
impl<E: Element> Layout for Zero<E> {
    fn load(
        _workspace: &Tensor<Line<E>>,
        fragment: &mut Fragment<E>,
        _tile: Tile,
        #[comptime] config: TileConfig,
    ) {
        comptime!(config.assert_lines());

        #[unroll]
        for register in 0..comptime!(config.num_registers()) {
            fragment[register] = Line::empty(config.register_size).fill(E::from_int(0));
        }
    }

    fn store(
        _workspace: &mut Tensor<Line<E>>,
        _fragment: &Fragment<E>,
        _tile: Tile,
        #[comptime] config: TileConfig,
    ) {
        comptime!(config.assert_lines());
    }
}
