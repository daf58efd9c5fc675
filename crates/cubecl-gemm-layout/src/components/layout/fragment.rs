use cubecl::prelude::*;
use num_complex::Complex;

use crate::components::{Coords2d, Element, FormattedConfigError, InvalidConfigError};

use super::MatrixLayout;

/// The local copy of a tile held by a unit.
///
/// Registers are stored in load order. For a column-major fragment, each register covers
/// `line_size` consecutive rows of one column and registers go down the column first; a
/// row-major fragment is the transpose. Complex layouts move one element per register,
/// with `(re, im)` in its two lanes.
pub type Fragment<E> = Array<Line<E>>;

/// Comptime geometry of the tiles moved by one layout.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct TileConfig {
    pub rows: u32,
    pub cols: u32,
    /// Logical elements moved per access along the contiguous dimension.
    pub line_size: u32,
    /// Lanes of one register of the fragment.
    pub register_size: u32,
    pub major: MatrixLayout,
}

impl TileConfig {
    pub fn new(rows: u32, cols: u32, line_size: u32, register_size: u32, major: MatrixLayout) -> Self {
        Self {
            rows,
            cols,
            line_size,
            register_size,
            major,
        }
    }

    /// Extent of the tile along the contiguous dimension.
    pub fn contiguous_extent(&self) -> u32 {
        match self.major {
            MatrixLayout::ColMajor => self.rows,
            MatrixLayout::RowMajor => self.cols,
        }
    }

    /// Number of columns of a column-major tile, or rows of a row-major one.
    pub fn num_segments(&self) -> u32 {
        match self.major {
            MatrixLayout::ColMajor => self.cols,
            MatrixLayout::RowMajor => self.rows,
        }
    }

    /// Registers covering one segment.
    pub fn lines_per_segment(&self) -> u32 {
        self.contiguous_extent() / self.line_size
    }

    pub fn num_registers(&self) -> u32 {
        self.num_segments() * self.lines_per_segment()
    }

    /// Rejects tiles that lines don't cover exactly.
    pub fn check_lines(&self) -> Result<(), InvalidConfigError> {
        let config = *self;
        if config.line_size == 0 || config.contiguous_extent() % config.line_size != 0 {
            return Err(FormattedConfigError::new(move || {
                format!(
                    "Tile {}x{} ({:?}) can't be covered by lines of {}",
                    config.rows, config.cols, config.major, config.line_size
                )
            }));
        }
        Ok(())
    }

    /// Panics unless lines cover the tile exactly. Evaluated when a kernel is expanded.
    pub fn assert_lines(&self) {
        assert!(
            self.line_size != 0 && self.contiguous_extent() % self.line_size == 0,
            "Tile {}x{} ({:?}) can't be covered by lines of {}",
            self.rows,
            self.cols,
            self.major,
            self.line_size
        );
    }

    /// Register and lane holding the logical `(row, col)` of the tile.
    pub fn register_of(&self, row: u32, col: u32) -> (u32, u32) {
        let (segment, within) = match self.major {
            MatrixLayout::ColMajor => (col, row),
            MatrixLayout::RowMajor => (row, col),
        };
        (
            segment * self.lines_per_segment() + within / self.line_size,
            within % self.line_size,
        )
    }

    /// Inverse of [TileConfig::register_of].
    pub fn coords_of(&self, register: u32, lane: u32) -> (u32, u32) {
        let segment = register / self.lines_per_segment();
        let within = (register % self.lines_per_segment()) * self.line_size + lane;
        match self.major {
            MatrixLayout::ColMajor => (within, segment),
            MatrixLayout::RowMajor => (segment, within),
        }
    }
}

/// Allocates the registers of a fragment.
#[cube]
pub fn allocate_fragment<E: Numeric>(#[comptime] config: TileConfig) -> Fragment<E> {
    Array::vectorized(comptime!(config.num_registers()), config.register_size)
}

/// Logical value at `(row, col)` of a real fragment.
#[cube]
pub fn fragment_value<E: Numeric>(
    fragment: &Fragment<E>,
    row: u32,
    col: u32,
    #[comptime] config: TileConfig,
) -> E {
    let line_size = comptime!(config.line_size);
    let lines_per_segment = comptime!(config.lines_per_segment());

    match comptime!(config.major) {
        MatrixLayout::ColMajor => {
            let line = fragment[col * lines_per_segment + row / line_size];
            line[row % line_size]
        }
        MatrixLayout::RowMajor => {
            let line = fragment[row * lines_per_segment + col / line_size];
            line[col % line_size]
        }
    }
}

/// Logical coordinates within the tile of a lane of a real fragment.
#[cube]
pub fn fragment_coords(register: u32, lane: u32, #[comptime] config: TileConfig) -> Coords2d {
    let line_size = comptime!(config.line_size);
    let lines_per_segment = comptime!(config.lines_per_segment());
    let segment = register / lines_per_segment;
    let within = (register % lines_per_segment) * line_size + lane;

    match comptime!(config.major) {
        MatrixLayout::ColMajor => (within, segment),
        MatrixLayout::RowMajor => (segment, within),
    }
}

/// A fragment copied to the host, with the registers flattened lane by lane.
#[derive(Clone, Debug, PartialEq)]
pub struct HostFragment<E> {
    values: Vec<E>,
    config: TileConfig,
}

impl<E: Element> HostFragment<E> {
    /// Wraps registers already in load order.
    pub fn new(values: Vec<E>, config: TileConfig) -> Self {
        debug_assert_eq!(
            values.len(),
            (config.num_registers() * config.register_size) as usize
        );
        Self { values, config }
    }

    /// Builds a real fragment from the logical value of each `(row, col)` of the tile.
    pub fn from_fn<F: FnMut(u32, u32) -> E>(config: TileConfig, mut func: F) -> Self {
        let values = (0..config.num_registers())
            .flat_map(|register| (0..config.register_size).map(move |lane| (register, lane)))
            .map(|(register, lane)| {
                let (row, col) = config.coords_of(register, lane);
                func(row, col)
            })
            .collect();

        Self::new(values, config)
    }

    /// Builds a complex fragment from the logical value of each `(row, col)` of the tile.
    pub fn from_complex_fn<F: FnMut(u32, u32) -> Complex<E>>(config: TileConfig, mut func: F) -> Self {
        let values = (0..config.num_registers())
            .flat_map(|register| {
                let (row, col) = config.coords_of(register, 0);
                let value = func(row, col);
                [value.re, value.im]
            })
            .collect();

        Self::new(values, config)
    }

    /// Logical value at `(row, col)` of a real fragment.
    pub fn get(&self, row: u32, col: u32) -> E {
        let (register, lane) = self.config.register_of(row, col);
        self.values[(register * self.config.register_size + lane) as usize]
    }

    /// Logical value at `(row, col)` of a complex fragment.
    pub fn get_complex(&self, row: u32, col: u32) -> Complex<E> {
        let (register, _) = self.config.register_of(row, col);
        let index = (register * self.config.register_size) as usize;
        Complex::new(self.values[index], self.values[index + 1])
    }

    pub fn values(&self) -> &[E] {
        &self.values
    }

    pub fn config(&self) -> TileConfig {
        self.config
    }
}
