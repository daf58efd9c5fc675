use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Logical extents of a matrix, as (rows, cols).
pub type MatrixSize = (usize, usize);

/// Description of a gemm problem `D = alpha * A * B + beta * C`, regardless of actual data.
///
/// `A` is `m x k`, `B` is `k x n`, `C` and `D` are `m x n`, all in logical coordinates.
#[derive(new, Copy, Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct GemmProblem {
    pub m: usize,
    pub n: usize,
    pub k: usize,
}

impl GemmProblem {
    /// Logical shape of `A`.
    pub fn lhs_shape(&self) -> MatrixSize {
        (self.m, self.k)
    }

    /// Logical shape of `B`.
    pub fn rhs_shape(&self) -> MatrixSize {
        (self.k, self.n)
    }

    /// Logical shape of `C` and `D`.
    pub fn out_shape(&self) -> MatrixSize {
        (self.m, self.n)
    }
}

impl Display for GemmProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "m={} n={} k={}", self.m, self.n, self.k)
    }
}

/// Extents of the block tile computed by one cube.
#[derive(new, Copy, Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSize {
    pub m: usize,
    pub n: usize,
    pub k: usize,
}

impl TileSize {
    /// Number of block tiles along m and n.
    pub fn grid(&self, problem: &GemmProblem) -> MatrixSize {
        (problem.m.div_ceil(self.m), problem.n.div_ceil(self.n))
    }
}

impl Display for TileSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.m, self.n, self.k)
    }
}

/// How a problem is split across the device.
///
/// Each cube computes one `block` of `D`. Each unit of the cube computes a
/// `unit_m x unit_n` sub-tile of that block, over the whole `block.k` extent.
#[derive(new, Copy, Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct GemmSelection {
    pub block: TileSize,
    pub unit_m: usize,
    pub unit_n: usize,
}

impl GemmSelection {
    /// Units per cube along m and n.
    pub fn units(&self) -> MatrixSize {
        (self.block.m / self.unit_m, self.block.n / self.unit_n)
    }

    pub fn num_units(&self) -> usize {
        let (units_m, units_n) = self.units();
        units_m * units_n
    }
}

impl Display for GemmSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "block={} unit={}x{}", self.block, self.unit_m, self.unit_n)
    }
}
