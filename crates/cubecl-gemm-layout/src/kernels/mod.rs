/// Tiled gemm driving the layouts.
pub mod gemm;
/// Naive CPU reference, for correctness checks.
pub mod naive;
/// Single-unit tile transfers through a layout.
pub mod tile;
