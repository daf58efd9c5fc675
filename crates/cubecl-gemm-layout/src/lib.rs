//! Memory layouts for tiled tensor-core matrix multiplication.
//!
//! A layout maps the logical view of a matrix operand (row, column, tile) to the
//! elements of its workspace, and moves tiles between the workspace and per-unit
//! fragments with vectorized loads and stores. Layouts are `#[cube]` type-level
//! markers: every kernel instantiation expands to exactly one load and store routine.

#[macro_use]
extern crate derive_new;

/// Building blocks of the layout layer.
pub mod components;
/// Global configuration.
pub mod config;
/// Matrix multiplication kernels built on the layouts.
pub mod kernels;

pub use components::*;
