/// Gemm launch config module.
pub mod gemm;

mod base;
mod logger;

pub use base::*;
pub use logger::*;
