mod vector;
mod workspace;

pub use vector::*;
pub use workspace::*;
