/// Logical layouts and the fragments they produce.
pub mod layout;
/// Workspaces and vectorized memory primitives.
pub mod memory;

mod element;
mod error;
mod problem;
mod tile;

pub use element::*;
pub use error::*;
pub use problem::*;
pub use tile::*;
