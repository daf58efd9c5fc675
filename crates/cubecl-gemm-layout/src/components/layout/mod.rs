mod aligned;
mod base;
mod diagonal;
mod fragment;
mod interleaved;
mod padded;
mod split;
mod zero;

pub use aligned::*;
pub use base::*;
pub use diagonal::*;
pub use fragment::*;
pub use interleaved::*;
pub use padded::*;
pub use split::*;
pub use zero::*;
