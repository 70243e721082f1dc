pub mod dataset;
pub mod ponds;
pub mod source;

pub use dataset::*;
pub use ponds::*;
pub use source::*;
