pub mod extent;
pub mod geojson;
pub mod pond;

pub use extent::*;
pub use geojson::*;
pub use pond::*;
