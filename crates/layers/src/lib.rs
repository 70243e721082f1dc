pub mod labels;
pub mod layer;
pub mod output;
pub mod overlays;
pub mod sections;
pub mod symbology;

pub use layer::*;
pub use output::*;
pub use sections::*;
