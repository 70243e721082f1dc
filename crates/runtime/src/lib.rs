pub mod event_bus;
pub mod trigger;

pub use event_bus::*;
pub use trigger::*;
