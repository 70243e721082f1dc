pub mod bounds;
pub mod viewport;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use viewport::*;
