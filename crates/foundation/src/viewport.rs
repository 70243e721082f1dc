use serde::{Deserialize, Serialize};

use crate::bounds::LatLngBounds;

/// Visible map extent and integer zoom, as reported by the map view.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub bounds: LatLngBounds,
    pub zoom: u8,
}

impl Viewport {
    pub const fn new(bounds: LatLngBounds, zoom: u8) -> Self {
        Self { bounds, zoom }
    }
}
