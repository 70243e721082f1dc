use serde::{Deserialize, Serialize};

/// Outline style handed to the map view. Colors are CSS strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineStyle {
    pub color: String,
    pub weight: f32,
    pub opacity: f32,
    pub fill_opacity: f32,
}

impl LineStyle {
    pub fn new(color: impl Into<String>, weight: f32, opacity: f32) -> Self {
        Self {
            color: color.into(),
            weight,
            opacity,
            fill_opacity: 0.0,
        }
    }

    pub fn plss_sections() -> Self {
        Self::new("#999999", 1.0, 0.9)
    }

    pub fn plss_townships() -> Self {
        Self::new("#ff6600", 2.0, 1.0)
    }

    pub fn counties() -> Self {
        Self::new("#aaaaaa", 1.0, 0.6)
    }
}

impl Default for LineStyle {
    fn default() -> Self {
        Self::plss_sections()
    }
}
