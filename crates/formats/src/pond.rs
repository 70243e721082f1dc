use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::geojson::FeatureCollection;

/// Pond identifier as it appears in `pond_index.json` and attribute files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PondId {
    Number(i64),
    Text(String),
}

impl fmt::Display for PondId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PondId::Number(n) => write!(f, "{n}"),
            PondId::Text(s) => f.write_str(s),
        }
    }
}

pub fn parse_pond_index(payload: &str) -> Result<Vec<PondId>, serde_json::Error> {
    serde_json::from_str(payload)
}

/// One row of a stage-volume survey table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageVolumeRow {
    #[serde(rename = "Depth")]
    pub depth_ft: f64,
    /// Barrels.
    #[serde(rename = "Volume")]
    pub volume: f64,
    /// Acres.
    #[serde(rename = "SurfaceArea")]
    pub surface_area: f64,
}

impl StageVolumeRow {
    pub fn volume_barrels(&self) -> i64 {
        self.volume.round() as i64
    }
}

/// Attribute file of one pond.
///
/// Only the stage-volume table has structure the viewer relies on; the
/// descriptive fields are popup text and tolerate nulls, absence and
/// numbers written as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PondAttributes {
    #[serde(rename = "PondID", default)]
    pub pond_id: Option<PondId>,
    #[serde(rename = "PondName", default)]
    pub name: Option<String>,
    #[serde(rename = "SurveyDate", default)]
    pub survey_date: Option<String>,
    #[serde(rename = "MaxDepth_ft", default, deserialize_with = "lenient_number")]
    pub max_depth_ft: Option<f64>,
    #[serde(rename = "DepthVolumeData", default)]
    pub stage_volume: Vec<StageVolumeRow>,
}

/// Number, numeric string, or anything else as `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

impl PondAttributes {
    pub fn from_json_str(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

/// Display-ready stage-volume row for the pond popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopupRow {
    pub depth_ft: String,
    pub volume_barrels: String,
    pub surface_area_acres: String,
}

/// Attributes plus outline geometry of a surveyed pond.
#[derive(Debug, Clone, PartialEq)]
pub struct PondRecord {
    pub attributes: PondAttributes,
    pub outline: FeatureCollection,
}

impl PondRecord {
    pub fn popup_rows(&self) -> Vec<PopupRow> {
        self.attributes
            .stage_volume
            .iter()
            .map(|row| PopupRow {
                depth_ft: fixed(row.depth_ft, 1),
                volume_barrels: group_thousands(row.volume_barrels()),
                surface_area_acres: fixed(row.surface_area, 2),
            })
            .collect()
    }
}

/// `digits` decimals, ties rounded away from zero (`0.25` → `"0.3"`).
fn fixed(value: f64, digits: u8) -> String {
    let scale = 10f64.powi(i32::from(digits));
    format!("{:.*}", usize::from(digits), (value * scale).round() / scale)
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
