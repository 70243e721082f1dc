use foundation::bounds::LatLngBounds;
use formats::geojson::Feature;
use serde::{Deserialize, Serialize};

use crate::output::LabelElement;

/// How a layer derives label text from feature properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LabelText {
    /// First non-empty value among the listed property keys.
    FirstOf { keys: Vec<String> },
    /// PLSS township/range designation, e.g. `T12N R5W`.
    Township,
}

impl LabelText {
    pub fn first_of<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LabelText::FirstOf {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn plss_section() -> Self {
        Self::first_of(["FRSTDIVNO", "SEC"])
    }

    pub fn county() -> Self {
        Self::first_of(["NAME", "NAME_ALT"])
    }

    pub fn text_for(&self, feature: &Feature) -> Option<String> {
        match self {
            LabelText::FirstOf { keys } => feature.first_property_text(keys),
            LabelText::Township => township_label(feature),
        }
    }
}

/// Label anchored at the center of the feature's bounding box.
///
/// `None` when the feature carries no usable label text.
pub fn label_for_feature(
    feature_index: usize,
    feature: &Feature,
    bounds: &LatLngBounds,
    text: &LabelText,
) -> Option<LabelElement> {
    let text = text.text_for(feature)?;
    Some(LabelElement {
        feature_index,
        anchor: bounds.center(),
        text,
    })
}

pub fn township_label(feature: &Feature) -> Option<String> {
    let part = |key: &str| feature.property_text(key).unwrap_or_default();

    let township_no = part("TWNSHPNO").trim_start_matches('0').to_string();
    let township_dir = direction_letters(&part("TWNSHPDIR"), &['N', 'S']);
    let range_no = part("RANGENO").trim_start_matches('0').to_string();
    let range_dir = direction_letters(&part("RANGEDIR"), &['E', 'W']);

    if township_no.is_empty() || township_dir.is_empty() || range_no.is_empty() || range_dir.is_empty()
    {
        return None;
    }
    Some(format!("T{township_no}{township_dir} R{range_no}{range_dir}"))
}

fn direction_letters(raw: &str, allowed: &[char]) -> String {
    raw.to_uppercase()
        .chars()
        .filter(|c| allowed.contains(c))
        .collect()
}
