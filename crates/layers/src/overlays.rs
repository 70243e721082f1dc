use formats::extent::compute_bounds;
use formats::geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::labels::{LabelText, label_for_feature};
use crate::layer::{Layer, LayerId};
use crate::output::{ElementGroup, LabelElement, LineElement};
use crate::sections::{RenderedSubset, emit_all};
use crate::symbology::LineStyle;

/// Whole-dataset overlay (counties, PLSS townships): drawn once after load,
/// never filtered by viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticOverlay {
    id: LayerId,
    pub line_style: LineStyle,
    pub label: LabelText,
}

impl StaticOverlay {
    pub fn new(id: u64, line_style: LineStyle, label: LabelText) -> Self {
        Self {
            id: LayerId(id),
            line_style,
            label,
        }
    }

    pub fn counties(id: u64) -> Self {
        Self::new(id, LineStyle::counties(), LabelText::county())
    }

    pub fn plss_townships(id: u64) -> Self {
        Self::new(id, LineStyle::plss_townships(), LabelText::Township)
    }

    /// One line per feature with geometry; one label per feature with both
    /// bounds and label text.
    pub fn build(&self, dataset: &FeatureCollection) -> RenderedSubset {
        let mut out = RenderedSubset::default();
        for (i, feature) in dataset.features.iter().enumerate() {
            if feature.geometry.is_none() {
                continue;
            }
            out.features.push(i);
            out.lines.push(LineElement {
                feature_index: i,
                style: self.line_style.clone(),
            });
            let Some(bounds) = compute_bounds(feature.geometry.as_ref()) else {
                continue;
            };
            if let Some(label) = label_for_feature(i, feature, &bounds, &self.label) {
                out.labels.push(label);
            }
        }
        out
    }

    /// Fills both groups from scratch; returns `(lines, labels)` added.
    pub fn populate<L, B>(
        &self,
        dataset: &FeatureCollection,
        lines: &mut L,
        labels: &mut B,
    ) -> (usize, usize)
    where
        L: ElementGroup<LineElement> + ?Sized,
        B: ElementGroup<LabelElement> + ?Sized,
    {
        let built = self.build(dataset);
        lines.clear();
        labels.clear();

        let line_count = emit_all(lines, built.lines).unwrap_or_else(|(added, e)| {
            warn!(layer = self.id.0, error = %e, "overlay lines truncated");
            added
        });
        let label_count = emit_all(labels, built.labels).unwrap_or_else(|(added, e)| {
            warn!(layer = self.id.0, error = %e, "overlay labels truncated");
            added
        });
        (line_count, label_count)
    }
}

impl Layer for StaticOverlay {
    fn id(&self) -> LayerId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::StaticOverlay;
    use crate::output::MemoryGroup;
    use formats::geojson::FeatureCollection;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn townships() -> FeatureCollection {
        let value = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "TWNSHPNO": "014", "TWNSHPDIR": "N", "RANGENO": "003", "RANGEDIR": "W" },
                    "geometry": { "type": "Polygon", "coordinates": [[[-97.4, 35.6], [-97.3, 35.6], [-97.3, 35.7], [-97.4, 35.6]]] }
                },
                {
                    "type": "Feature",
                    "properties": { "TWNSHPNO": "015" },
                    "geometry": { "type": "Polygon", "coordinates": [[[-97.4, 35.7], [-97.3, 35.7], [-97.3, 35.8], [-97.4, 35.7]]] }
                },
                { "type": "Feature", "properties": {}, "geometry": null }
            ]
        });
        FeatureCollection::from_geojson_value(&value).expect("parse")
    }

    #[test]
    fn builds_lines_for_every_geometry_and_labels_when_complete() {
        let overlay = StaticOverlay::plss_townships(3);
        let built = overlay.build(&townships());
        assert_eq!(built.features, vec![0, 1]);
        assert_eq!(built.lines.len(), 2);
        assert_eq!(built.labels.len(), 1);
        assert_eq!(built.labels[0].text, "T14N R3W");
    }

    #[test]
    fn populate_replaces_group_contents() {
        let overlay = StaticOverlay::plss_townships(3);
        let data = townships();
        let mut lines = MemoryGroup::new();
        let mut labels = MemoryGroup::new();
        assert_eq!(overlay.populate(&data, &mut lines, &mut labels), (2, 1));
        assert_eq!(overlay.populate(&data, &mut lines, &mut labels), (2, 1));
        assert_eq!(lines.len(), 2);
        assert_eq!(labels.len(), 1);
    }

    #[test]
    fn populate_truncates_only_the_full_group() {
        let overlay = StaticOverlay::plss_townships(3);
        let mut lines = MemoryGroup::with_capacity_limit(1);
        let mut labels = MemoryGroup::new();
        assert_eq!(overlay.populate(&townships(), &mut lines, &mut labels), (1, 1));
        assert_eq!(labels.len(), 1);
    }
}
