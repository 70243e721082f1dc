use foundation::bounds::LatLngBounds;
use foundation::viewport::Viewport;
use formats::extent::compute_bounds;
use formats::geojson::{Feature, FeatureCollection};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::labels::{LabelText, label_for_feature};
use crate::layer::{Layer, LayerId};
use crate::output::{ElementGroup, EmitError, LabelElement, LineElement};
use crate::symbology::LineStyle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionsConfig {
    /// Below this zoom nothing is drawn.
    pub min_zoom: u8,
    /// Per-pass cap; features past it (in input order) are dropped.
    pub max_features: usize,
    pub label: LabelText,
    pub line_style: LineStyle,
}

impl Default for SectionsConfig {
    fn default() -> Self {
        Self {
            min_zoom: 13,
            max_features: 1000,
            label: LabelText::plss_section(),
            line_style: LineStyle::plss_sections(),
        }
    }
}

/// Which of the two output groups the user has switched on.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveOutputs {
    pub lines: bool,
    pub labels: bool,
}

impl ActiveOutputs {
    pub const fn new(lines: bool, labels: bool) -> Self {
        Self { lines, labels }
    }

    pub const fn any(&self) -> bool {
        self.lines || self.labels
    }
}

/// Elements derived for one render pass. Never stored across passes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderedSubset {
    /// Indices of the in-view features, after the cap.
    pub features: Vec<usize>,
    pub lines: Vec<LineElement>,
    pub labels: Vec<LabelElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderPass {
    /// Dataset unset or zoomed out: both groups are emptied.
    Clear,
    /// No output group active: groups are left as they are.
    Skip,
    Draw(RenderedSubset),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Cleared,
    Skipped,
    Drawn {
        features: usize,
        lines: usize,
        labels: usize,
    },
}

/// Viewport-driven PLSS sections layer.
///
/// Ordering contract:
/// - Surviving features keep dataset order; the cap keeps the first
///   `max_features` of them.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionsLayer {
    id: LayerId,
    pub config: SectionsConfig,
}

impl SectionsLayer {
    pub fn new(id: u64, config: SectionsConfig) -> Self {
        Self {
            id: LayerId(id),
            config,
        }
    }

    /// Features whose bounds intersect `view`, capped, with their bounds.
    pub fn visible_features<'a>(
        &self,
        dataset: &'a FeatureCollection,
        view: &LatLngBounds,
    ) -> Vec<(usize, &'a Feature, LatLngBounds)> {
        dataset
            .features
            .iter()
            .enumerate()
            .filter_map(|(i, f)| {
                let b = compute_bounds(f.geometry.as_ref())?;
                view.intersects(&b).then_some((i, f, b))
            })
            .take(self.config.max_features)
            .collect()
    }

    pub fn plan(
        &self,
        dataset: Option<&FeatureCollection>,
        viewport: &Viewport,
        active: ActiveOutputs,
    ) -> RenderPass {
        let Some(dataset) = dataset else {
            return RenderPass::Clear;
        };
        if viewport.zoom < self.config.min_zoom {
            return RenderPass::Clear;
        }
        if !active.any() {
            return RenderPass::Skip;
        }

        let visible = self.visible_features(dataset, &viewport.bounds);
        let mut out = RenderedSubset {
            features: visible.iter().map(|(i, _, _)| *i).collect(),
            ..RenderedSubset::default()
        };

        if active.lines {
            out.lines = visible
                .iter()
                .map(|(i, _, _)| LineElement {
                    feature_index: *i,
                    style: self.config.line_style.clone(),
                })
                .collect();
        }
        if active.labels {
            out.labels = visible
                .iter()
                .filter_map(|(i, f, b)| label_for_feature(*i, f, b, &self.config.label))
                .collect();
        }

        RenderPass::Draw(out)
    }

    /// Clears and repopulates `lines` / `labels` for the current view.
    ///
    /// An emission error stops only the output type it occurred in; nothing
    /// is propagated to the caller.
    pub fn render<L, B>(
        &self,
        dataset: Option<&FeatureCollection>,
        viewport: &Viewport,
        active: ActiveOutputs,
        lines: &mut L,
        labels: &mut B,
    ) -> RenderOutcome
    where
        L: ElementGroup<LineElement> + ?Sized,
        B: ElementGroup<LabelElement> + ?Sized,
    {
        let subset = match self.plan(dataset, viewport, active) {
            RenderPass::Clear => {
                lines.clear();
                labels.clear();
                return RenderOutcome::Cleared;
            }
            RenderPass::Skip => return RenderOutcome::Skipped,
            RenderPass::Draw(subset) => subset,
        };

        lines.clear();
        labels.clear();
        if subset.features.is_empty() {
            return RenderOutcome::Drawn {
                features: 0,
                lines: 0,
                labels: 0,
            };
        }

        let lines_added = emit_all(lines, subset.lines).unwrap_or_else(|(added, e)| {
            error!(layer = self.id.0, error = %e, "failed to add section lines");
            added
        });
        let labels_added = emit_all(labels, subset.labels).unwrap_or_else(|(added, e)| {
            error!(layer = self.id.0, error = %e, "failed to add section labels");
            added
        });

        debug!(
            layer = self.id.0,
            zoom = viewport.zoom,
            features = subset.features.len(),
            lines = lines_added,
            labels = labels_added,
            "rendered sections subset"
        );
        RenderOutcome::Drawn {
            features: subset.features.len(),
            lines: lines_added,
            labels: labels_added,
        }
    }
}

/// Adds `elements` in order, stopping at the first rejection. The error
/// carries how many were added before it.
pub(crate) fn emit_all<E, G>(group: &mut G, elements: Vec<E>) -> Result<usize, (usize, EmitError)>
where
    G: ElementGroup<E> + ?Sized,
{
    let mut added = 0;
    for element in elements {
        group.add(element).map_err(|e| (added, e))?;
        added += 1;
    }
    Ok(added)
}

impl Layer for SectionsLayer {
    fn id(&self) -> LayerId {
        self.id
    }
}
