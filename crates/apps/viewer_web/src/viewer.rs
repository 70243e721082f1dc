use std::collections::BTreeSet;
use std::rc::Rc;

use formats::geojson::features_to_geojson;
use formats::pond::{PondAttributes, PopupRow};
use foundation::bounds::LatLngBounds;
use foundation::viewport::Viewport;
use layers::layer::{Layer, LayerId};
use layers::output::{LabelElement, LineElement, MemoryGroup};
use layers::overlays::StaticOverlay;
use layers::sections::{SectionsConfig, SectionsLayer};
use layers::symbology::LineStyle;
use runtime::event_bus::{EventBus, MapEvent};
use runtime::trigger::{MapView, RenderTrigger, SectionsOverlays};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use streaming::dataset::DatasetHolder;
use streaming::ponds::{PondCatalog, PondPaths};
use tracing::debug;

pub const COUNTIES: LayerId = LayerId(1);
pub const TOWNSHIPS: LayerId = LayerId(2);
pub const SECTION_LINES: LayerId = LayerId(3);
pub const SECTION_LABELS: LayerId = LayerId(4);
pub const PONDS: LayerId = LayerId(5);

/// Overlay names as the page's layer control knows them.
pub fn overlay_id(name: &str) -> Option<LayerId> {
    match name {
        "counties" => Some(COUNTIES),
        "plss_townships" => Some(TOWNSHIPS),
        "plss_sections" => Some(SECTION_LINES),
        "section_labels" => Some(SECTION_LABELS),
        "ponds" => Some(PONDS),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Prefix for every dataset location; empty means page-relative.
    pub base_url: String,
    pub sections_url: String,
    pub townships_url: String,
    pub counties_url: String,
    pub ponds: PondPaths,
    pub sections: SectionsConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            sections_url: "data/plss_sections.geojson".to_string(),
            townships_url: "data/plss_townships.geojson".to_string(),
            counties_url: "data/ok_counties.geojson".to_string(),
            ponds: PondPaths::default(),
            sections: SectionsConfig::default(),
        }
    }
}

/// Last viewport and overlay toggles reported by the page.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub viewport: Viewport,
    active: BTreeSet<LayerId>,
}

impl Default for ViewState {
    fn default() -> Self {
        // Oklahoma at state zoom.
        Self {
            viewport: Viewport::new(LatLngBounds::new(33.6, -103.0, 37.0, -94.4), 7),
            active: BTreeSet::new(),
        }
    }
}

impl ViewState {
    pub fn set_layer(&mut self, id: LayerId, visible: bool) {
        if visible {
            self.active.insert(id);
        } else {
            self.active.remove(&id);
        }
    }
}

impl MapView for ViewState {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn has_layer(&self, id: LayerId) -> bool {
        self.active.contains(&id)
    }
}

/// Line and label output of one overlay, ready for the page to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlaySnapshot {
    pub style: LineStyle,
    /// FeatureCollection of the features that have a line element.
    pub lines: Value,
    pub labels: Vec<LabelElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PondView {
    pub attributes: PondAttributes,
    pub outline: Value,
    pub popup_rows: Vec<PopupRow>,
}

#[derive(Debug)]
struct OverlayState {
    overlay: StaticOverlay,
    dataset: Rc<DatasetHolder>,
    lines: MemoryGroup<LineElement>,
    labels: MemoryGroup<LabelElement>,
}

impl OverlayState {
    fn new(overlay: StaticOverlay, dataset: Rc<DatasetHolder>) -> Self {
        Self {
            overlay,
            dataset,
            lines: MemoryGroup::new(),
            labels: MemoryGroup::new(),
        }
    }

    fn refresh(&mut self) {
        let Some(dataset) = self.dataset.get() else {
            return;
        };
        let (lines, labels) = self
            .overlay
            .populate(&dataset, &mut self.lines, &mut self.labels);
        debug!(layer = self.overlay.id().0, lines, labels, "overlay populated");
    }

    fn snapshot(&self) -> OverlaySnapshot {
        let dataset = self.dataset.get();
        OverlaySnapshot {
            style: self.overlay.line_style.clone(),
            lines: lines_geojson(dataset.as_deref(), self.lines.elements()),
            labels: self.labels.elements().to_vec(),
        }
    }
}

fn lines_geojson(
    dataset: Option<&formats::geojson::FeatureCollection>,
    lines: &[LineElement],
) -> Value {
    let features = dataset
        .into_iter()
        .flat_map(|fc| lines.iter().filter_map(|l| fc.features.get(l.feature_index)));
    features_to_geojson(features)
}

/// Everything the page-side map talks to: dataset holders, the sections
/// render trigger and the element groups it fills.
#[derive(Debug)]
pub struct Viewer {
    config: ViewerConfig,
    view: ViewState,
    bus: EventBus,
    trigger: RenderTrigger,
    section_lines: MemoryGroup<LineElement>,
    section_labels: MemoryGroup<LabelElement>,
    counties: OverlayState,
    townships: OverlayState,
    ponds: Rc<PondCatalog>,
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Self {
        Self::with_datasets(
            config,
            Rc::new(DatasetHolder::new()),
            Rc::new(DatasetHolder::new()),
            Rc::new(DatasetHolder::new()),
        )
    }

    pub fn with_datasets(
        config: ViewerConfig,
        sections: Rc<DatasetHolder>,
        counties: Rc<DatasetHolder>,
        townships: Rc<DatasetHolder>,
    ) -> Self {
        let layer = SectionsLayer::new(SECTION_LINES.0, config.sections.clone());
        let trigger = RenderTrigger::new(
            layer,
            SectionsOverlays {
                lines: SECTION_LINES,
                labels: SECTION_LABELS,
            },
            sections,
        );
        Self {
            config,
            view: ViewState::default(),
            bus: EventBus::new(),
            trigger,
            section_lines: MemoryGroup::new(),
            section_labels: MemoryGroup::new(),
            counties: OverlayState::new(StaticOverlay::counties(COUNTIES.0), counties),
            townships: OverlayState::new(StaticOverlay::plss_townships(TOWNSHIPS.0), townships),
            ponds: Rc::new(PondCatalog::new()),
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn sections_dataset(&self) -> Rc<DatasetHolder> {
        Rc::clone(self.trigger.dataset())
    }

    pub fn counties_dataset(&self) -> Rc<DatasetHolder> {
        Rc::clone(&self.counties.dataset)
    }

    pub fn townships_dataset(&self) -> Rc<DatasetHolder> {
        Rc::clone(&self.townships.dataset)
    }

    pub fn ponds(&self) -> Rc<PondCatalog> {
        Rc::clone(&self.ponds)
    }

    pub fn set_viewport(&mut self, bounds: LatLngBounds, zoom: u8) {
        self.view.viewport = Viewport::new(bounds, zoom);
    }

    /// Applies `event` to the view state, then runs the renders it
    /// triggers. Returns the number of sections passes run.
    pub fn notify(&mut self, event: MapEvent) -> usize {
        match event {
            MapEvent::LayerAdd(id) => self.view.set_layer(id, true),
            MapEvent::LayerRemove(id) => self.view.set_layer(id, false),
            MapEvent::DatasetLoaded => self.refresh_static_overlays(),
            MapEvent::MoveEnd | MapEvent::ZoomEnd => {}
        }
        self.bus.emit(event);
        self.trigger.dispatch(
            &mut self.bus,
            &self.view,
            &mut self.section_lines,
            &mut self.section_labels,
        )
    }

    pub fn refresh_static_overlays(&mut self) {
        self.counties.refresh();
        self.townships.refresh();
    }

    pub fn sections_snapshot(&self) -> OverlaySnapshot {
        let dataset = self.trigger.dataset().get();
        OverlaySnapshot {
            style: self.trigger.layer().config.line_style.clone(),
            lines: lines_geojson(dataset.as_deref(), self.section_lines.elements()),
            labels: self.section_labels.elements().to_vec(),
        }
    }

    /// Snapshot of a static overlay; `None` for ids that are not one.
    pub fn overlay_snapshot(&self, id: LayerId) -> Option<OverlaySnapshot> {
        match id {
            COUNTIES => Some(self.counties.snapshot()),
            TOWNSHIPS => Some(self.townships.snapshot()),
            _ => None,
        }
    }

    pub fn pond_views(&self) -> Vec<PondView> {
        let records = self.ponds.records();
        debug!(ponds = records.len(), "pond views requested");
        records
            .iter()
            .map(|record| PondView {
                attributes: record.attributes.clone(),
                outline: features_to_geojson(&record.outline.features),
                popup_rows: record.popup_rows(),
            })
            .collect()
    }
}
