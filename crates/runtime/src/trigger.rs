use std::rc::Rc;

use foundation::viewport::Viewport;
use layers::layer::LayerId;
use layers::output::{ElementGroup, LabelElement, LineElement};
use layers::sections::{ActiveOutputs, RenderOutcome, SectionsLayer};
use streaming::dataset::DatasetHolder;
use tracing::trace;

use crate::event_bus::{EventBus, MapEvent};

/// Read side of the map view: current extent and overlay toggles.
pub trait MapView {
    fn viewport(&self) -> Viewport;
    fn has_layer(&self, id: LayerId) -> bool;
}

/// Overlay ids of the two sections output groups.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SectionsOverlays {
    pub lines: LayerId,
    pub labels: LayerId,
}

impl SectionsOverlays {
    pub fn contains(&self, id: LayerId) -> bool {
        id == self.lines || id == self.labels
    }
}

/// Binds the sections renderer to map events.
///
/// Every accepted event runs one full synchronous render pass; passes are
/// idempotent, so overlapping triggers only repeat work.
#[derive(Debug)]
pub struct RenderTrigger {
    layer: SectionsLayer,
    overlays: SectionsOverlays,
    dataset: Rc<DatasetHolder>,
}

impl RenderTrigger {
    pub fn new(layer: SectionsLayer, overlays: SectionsOverlays, dataset: Rc<DatasetHolder>) -> Self {
        Self {
            layer,
            overlays,
            dataset,
        }
    }

    pub fn layer(&self) -> &SectionsLayer {
        &self.layer
    }

    pub fn overlays(&self) -> SectionsOverlays {
        self.overlays
    }

    pub fn dataset(&self) -> &Rc<DatasetHolder> {
        &self.dataset
    }

    pub fn subscribes_to(&self, event: &MapEvent) -> bool {
        match event {
            MapEvent::MoveEnd | MapEvent::ZoomEnd | MapEvent::DatasetLoaded => true,
            MapEvent::LayerAdd(id) | MapEvent::LayerRemove(id) => self.overlays.contains(*id),
        }
    }

    /// Renders against whatever the map view currently shows.
    pub fn render_visible<V, L, B>(&self, view: &V, lines: &mut L, labels: &mut B) -> RenderOutcome
    where
        V: MapView + ?Sized,
        L: ElementGroup<LineElement> + ?Sized,
        B: ElementGroup<LabelElement> + ?Sized,
    {
        let active = ActiveOutputs::new(
            view.has_layer(self.overlays.lines),
            view.has_layer(self.overlays.labels),
        );
        let dataset = self.dataset.get();
        self.layer
            .render(dataset.as_deref(), &view.viewport(), active, lines, labels)
    }

    pub fn handle<V, L, B>(
        &self,
        event: &MapEvent,
        view: &V,
        lines: &mut L,
        labels: &mut B,
    ) -> Option<RenderOutcome>
    where
        V: MapView + ?Sized,
        L: ElementGroup<LineElement> + ?Sized,
        B: ElementGroup<LabelElement> + ?Sized,
    {
        if !self.subscribes_to(event) {
            return None;
        }
        let outcome = self.render_visible(view, lines, labels);
        trace!(?event, ?outcome, "sections render");
        Some(outcome)
    }

    /// Drains `bus`, rendering once per subscribed event. Returns the number
    /// of render passes run.
    pub fn dispatch<V, L, B>(
        &self,
        bus: &mut EventBus,
        view: &V,
        lines: &mut L,
        labels: &mut B,
    ) -> usize
    where
        V: MapView + ?Sized,
        L: ElementGroup<LineElement> + ?Sized,
        B: ElementGroup<LabelElement> + ?Sized,
    {
        bus.drain()
            .iter()
            .filter_map(|event| self.handle(event, view, lines, labels))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::rc::Rc;

    use super::{MapView, RenderTrigger, SectionsOverlays};
    use crate::event_bus::{EventBus, MapEvent};
    use formats::geojson::FeatureCollection;
    use foundation::bounds::LatLngBounds;
    use foundation::viewport::Viewport;
    use layers::layer::LayerId;
    use layers::output::MemoryGroup;
    use layers::sections::{RenderOutcome, SectionsConfig, SectionsLayer};
    use pretty_assertions::assert_eq;
    use streaming::dataset::DatasetHolder;

    const LINES: LayerId = LayerId(10);
    const LABELS: LayerId = LayerId(11);
    const COUNTIES: LayerId = LayerId(1);

    struct FakeView {
        viewport: Viewport,
        active: HashSet<LayerId>,
    }

    impl MapView for FakeView {
        fn viewport(&self) -> Viewport {
            self.viewport
        }

        fn has_layer(&self, id: LayerId) -> bool {
            self.active.contains(&id)
        }
    }

    fn sections() -> FeatureCollection {
        FeatureCollection::from_geojson_str(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"FRSTDIVNO":"16"},
                 "geometry":{"type":"Polygon","coordinates":[[[-97.50,35.50],[-97.49,35.50],[-97.49,35.51],[-97.50,35.50]]]}},
                {"type":"Feature","properties":{"SEC":"17"},
                 "geometry":{"type":"Polygon","coordinates":[[[-97.49,35.50],[-97.48,35.50],[-97.48,35.51],[-97.49,35.50]]]}}
            ]}"#,
        )
        .expect("parse")
    }

    fn trigger(holder: DatasetHolder) -> RenderTrigger {
        RenderTrigger::new(
            SectionsLayer::new(1, SectionsConfig::default()),
            SectionsOverlays {
                lines: LINES,
                labels: LABELS,
            },
            Rc::new(holder),
        )
    }

    fn view(zoom: u8, active: &[LayerId]) -> FakeView {
        FakeView {
            viewport: Viewport::new(LatLngBounds::new(35.45, -97.55, 35.55, -97.45), zoom),
            active: active.iter().copied().collect(),
        }
    }

    #[test]
    fn ignores_unrelated_overlay_toggles() {
        let t = trigger(DatasetHolder::loaded(sections()));
        assert!(t.subscribes_to(&MapEvent::MoveEnd));
        assert!(t.subscribes_to(&MapEvent::LayerRemove(LABELS)));
        assert!(!t.subscribes_to(&MapEvent::LayerAdd(COUNTIES)));

        let mut lines = MemoryGroup::new();
        let mut labels = MemoryGroup::new();
        let v = view(14, &[LINES, LABELS]);
        assert_eq!(
            t.handle(&MapEvent::LayerAdd(COUNTIES), &v, &mut lines, &mut labels),
            None
        );
        assert!(lines.is_empty());
    }

    #[test]
    fn dispatch_renders_per_subscribed_event() {
        let t = trigger(DatasetHolder::loaded(sections()));
        let mut bus = EventBus::new();
        bus.emit(MapEvent::MoveEnd);
        bus.emit(MapEvent::LayerAdd(COUNTIES));
        bus.emit(MapEvent::ZoomEnd);

        let mut lines = MemoryGroup::new();
        let mut labels = MemoryGroup::new();
        let v = view(14, &[LINES, LABELS]);
        assert_eq!(t.dispatch(&mut bus, &v, &mut lines, &mut labels), 2);
        assert!(bus.events().is_empty());

        // Clear-then-repopulate: repeated passes do not accumulate.
        assert_eq!(lines.len(), 2);
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn layer_remove_reads_current_toggles() {
        let t = trigger(DatasetHolder::loaded(sections()));
        let mut lines = MemoryGroup::new();
        let mut labels = MemoryGroup::new();
        t.render_visible(&view(14, &[LINES, LABELS]), &mut lines, &mut labels);
        assert_eq!(lines.len(), 2);

        let outcome = t.handle(
            &MapEvent::LayerRemove(LINES),
            &view(14, &[LABELS]),
            &mut lines,
            &mut labels,
        );
        assert_eq!(
            outcome,
            Some(RenderOutcome::Drawn {
                features: 2,
                lines: 0,
                labels: 2
            })
        );
        assert!(lines.is_empty());
    }

    #[test]
    fn unloaded_dataset_stays_inert() {
        let t = trigger(DatasetHolder::new());
        let mut lines = MemoryGroup::new();
        let mut labels = MemoryGroup::new();
        let outcome = t.render_visible(&view(16, &[LINES, LABELS]), &mut lines, &mut labels);
        assert_eq!(outcome, RenderOutcome::Cleared);
        assert!(lines.is_empty() && labels.is_empty());
    }

    #[test]
    fn zooming_out_clears_output() {
        let t = trigger(DatasetHolder::loaded(sections()));
        let mut lines = MemoryGroup::new();
        let mut labels = MemoryGroup::new();
        t.render_visible(&view(14, &[LINES, LABELS]), &mut lines, &mut labels);
        let outcome = t.handle(
            &MapEvent::ZoomEnd,
            &view(10, &[LINES, LABELS]),
            &mut lines,
            &mut labels,
        );
        assert_eq!(outcome, Some(RenderOutcome::Cleared));
        assert!(lines.is_empty() && labels.is_empty());
    }
}
