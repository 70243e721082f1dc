use layers::layer::LayerId;

/// Map-view notifications the viewer reacts to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MapEvent {
    /// Pan finished.
    MoveEnd,
    /// Zoom animation finished.
    ZoomEnd,
    /// An overlay was switched on.
    LayerAdd(LayerId),
    /// An overlay was switched off.
    LayerRemove(LayerId),
    /// A dataset finished loading.
    DatasetLoaded,
}

/// FIFO of pending map events, drained by the event handler.
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<MapEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: MapEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[MapEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, MapEvent};
    use layers::layer::LayerId;

    #[test]
    fn keeps_emission_order() {
        let mut bus = EventBus::new();
        bus.emit(MapEvent::MoveEnd);
        bus.emit(MapEvent::LayerAdd(LayerId(2)));
        assert_eq!(
            bus.events(),
            &[MapEvent::MoveEnd, MapEvent::LayerAdd(LayerId(2))]
        );
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.emit(MapEvent::ZoomEnd);
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.events().is_empty());
    }
}
