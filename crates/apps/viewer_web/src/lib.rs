use console_error_panic_hook::set_once;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use foundation::bounds::LatLngBounds;
use runtime::event_bus::MapEvent;
use serde::Serialize;
use streaming::dataset::{DatasetHolder, LoadAttempt};
use tracing::{Level, debug, info, warn};

mod console;
mod source;
pub mod viewer;

use source::BrowserSource;
use viewer::{Viewer, ViewerConfig, overlay_id};

thread_local! {
    static VIEWER: RefCell<Viewer> = RefCell::new(Viewer::default());
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    console::init_logging(Level::INFO);
    Ok(())
}

/// Replaces the viewer with one built from `config` (a plain JS object;
/// missing keys keep their defaults). Call before `load_datasets`.
#[wasm_bindgen]
pub fn configure(config: JsValue) -> Result<(), JsValue> {
    let config: ViewerConfig = if config.is_undefined() || config.is_null() {
        ViewerConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)?
    };
    info!(base_url = %config.base_url, "viewer configured");
    VIEWER.with(|v| *v.borrow_mut() = Viewer::new(config));
    Ok(())
}

/// Starts every dataset fetch. `on_update` is called with the dataset name
/// ("plss_sections", "plss_townships", "counties", "ponds") once that
/// dataset is ready to draw.
#[wasm_bindgen]
pub fn load_datasets(on_update: Option<js_sys::Function>) {
    let (config, sections, counties, townships, ponds) = VIEWER.with(|v| {
        let v = v.borrow();
        (
            v.config().clone(),
            v.sections_dataset(),
            v.counties_dataset(),
            v.townships_dataset(),
            v.ponds(),
        )
    });
    let source = BrowserSource::new(config.base_url.clone());

    for (name, holder, location) in [
        ("plss_sections", sections, config.sections_url.clone()),
        ("counties", counties, config.counties_url.clone()),
        ("plss_townships", townships, config.townships_url.clone()),
    ] {
        let source = source.clone();
        let on_update = on_update.clone();
        spawn_local(async move {
            load_dataset(&source, &holder, &location, name, on_update.as_ref()).await;
        });
    }

    spawn_local(async move {
        if ponds.load(&source, &config.ponds).await > 0 {
            notify_page(on_update.as_ref(), "ponds");
        }
    });
}

async fn load_dataset(
    source: &BrowserSource,
    holder: &Rc<DatasetHolder>,
    location: &str,
    name: &str,
    on_update: Option<&js_sys::Function>,
) {
    if !matches!(holder.load(source, location).await, LoadAttempt::Loaded { .. }) {
        return;
    }
    let passes = VIEWER.with(|v| v.borrow_mut().notify(MapEvent::DatasetLoaded));
    debug!(dataset = name, passes, "dataset ready");
    notify_page(on_update, name);
}

fn notify_page(on_update: Option<&js_sys::Function>, name: &str) {
    let Some(callback) = on_update else {
        return;
    };
    if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(name)) {
        warn!(dataset = name, error = ?err, "update callback threw");
    }
}

/// Leaflet zoom can be fractional; thresholds compare against whole levels.
fn zoom_level(zoom: f64) -> u8 {
    if zoom.is_finite() {
        zoom.floor().clamp(0.0, f64::from(u8::MAX)) as u8
    } else {
        0
    }
}

fn bounds(south: f64, west: f64, north: f64, east: f64) -> LatLngBounds {
    LatLngBounds::new(south, west, north, east)
}

#[wasm_bindgen]
pub fn set_viewport(south: f64, west: f64, north: f64, east: f64, zoom: f64) {
    VIEWER.with(|v| {
        v.borrow_mut()
            .set_viewport(bounds(south, west, north, east), zoom_level(zoom))
    });
}

#[wasm_bindgen]
pub fn on_move_end(south: f64, west: f64, north: f64, east: f64, zoom: f64) -> usize {
    set_viewport(south, west, north, east, zoom);
    VIEWER.with(|v| v.borrow_mut().notify(MapEvent::MoveEnd))
}

#[wasm_bindgen]
pub fn on_zoom_end(south: f64, west: f64, north: f64, east: f64, zoom: f64) -> usize {
    set_viewport(south, west, north, east, zoom);
    VIEWER.with(|v| v.borrow_mut().notify(MapEvent::ZoomEnd))
}

#[wasm_bindgen]
pub fn on_layer_add(name: &str) -> usize {
    toggle_layer(name, true)
}

#[wasm_bindgen]
pub fn on_layer_remove(name: &str) -> usize {
    toggle_layer(name, false)
}

fn toggle_layer(name: &str, visible: bool) -> usize {
    let Some(id) = overlay_id(name) else {
        debug!(overlay = name, "unknown overlay toggled");
        return 0;
    };
    let event = if visible {
        MapEvent::LayerAdd(id)
    } else {
        MapEvent::LayerRemove(id)
    };
    VIEWER.with(|v| v.borrow_mut().notify(event))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

/// `{ style, lines: FeatureCollection, labels: [{ feature_index, anchor, text }] }`
#[wasm_bindgen]
pub fn sections_snapshot() -> Result<JsValue, JsValue> {
    VIEWER.with(|v| to_js(&v.borrow().sections_snapshot()))
}

/// Same shape as `sections_snapshot`; `undefined` for non-static overlays.
#[wasm_bindgen]
pub fn overlay_snapshot(name: &str) -> Result<JsValue, JsValue> {
    let Some(id) = overlay_id(name) else {
        return Ok(JsValue::UNDEFINED);
    };
    VIEWER.with(|v| match v.borrow().overlay_snapshot(id) {
        Some(snapshot) => to_js(&snapshot),
        None => Ok(JsValue::UNDEFINED),
    })
}

#[wasm_bindgen]
pub fn ponds() -> Result<JsValue, JsValue> {
    VIEWER.with(|v| to_js(&v.borrow().pond_views()))
}
