use std::cell::{Cell, Ref, RefCell};

use formats::geojson::FeatureCollection;
use formats::pond::{PondAttributes, PondId, PondRecord, parse_pond_index};
use futures_util::future::join;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::source::{DatasetSource, LoadError};

/// Layout of the pond survey files under the data root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PondPaths {
    pub index: String,
    pub attributes_dir: String,
    pub geojson_dir: String,
}

impl Default for PondPaths {
    fn default() -> Self {
        Self {
            index: "data/pond_index.json".to_string(),
            attributes_dir: "data/attributes".to_string(),
            geojson_dir: "data/geojson".to_string(),
        }
    }
}

impl PondPaths {
    pub fn attributes(&self, id: &PondId) -> String {
        format!("{}/{id}.json", self.attributes_dir.trim_end_matches('/'))
    }

    pub fn geojson(&self, id: &PondId) -> String {
        format!("{}/{id}.geojson", self.geojson_dir.trim_end_matches('/'))
    }
}

/// Pond survey records, loaded once.
///
/// A pond whose attribute or outline file is missing or malformed is logged
/// and skipped; the rest still load.
#[derive(Debug, Default)]
pub struct PondCatalog {
    started: Cell<bool>,
    records: RefCell<Vec<PondRecord>>,
}

impl PondCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Ref<'_, Vec<PondRecord>> {
        self.records.borrow()
    }

    /// Loads every pond in the index, in index order. Returns how many
    /// ponds were loaded by this call (0 if a load already started).
    pub async fn load<S: DatasetSource>(&self, source: &S, paths: &PondPaths) -> usize {
        if self.started.replace(true) {
            return 0;
        }

        let ids = match load_index(source, &paths.index).await {
            Ok(ids) => ids,
            Err(err) => {
                error!(error = %err, "pond index not loaded");
                return 0;
            }
        };

        let mut loaded = 0;
        for id in ids {
            match load_pond(source, paths, &id).await {
                Ok(record) => {
                    self.records.borrow_mut().push(record);
                    loaded += 1;
                }
                Err(err) => warn!(pond = %id, error = %err, "failed to load pond"),
            }
        }
        info!(ponds = loaded, "pond catalog loaded");
        loaded
    }
}

async fn load_index<S: DatasetSource>(source: &S, location: &str) -> Result<Vec<PondId>, LoadError> {
    let payload = source.fetch(location).await?;
    parse_pond_index(&payload).map_err(|e| LoadError::Decode {
        location: location.to_string(),
        reason: e.to_string(),
    })
}

async fn load_pond<S: DatasetSource>(
    source: &S,
    paths: &PondPaths,
    id: &PondId,
) -> Result<PondRecord, LoadError> {
    let attributes_location = paths.attributes(id);
    let geojson_location = paths.geojson(id);
    let (attributes, outline) = join(
        source.fetch(&attributes_location),
        source.fetch(&geojson_location),
    )
    .await;

    let attributes = PondAttributes::from_json_str(&attributes?).map_err(|e| {
        LoadError::Decode {
            location: attributes_location.clone(),
            reason: e.to_string(),
        }
    })?;
    let outline = FeatureCollection::from_geojson_str(&outline?).map_err(|e| {
        LoadError::Decode {
            location: geojson_location.clone(),
            reason: e.to_string(),
        }
    })?;

    Ok(PondRecord {
        attributes,
        outline,
    })
}
