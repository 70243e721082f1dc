use std::cell::RefCell;
use std::rc::Rc;

use formats::geojson::FeatureCollection;
use tracing::{info, warn};

use crate::source::{DatasetSource, LoadError};

/// Lifecycle of a once-loaded dataset.
///
/// Unloaded → Loading → Loaded | Failed. `Failed` is terminal and reads as
/// "unset" to consumers; there is no automatic retry.
#[derive(Debug, Clone, Default)]
pub enum DatasetState {
    #[default]
    Unloaded,
    Loading,
    Loaded(Rc<FeatureCollection>),
    Failed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoadAttempt {
    Loaded { features: usize },
    Failed,
    /// An earlier call already started (or finished) the load.
    AlreadyStarted,
}

/// Single-assignment holder for a dataset fetched at most once.
///
/// Single-threaded by construction: share it via `Rc` between the loader
/// task and the render trigger.
#[derive(Debug, Default)]
pub struct DatasetHolder {
    state: RefCell<DatasetState>,
}

impl DatasetHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holder that starts out loaded.
    pub fn loaded(dataset: FeatureCollection) -> Self {
        Self {
            state: RefCell::new(DatasetState::Loaded(Rc::new(dataset))),
        }
    }

    pub fn state(&self) -> DatasetState {
        self.state.borrow().clone()
    }

    /// The dataset, if loaded. Cheap: clones the `Rc`.
    pub fn get(&self) -> Option<Rc<FeatureCollection>> {
        match &*self.state.borrow() {
            DatasetState::Loaded(fc) => Some(Rc::clone(fc)),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(&*self.state.borrow(), DatasetState::Loaded(_))
    }

    /// Fetches and decodes `location` once.
    ///
    /// Calls made while a load is in flight, or after it finished, return
    /// `AlreadyStarted` without touching the source.
    pub async fn load<S: DatasetSource>(&self, source: &S, location: &str) -> LoadAttempt {
        {
            let mut state = self.state.borrow_mut();
            if !matches!(*state, DatasetState::Unloaded) {
                return LoadAttempt::AlreadyStarted;
            }
            *state = DatasetState::Loading;
        }

        match fetch_collection(source, location).await {
            Ok(fc) => {
                let features = fc.len();
                info!(location, features, "dataset loaded");
                *self.state.borrow_mut() = DatasetState::Loaded(Rc::new(fc));
                LoadAttempt::Loaded { features }
            }
            Err(err) => {
                warn!(location, error = %err, "dataset not loaded");
                *self.state.borrow_mut() = DatasetState::Failed;
                LoadAttempt::Failed
            }
        }
    }
}

pub async fn fetch_collection<S: DatasetSource>(
    source: &S,
    location: &str,
) -> Result<FeatureCollection, LoadError> {
    let payload = source.fetch(location).await?;
    FeatureCollection::from_geojson_str(&payload).map_err(|e| LoadError::Decode {
        location: location.to_string(),
        reason: e.to_string(),
    })
}
