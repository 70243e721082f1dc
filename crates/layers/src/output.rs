use foundation::bounds::LatLng;
use serde::Serialize;
use thiserror::Error;

use crate::symbology::LineStyle;

/// Request to draw the outline of one dataset feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineElement {
    /// Index into the source collection.
    pub feature_index: usize,
    pub style: LineStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelElement {
    pub feature_index: usize,
    pub anchor: LatLng,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("element group is full (capacity {capacity})")]
    Full { capacity: usize },
}

/// A clearable collection of rendered elements owned by the map view
/// (a Leaflet layer group on the web).
pub trait ElementGroup<E> {
    fn clear(&mut self);
    fn add(&mut self, element: E) -> Result<(), EmitError>;
}

/// In-memory element group; snapshots are read back by the view adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryGroup<E> {
    elements: Vec<E>,
    capacity: Option<usize>,
    clears: u64,
}

impl<E> Default for MemoryGroup<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> MemoryGroup<E> {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            capacity: None,
            clears: 0,
        }
    }

    /// Group that rejects elements beyond `capacity`.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new()
        }
    }

    pub fn elements(&self) -> &[E] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of times `clear` has been called.
    pub fn clear_count(&self) -> u64 {
        self.clears
    }
}

impl<E> ElementGroup<E> for MemoryGroup<E> {
    fn clear(&mut self) {
        self.elements.clear();
        self.clears += 1;
    }

    fn add(&mut self, element: E) -> Result<(), EmitError> {
        if let Some(capacity) = self.capacity
            && self.elements.len() >= capacity
        {
            return Err(EmitError::Full { capacity });
        }
        self.elements.push(element);
        Ok(())
    }
}
