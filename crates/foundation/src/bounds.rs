use serde::{Deserialize, Serialize};

/// Geographic position in degrees.
///
/// GeoJSON encodes positions as `[lng, lat]`; everything in this workspace
/// that is consumed by the map view is expressed as `(lat, lng)`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a position from a GeoJSON `[lng, lat]` pair.
    pub const fn from_lng_lat(pair: [f64; 2]) -> Self {
        Self {
            lat: pair[1],
            lng: pair[0],
        }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Axis-aligned lat/lng rectangle.
///
/// Convention:
/// - `south <= north` and `west <= east` for every box built through
///   `from_point`/`extend`.
/// - Edges are inclusive: boxes that only touch still intersect.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl LatLngBounds {
    pub const fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    pub const fn from_point(p: LatLng) -> Self {
        Self::new(p.lat, p.lng, p.lat, p.lng)
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south = self.south.min(p.lat);
        self.west = self.west.min(p.lng);
        self.north = self.north.max(p.lat);
        self.east = self.east.max(p.lng);
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) * 0.5,
            (self.west + self.east) * 0.5,
        )
    }

    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south && p.lat <= self.north && p.lng >= self.west && p.lng <= self.east
    }

    pub fn intersects(&self, other: &LatLngBounds) -> bool {
        let lat_overlap = other.north >= self.south && other.south <= self.north;
        let lng_overlap = other.east >= self.west && other.west <= self.east;
        lat_overlap && lng_overlap
    }
}

#[cfg(test)]
mod tests {
    use super::{LatLng, LatLngBounds};
    use pretty_assertions::assert_eq;

    #[test]
    fn extend_grows_to_cover_points() {
        let mut b = LatLngBounds::from_point(LatLng::new(35.0, -98.0));
        b.extend(LatLng::new(34.5, -97.0));
        b.extend(LatLng::new(35.2, -98.4));
        assert_eq!(b, LatLngBounds::new(34.5, -98.4, 35.2, -97.0));
    }

    #[test]
    fn from_lng_lat_swaps_axes() {
        assert_eq!(
            LatLng::from_lng_lat([-97.5, 35.25]),
            LatLng::new(35.25, -97.5)
        );
    }

    #[test]
    fn intersects_overlapping_and_touching() {
        let a = LatLngBounds::new(0.0, 0.0, 1.0, 1.0);
        assert!(a.intersects(&LatLngBounds::new(0.5, 0.5, 2.0, 2.0)));
        assert!(a.intersects(&LatLngBounds::new(1.0, 1.0, 2.0, 2.0)));
        assert!(!a.intersects(&LatLngBounds::new(1.1, 0.0, 2.0, 1.0)));
        assert!(!a.intersects(&LatLngBounds::new(0.0, -2.0, 1.0, -0.1)));
    }

    #[test]
    fn center_is_midpoint() {
        let b = LatLngBounds::new(34.0, -99.0, 36.0, -97.0);
        assert_eq!(b.center(), LatLng::new(35.0, -98.0));
        assert!(b.contains(b.center()));
    }
}
