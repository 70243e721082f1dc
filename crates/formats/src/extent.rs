use foundation::bounds::{LatLng, LatLngBounds};

use crate::geojson::{Coordinates, Geometry};

/// Bounding box of a geometry in `(lat, lng)` terms.
///
/// Walks the coordinate tree directly; runs once per feature on every
/// viewport change, so it must stay allocation-free.
///
/// Returns `None` when the geometry is absent, its coordinate tree holds no
/// positions, or every position is non-finite.
pub fn compute_bounds(geometry: Option<&Geometry>) -> Option<LatLngBounds> {
    let geometry = geometry?;
    let mut acc: Option<LatLngBounds> = None;
    fold_coordinates(&geometry.coordinates, &mut acc);
    acc
}

pub fn coordinates_bounds(coordinates: &Coordinates) -> Option<LatLngBounds> {
    let mut acc = None;
    fold_coordinates(coordinates, &mut acc);
    acc
}

fn fold_coordinates(coordinates: &Coordinates, acc: &mut Option<LatLngBounds>) {
    match coordinates {
        Coordinates::Point(pair) => {
            let p = LatLng::from_lng_lat(*pair);
            if !p.is_finite() {
                return;
            }
            match acc {
                Some(b) => b.extend(p),
                None => *acc = Some(LatLngBounds::from_point(p)),
            }
        }
        Coordinates::List(items) => {
            for item in items {
                fold_coordinates(item, acc);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_bounds, coordinates_bounds};
    use crate::geojson::{Coordinates, Geometry, GeometryKind};
    use foundation::bounds::LatLngBounds;
    use pretty_assertions::assert_eq;

    fn ring(points: &[[f64; 2]]) -> Coordinates {
        Coordinates::List(points.iter().copied().map(Coordinates::Point).collect())
    }

    #[test]
    fn polygon_bounds_match_extremes_with_axes_swapped() {
        let geom = Geometry {
            kind: GeometryKind::Polygon,
            coordinates: Coordinates::List(vec![ring(&[
                [-97.50, 35.10],
                [-97.40, 35.10],
                [-97.40, 35.25],
                [-97.55, 35.20],
                [-97.50, 35.10],
            ])]),
        };
        let b = compute_bounds(Some(&geom)).expect("bounds");
        assert_eq!(b, LatLngBounds::new(35.10, -97.55, 35.25, -97.40));
    }

    #[test]
    fn multipolygon_covers_every_part() {
        let geom = Geometry {
            kind: GeometryKind::MultiPolygon,
            coordinates: Coordinates::List(vec![
                Coordinates::List(vec![ring(&[[-98.0, 34.0], [-97.9, 34.1], [-98.0, 34.1]])]),
                Coordinates::List(vec![ring(&[[-96.0, 36.0], [-95.5, 36.5], [-96.0, 36.5]])]),
            ]),
        };
        let b = compute_bounds(Some(&geom)).expect("bounds");
        assert_eq!(b, LatLngBounds::new(34.0, -98.0, 36.5, -95.5));
    }

    #[test]
    fn missing_or_empty_geometry_has_no_bounds() {
        assert_eq!(compute_bounds(None), None);

        let empty = Geometry {
            kind: GeometryKind::Polygon,
            coordinates: Coordinates::List(Vec::new()),
        };
        assert_eq!(compute_bounds(Some(&empty)), None);

        let hollow = Coordinates::List(vec![Coordinates::List(Vec::new())]);
        assert_eq!(coordinates_bounds(&hollow), None);
    }

    #[test]
    fn tolerates_arbitrary_depth_and_skips_non_finite() {
        let deep = Coordinates::List(vec![Coordinates::List(vec![Coordinates::List(vec![
            Coordinates::List(vec![
                Coordinates::Point([1.0, 2.0]),
                Coordinates::Point([f64::NAN, 9.0]),
            ]),
        ])])]);
        assert_eq!(
            coordinates_bounds(&deep),
            Some(LatLngBounds::new(2.0, 1.0, 2.0, 1.0))
        );

        assert_eq!(
            coordinates_bounds(&Coordinates::Point([3.0, 4.0])),
            Some(LatLngBounds::new(4.0, 3.0, 4.0, 3.0))
        );
    }
}
