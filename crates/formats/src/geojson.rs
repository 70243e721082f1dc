use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// GeoJSON position tree.
///
/// Polygon and MultiPolygon differ only in nesting depth, so both decode into
/// the same recursive shape: a leaf `[lng, lat]` pair or a list of subtrees.
#[derive(Debug, Clone, PartialEq)]
pub enum Coordinates {
    Point([f64; 2]),
    List(Vec<Coordinates>),
}

impl Coordinates {
    pub fn is_empty(&self) -> bool {
        match self {
            Coordinates::Point(_) => false,
            Coordinates::List(items) => items.is_empty(),
        }
    }

    pub fn to_geojson_value(&self) -> Value {
        match self {
            Coordinates::Point([lng, lat]) => Value::Array(vec![Value::from(*lng), Value::from(*lat)]),
            Coordinates::List(items) => {
                Value::Array(items.iter().map(Coordinates::to_geojson_value).collect())
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
}

impl GeometryKind {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "Point" => Some(GeometryKind::Point),
            "MultiPoint" => Some(GeometryKind::MultiPoint),
            "LineString" => Some(GeometryKind::LineString),
            "MultiLineString" => Some(GeometryKind::MultiLineString),
            "Polygon" => Some(GeometryKind::Polygon),
            "MultiPolygon" => Some(GeometryKind::MultiPolygon),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::LineString => "LineString",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPolygon => "MultiPolygon",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub kind: GeometryKind,
    pub coordinates: Coordinates,
}

impl Geometry {
    pub fn to_geojson_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), Value::String(self.kind.as_str().to_string()));
        obj.insert("coordinates".to_string(), self.coordinates.to_geojson_value());
        Value::Object(obj)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    /// `None` for a null geometry or one that failed to decode.
    pub geometry: Option<Geometry>,
}

impl Feature {
    /// Display text of a primitive property value.
    ///
    /// Strings are trimmed; integral numbers render without a fraction.
    /// Empty strings, nulls, arrays and objects yield `None`.
    pub fn property_text(&self, key: &str) -> Option<String> {
        let text = match self.properties.get(key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => number_text(n),
            Value::Bool(b) => b.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    /// First non-empty `property_text` among `keys`, in order.
    pub fn first_property_text<S: AsRef<str>>(&self, keys: &[S]) -> Option<String> {
        keys.iter().find_map(|k| self.property_text(k.as_ref()))
    }

    pub fn to_geojson_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), Value::String("Feature".to_string()));
        if let Some(id) = &self.id {
            obj.insert("id".to_string(), Value::String(id.clone()));
        }
        obj.insert(
            "properties".to_string(),
            Value::Object(self.properties.clone()),
        );
        obj.insert(
            "geometry".to_string(),
            self.geometry
                .as_ref()
                .map_or(Value::Null, Geometry::to_geojson_value),
        );
        Value::Object(obj)
    }
}

/// Wraps `features` into a GeoJSON FeatureCollection value.
pub fn features_to_geojson<'a, I>(features: I) -> Value
where
    I: IntoIterator<Item = &'a Feature>,
{
    let mut root = Map::new();
    root.insert(
        "type".to_string(),
        Value::String("FeatureCollection".to_string()),
    );
    root.insert(
        "features".to_string(),
        Value::Array(features.into_iter().map(Feature::to_geojson_value).collect()),
    );
    Value::Object(root)
}

fn number_text(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug, Error)]
pub enum GeoJsonError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected GeoJSON FeatureCollection")]
    NotAFeatureCollection,
    #[error("invalid feature at index {index}: {reason}")]
    InvalidFeature { index: usize, reason: String },
}

impl FeatureCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn from_geojson_str(payload: &str) -> Result<Self, GeoJsonError> {
        let value: Value = serde_json::from_str(payload)?;
        Self::from_geojson_value(&value)
    }

    /// Decodes a FeatureCollection.
    ///
    /// Structural problems (not a collection, feature not an object) are
    /// errors. A feature whose geometry cannot be decoded is kept with
    /// `geometry: None` so that it simply never matches a bounds filter.
    pub fn from_geojson_value(value: &Value) -> Result<Self, GeoJsonError> {
        let obj = value
            .as_object()
            .ok_or(GeoJsonError::NotAFeatureCollection)?;
        if obj.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
            return Err(GeoJsonError::NotAFeatureCollection);
        }
        let features_val = obj
            .get("features")
            .and_then(Value::as_array)
            .ok_or(GeoJsonError::NotAFeatureCollection)?;

        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            features.push(parse_feature(index, feat_val)?);
        }
        Ok(Self { features })
    }
}

fn parse_feature(index: usize, value: &Value) -> Result<Feature, GeoJsonError> {
    let obj = value.as_object().ok_or(GeoJsonError::InvalidFeature {
        index,
        reason: "feature must be an object".to_string(),
    })?;

    let id = match obj.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    let properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let geometry = match obj.get("geometry") {
        None | Some(Value::Null) => None,
        Some(g) => match parse_geometry(g) {
            Ok(geom) => Some(geom),
            Err(reason) => {
                debug!(index, %reason, "dropping undecodable geometry");
                None
            }
        },
    };

    Ok(Feature {
        id,
        properties,
        geometry,
    })
}

pub fn parse_geometry(value: &Value) -> Result<Geometry, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or("geometry missing type".to_string())?;
    let kind =
        GeometryKind::parse(ty).ok_or_else(|| format!("unsupported geometry type: {ty}"))?;
    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())?;

    Ok(Geometry {
        kind,
        coordinates: parse_coordinates(coords)?,
    })
}

fn parse_coordinates(value: &Value) -> Result<Coordinates, String> {
    let arr = value
        .as_array()
        .ok_or("coordinates must be an array".to_string())?;

    match arr.first() {
        Some(Value::Number(_)) => {
            if arr.len() < 2 {
                return Err("position must have [lng, lat]".to_string());
            }
            let lng = arr[0].as_f64().ok_or("lng must be a number".to_string())?;
            let lat = arr[1].as_f64().ok_or("lat must be a number".to_string())?;
            Ok(Coordinates::Point([lng, lat]))
        }
        _ => {
            let mut out = Vec::with_capacity(arr.len());
            for item in arr {
                out.push(parse_coordinates(item)?);
            }
            Ok(Coordinates::List(out))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Coordinates, FeatureCollection, GeoJsonError, GeometryKind, features_to_geojson};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_polygon_and_multipolygon() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "FRSTDIVNO": "12" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[-97.0, 35.0], [-96.9, 35.0], [-96.9, 35.1], [-97.0, 35.0]]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "SEC": 7 },
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [[[[-98.0, 34.0], [-97.9, 34.0], [-97.9, 34.1]]]]
                    }
                }
            ]
        });

        let fc = FeatureCollection::from_geojson_value(&value).expect("parse");
        assert_eq!(fc.len(), 2);

        let g0 = fc.features[0].geometry.as_ref().expect("geometry");
        assert_eq!(g0.kind, GeometryKind::Polygon);
        let Coordinates::List(rings) = &g0.coordinates else {
            panic!("expected rings");
        };
        assert_eq!(rings.len(), 1);

        let g1 = fc.features[1].geometry.as_ref().expect("geometry");
        assert_eq!(g1.kind, GeometryKind::MultiPolygon);
        assert_eq!(fc.features[1].property_text("SEC").as_deref(), Some("7"));
    }

    #[test]
    fn malformed_geometry_is_kept_as_none() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": {}, "geometry": null },
                { "type": "Feature", "properties": {}, "geometry": { "type": "Polygon", "coordinates": [[["x", 1.0]]] } },
                { "type": "Feature", "properties": {}, "geometry": { "type": "GeometryCollection", "geometries": [] } }
            ]
        });
        let fc = FeatureCollection::from_geojson_value(&value).expect("parse");
        assert_eq!(fc.len(), 3);
        assert!(fc.features.iter().all(|f| f.geometry.is_none()));
    }

    #[test]
    fn rejects_non_collection() {
        let err = FeatureCollection::from_geojson_str(r#"{"type":"Feature"}"#)
            .expect_err("not a collection");
        assert!(matches!(err, GeoJsonError::NotAFeatureCollection));

        let err = FeatureCollection::from_geojson_str("{").expect_err("bad json");
        assert!(matches!(err, GeoJsonError::Json(_)));
    }

    #[test]
    fn exports_features_back_to_geojson() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "SEC": "4" },
                    "geometry": { "type": "Polygon", "coordinates": [[[-97.0, 35.0], [-96.9, 35.0], [-96.9, 35.1], [-97.0, 35.0]]] }
                }
            ]
        });
        let fc = FeatureCollection::from_geojson_value(&value).expect("parse");
        assert_eq!(features_to_geojson(&fc.features), value);
    }

    #[test]
    fn first_property_text_skips_empty_candidates() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "FRSTDIVNO": "  ", "SEC": 3.0 }, "geometry": null },
                { "type": "Feature", "properties": { "FRSTDIVNO": null, "SEC": "" }, "geometry": null }
            ]
        });
        let fc = FeatureCollection::from_geojson_value(&value).expect("parse");
        let keys = ["FRSTDIVNO", "SEC"];
        assert_eq!(fc.features[0].first_property_text(&keys).as_deref(), Some("3"));
        assert_eq!(fc.features[1].first_property_text(&keys), None);
    }
}
