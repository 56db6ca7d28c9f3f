//! # Geometry Canonicalization
//!
//! Normalizes the geometry of a GeoJSON-like document in place:
//!
//! 1. every coordinate is reduced to a fixed number of decimal digits
//!    (see [`crate::precision`]);
//! 2. polygon rings are rewound so that outer rings and holes run in
//!    opposite, fixed directions.
//!
//! Only the numbers and the direction of a ring change. Ring membership,
//! the starting point of a ring (up to reversal), properties and feature
//! identity are left alone. Precision is reduced before the winding is
//! measured, so a second pass sees the same signed areas as the first and
//! changes nothing.

use geo::algorithm::winding_order::WindingOrder;
use geo::{Coord, LineString, Winding as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CanonicalizationError;
use crate::precision::reduce_number;

/// Number of decimal digits kept in canonical coordinates.
pub const DEFAULT_PRECISION: u32 = 5;

/// Ring orientation convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winding {
    /// RFC 7946 §3.1.6: exterior rings counter-clockwise, holes clockwise.
    #[default]
    Rfc7946,
    /// Exterior rings clockwise, holes counter-clockwise.
    Clockwise,
}

impl Winding {
    fn exterior(self) -> WindingOrder {
        match self {
            Winding::Rfc7946 => WindingOrder::CounterClockwise,
            Winding::Clockwise => WindingOrder::Clockwise,
        }
    }

    fn interior(self) -> WindingOrder {
        match self.exterior() {
            WindingOrder::Clockwise => WindingOrder::CounterClockwise,
            WindingOrder::CounterClockwise => WindingOrder::Clockwise,
        }
    }
}

/// Canonicalizes geometry embedded in feature documents.
#[derive(Debug, Clone, Copy)]
pub struct GeometryCanonicalizer {
    precision: u32,
    winding: Winding,
}

impl Default for GeometryCanonicalizer {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION, Winding::default())
    }
}

impl GeometryCanonicalizer {
    /// Create a canonicalizer keeping `precision` decimal digits.
    pub fn new(precision: u32, winding: Winding) -> Self {
        Self { precision, winding }
    }

    /// Decimal digits kept in coordinates.
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Ring orientation convention applied to polygons.
    pub fn winding(&self) -> Winding {
        self.winding
    }

    /// Canonicalize every geometry reachable from a document.
    ///
    /// Accepts a `Feature`, a `FeatureCollection`, a `GeometryCollection`
    /// or a bare geometry. Objects of any other `type` are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError` if a geometry's coordinates do not
    /// have the nesting its type requires or contain non-numbers.
    pub fn canonicalize_document(&self, document: &mut Value) -> Result<(), CanonicalizationError> {
        match document.get("type").and_then(Value::as_str) {
            Some("Feature") => match document.get_mut("geometry") {
                Some(geometry) => self.canonicalize_geometry(geometry),
                None => Ok(()),
            },
            Some("FeatureCollection") => {
                if let Some(Value::Array(features)) = document.get_mut("features") {
                    for feature in features {
                        self.canonicalize_document(feature)?;
                    }
                }
                Ok(())
            }
            _ => self.canonicalize_geometry(document),
        }
    }

    /// Canonicalize a single geometry object. `null` is accepted as the
    /// empty geometry.
    ///
    /// # Errors
    ///
    /// See [`canonicalize_document`](Self::canonicalize_document).
    pub fn canonicalize_geometry(&self, geometry: &mut Value) -> Result<(), CanonicalizationError> {
        if geometry.is_null() {
            return Ok(());
        }
        let geometry_type = geometry
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if geometry_type == "GeometryCollection" {
            if let Some(Value::Array(members)) = geometry.get_mut("geometries") {
                for member in members {
                    self.canonicalize_geometry(member)?;
                }
            }
            return Ok(());
        }

        let Some(coordinates) = geometry.get_mut("coordinates") else {
            return Ok(());
        };

        // Nesting depth below `coordinates` at which positions live.
        let depth = match geometry_type.as_str() {
            "Point" => 0,
            "MultiPoint" | "LineString" => 1,
            "MultiLineString" | "Polygon" => 2,
            "MultiPolygon" => 3,
            _ => return Ok(()),
        };
        self.reduce_positions(coordinates, depth, &geometry_type, "coordinates")?;

        match geometry_type.as_str() {
            "Polygon" => self.rewind_polygon(coordinates, &geometry_type),
            "MultiPolygon" => {
                let polygons = as_array_mut(coordinates, &geometry_type)?;
                for polygon in polygons {
                    self.rewind_polygon(polygon, &geometry_type)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn reduce_positions(
        &self,
        value: &mut Value,
        depth: usize,
        geometry_type: &str,
        location: &str,
    ) -> Result<(), CanonicalizationError> {
        let items = as_array_mut(value, geometry_type)?;
        if depth == 0 {
            for (i, ordinate) in items.iter_mut().enumerate() {
                match ordinate {
                    Value::Number(n) => *n = reduce_number(n, self.precision)?,
                    _ => {
                        return Err(CanonicalizationError::NonNumericCoordinate {
                            location: format!("{location}.{i}"),
                        })
                    }
                }
            }
            return Ok(());
        }
        for (i, child) in items.iter_mut().enumerate() {
            self.reduce_positions(child, depth - 1, geometry_type, &format!("{location}.{i}"))?;
        }
        Ok(())
    }

    /// Rewind the rings of one polygon: ring 0 is the exterior, the rest
    /// are holes.
    fn rewind_polygon(&self, rings: &mut Value, geometry_type: &str) -> Result<(), CanonicalizationError> {
        let rings = as_array_mut(rings, geometry_type)?;
        for (i, ring) in rings.iter_mut().enumerate() {
            let wanted = if i == 0 {
                self.winding.exterior()
            } else {
                self.winding.interior()
            };
            let positions = as_array_mut(ring, geometry_type)?;
            if let Some(current) = ring_winding(positions) {
                if current != wanted {
                    positions.reverse();
                }
            }
        }
        Ok(())
    }
}

/// Winding of a ring, or `None` for rings without area.
fn ring_winding(positions: &[Value]) -> Option<WindingOrder> {
    let coords: Vec<Coord<f64>> = positions
        .iter()
        .filter_map(|p| {
            let x = p.get(0)?.as_f64()?;
            let y = p.get(1)?.as_f64()?;
            Some(Coord { x, y })
        })
        .collect();
    if coords.len() != positions.len() {
        return None;
    }
    let mut ring = LineString::new(coords);
    ring.close();
    ring.winding_order()
}

fn as_array_mut<'a>(
    value: &'a mut Value,
    geometry_type: &str,
) -> Result<&'a mut Vec<Value>, CanonicalizationError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(CanonicalizationError::MalformedGeometry {
            geometry_type: geometry_type.to_string(),
            reason: format!("expected an array, found {}", json_kind(other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square_cw() -> Value {
        json!([[0, 0], [0, 1], [1, 1], [1, 0], [0, 0]])
    }

    fn square_ccw() -> Value {
        json!([[0, 0], [1, 0], [1, 1], [0, 1], [0, 0]])
    }

    #[test]
    fn reduces_coordinate_precision() {
        let mut doc = json!({
            "type": "Feature",
            "id": "p",
            "properties": {},
            "geometry": {"type": "Point", "coordinates": [12.123456789, 45.987654321]}
        });
        GeometryCanonicalizer::default().canonicalize_document(&mut doc).unwrap();
        assert_eq!(doc["geometry"]["coordinates"], json!([12.12346, 45.98765]));
    }

    #[test]
    fn exterior_ring_becomes_counter_clockwise() {
        let mut geometry = json!({"type": "Polygon", "coordinates": [square_cw()]});
        GeometryCanonicalizer::default().canonicalize_geometry(&mut geometry).unwrap();
        assert_eq!(geometry["coordinates"][0], square_ccw());
    }

    #[test]
    fn holes_wind_opposite_to_exterior() {
        let hole_ccw = json!([[0.25, 0.25], [0.75, 0.25], [0.75, 0.75], [0.25, 0.75], [0.25, 0.25]]);
        let mut geometry = json!({"type": "Polygon", "coordinates": [square_ccw(), hole_ccw.clone()]});
        GeometryCanonicalizer::default().canonicalize_geometry(&mut geometry).unwrap();
        assert_eq!(geometry["coordinates"][0], square_ccw());
        let mut expected_hole = hole_ccw.as_array().unwrap().clone();
        expected_hole.reverse();
        assert_eq!(geometry["coordinates"][1], Value::Array(expected_hole));
    }

    #[test]
    fn clockwise_convention_reverses_exterior() {
        let mut geometry = json!({"type": "MultiPolygon", "coordinates": [[square_ccw()]]});
        GeometryCanonicalizer::new(5, Winding::Clockwise)
            .canonicalize_geometry(&mut geometry)
            .unwrap();
        assert_eq!(geometry["coordinates"][0][0], square_cw());
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let mut doc = json!({
            "type": "Feature",
            "id": "x",
            "properties": {"name": "keep me"},
            "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[10.1234567, 50.0], [10.1234567, 51.0000049], [11.5, 51.0], [11.5, 50.0], [10.1234567, 50.0]]],
                [[[0, 0], [2, 0], [2, 2], [0, 2], [0, 0]], [[0.5, 0.5], [1.5, 0.5], [1.5, 1.5], [0.5, 0.5]]]
            ]}
        });
        let canonicalizer = GeometryCanonicalizer::default();
        canonicalizer.canonicalize_document(&mut doc).unwrap();
        let once = doc.clone();
        canonicalizer.canonicalize_document(&mut doc).unwrap();
        assert_eq!(doc, once);
        assert_eq!(doc["properties"]["name"], "keep me");
    }

    #[test]
    fn null_geometry_is_accepted() {
        let mut doc = json!({"type": "Feature", "id": "world", "properties": {}, "geometry": null});
        GeometryCanonicalizer::default().canonicalize_document(&mut doc).unwrap();
        assert!(doc["geometry"].is_null());
    }

    #[test]
    fn single_feature_collection_members_are_canonicalized() {
        let mut doc = json!({"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {}, "geometry": {"type": "Polygon", "coordinates": [square_cw()]}}
        ]});
        GeometryCanonicalizer::default().canonicalize_document(&mut doc).unwrap();
        assert_eq!(doc["features"][0]["geometry"]["coordinates"][0], square_ccw());
    }

    #[test]
    fn non_numeric_coordinate_is_rejected() {
        let mut geometry = json!({"type": "Polygon", "coordinates": [[[0, 0], [0, "1"], [1, 1], [0, 0]]]});
        let err = GeometryCanonicalizer::default()
            .canonicalize_geometry(&mut geometry)
            .unwrap_err();
        match err {
            CanonicalizationError::NonNumericCoordinate { location } => {
                assert_eq!(location, "coordinates.0.1.1")
            }
            other => panic!("expected NonNumericCoordinate, got {other}"),
        }
    }

    #[test]
    fn wrong_nesting_is_malformed() {
        let mut geometry = json!({"type": "Polygon", "coordinates": [0, 0]});
        assert!(matches!(
            GeometryCanonicalizer::default().canonicalize_geometry(&mut geometry),
            Err(CanonicalizationError::MalformedGeometry { .. })
        ));
    }

    #[test]
    fn degenerate_ring_is_left_alone() {
        let line = json!([[0, 0], [1, 1], [2, 2], [0, 0]]);
        let mut geometry = json!({"type": "Polygon", "coordinates": [line.clone()]});
        GeometryCanonicalizer::default().canonicalize_geometry(&mut geometry).unwrap();
        assert_eq!(geometry["coordinates"][0], line);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn ring() -> impl Strategy<Value = Value> {
        prop::collection::vec((-180.0f64..180.0, -90.0f64..90.0), 3..12).prop_map(|points| {
            let mut positions: Vec<Value> = points.iter().map(|(x, y)| json!([x, y])).collect();
            positions.push(positions[0].clone());
            Value::Array(positions)
        })
    }

    proptest! {
        /// canon(canon(x)) == canon(x)
        #[test]
        fn canonicalize_twice_equals_once(rings in prop::collection::vec(ring(), 1..4)) {
            let mut geometry = json!({"type": "Polygon", "coordinates": rings});
            let canonicalizer = GeometryCanonicalizer::default();
            canonicalizer.canonicalize_geometry(&mut geometry).unwrap();
            let once = geometry.clone();
            canonicalizer.canonicalize_geometry(&mut geometry).unwrap();
            prop_assert_eq!(geometry, once);
        }

        /// Rewinding only reverses rings: the multiset of rounded points is unchanged.
        #[test]
        fn ring_membership_is_preserved(r in ring()) {
            let mut expected: Vec<String> = r
                .as_array()
                .unwrap()
                .iter()
                .map(|p| {
                    let x = crate::precision::round_half_away(p[0].as_f64().unwrap(), DEFAULT_PRECISION);
                    let y = crate::precision::round_half_away(p[1].as_f64().unwrap(), DEFAULT_PRECISION);
                    json!([x, y]).to_string()
                })
                .collect();
            let mut geometry = json!({"type": "Polygon", "coordinates": [r]});
            GeometryCanonicalizer::default().canonicalize_geometry(&mut geometry).unwrap();
            let mut actual: Vec<String> = geometry["coordinates"][0]
                .as_array()
                .unwrap()
                .iter()
                .map(Value::to_string)
                .collect();
            expected.sort();
            actual.sort();
            prop_assert_eq!(expected, actual);
        }
    }
}
