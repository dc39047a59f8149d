use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Number, Value as JsonValue};
use crate::{
    error::Result,
    types::{FrameResult, HazardZone},
};

fn position([x, y]: [f32; 2]) -> Vec<f64> {
    vec![x as f64, y as f64]
}

/// Closed ring in GeoJSON order (first vertex repeated at the end)
fn ring(points: &[[f32; 2]]) -> Vec<Vec<f64>> {
    let mut ring: Vec<Vec<f64>> = points.iter().copied().map(position).collect();
    if let Some(first) = ring.first().cloned() {
        ring.push(first);
    }
    ring
}

fn number(value: f32) -> JsonValue {
    Number::from_f64(value as f64)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

fn feature(id: &str, geometry: Value, properties: Map<String, JsonValue>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geometry)),
        id: Some(geojson::feature::Id::String(id.to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Hull geometry as the richest GeoJSON type its vertex count allows
fn hull_geometry(points: &[[f32; 2]]) -> Option<Value> {
    match points {
        [] => None,
        [point] => Some(Value::Point(position(*point))),
        [a, b] => Some(Value::LineString(vec![position(*a), position(*b)])),
        _ => Some(Value::Polygon(vec![ring(points)])),
    }
}

impl HazardZone {
    pub fn to_geojson_feature(&self) -> Feature {
        let mut properties = Map::new();
        properties.insert("kind".to_string(), JsonValue::from("hazard_zone"));
        properties.insert("area".to_string(), number(self.area()));
        feature("hazard_zone", Value::Polygon(vec![ring(&self.vertices())]), properties)
    }
}

impl FrameResult {
    /// Export the frame overlay (zone, hull and closest-point segment) as GeoJSON
    pub fn to_geojson(&self, zone: Option<&HazardZone>) -> Result<FeatureCollection> {
        let mut features = Vec::new();

        if let Some(zone) = zone {
            let mut zone_feature = zone.to_geojson_feature();
            if let Some(properties) = zone_feature.properties.as_mut() {
                properties.insert("level".to_string(), JsonValue::from(<&'static str>::from(self.level)));
            }
            features.push(zone_feature);
        }

        if let Some(hull) = &self.hull {
            if let Some(geometry) = hull_geometry(&hull.points) {
                let mut properties = Map::new();
                properties.insert("kind".to_string(), JsonValue::from("hand_hull"));
                properties.insert("vertex_count".to_string(), JsonValue::from(hull.len()));
                properties.insert("area".to_string(), number(hull.area()));
                features.push(feature("hand_hull", geometry, properties));
            }
        }

        if let (Some(hand), Some(zone_point), Some(distance)) =
            (self.hand_point, self.zone_point, self.distance)
        {
            let mut properties = Map::new();
            properties.insert("kind".to_string(), JsonValue::from("closest_points"));
            properties.insert("distance".to_string(), number(distance));
            features.push(feature(
                "closest_points",
                Value::LineString(vec![position(hand), position(zone_point)]),
                properties,
            ));
        }

        let mut foreign_members = Map::new();
        foreign_members.insert("sequence".to_string(), JsonValue::from(self.sequence));
        foreign_members.insert("status".to_string(), JsonValue::from(<&'static str>::from(self.status)));
        foreign_members.insert("level".to_string(), JsonValue::from(<&'static str>::from(self.level)));
        foreign_members.insert("transitioned".to_string(), JsonValue::Bool(self.transitioned));
        foreign_members.insert(
            "distance".to_string(),
            self.distance.map_or(JsonValue::Null, number),
        );

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        })
    }

    /// Export to GeoJSON and serialize to JSON string
    pub fn to_geojson_string(&self, zone: Option<&HazardZone>) -> Result<String> {
        let geojson = self.to_geojson(zone)?;
        Ok(serde_json::to_string_pretty(&geojson)?)
    }

    /// Save GeoJSON to file
    pub fn save_geojson(&self, zone: Option<&HazardZone>, path: impl AsRef<Path>) -> Result<()> {
        let geojson_string = self.to_geojson_string(zone)?;
        std::fs::write(path, geojson_string)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertLevel, FrameStatus, Hull};

    fn detected() -> FrameResult {
        FrameResult {
            sequence: 3,
            status: FrameStatus::Detected,
            hull: Some(Hull::new(vec![[10.0, 10.0], [50.0, 10.0], [50.0, 40.0], [10.0, 40.0]])),
            distance: Some(80.0),
            hand_point: Some([50.0, 20.0]),
            zone_point: Some([130.0, 20.0]),
            level: AlertLevel::Warning,
            transitioned: true,
        }
    }

    #[test]
    fn test_detected_frame_exports_three_features() {
        let zone = HazardZone::rectangle(130.0, 0.0, 50.0, 50.0);
        let collection = detected().to_geojson(Some(&zone)).unwrap();
        assert_eq!(collection.features.len(), 3);

        let hull = &collection.features[1];
        match &hull.geometry.as_ref().unwrap().value {
            Value::Polygon(rings) => {
                assert_eq!(rings[0].len(), 5);
                assert_eq!(rings[0].first(), rings[0].last());
            }
            other => panic!("expected polygon, got {other:?}"),
        }

        let members = collection.foreign_members.unwrap();
        assert_eq!(members["level"], "WARNING");
        assert_eq!(members["status"], "detected");
        assert_eq!(members["sequence"], 3);
    }

    #[test]
    fn test_no_hand_frame_exports_zone_only() {
        let result = FrameResult {
            status: FrameStatus::NoHand,
            hull: None,
            distance: None,
            hand_point: None,
            zone_point: None,
            ..detected()
        };
        let zone = HazardZone::rectangle(130.0, 0.0, 50.0, 50.0);
        let collection = result.to_geojson(Some(&zone)).unwrap();
        assert_eq!(collection.features.len(), 1);
        assert_eq!(collection.foreign_members.unwrap()["distance"], JsonValue::Null);
    }

    #[test]
    fn test_degenerate_hull_exported_as_line() {
        let result = FrameResult {
            hull: Some(Hull::new(vec![[0.0, 0.0], [5.0, 0.0]])),
            ..detected()
        };
        let collection = result.to_geojson(None).unwrap();
        assert!(matches!(
            collection.features[0].geometry.as_ref().unwrap().value,
            Value::LineString(_)
        ));
    }

    #[test]
    fn test_save_geojson_writes_parseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay.geojson");
        detected().save_geojson(None, &path).unwrap();
        let parsed: FeatureCollection = std::fs::read_to_string(&path).unwrap().parse().unwrap();
        assert_eq!(parsed.features.len(), 2);
    }
}
