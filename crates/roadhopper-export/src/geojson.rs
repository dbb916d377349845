//! GeoJSON encoding of routes.
//!
//! Segments become `LineString` features and road signs and bends become
//! `Point` features. A segment's sign is emitted directly before the
//! segment, since signs sit at the end of the segment that leads up to
//! them.
//!
//! Positions are `[longitude, latitude]` (plus elevation when known),
//! the reverse of the internal coordinate order.

use ::geojson::{Feature, FeatureCollection};
use log::debug;
use roadhopper_pipeline::{RoadBend, RoadSegment, RoadSign, Route, find_bends};
use serde_json::{Map, Value, json};

use crate::ExportError;

/// Encode every segment of `route`, each preceded by its road sign.
///
/// # Errors
///
/// Returns [`ExportError::GeoJson`] if a feature cannot be assembled.
pub fn route_features(route: &Route) -> Result<Vec<Feature>, ExportError> {
    let mut features = Vec::with_capacity(route.len());
    for segment in route.segments() {
        if let Some(sign) = segment.road_sign() {
            features.push(sign_feature(sign)?);
        }
        features.push(segment_feature(segment)?);
    }
    Ok(features)
}

/// Encode a road sign as a `Point` with `info` and `id` properties.
///
/// # Errors
///
/// Returns [`ExportError::GeoJson`] if the feature cannot be assembled.
pub fn sign_feature(sign: &RoadSign) -> Result<Feature, ExportError> {
    to_feature(json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            "coordinates": sign.coordinate.to_geojson_position(),
        },
        "properties": {
            "info": sign.kind.info(),
            "id": sign.id,
        }
    }))
}

/// Encode a bend as a `Point` at the start of its first segment.
///
/// `radius` is `null` for bends without a meaningful radius.
///
/// # Errors
///
/// Returns [`ExportError::GeoJson`] if the feature cannot be assembled.
pub fn bend_feature(bend: &RoadBend) -> Result<Feature, ExportError> {
    let first = bend.first_segment();
    to_feature(json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            "coordinates": first.start().to_geojson_position(),
        },
        "properties": {
            "info": "RoadBend",
            "length": bend.length(),
            "angle": bend.angle(),
            "radius": bend.radius(),
            "direction": bend.direction().id(),
            "initialOrientation": first.orientation(),
        }
    }))
}

/// Encode `route` as a collection of segment, sign and bend features.
///
/// Bends cached on the route are used as-is. Otherwise they are
/// detected with the default thresholds. The route identifier is stored
/// as the `routeId` foreign member.
///
/// # Errors
///
/// Returns [`ExportError::GeoJson`] if a feature cannot be assembled.
pub fn to_feature_collection(route: &Route) -> Result<FeatureCollection, ExportError> {
    let mut features = route_features(route)?;

    let computed;
    let bends = if let Some(cached) = route.bends() {
        cached
    } else {
        computed = find_bends(route.segments());
        computed.as_slice()
    };
    for bend in bends {
        features.push(bend_feature(bend)?);
    }

    debug!(
        "encoded route {} as {} features ({} bends)",
        route.id(),
        features.len(),
        bends.len()
    );

    let mut foreign_members = Map::new();
    foreign_members.insert("routeId".to_string(), Value::String(route.id().to_string()));

    Ok(FeatureCollection {
        features,
        bbox: None,
        foreign_members: Some(foreign_members),
    })
}

/// Encode `route` as a GeoJSON string.
///
/// # Errors
///
/// Returns [`ExportError`] if encoding or serialization fails.
pub fn to_geojson_string(route: &Route, pretty: bool) -> Result<String, ExportError> {
    let collection = to_feature_collection(route)?;
    let encoded = if pretty {
        serde_json::to_string_pretty(&collection)?
    } else {
        serde_json::to_string(&collection)?
    };
    Ok(encoded)
}

fn segment_feature(segment: &RoadSegment) -> Result<Feature, ExportError> {
    to_feature(json!({
        "type": "Feature",
        "geometry": {
            "type": "LineString",
            "coordinates": [
                segment.start().to_geojson_position(),
                segment.end().to_geojson_position(),
            ],
        },
        "properties": {
            "length": segment.length(),
            "orientation": segment.orientation(),
            "grade": segment.grade(),
            "road": segment.road_name().unwrap_or_default(),
            "speedLimit": segment.speed_limit(),
        }
    }))
}

fn to_feature(value: Value) -> Result<Feature, ExportError> {
    serde_json::from_value::<Feature>(value).map_err(|e| ExportError::GeoJson(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use roadhopper_pipeline::{Coordinate, RoadSignKind};

    use super::*;

    fn property<'a>(feature: &'a Feature, key: &str) -> &'a Value {
        feature.properties.as_ref().unwrap().get(key).unwrap()
    }

    fn feature_json(feature: &Feature) -> Value {
        serde_json::to_value(feature).unwrap()
    }

    fn signed_route() -> Route {
        let a = Coordinate::new(49.0, 8.0);
        let b = Coordinate::new(49.001, 8.0);
        let c = Coordinate::new(49.001, 8.001);
        let sign = RoadSign {
            kind: RoadSignKind::TrafficLight,
            id: 42,
            coordinate: b,
        };
        Route::new(vec![
            RoadSegment::new(a, b)
                .with_road_name(Some("Ringstraße".to_string()))
                .with_speed_limit(Some(50.0))
                .with_end_node(Some(42))
                .with_road_sign(Some(sign)),
            RoadSegment::new(b, c),
        ])
    }

    #[test]
    fn coordinates_are_lon_lat() {
        let features = route_features(&signed_route()).unwrap();
        let json = feature_json(&features[1]);
        let first = &json["geometry"]["coordinates"][0];
        assert!((first[0].as_f64().unwrap() - 8.0).abs() < f64::EPSILON);
        assert!((first[1].as_f64().unwrap() - 49.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sign_precedes_its_segment() {
        let features = route_features(&signed_route()).unwrap();
        assert_eq!(features.len(), 3);
        assert_eq!(property(&features[0], "info"), "trafficLight");
        assert_eq!(property(&features[0], "id"), 42);
        assert_eq!(feature_json(&features[0])["geometry"]["type"], "Point");
        assert_eq!(feature_json(&features[1])["geometry"]["type"], "LineString");
    }

    #[test]
    fn segment_properties() {
        let features = route_features(&signed_route()).unwrap();
        let named = &features[1];
        assert_eq!(property(named, "road"), "Ringstraße");
        assert_eq!(property(named, "speedLimit"), 50.0);
        assert!(property(named, "grade").is_null());
        assert!(property(named, "length").as_f64().unwrap() > 100.0);

        let unnamed = &features[2];
        assert_eq!(property(unnamed, "road"), "");
        assert!(property(unnamed, "speedLimit").is_null());
        let orientation = property(unnamed, "orientation").as_f64().unwrap();
        assert!((orientation - 90.0).abs() < 0.1, "got {orientation}");
    }

    #[test]
    fn bend_feature_properties() {
        let route = signed_route();
        let bend = RoadBend::new(route.segments().to_vec()).unwrap();
        let feature = bend_feature(&bend).unwrap();
        assert_eq!(property(&feature, "info"), "RoadBend");
        assert_eq!(property(&feature, "direction"), "right");
        let angle = property(&feature, "angle").as_f64().unwrap();
        assert!((angle - 90.0).abs() < 0.1, "got {angle}");
        assert!(property(&feature, "radius").as_f64().unwrap() > 0.0);
        let initial = property(&feature, "initialOrientation").as_f64().unwrap();
        assert!(initial.abs() < 1e-6);
        let json = feature_json(&feature);
        assert!((json["geometry"]["coordinates"][0].as_f64().unwrap() - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn collection_computes_bends_when_not_cached() {
        let collection = to_feature_collection(&signed_route()).unwrap();
        // sign + 2 segments + the right-angle bend
        assert_eq!(collection.features.len(), 4);
        let members = collection.foreign_members.unwrap();
        assert_eq!(
            members["routeId"],
            Value::String(signed_route().id().to_string())
        );
    }

    #[test]
    fn collection_uses_cached_bends() {
        let route = signed_route().with_bends(Vec::new());
        let collection = to_feature_collection(&route).unwrap();
        assert_eq!(collection.features.len(), 3);
    }

    #[test]
    fn malformed_feature_value_is_a_geojson_error() {
        let result = to_feature(json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": "nowhere" },
            "properties": {}
        }));
        assert!(matches!(result, Err(ExportError::GeoJson(_))));
    }

    #[test]
    fn sign_feature_is_a_point_at_the_sign() {
        let sign = RoadSign {
            kind: RoadSignKind::Other("giveWay".to_string()),
            id: 7,
            coordinate: Coordinate::with_elevation(49.0, 8.5, 110.0),
        };
        let json = feature_json(&sign_feature(&sign).unwrap());
        assert_eq!(json["geometry"]["type"], "Point");
        assert_eq!(json["geometry"]["coordinates"], json!([8.5, 49.0, 110.0]));
        assert_eq!(json["properties"]["info"], "giveWay");
    }

    #[test]
    fn geojson_string_is_a_feature_collection() {
        let encoded = to_geojson_string(&signed_route(), false).unwrap();
        let value: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert!(value["routeId"].is_string());

        let pretty = to_geojson_string(&signed_route(), true).unwrap();
        assert!(pretty.contains('\n'));
    }
}
