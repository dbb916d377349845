//! Shared types for the roadhopper road model pipeline.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;

use crate::geometry;

/// Identifier of a graph (tower) node in the external routing engine.
pub type NodeId = u64;

/// Segments shorter than this (metres) are considered degenerate.
pub const DEGENERATE_LENGTH_M: f64 = 1e-6;

/// Turning angles (degrees) below this magnitude count as zero.
pub const ANGLE_EPSILON_DEG: f64 = 1e-6;

/// A geographic coordinate with optional elevation.
///
/// Internal order is latitude first. GeoJSON output reverses this, see
/// [`Coordinate::to_geojson_position`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Elevation in metres, if the routing engine provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ele: Option<f64>,
}

impl Coordinate {
    /// Create a coordinate without elevation.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            ele: None,
        }
    }

    /// Create a coordinate with elevation.
    #[must_use]
    pub const fn with_elevation(lat: f64, lon: f64, ele: f64) -> Self {
        Self {
            lat,
            lon,
            ele: Some(ele),
        }
    }

    /// Great-circle distance to another coordinate in metres.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        geometry::distance(self, other)
    }

    /// Position in GeoJSON order: `[lon, lat]` or `[lon, lat, ele]`.
    #[must_use]
    pub fn to_geojson_position(self) -> Vec<f64> {
        match self.ele {
            Some(ele) => vec![self.lon, self.lat, ele],
            None => vec![self.lon, self.lat],
        }
    }
}

/// One directed traversal of a routing graph edge, as returned by the
/// routing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedEdge {
    /// Full way geometry: base node, pillar points, adjacent node.
    pub geometry: Vec<Coordinate>,
    /// Tower node the traversal starts at.
    #[serde(default)]
    pub base_node: Option<NodeId>,
    /// Tower node the traversal ends at.
    #[serde(default)]
    pub adj_node: Option<NodeId>,
    /// Street name, if known.
    #[serde(default)]
    pub road_name: Option<String>,
    /// Speed limit in km/h, if known.
    #[serde(default)]
    pub speed_limit: Option<f64>,
}

impl RoutedEdge {
    /// Create an edge from its way geometry with no attributes.
    #[must_use]
    pub const fn new(geometry: Vec<Coordinate>) -> Self {
        Self {
            geometry,
            base_node: None,
            adj_node: None,
            road_name: None,
            speed_limit: None,
        }
    }
}

/// The kind of a road sign attached to a segment end.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoadSignKind {
    /// Signal-controlled intersection.
    TrafficLight,
    /// Stop sign.
    StopSign,
    /// Any other point feature, named by the data source.
    Other(String),
}

impl RoadSignKind {
    /// Identifier used in encoded output (`info` property).
    #[must_use]
    pub fn info(&self) -> &str {
        match self {
            Self::TrafficLight => "trafficLight",
            Self::StopSign => "stopSign",
            Self::Other(name) => name,
        }
    }
}

/// A point feature located at the end node of a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadSign {
    /// What kind of sign this is.
    pub kind: RoadSignKind,
    /// Source node the sign was found on.
    pub id: NodeId,
    /// Location of the sign.
    pub coordinate: Coordinate,
}

/// A straight piece of a route between two coordinates.
///
/// Length, orientation and grade are derived once at construction and
/// never change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadSegment {
    pub(crate) start: Coordinate,
    pub(crate) end: Coordinate,
    pub(crate) length: f64,
    pub(crate) orientation: f64,
    pub(crate) grade: Option<f64>,
    pub(crate) road_name: Option<String>,
    pub(crate) speed_limit: Option<f64>,
    pub(crate) end_node: Option<NodeId>,
    pub(crate) road_sign: Option<RoadSign>,
}

impl RoadSegment {
    /// Create a segment from `start` to `end`, deriving length,
    /// orientation and grade.
    #[must_use]
    pub fn new(start: Coordinate, end: Coordinate) -> Self {
        let length = geometry::distance(start, end);
        let orientation = geometry::bearing(start, end);
        let grade = match (start.ele, end.ele) {
            (Some(from), Some(to)) if length > DEGENERATE_LENGTH_M => Some((to - from) / length),
            _ => None,
        };
        Self {
            start,
            end,
            length,
            orientation,
            grade,
            road_name: None,
            speed_limit: None,
            end_node: None,
            road_sign: None,
        }
    }

    /// Set the road name.
    #[must_use]
    pub fn with_road_name(mut self, road_name: Option<String>) -> Self {
        self.road_name = road_name;
        self
    }

    /// Set the speed limit (km/h).
    #[must_use]
    pub const fn with_speed_limit(mut self, speed_limit: Option<f64>) -> Self {
        self.speed_limit = speed_limit;
        self
    }

    /// Set the graph node this segment ends at.
    #[must_use]
    pub const fn with_end_node(mut self, end_node: Option<NodeId>) -> Self {
        self.end_node = end_node;
        self
    }

    /// Attach (or clear) the road sign at the end of this segment.
    #[must_use]
    pub fn with_road_sign(mut self, road_sign: Option<RoadSign>) -> Self {
        self.road_sign = road_sign;
        self
    }

    /// Start coordinate.
    #[must_use]
    pub const fn start(&self) -> Coordinate {
        self.start
    }

    /// End coordinate.
    #[must_use]
    pub const fn end(&self) -> Coordinate {
        self.end
    }

    /// Great-circle length in metres.
    #[must_use]
    pub const fn length(&self) -> f64 {
        self.length
    }

    /// Bearing from start to end in degrees, `[0, 360)`, 0 = north.
    #[must_use]
    pub const fn orientation(&self) -> f64 {
        self.orientation
    }

    /// Rise over run, if both endpoints carry elevation.
    #[must_use]
    pub const fn grade(&self) -> Option<f64> {
        self.grade
    }

    /// Street name, if known.
    #[must_use]
    pub fn road_name(&self) -> Option<&str> {
        self.road_name.as_deref()
    }

    /// Speed limit in km/h, if known.
    #[must_use]
    pub const fn speed_limit(&self) -> Option<f64> {
        self.speed_limit
    }

    /// Graph node at the end of this segment, if it ends on a tower node.
    #[must_use]
    pub const fn end_node(&self) -> Option<NodeId> {
        self.end_node
    }

    /// Road sign at the end of this segment.
    #[must_use]
    pub const fn road_sign(&self) -> Option<&RoadSign> {
        self.road_sign.as_ref()
    }

    /// Returns `true` if the segment has (near) zero length.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.length < DEGENERATE_LENGTH_M
    }
}

/// Rotational direction of a bend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BendDirection {
    /// Counter-clockwise heading change.
    Left,
    /// Clockwise heading change.
    Right,
}

impl BendDirection {
    /// Identifier used in encoded output.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// A contiguous run of segments forming a single curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadBend {
    segments: Vec<RoadSegment>,
    length: f64,
    angle: f64,
}

impl RoadBend {
    /// Build a bend from its member segments.
    ///
    /// Returns `None` for an empty run.
    #[must_use]
    pub fn new(segments: Vec<RoadSegment>) -> Option<Self> {
        if segments.is_empty() {
            return None;
        }
        let length = segments.iter().map(RoadSegment::length).sum();
        let angle = segments
            .windows(2)
            .map(|pair| geometry::heading_change(pair[0].orientation, pair[1].orientation))
            .sum();
        Some(Self {
            segments,
            length,
            angle,
        })
    }

    /// Member segments in travel order.
    #[must_use]
    pub fn segments(&self) -> &[RoadSegment] {
        &self.segments
    }

    /// The segment anchoring the bend's start.
    #[must_use]
    pub fn first_segment(&self) -> &RoadSegment {
        &self.segments[0]
    }

    /// Sum of member lengths in metres.
    #[must_use]
    pub const fn length(&self) -> f64 {
        self.length
    }

    /// Signed total turning angle in degrees (positive = right).
    #[must_use]
    pub const fn angle(&self) -> f64 {
        self.angle
    }

    /// Radius in metres assuming constant curvature.
    ///
    /// `None` when the total angle is within [`ANGLE_EPSILON_DEG`] of zero.
    #[must_use]
    pub fn radius(&self) -> Option<f64> {
        if self.angle.abs() < ANGLE_EPSILON_DEG {
            return None;
        }
        Some(self.length / self.angle.to_radians().abs())
    }

    /// Turning direction, from the sign of [`angle`](Self::angle).
    #[must_use]
    pub fn direction(&self) -> BendDirection {
        if self.angle < 0.0 {
            BendDirection::Left
        } else {
            BendDirection::Right
        }
    }
}

/// Stable identifier of a route, derived from its full content.
///
/// Two routes share an identifier only if their segments agree in
/// geometry, metadata and road signs, and their cached bends agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(u64);

/// Fixed `SipHash` keys so identifiers are stable across processes.
const ROUTE_ID_KEYS: (u64, u64) = (0x726f_6164_686f_7070, 0x6572_2d72_6f75_7465);

impl RouteId {
    /// Derive the identifier of a segment sequence without cached bends.
    #[must_use]
    pub fn of_segments(segments: &[RoadSegment]) -> Self {
        Self::of_route(segments, None)
    }

    /// Derive the identifier of a segment sequence and its cached bends.
    #[must_use]
    pub fn of_route(segments: &[RoadSegment], bends: Option<&[RoadBend]>) -> Self {
        let mut hasher = SipHasher13::new_with_keys(ROUTE_ID_KEYS.0, ROUTE_ID_KEYS.1);
        hasher.write_usize(segments.len());
        for segment in segments {
            hash_segment(segment, &mut hasher);
        }
        match bends {
            None => hasher.write_u8(0),
            Some(bends) => {
                hasher.write_u8(1);
                hasher.write_usize(bends.len());
                for bend in bends {
                    hasher.write_usize(bend.segments.len());
                    hasher.write_u64(bend.angle.to_bits());
                    hash_coordinate(bend.first_segment().start, &mut hasher);
                }
            }
        }
        Self(hasher.finish())
    }

    /// The raw 64-bit value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

fn hash_coordinate(c: Coordinate, hasher: &mut impl Hasher) {
    hasher.write_u64(c.lat.to_bits());
    hasher.write_u64(c.lon.to_bits());
    c.ele.map(f64::to_bits).hash(hasher);
}

fn hash_segment(segment: &RoadSegment, hasher: &mut impl Hasher) {
    hash_coordinate(segment.start, hasher);
    hash_coordinate(segment.end, hasher);
    segment.road_name.hash(hasher);
    segment.speed_limit.map(f64::to_bits).hash(hasher);
    segment.end_node.hash(hasher);
    if let Some(sign) = &segment.road_sign {
        hasher.write_u8(1);
        sign.kind.hash(hasher);
        sign.id.hash(hasher);
    } else {
        hasher.write_u8(0);
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for RouteId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s, 16).map(Self)
    }
}

impl Serialize for RouteId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RouteId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An ordered sequence of road segments in travel order.
///
/// Immutable once built. Stages that change the segment list (such as
/// simplification) produce a new route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    id: RouteId,
    segments: Vec<RoadSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bends: Option<Vec<RoadBend>>,
}

impl Route {
    /// Create a route from its segments.
    #[must_use]
    pub fn new(segments: Vec<RoadSegment>) -> Self {
        Self {
            id: RouteId::of_segments(&segments),
            segments,
            bends: None,
        }
    }

    /// Return this route with a cached bend list.
    #[must_use]
    ///
    /// The identifier changes with the bend list, so a route with bends
    /// and the same route without them are stored separately.
    pub fn with_bends(self, bends: Vec<RoadBend>) -> Self {
        let id = RouteId::of_route(&self.segments, Some(&bends));
        Self {
            id,
            bends: Some(bends),
            ..self
        }
    }

    /// Stable identifier for later lookup.
    #[must_use]
    pub const fn id(&self) -> RouteId {
        self.id
    }

    /// Segments in travel order.
    #[must_use]
    pub fn segments(&self) -> &[RoadSegment] {
        &self.segments
    }

    /// Cached bends, if bend evaluation has run.
    #[must_use]
    pub fn bends(&self) -> Option<&[RoadBend]> {
        self.bends.as_deref()
    }

    /// Number of segments.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the route has no segments.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total length in metres.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.segments.iter().map(RoadSegment::length).sum()
    }

    /// Vertex list: start of the first segment, then every segment end.
    #[must_use]
    pub fn points(&self) -> Vec<Coordinate> {
        self.segments
            .first()
            .map(|s| s.start)
            .into_iter()
            .chain(self.segments.iter().map(|s| s.end))
            .collect()
    }

    /// All attached road signs in travel order.
    pub fn signs(&self) -> impl Iterator<Item = &RoadSign> {
        self.segments.iter().filter_map(RoadSegment::road_sign)
    }
}

/// Configuration for the road model pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Whether to merge segments that are indistinguishable within
    /// `simplify_tolerance`.
    pub simplify: bool,

    /// Maximum deviation in metres introduced by
    /// simplification.
    pub simplify_tolerance: f64,

    /// Whether to evaluate bends and cache them on the route.
    pub find_bends: bool,

    /// Minimum absolute turning angle in degrees for a run to count as a
    /// bend.
    pub min_bend_angle: f64,

    /// Heading changes below this magnitude (degrees) count as straight.
    pub straight_delta: f64,
}

impl PipelineConfig {
    /// Default for [`simplify`](Self::simplify).
    pub const DEFAULT_SIMPLIFY: bool = true;
    /// Default for [`simplify_tolerance`](Self::simplify_tolerance).
    pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 2.0;
    /// Default for [`find_bends`](Self::find_bends).
    pub const DEFAULT_FIND_BENDS: bool = true;
    /// Default for [`min_bend_angle`](Self::min_bend_angle).
    pub const DEFAULT_MIN_BEND_ANGLE: f64 = 5.0;
    /// Default for [`straight_delta`](Self::straight_delta).
    pub const DEFAULT_STRAIGHT_DELTA: f64 = 0.5;

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ToleranceOutOfRange`] for a negative or
    /// non-finite tolerance, and [`PipelineError::InvalidConfig`] for a
    /// negative or non-finite bend threshold.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.simplify_tolerance.is_finite() || self.simplify_tolerance < 0.0 {
            return Err(PipelineError::ToleranceOutOfRange(self.simplify_tolerance));
        }
        if !self.min_bend_angle.is_finite() || self.min_bend_angle < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "min_bend_angle must be finite and non-negative, got {}",
                self.min_bend_angle
            )));
        }
        if !self.straight_delta.is_finite() || self.straight_delta < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "straight_delta must be finite and non-negative, got {}",
                self.straight_delta
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            simplify: Self::DEFAULT_SIMPLIFY,
            simplify_tolerance: Self::DEFAULT_SIMPLIFY_TOLERANCE,
            find_bends: Self::DEFAULT_FIND_BENDS,
            min_bend_angle: Self::DEFAULT_MIN_BEND_ANGLE,
            straight_delta: Self::DEFAULT_STRAIGHT_DELTA,
        }
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum PipelineError {
    /// The routed edges cannot form a route.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The simplification tolerance is negative or not finite.
    #[error("simplification tolerance out of range: {0}")]
    ToleranceOutOfRange(f64),

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn seg(start: (f64, f64), end: (f64, f64)) -> RoadSegment {
        RoadSegment::new(
            Coordinate::new(start.0, start.1),
            Coordinate::new(end.0, end.1),
        )
    }

    // --- Coordinate tests ---

    #[test]
    fn geojson_position_is_lon_lat() {
        let c = Coordinate::new(49.5, 8.25);
        assert_eq!(c.to_geojson_position(), vec![8.25, 49.5]);
    }

    #[test]
    fn geojson_position_includes_elevation() {
        let c = Coordinate::with_elevation(49.5, 8.25, 120.0);
        assert_eq!(c.to_geojson_position(), vec![8.25, 49.5, 120.0]);
    }

    #[test]
    fn coordinate_deserializes_without_elevation() {
        let c: Coordinate = serde_json::from_str(r#"{"lat": 1.0, "lon": 2.0}"#).unwrap();
        assert_eq!(c, Coordinate::new(1.0, 2.0));
    }

    // --- RoadSegment tests ---

    #[test]
    fn segment_length_one_degree_latitude() {
        let s = seg((0.0, 0.0), (1.0, 0.0));
        // One degree of latitude on the mean-radius sphere.
        assert!((s.length() - 111_195.0).abs() < 10.0, "got {}", s.length());
    }

    #[test]
    fn segment_orientation_cardinal_directions() {
        assert!(seg((0.0, 0.0), (1.0, 0.0)).orientation().abs() < 1e-9);
        assert!((seg((0.0, 0.0), (0.0, 1.0)).orientation() - 90.0).abs() < 1e-9);
        assert!((seg((0.0, 0.0), (-1.0, 0.0)).orientation() - 180.0).abs() < 1e-9);
        assert!((seg((0.0, 0.0), (0.0, -1.0)).orientation() - 270.0).abs() < 1e-9);
    }

    #[test]
    fn segment_grade_requires_both_elevations() {
        let flat = seg((0.0, 0.0), (0.001, 0.0));
        assert!(flat.grade().is_none());

        let start = Coordinate::with_elevation(0.0, 0.0, 100.0);
        let end = Coordinate::with_elevation(0.001, 0.0, 105.0);
        let s = RoadSegment::new(start, end);
        let expected = 5.0 / s.length();
        assert!((s.grade().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn zero_length_segment_is_degenerate() {
        let s = seg((1.0, 1.0), (1.0, 1.0));
        assert!(s.is_degenerate());
        assert!(s.grade().is_none());
        assert!(!seg((1.0, 1.0), (1.0, 1.001)).is_degenerate());
    }

    #[test]
    fn segment_builders_set_metadata() {
        let s = seg((0.0, 0.0), (0.0, 0.01))
            .with_road_name(Some("Hauptstraße".to_string()))
            .with_speed_limit(Some(50.0))
            .with_end_node(Some(7));
        assert_eq!(s.road_name(), Some("Hauptstraße"));
        assert_eq!(s.speed_limit(), Some(50.0));
        assert_eq!(s.end_node(), Some(7));
        assert!(s.road_sign().is_none());
    }

    // --- RoadSignKind tests ---

    #[test]
    fn sign_kind_info_strings() {
        assert_eq!(RoadSignKind::TrafficLight.info(), "trafficLight");
        assert_eq!(RoadSignKind::StopSign.info(), "stopSign");
        assert_eq!(RoadSignKind::Other("giveWay".into()).info(), "giveWay");
    }

    // --- RoadBend tests ---

    #[test]
    fn empty_bend_is_rejected() {
        assert!(RoadBend::new(vec![]).is_none());
    }

    #[test]
    fn straight_bend_has_no_radius() {
        let bend = RoadBend::new(vec![
            seg((0.0, 0.0), (0.0, 0.001)),
            seg((0.0, 0.001), (0.0, 0.002)),
        ])
        .unwrap();
        assert!(bend.angle().abs() < ANGLE_EPSILON_DEG);
        assert!(bend.radius().is_none());
    }

    #[test]
    fn right_angle_bend_radius_and_direction() {
        // North then east: a 90 degree right turn.
        let bend = RoadBend::new(vec![
            seg((0.0, 0.0), (0.001, 0.0)),
            seg((0.001, 0.0), (0.001, 0.001)),
        ])
        .unwrap();
        assert!((bend.angle() - 90.0).abs() < 0.01, "got {}", bend.angle());
        assert_eq!(bend.direction(), BendDirection::Right);
        let expected = bend.length() / std::f64::consts::FRAC_PI_2;
        assert!((bend.radius().unwrap() - expected).abs() < 0.1);
    }

    #[test]
    fn left_bend_direction() {
        // North then west.
        let bend = RoadBend::new(vec![
            seg((0.0, 0.0), (0.001, 0.0)),
            seg((0.001, 0.0), (0.001, -0.001)),
        ])
        .unwrap();
        assert!(bend.angle() < 0.0);
        assert_eq!(bend.direction(), BendDirection::Left);
        assert_eq!(bend.direction().id(), "left");
    }

    // --- Route tests ---

    #[test]
    fn route_id_is_stable_for_same_geometry() {
        let a = Route::new(vec![seg((0.0, 0.0), (0.0, 1.0))]);
        let b = Route::new(vec![seg((0.0, 0.0), (0.0, 1.0))]);
        let c = Route::new(vec![seg((0.0, 0.0), (0.0, 2.0))]);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn route_id_covers_signs_and_metadata() {
        let plain = seg((0.0, 0.0), (0.0, 1.0)).with_end_node(Some(3));
        let sign = RoadSign {
            kind: RoadSignKind::StopSign,
            id: 3,
            coordinate: plain.end(),
        };
        let signed = plain.clone().with_road_sign(Some(sign));
        let named = plain.clone().with_road_name(Some("Pfinztalstraße".to_string()));

        let base = Route::new(vec![plain]).id();
        assert_ne!(base, Route::new(vec![signed]).id());
        assert_ne!(base, Route::new(vec![named]).id());
    }

    #[test]
    fn route_id_covers_cached_bends() {
        let route = Route::new(vec![
            seg((0.0, 0.0), (0.001, 0.0)),
            seg((0.001, 0.0), (0.001, 0.001)),
        ]);
        let bend = RoadBend::new(route.segments().to_vec()).unwrap();
        let without = route.id();
        let empty = route.clone().with_bends(Vec::new());
        let with_bend = route.with_bends(vec![bend]);
        assert_ne!(without, empty.id());
        assert_ne!(empty.id(), with_bend.id());
        assert_eq!(
            with_bend.id(),
            RouteId::of_route(with_bend.segments(), with_bend.bends())
        );
    }

    #[test]
    fn route_id_display_parses_back() {
        let route = Route::new(vec![seg((0.0, 0.0), (0.0, 1.0))]);
        let text = route.id().to_string();
        assert_eq!(text.len(), 16);
        assert_eq!(text.parse::<RouteId>().unwrap(), route.id());
    }

    #[test]
    fn route_points_and_length() {
        let route = Route::new(vec![
            seg((0.0, 0.0), (0.0, 1.0)),
            seg((0.0, 1.0), (0.0, 2.0)),
        ]);
        assert_eq!(route.len(), 2);
        assert_eq!(
            route.points(),
            vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.0, 1.0),
                Coordinate::new(0.0, 2.0)
            ]
        );
        let expected: f64 = route.segments().iter().map(RoadSegment::length).sum();
        assert!((route.length() - expected).abs() < 1e-9);
        assert!(route.bends().is_none());
    }

    #[test]
    fn empty_route_has_no_points() {
        let route = Route::new(vec![]);
        assert!(route.is_empty());
        assert!(route.points().is_empty());
    }

    // --- PipelineConfig tests ---

    #[test]
    fn pipeline_config_defaults() {
        let config = PipelineConfig::default();
        assert!(config.simplify);
        assert!((config.simplify_tolerance - 2.0).abs() < f64::EPSILON);
        assert!(config.find_bends);
        assert!((config.min_bend_angle - 5.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let config = PipelineConfig {
            simplify_tolerance: -1.0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::ToleranceOutOfRange(_))
        ));
    }

    #[test]
    fn nan_bend_angle_is_rejected() {
        let config = PipelineConfig {
            min_bend_angle: f64::NAN,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn pipeline_config_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"simplify_tolerance": 5.0}"#).unwrap();
        assert!((config.simplify_tolerance - 5.0).abs() < f64::EPSILON);
        assert!(config.simplify);
        assert!(config.find_bends);
    }

    // --- PipelineError tests ---

    #[test]
    fn error_display() {
        let err = PipelineError::MalformedInput("route has no edges".to_string());
        assert_eq!(err.to_string(), "malformed input: route has no edges");
        let err = PipelineError::ToleranceOutOfRange(-2.0);
        assert_eq!(
            err.to_string(),
            "simplification tolerance out of range: -2"
        );
    }

    #[test]
    fn pipeline_error_serde_round_trip() {
        let err = PipelineError::InvalidConfig("bad value".to_string());
        let json = serde_json::to_string(&err).unwrap();
        let deserialized: PipelineError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, deserialized);
    }
}
