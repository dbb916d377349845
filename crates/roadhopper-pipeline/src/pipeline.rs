//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::process`] which runs the entire pipeline in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use roadhopper_pipeline::{Pipeline, PipelineConfig, PipelineError, RoutedEdge, SignTable};
//! # fn run(edges: Vec<RoutedEdge>, signs: &SignTable) -> Result<(), PipelineError> {
//! let route = Pipeline::new(edges, PipelineConfig::default())
//!     .build()?
//!     .attach_signs(signs)
//!     .simplify()?
//!     .find_bends()
//!     .into_route();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages). The caller can inspect the current
//! stage's output via accessor methods at any point.

use crate::bends::BendEvaluator;
use crate::diagnostics::{StageMetrics, reduction_ratio};
use crate::signs::{self, RoadSignLookup};
use crate::types::{PipelineConfig, PipelineError, RoadBend, RoadSegment, Route, RoutedEdge};

/// Entry point of the staged pipeline.
pub struct Pipeline;

impl Pipeline {
    /// Store the routed edges and config without processing them.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(edges: Vec<RoutedEdge>, config: PipelineConfig) -> Pending {
        Pending { config, edges }
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// Call [`build`](Self::build) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .build() to continue"]
pub struct Pending {
    config: PipelineConfig,
    edges: Vec<RoutedEdge>,
}

impl Pending {
    /// The routed edges to process.
    #[must_use]
    pub fn edges(&self) -> &[RoutedEdge] {
        &self.edges
    }

    /// The configuration this run uses.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate the configuration and build the segment list.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ToleranceOutOfRange`] or
    /// [`PipelineError::InvalidConfig`] for a bad configuration, and
    /// [`PipelineError::MalformedInput`] if the edges cannot form a
    /// route.
    pub fn build(self) -> Result<Built, PipelineError> {
        self.config.validate()?;
        let segments = crate::build::build_segments(&self.edges)?;
        let degenerate_dropped = crate::build::pair_count(&self.edges) - segments.len();
        Ok(Built {
            config: self.config,
            edge_count: self.edges.len(),
            degenerate_dropped,
            segments,
        })
    }
}

// ───────────────────────── Stage 1: Built ────────────────────────────

/// Pipeline state after building the chained segment list.
#[must_use = "pipeline stages are consumed by advancing; call .attach_signs() to continue"]
pub struct Built {
    config: PipelineConfig,
    edge_count: usize,
    degenerate_dropped: usize,
    segments: Vec<RoadSegment>,
}

impl Built {
    /// The segments, one per consecutive geometry point pair.
    #[must_use]
    pub fn segments(&self) -> &[RoadSegment] {
        &self.segments
    }

    /// Metrics describing the build step.
    #[must_use]
    pub const fn metrics(&self) -> StageMetrics {
        StageMetrics::Build {
            edge_count: self.edge_count,
            segment_count: self.segments.len(),
            degenerate_dropped: self.degenerate_dropped,
        }
    }

    /// Attach road signs from `lookup`.
    pub fn attach_signs<L: RoadSignLookup + ?Sized>(self, lookup: &L) -> SignsAttached {
        let segments = signs::attach_signs(&self.segments, lookup);
        SignsAttached {
            config: self.config,
            segments,
        }
    }

    /// Advance without any sign information.
    pub fn skip_signs(self) -> SignsAttached {
        SignsAttached {
            config: self.config,
            segments: self.segments,
        }
    }
}

// ───────────────────────── Stage 2: SignsAttached ────────────────────

/// Pipeline state after road sign attachment.
#[must_use = "pipeline stages are consumed by advancing; call .simplify() to continue"]
pub struct SignsAttached {
    config: PipelineConfig,
    segments: Vec<RoadSegment>,
}

impl SignsAttached {
    /// The segments with their signs.
    #[must_use]
    pub fn segments(&self) -> &[RoadSegment] {
        &self.segments
    }

    /// Metrics describing the sign step.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Signs {
            signs_attached: signs::count_signs(&self.segments),
        }
    }

    /// Simplify the segment list, or pass it through unchanged when
    /// `config.simplify` is off.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ToleranceOutOfRange`] if the configured
    /// tolerance is negative or not finite.
    pub fn simplify(self) -> Result<Simplified, PipelineError> {
        let segments_before = self.segments.len();
        let (segments, applied) = if self.config.simplify {
            (
                crate::simplify::simplify(&self.segments, self.config.simplify_tolerance)?,
                true,
            )
        } else {
            (self.segments, false)
        };
        Ok(Simplified {
            config: self.config,
            segments_before,
            applied,
            segments,
        })
    }
}

// ───────────────────────── Stage 3: Simplified ───────────────────────

/// Pipeline state after simplification.
#[must_use = "pipeline stages are consumed by advancing; call .find_bends() to continue"]
pub struct Simplified {
    config: PipelineConfig,
    segments_before: usize,
    applied: bool,
    segments: Vec<RoadSegment>,
}

impl Simplified {
    /// The simplified segments.
    #[must_use]
    pub fn segments(&self) -> &[RoadSegment] {
        &self.segments
    }

    /// Whether simplification actually ran.
    #[must_use]
    pub const fn applied(&self) -> bool {
        self.applied
    }

    /// Metrics describing the simplification, `None` when it was skipped.
    #[must_use]
    pub fn metrics(&self) -> Option<StageMetrics> {
        self.applied.then(|| StageMetrics::Simplification {
            tolerance: self.config.simplify_tolerance,
            segments_before: self.segments_before,
            segments_after: self.segments.len(),
            reduction_ratio: reduction_ratio(self.segments_before, self.segments.len()),
        })
    }

    /// Detect bends, or skip detection when `config.find_bends` is off.
    pub fn find_bends(self) -> Evaluated {
        let evaluator = BendEvaluator::from_config(&self.config);
        let route = Route::new(self.segments);
        let route = if self.config.find_bends {
            let bends = evaluator.evaluate(route.segments());
            route.with_bends(bends)
        } else {
            route
        };
        Evaluated { evaluator, route }
    }
}

// ───────────────────────── Stage 4: Evaluated ────────────────────────

/// Final pipeline state holding the finished route.
#[must_use = "call .into_route() to extract the Route"]
pub struct Evaluated {
    evaluator: BendEvaluator,
    route: Route,
}

impl Evaluated {
    /// The finished route.
    #[must_use]
    pub const fn route(&self) -> &Route {
        &self.route
    }

    /// Bends found, `None` when detection was switched off.
    #[must_use]
    pub fn bends(&self) -> Option<&[RoadBend]> {
        self.route.bends()
    }

    /// Metrics describing bend detection, `None` when it was skipped.
    #[must_use]
    pub fn metrics(&self) -> Option<StageMetrics> {
        self.route.bends().map(|bends| StageMetrics::Bends {
            bend_count: bends.len(),
            min_angle: self.evaluator.min_angle(),
            segments_in_bends: bends.iter().map(|b| b.segments().len()).sum(),
        })
    }

    /// Consume the pipeline and return the route.
    #[must_use]
    pub fn into_route(self) -> Route {
        self.route
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::signs::SignTable;
    use crate::types::Coordinate;

    /// A straight northbound edge, then a gentle right-hand curve.
    fn edges() -> Vec<RoutedEdge> {
        let mut straight = RoutedEdge::new(vec![
            Coordinate::new(49.0, 8.0),
            Coordinate::new(49.0005, 8.0),
            Coordinate::new(49.001, 8.0),
        ]);
        straight.adj_node = Some(100);
        straight.road_name = Some("Hauptstraße".to_string());

        let mut at = Coordinate::new(49.001, 8.0);
        let mut curve_points = vec![at];
        for heading in [10.0, 20.0, 30.0, 40.0, 50.0] {
            at = crate::geometry::destination(at, heading, 30.0);
            curve_points.push(at);
        }
        let mut curve = RoutedEdge::new(curve_points);
        curve.adj_node = Some(200);
        vec![straight, curve]
    }

    #[test]
    fn stages_advance_to_route() {
        let table = SignTable {
            traffic_lights: BTreeSet::from([100]),
            ..SignTable::default()
        };
        let built = Pipeline::new(edges(), PipelineConfig::default())
            .build()
            .unwrap();
        assert_eq!(built.segments().len(), 7);

        let signed = built.attach_signs(&table);
        assert_eq!(signs::count_signs(signed.segments()), 1);

        let simplified = signed.simplify().unwrap();
        assert!(simplified.applied());
        assert!(simplified.segments().len() < 7);

        let evaluated = simplified.find_bends();
        assert_eq!(evaluated.bends().unwrap().len(), 1);
        let route = evaluated.into_route();
        assert_eq!(route.signs().count(), 1);
    }

    #[test]
    fn build_validates_config_first() {
        let config = PipelineConfig {
            simplify_tolerance: -1.0,
            ..PipelineConfig::default()
        };
        let result = Pipeline::new(edges(), config).build();
        assert!(matches!(result, Err(PipelineError::ToleranceOutOfRange(_))));
    }

    #[test]
    fn disabled_simplification_passes_segments_through() {
        let config = PipelineConfig {
            simplify: false,
            ..PipelineConfig::default()
        };
        let signed = Pipeline::new(edges(), config).build().unwrap().skip_signs();
        let before = signed.segments().to_vec();
        let simplified = signed.simplify().unwrap();
        assert!(!simplified.applied());
        assert!(simplified.metrics().is_none());
        assert_eq!(simplified.segments(), before.as_slice());
    }

    #[test]
    fn disabled_bends_leave_no_cache() {
        let config = PipelineConfig {
            find_bends: false,
            ..PipelineConfig::default()
        };
        let evaluated = Pipeline::new(edges(), config)
            .build()
            .unwrap()
            .skip_signs()
            .simplify()
            .unwrap()
            .find_bends();
        assert!(evaluated.bends().is_none());
        assert!(evaluated.metrics().is_none());
    }

    #[test]
    fn build_metrics_count_dropped_segments() {
        let mut input = edges();
        input[0].geometry.insert(1, Coordinate::new(49.0, 8.0));
        let built = Pipeline::new(input, PipelineConfig::default())
            .build()
            .unwrap();
        assert!(matches!(
            built.metrics(),
            StageMetrics::Build {
                edge_count: 2,
                segment_count: 7,
                degenerate_dropped: 1,
            }
        ));
    }
}
