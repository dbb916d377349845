//! Bend detection over a segment list.
//!
//! A bend is a run of consecutive segments that keeps turning in one
//! direction. The evaluator walks the heading changes between
//! neighbouring segments once, left to right, and emits every run whose
//! total turning angle reaches the configured threshold.

use log::{debug, trace};

use crate::geometry;
use crate::types::{ANGLE_EPSILON_DEG, PipelineConfig, RoadBend, RoadSegment};

/// Default minimum total turning angle (degrees) for a bend.
pub const MIN_BEND_ANGLE_DEG: f64 = PipelineConfig::DEFAULT_MIN_BEND_ANGLE;

/// Default heading change (degrees) below which a delta counts as straight.
pub const STRAIGHT_DELTA_DEG: f64 = PipelineConfig::DEFAULT_STRAIGHT_DELTA;

/// Detect bends in `segments` with the default thresholds.
#[must_use]
pub fn find_bends(segments: &[RoadSegment]) -> Vec<RoadBend> {
    BendEvaluator::default().evaluate(segments)
}

/// Bend detection policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BendEvaluator {
    min_angle: f64,
    straight_delta: f64,
}

impl Default for BendEvaluator {
    fn default() -> Self {
        Self::new(MIN_BEND_ANGLE_DEG, STRAIGHT_DELTA_DEG)
    }
}

/// Candidate run while scanning.
///
/// `start` is the first member segment, `last_turn` the index of the
/// last non-straight delta (delta `i` sits between segments `i` and
/// `i + 1`).
#[derive(Debug, Clone, Copy)]
struct Run {
    start: usize,
    clockwise: bool,
    last_turn: usize,
    straight_streak: usize,
}

impl BendEvaluator {
    /// Create an evaluator with explicit thresholds in degrees.
    #[must_use]
    pub const fn new(min_angle: f64, straight_delta: f64) -> Self {
        Self {
            min_angle,
            straight_delta,
        }
    }

    /// Create an evaluator from the bend thresholds of `config`.
    #[must_use]
    pub const fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.min_bend_angle, config.straight_delta)
    }

    /// Minimum total turning angle in degrees.
    #[must_use]
    pub const fn min_angle(&self) -> f64 {
        self.min_angle
    }

    /// Find all bends in `segments`, in travel order.
    ///
    /// Bends never share a segment. Segments outside every bend are not
    /// reported.
    #[must_use]
    pub fn evaluate(&self, segments: &[RoadSegment]) -> Vec<RoadBend> {
        let mut bends = Vec::new();
        if segments.len() < 2 {
            return bends;
        }

        // An exact zero delta is straight even with a zero threshold.
        let straight_limit = self.straight_delta.max(ANGLE_EPSILON_DEG);
        let mut run: Option<Run> = None;
        // First segment index a new run may start at.
        let mut boundary = 0;

        for (i, pair) in segments.windows(2).enumerate() {
            let delta = geometry::heading_change(pair[0].orientation, pair[1].orientation);
            let straight = delta.abs() < straight_limit;

            run = match run {
                None => (!straight && i >= boundary).then(|| Run::open(i, delta)),
                Some(mut current) if straight => {
                    current.straight_streak += 1;
                    if current.straight_streak > 1 {
                        boundary = self.close(current, segments, &mut bends).unwrap_or(boundary);
                        None
                    } else {
                        Some(current)
                    }
                }
                Some(mut current) if (delta > 0.0) == current.clockwise => {
                    current.last_turn = i;
                    current.straight_streak = 0;
                    Some(current)
                }
                Some(current) => {
                    trace!("direction reversal at delta {i}");
                    boundary = self.close(current, segments, &mut bends).unwrap_or(boundary);
                    (i >= boundary).then(|| Run::open(i, delta))
                }
            };
        }

        if let Some(current) = run {
            self.close(current, segments, &mut bends);
        }

        debug!(
            "found {} bends in {} segments (min angle {}°)",
            bends.len(),
            segments.len(),
            self.min_angle
        );
        bends
    }

    /// Emit `run` if it turns far enough.
    ///
    /// Returns the first index after the emitted bend, or `None` when the
    /// run was discarded and its segments stay free for the next run.
    fn close(
        &self,
        run: Run,
        segments: &[RoadSegment],
        bends: &mut Vec<RoadBend>,
    ) -> Option<usize> {
        let end = run.last_turn + 1;
        let bend = RoadBend::new(segments[run.start..=end].to_vec())?;
        if bend.angle().abs() < self.min_angle {
            trace!(
                "discarding run {}..={end}: {:.2}° below threshold",
                run.start,
                bend.angle()
            );
            return None;
        }
        bends.push(bend);
        Some(end + 1)
    }
}

impl Run {
    fn open(delta_index: usize, delta: f64) -> Self {
        Self {
            start: delta_index,
            clockwise: delta > 0.0,
            last_turn: delta_index,
            straight_streak: 0,
        }
    }
}
