//! Segment simplification using the Ramer-Douglas-Peucker algorithm.
//!
//! The chained segment list is treated as a polyline of vertices
//! (first start, then every segment end). Vertices within `tolerance`
//! metres of the chord between their run's endpoints are removed and the
//! segments between the surviving vertices are merged into a single
//! straight replacement segment.
//!
//! The end vertex of every segment that carries a road sign is pinned,
//! so each sign ends up on exactly one replacement segment that ends at
//! the sign's node.
//!
//! RDP starts from the longest possible run and only splits where the
//! tolerance is violated, which keeps the output segment count low. The
//! result is idempotent: simplifying a simplified list with the same
//! tolerance returns it unchanged.

use std::iter;

use log::debug;

use crate::geometry;
use crate::types::{Coordinate, DEGENERATE_LENGTH_M, PipelineError, RoadSegment};

/// Merge consecutive segments that deviate at most `tolerance` metres
/// from a straight replacement.
///
/// A tolerance of 0.0 only merges exactly collinear runs. Merged
/// segments take road name and speed limit from their first
/// constituent; end node and road sign come from the last. The first and
/// last coordinates of the route are preserved exactly.
///
/// # Errors
///
/// Returns [`PipelineError::ToleranceOutOfRange`] if `tolerance` is
/// negative or not finite.
pub fn simplify(
    segments: &[RoadSegment],
    tolerance: f64,
) -> Result<Vec<RoadSegment>, PipelineError> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(PipelineError::ToleranceOutOfRange(tolerance));
    }
    if segments.len() < 2 {
        return Ok(segments.to_vec());
    }

    // Vertex k (k >= 1) is the end of segment k - 1.
    let vertices: Vec<Coordinate> = iter::once(segments[0].start)
        .chain(segments.iter().map(|s| s.end))
        .collect();

    let last = vertices.len() - 1;
    let mut kept = vec![false; vertices.len()];
    kept[0] = true;
    kept[last] = true;
    for (i, segment) in segments.iter().enumerate() {
        if segment.road_sign.is_some() {
            kept[i + 1] = true;
        }
    }

    let pinned: Vec<usize> = (0..vertices.len()).filter(|&i| kept[i]).collect();
    for window in pinned.windows(2) {
        rdp_recurse(&vertices, window[0], window[1], tolerance, &mut kept);
    }

    let mut simplified = Vec::with_capacity(kept.iter().filter(|&&k| k).count());
    let mut run_start = 0;
    for v in 1..vertices.len() {
        if kept[v] {
            simplified.extend(merge_run(&segments[run_start..v]));
            run_start = v;
        }
    }

    debug!(
        "simplified {} segments to {} (tolerance {tolerance}m)",
        segments.len(),
        simplified.len()
    );
    Ok(simplified)
}

/// Replace a run of chained segments with one straight segment.
///
/// A run of one segment is returned unchanged.
fn merge_run(run: &[RoadSegment]) -> Option<RoadSegment> {
    match run {
        [single] => Some(single.clone()),
        [first, .., last] => Some(
            RoadSegment::new(first.start, last.end)
                .with_road_name(first.road_name.clone())
                .with_speed_limit(first.speed_limit)
                .with_end_node(last.end_node)
                .with_road_sign(last.road_sign.clone()),
        ),
        [] => None,
    }
}

/// Recursive step of the Ramer-Douglas-Peucker algorithm.
///
/// Finds the vertex between `start` and `end` that deviates most from
/// the chord between them. If that deviation exceeds `tolerance`, or the
/// run would collapse into a zero-length segment, the vertex is kept and
/// both halves are processed recursively.
fn rdp_recurse(
    vertices: &[Coordinate],
    start: usize,
    end: usize,
    tolerance: f64,
    kept: &mut [bool],
) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = -1.0;
    let mut max_idx = start + 1;

    for i in (start + 1)..end {
        let d = geometry::deviation(vertices[i], vertices[start], vertices[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    let closes_loop = geometry::distance(vertices[start], vertices[end]) < DEGENERATE_LENGTH_M;
    if max_dist > tolerance || closes_loop {
        kept[max_idx] = true;
        rdp_recurse(vertices, start, max_idx, tolerance, kept);
        rdp_recurse(vertices, max_idx, end, tolerance, kept);
    }
}
