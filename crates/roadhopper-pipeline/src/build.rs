//! Segment building: turn routed edges into a chained segment list.
//!
//! Every consecutive pair of way-geometry points becomes its own
//! segment, so pillar points inside an edge keep the road's shape.
//! This is the first stage of the pipeline.

use log::{debug, trace, warn};

use crate::geometry;
use crate::types::{PipelineError, RoadSegment, RoutedEdge};

/// Gap (metres) between consecutive edges above which a warning is logged.
///
/// Routing engines snap virtual start/end nodes onto edges, so small
/// gaps are expected and never rejected.
pub const CHAIN_TOLERANCE_M: f64 = 1.0;

/// Build the ordered segment list for a routed path.
///
/// Road name and speed limit are copied from each edge onto all of its
/// segments. The last segment of an edge records the edge's adjacent
/// node as its end node, which is where road signs attach.
///
/// # Errors
///
/// Returns [`PipelineError::MalformedInput`] if `edges` is empty, if any
/// edge has fewer than two geometry points, or if every segment is
/// degenerate.
pub fn build_segments(edges: &[RoutedEdge]) -> Result<Vec<RoadSegment>, PipelineError> {
    if edges.is_empty() {
        return Err(PipelineError::MalformedInput("route has no edges".to_string()));
    }

    let mut segments = Vec::with_capacity(pair_count(edges));
    let mut dropped = 0_usize;

    for (idx, edge) in edges.iter().enumerate() {
        if edge.geometry.len() < 2 {
            return Err(PipelineError::MalformedInput(format!(
                "edge {idx} has {} geometry point(s), expected at least 2",
                edge.geometry.len()
            )));
        }

        if let (Some(prev), Some(&first)) =
            (segments.last().map(RoadSegment::end), edge.geometry.first())
        {
            let gap = geometry::distance(prev, first);
            if gap > CHAIN_TOLERANCE_M {
                warn!("edge {idx} starts {gap:.2}m away from the end of the previous edge");
            }
        }

        let edge_start = segments.len();
        for pair in edge.geometry.windows(2) {
            let segment = RoadSegment::new(pair[0], pair[1])
                .with_road_name(edge.road_name.clone())
                .with_speed_limit(edge.speed_limit);
            if segment.is_degenerate() {
                trace!("edge {idx}: dropping zero-length segment at {:?}", pair[0]);
                dropped += 1;
                continue;
            }
            segments.push(segment);
        }

        if segments.len() > edge_start
            && let Some(last) = segments.last_mut()
        {
            last.end_node = edge.adj_node;
        }
    }

    if segments.is_empty() {
        return Err(PipelineError::MalformedInput(format!(
            "all {dropped} segment(s) of the route are zero-length"
        )));
    }

    debug!(
        "built {} segments from {} edges ({dropped} degenerate dropped)",
        segments.len(),
        edges.len()
    );
    Ok(segments)
}

/// Number of consecutive geometry point pairs across all edges.
///
/// This is the segment count before degenerate segments are dropped.
#[must_use]
pub fn pair_count(edges: &[RoutedEdge]) -> usize {
    edges
        .iter()
        .map(|e| e.geometry.len().saturating_sub(1))
        .sum()
}
