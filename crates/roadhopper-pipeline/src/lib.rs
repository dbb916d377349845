//! roadhopper-pipeline: Pure road model pipeline (sans-IO).
//!
//! Turns the edges of a routed path into an annotated road model:
//! segment building -> road sign attachment -> simplification ->
//! bend detection.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory
//! edge lists and returns structured data. Encoding lives in
//! `roadhopper-export` and file handling in the `roadhopper` CLI.

pub mod bends;
pub mod build;
pub mod diagnostics;
pub mod geometry;
pub mod pipeline;
pub mod repository;
pub mod signs;
pub mod simplify;
pub mod types;

pub use bends::{BendEvaluator, find_bends};
pub use diagnostics::{Clock, PipelineDiagnostics};
pub use pipeline::Pipeline;
pub use repository::RouteRepository;
pub use signs::{RoadSignLookup, SignTable, attach_signs};
pub use types::{
    BendDirection, Coordinate, NodeId, PipelineConfig, PipelineError, RoadBend, RoadSegment,
    RoadSign, RoadSignKind, Route, RouteId, RoutedEdge,
};

use diagnostics::{PipelineSummary, StageDiagnostics};

/// Run the full road model pipeline.
///
/// # Pipeline steps
///
/// 1. Validate the configuration
/// 2. Build one segment per consecutive geometry point pair
/// 3. Attach road signs at segment end nodes
/// 4. Simplify (Ramer-Douglas-Peucker), unless `config.simplify` is off
/// 5. Detect bends, unless `config.find_bends` is off
///
/// # Errors
///
/// Returns [`PipelineError::MalformedInput`] if the edges cannot form a
/// route, [`PipelineError::ToleranceOutOfRange`] for a bad tolerance, and
/// [`PipelineError::InvalidConfig`] for other bad settings.
pub fn process<L: RoadSignLookup + ?Sized>(
    edges: Vec<RoutedEdge>,
    config: &PipelineConfig,
    lookup: &L,
) -> Result<Route, PipelineError> {
    Ok(Pipeline::new(edges, config.clone())
        .build()?
        .attach_signs(lookup)
        .simplify()?
        .find_bends()
        .into_route())
}

/// Run the full pipeline and collect per-stage diagnostics.
///
/// Stage durations are measured with `clock`.
///
/// # Errors
///
/// Same as [`process`].
pub fn process_with_diagnostics<L, C>(
    edges: Vec<RoutedEdge>,
    config: &PipelineConfig,
    lookup: &L,
    clock: &C,
) -> Result<(Route, PipelineDiagnostics), PipelineError>
where
    L: RoadSignLookup + ?Sized,
    C: Clock,
{
    let pipeline_start = clock.now();

    let t = clock.now();
    let built = Pipeline::new(edges, config.clone()).build()?;
    let build = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: built.metrics(),
    };

    let t = clock.now();
    let signed = built.attach_signs(lookup);
    let signs = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: signed.metrics(),
    };

    let t = clock.now();
    let simplified = signed.simplify()?;
    let simplify_duration = clock.elapsed(&t);
    let simplification = simplified.metrics().map(|metrics| StageDiagnostics {
        duration: simplify_duration,
        metrics,
    });

    let t = clock.now();
    let evaluated = simplified.find_bends();
    let bends_duration = clock.elapsed(&t);
    let bends = evaluated.metrics().map(|metrics| StageDiagnostics {
        duration: bends_duration,
        metrics,
    });

    let route = evaluated.into_route();
    let diagnostics = PipelineDiagnostics {
        build,
        signs,
        simplification,
        bends,
        total_duration: clock.elapsed(&pipeline_start),
        summary: PipelineSummary {
            route_id: route.id().to_string(),
            final_segment_count: route.len(),
            route_length: route.length(),
        },
    };
    Ok((route, diagnostics))
}
