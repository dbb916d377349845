//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! The pipeline never reads the system clock itself. Callers pass a
//! [`Clock`] to [`process_with_diagnostics`](crate::process_with_diagnostics)
//! so the crate stays free of I/O and platform time sources.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Time source used to measure stage durations.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
///
/// Stages that are switched off in the configuration have `Option`
/// fields that are `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: segment building.
    pub build: StageDiagnostics,
    /// Stage 2: road sign attachment.
    pub signs: StageDiagnostics,
    /// Stage 3: RDP simplification (only when `config.simplify == true`).
    pub simplification: Option<StageDiagnostics>,
    /// Stage 4: bend detection (only when `config.find_bends == true`).
    pub bends: Option<StageDiagnostics>,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Segment building metrics.
    Build {
        /// Number of routed edges in the input.
        edge_count: usize,
        /// Number of segments produced.
        segment_count: usize,
        /// Zero-length segments that were dropped.
        degenerate_dropped: usize,
    },
    /// Road sign attachment metrics.
    Signs {
        /// Number of segments carrying a sign afterwards.
        signs_attached: usize,
    },
    /// Simplification metrics.
    Simplification {
        /// RDP tolerance in metres.
        tolerance: f64,
        /// Segments before simplification.
        segments_before: usize,
        /// Segments after simplification.
        segments_after: usize,
        /// Reduction ratio: `1.0 - (after / before)`.
        reduction_ratio: f64,
    },
    /// Bend detection metrics.
    Bends {
        /// Number of bends found.
        bend_count: usize,
        /// Minimum turning angle used, in degrees.
        min_angle: f64,
        /// Segments that belong to some bend.
        segments_in_bends: usize,
    },
}

/// High-level summary for the entire run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Identifier of the resulting route.
    pub route_id: String,
    /// Segments in the final route.
    pub final_segment_count: usize,
    /// Total route length in metres.
    pub route_length: f64,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Route: {} ({:.1}m)",
            self.summary.route_id, self.summary.route_length,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        let mut stages: Vec<(&str, &StageDiagnostics)> =
            vec![("Build", &self.build), ("Signs", &self.signs)];
        if let Some(ref s) = self.simplification {
            stages.push(("Simplification", s));
        }
        if let Some(ref b) = self.bends {
            stages.push(("Bends", b));
        }

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Final segments: {}",
            self.summary.final_segment_count
        ));

        lines.join("\n")
    }
}

/// Reduction ratio `1 - after / before`, 0 for empty input.
#[must_use]
pub fn reduction_ratio(before: usize, after: usize) -> f64 {
    if before == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = 1.0 - after as f64 / before as f64;
    ratio
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Build {
            edge_count,
            segment_count,
            degenerate_dropped,
        } => {
            format!("{edge_count} edges -> {segment_count} segments ({degenerate_dropped} dropped)")
        }
        StageMetrics::Signs { signs_attached } => format!("{signs_attached} signs"),
        StageMetrics::Simplification {
            tolerance,
            segments_before,
            segments_after,
            reduction_ratio,
        } => {
            format!(
                "tol={tolerance:.2}m {segments_before}->{segments_after} segments ({:.1}% reduction)",
                reduction_ratio * 100.0,
            )
        }
        StageMetrics::Bends {
            bend_count,
            min_angle,
            segments_in_bends,
        } => {
            format!("{bend_count} bends >= {min_angle:.1}deg, {segments_in_bends} segments")
        }
    }
}
