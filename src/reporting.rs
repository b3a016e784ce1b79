use serde::{Deserialize, Serialize};

use crate::evaluator::{FinishReason, GenerationReport};

/// Spread of one generation's fitness values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p90: f64,
}

impl MetricSummary {
    /// Nearest-rank percentiles over `values`; all zeroes when there are none.
    pub fn of(values: impl IntoIterator<Item = f64>) -> Self {
        let mut sorted: Vec<f64> = values.into_iter().collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let rank = |p: f64| sorted[((p * n as f64).ceil() as usize).clamp(1, n) - 1];
        Self {
            count: n,
            min: sorted[0],
            max: sorted[n - 1],
            mean: sorted.iter().sum::<f64>() / n as f64,
            p50: rank(0.50),
            p90: rank(0.90),
        }
    }
}

/// One line of the headless run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: u64,
    pub ticks: u32,
    pub finish: FinishReason,
    pub survivors: usize,
    pub fitness: MetricSummary,
}

impl GenerationSummary {
    pub fn from_report(report: &GenerationReport) -> Self {
        Self {
            generation: report.generation,
            ticks: report.ticks,
            finish: report.finish,
            survivors: report.survivors,
            fitness: MetricSummary::of(report.fitness.values().copied()),
        }
    }
}
