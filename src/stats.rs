//! Rolling per-generation statistics for graph display and logging.

use std::collections::VecDeque;

use crate::evaluator::GenerationReport;
use crate::reporting::MetricSummary;

/// The most recent `capacity` samples of one metric, oldest first.
pub struct RingBuffer {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<f32> {
        self.samples.back().copied()
    }

    pub fn max(&self) -> Option<f32> {
        self.iter().reduce(f32::max)
    }
}

/// Best and mean fitness, one sample per generation.
pub struct FitnessHistory {
    pub best: RingBuffer,
    pub mean: RingBuffer,
}

impl FitnessHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            best: RingBuffer::new(capacity),
            mean: RingBuffer::new(capacity),
        }
    }

    pub fn record(&mut self, report: &GenerationReport) {
        let spread = MetricSummary::of(report.fitness.values().copied());
        self.best.push(spread.max as f32);
        self.mean.push(spread.mean as f32);
    }
}
