use serde::{Deserialize, Serialize};

use crate::config::{NUM_ACTIONS, NUM_RADARS};

/// Quantised radar distances, one per fixed offset.
pub type SensorVector = [i32; NUM_RADARS];

/// Identifies a policy across a generation's report.
pub type PolicyId = u64;

/// The four discrete controls a policy can pick each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    TurnLeft,
    TurnRight,
    Slow,
    SpeedUp,
}

impl Action {
    pub const ALL: [Action; NUM_ACTIONS] = [
        Action::TurnLeft,
        Action::TurnRight,
        Action::Slow,
        Action::SpeedUp,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            Action::TurnLeft => 0,
            Action::TurnRight => 1,
            Action::Slow => 2,
            Action::SpeedUp => 3,
        }
    }

    /// Pick the highest score; ties go to the lowest index and NaN never wins.
    pub fn from_scores(scores: &[f32; NUM_ACTIONS]) -> Self {
        let mut best = 0;
        for i in 1..NUM_ACTIONS {
            if scores[i] > scores[best] || scores[best].is_nan() {
                best = i;
            }
        }
        Self::ALL[best]
    }
}

/// Maps sensor readings to one action per tick. Must be deterministic for a
/// given input or generations stop being reproducible.
pub trait Policy {
    fn decide(&self, sensors: &SensorVector) -> Action;
}

impl<F> Policy for F
where
    F: Fn(&SensorVector) -> Action,
{
    fn decide(&self, sensors: &SensorVector) -> Action {
        self(sensors)
    }
}
