//! Radar-guided cars on a pixel-mask track, evaluated one generation at a time.
//!
//! The core is `evaluator::PopulationEvaluator`: give it a `track::BoundaryMask`
//! and one `policy::Policy` per agent, and it returns accumulated fitness per
//! policy id. Everything else (genomes, the evolution loop, checkpoints) is a
//! reference driver around that core.

pub mod brain;
pub mod car;
pub mod collision;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod evolution;
pub mod genome;
pub mod observer;
pub mod policy;
pub mod radar;
pub mod reporting;
pub mod save_load;
pub mod stats;
pub mod track;

pub use config::SimConfig;
pub use error::{Result, SimError};
pub use evaluator::{FinishReason, GenerationReport, GenerationRun, PopulationEvaluator};
pub use policy::{Action, Policy, PolicyId, SensorVector};
pub use track::{BoundaryMask, TrackMask};
