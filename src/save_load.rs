use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SimError};
use crate::evolution::Population;
use crate::reporting::GenerationSummary;

const CHECKPOINT_VERSION: u32 = 1;

/// Everything needed to continue evolving where a run stopped.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    /// Number of generations already evaluated.
    pub generation: u64,
    pub population: Population,
}

impl Checkpoint {
    pub fn new(generation: u64, population: Population) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            generation,
            population,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.version != CHECKPOINT_VERSION {
            return Err(SimError::CheckpointVersion {
                found: self.version,
                expected: CHECKPOINT_VERSION,
            });
        }
        if let Some(idx) = self
            .population
            .genomes
            .iter()
            .position(|g| !g.is_well_formed())
        {
            return Err(SimError::InvalidCheckpoint(format!(
                "genome {idx} has the wrong length or out-of-range genes"
            )));
        }
        Ok(())
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SimError + '_ {
    move |source| SimError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub fn save_to_file(checkpoint: &Checkpoint, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes = bincode::serialize(checkpoint)?;
    std::fs::write(path, bytes).map_err(io_error(path))
}

pub fn load_from_file(path: impl AsRef<Path>) -> Result<Checkpoint> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(io_error(path))?;
    let checkpoint: Checkpoint = bincode::deserialize(&bytes)?;
    if let Err(e) = checkpoint.validate() {
        warn!(path = %path.display(), error = %e, "rejecting checkpoint");
        return Err(e);
    }
    Ok(checkpoint)
}

/// Append one generation summary as a JSON line.
pub fn append_summary(summary: &GenerationSummary, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut line = serde_json::to_string(summary)?;
    line.push('\n');
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_error(path))?;
    file.write_all(line.as_bytes()).map_err(io_error(path))
}
