use ::rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::brain::FeedForwardNet;
use crate::config;
use crate::evaluator::GenerationReport;
use crate::genome::Genome;
use crate::policy::{Policy, PolicyId};

/// A simple elitist genetic optimiser over feed-forward genomes.
///
/// Policy ids are positions in `genomes`, so a report from the evaluator maps
/// straight back onto the population that produced it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Population {
    pub genomes: Vec<Genome>,
    rng: ChaCha8Rng,
}

impl Population {
    pub fn random(size: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let genomes = (0..size).map(|_| Genome::random(&mut rng)).collect();
        Self { genomes, rng }
    }

    pub fn networks(&self) -> Vec<FeedForwardNet> {
        self.genomes.iter().map(FeedForwardNet::from_genome).collect()
    }

    /// Pair each network with its policy id for `PopulationEvaluator::begin`.
    pub fn policies(nets: &[FeedForwardNet]) -> Vec<(PolicyId, &dyn Policy)> {
        nets.iter()
            .enumerate()
            .map(|(i, net)| (i as PolicyId, net as &dyn Policy))
            .collect()
    }

    /// Breed the next population from a finished generation's fitness.
    ///
    /// The top `ELITE_FRACTION` survive unchanged; the rest are mutated
    /// tournament winners.
    pub fn evolve(&mut self, report: &GenerationReport) {
        let size = self.genomes.len();
        if size == 0 {
            return;
        }

        let fitness: Vec<f64> = (0..size)
            .map(|i| report.fitness.get(&(i as PolicyId)).copied().unwrap_or(0.0))
            .collect();
        let mut ranked: Vec<usize> = (0..size).collect();
        ranked.sort_by(|a, b| fitness[*b].total_cmp(&fitness[*a]).then(a.cmp(b)));

        let elite_count = ((size as f32 * config::ELITE_FRACTION).ceil() as usize).clamp(1, size);
        let mut next: Vec<Genome> = ranked[..elite_count]
            .iter()
            .map(|i| self.genomes[*i].clone())
            .collect();

        while next.len() < size {
            let parent = self.tournament(&fitness);
            next.push(self.genomes[parent].mutate(&mut self.rng));
        }

        info!(
            generation = report.generation,
            best = fitness[ranked[0]],
            elites = elite_count,
            "population evolved"
        );
        self.genomes = next;
    }

    fn tournament(&mut self, fitness: &[f64]) -> usize {
        let mut best = self.rng.gen_range(0..fitness.len());
        for _ in 1..config::TOURNAMENT_SIZE {
            let candidate = self.rng.gen_range(0..fitness.len());
            if fitness[candidate] > fitness[best] {
                best = candidate;
            }
        }
        best
    }
}
