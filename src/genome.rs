use ::rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{self, HIDDEN_NEURONS, NUM_ACTIONS, NUM_RADARS};

pub const INPUTS: usize = NUM_RADARS;
pub const HIDDEN: usize = HIDDEN_NEURONS;
pub const OUTPUTS: usize = NUM_ACTIONS;

// Gene layout: [input->hidden weights] [hidden biases] [hidden->output weights] [output biases]
const W1_START: usize = 0;
const B1_START: usize = W1_START + HIDDEN * INPUTS;
const W2_START: usize = B1_START + HIDDEN;
const B2_START: usize = W2_START + OUTPUTS * HIDDEN;

pub const GENOME_SIZE: usize = B2_START + OUTPUTS; // 30 + 6 + 24 + 4 = 64

/// Weight range after decoding: genes in [0, 1] map to [-WEIGHT_SPAN/2, WEIGHT_SPAN/2].
const WEIGHT_SPAN: f32 = 4.0;

/// Flat encoding of a feed-forward policy network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    /// Raw gene values, all in [0, 1].
    pub genes: Vec<f32>,
}

impl Genome {
    pub fn random(rng: &mut impl Rng) -> Self {
        let genes: Vec<f32> = (0..GENOME_SIZE).map(|_| rng.gen_range(0.0..1.0)).collect();
        Self { genes }
    }

    /// All weights and biases decode to zero.
    pub fn neutral() -> Self {
        Self {
            genes: vec![0.5; GENOME_SIZE],
        }
    }

    /// Mutate this genome, returning a new child genome.
    pub fn mutate(&self, rng: &mut impl Rng) -> Self {
        let mut child = self.clone();
        let sigma = config::MUTATION_SIGMA;

        for gene in &mut child.genes {
            if rng.gen::<f32>() < config::MUTATION_RATE {
                *gene += rng.gen_range(-sigma..sigma);
                *gene = gene.clamp(0.0, 1.0);
            }
        }

        child
    }

    pub fn is_well_formed(&self) -> bool {
        self.genes.len() == GENOME_SIZE && self.genes.iter().all(|g| (0.0..=1.0).contains(g))
    }

    #[inline]
    fn decode(gene: f32) -> f32 {
        (gene - 0.5) * WEIGHT_SPAN
    }

    /// Weight from input `from` into hidden neuron `to`.
    pub fn hidden_weight(&self, to: usize, from: usize) -> f32 {
        Self::decode(self.genes[W1_START + to * INPUTS + from])
    }

    pub fn hidden_bias(&self, i: usize) -> f32 {
        Self::decode(self.genes[B1_START + i])
    }

    /// Weight from hidden neuron `from` into output `to`.
    pub fn output_weight(&self, to: usize, from: usize) -> f32 {
        Self::decode(self.genes[W2_START + to * HIDDEN + from])
    }

    pub fn output_bias(&self, i: usize) -> f32 {
        Self::decode(self.genes[B2_START + i])
    }

    #[cfg(test)]
    pub(crate) fn output_bias_gene_mut(&mut self, i: usize) -> &mut f32 {
        &mut self.genes[B2_START + i]
    }
}
