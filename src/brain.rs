use crate::genome::{Genome, HIDDEN, INPUTS, OUTPUTS};
use crate::policy::{Action, Policy, SensorVector};

/// Decoded two-layer network: tanh hidden layer, sigmoid outputs, one output per action.
#[derive(Clone, Debug)]
pub struct FeedForwardNet {
    hidden_weights: [[f32; INPUTS]; HIDDEN],
    hidden_biases: [f32; HIDDEN],
    output_weights: [[f32; HIDDEN]; OUTPUTS],
    output_biases: [f32; OUTPUTS],
}

impl FeedForwardNet {
    pub fn from_genome(genome: &Genome) -> Self {
        let mut net = Self {
            hidden_weights: [[0.0; INPUTS]; HIDDEN],
            hidden_biases: [0.0; HIDDEN],
            output_weights: [[0.0; HIDDEN]; OUTPUTS],
            output_biases: [0.0; OUTPUTS],
        };
        for to in 0..HIDDEN {
            for from in 0..INPUTS {
                net.hidden_weights[to][from] = genome.hidden_weight(to, from);
            }
            net.hidden_biases[to] = genome.hidden_bias(to);
        }
        for to in 0..OUTPUTS {
            for from in 0..HIDDEN {
                net.output_weights[to][from] = genome.output_weight(to, from);
            }
            net.output_biases[to] = genome.output_bias(to);
        }
        net
    }

    /// One score per action in `Action::ALL` order. Sensor values are fed in unscaled.
    pub fn activate(&self, sensors: &SensorVector) -> [f32; OUTPUTS] {
        let mut hidden = [0.0f32; HIDDEN];
        for (h, value) in hidden.iter_mut().enumerate() {
            let mut sum = self.hidden_biases[h];
            for (i, s) in sensors.iter().enumerate() {
                sum += self.hidden_weights[h][i] * *s as f32;
            }
            *value = sum.tanh();
        }

        let mut outputs = [0.0f32; OUTPUTS];
        for (o, value) in outputs.iter_mut().enumerate() {
            let mut sum = self.output_biases[o];
            for (h, a) in hidden.iter().enumerate() {
                sum += self.output_weights[o][h] * a;
            }
            *value = sigmoid(sum);
        }
        outputs
    }
}

impl Policy for FeedForwardNet {
    fn decide(&self, sensors: &SensorVector) -> Action {
        Action::from_scores(&self.activate(sensors))
    }
}

#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
