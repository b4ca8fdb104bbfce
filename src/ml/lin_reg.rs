//! Single-feature linear regression trained by batch gradient descent.
//!
//! ```text
//!   y = weight · x + bias
//! ```
//!
//! The model borrows its training data for its whole lifetime and never
//! rebinds it. The effective training-set size is the shorter of the two
//! slices; any trailing excess in the longer one is ignored.
//!
//! ## Gradient
//!
//! Each epoch computes the true mean-squared-error gradient over the whole
//! set, scaled by `2 / N`:
//!
//! | Parameter | Gradient                      |
//! |-----------|-------------------------------|
//! | weight    | (2/N) · Σ (ŷᵢ − yᵢ) · xᵢ      |
//! | bias      | (2/N) · Σ (ŷᵢ − yᵢ)           |

use crate::error::TrainError;

use super::Predictor;

/// Initial value of both parameters before any training.
const INITIAL_PARAM: f64 = 0.5;

/// Sensor calibration data for a TMP36: 0.0–1.0 V maps linearly to
/// -50–50 °C (`T = 100 · V − 50`).
pub struct TrainingSet;

impl TrainingSet {
    pub const INPUT_VOLTS: [f64; 11] = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];
    pub const OUTPUT_CELSIUS: [f64; 11] =
        [-50.0, -40.0, -30.0, -20.0, -10.0, 0.0, 10.0, 20.0, 30.0, 40.0, 50.0];
}

#[derive(Debug)]
pub struct LinReg<'a> {
    inputs: &'a [f64],
    outputs: &'a [f64],
    count: usize,
    weight: f64,
    bias: f64,
}

impl<'a> LinReg<'a> {
    pub fn new(inputs: &'a [f64], outputs: &'a [f64]) -> Self {
        Self {
            inputs,
            outputs,
            count: inputs.len().min(outputs.len()),
            weight: INITIAL_PARAM,
            bias: INITIAL_PARAM,
        }
    }

    /// Run `epoch_count` epochs of batch gradient descent, continuing from
    /// the current parameters.
    ///
    /// Rejected arguments leave the parameters untouched.
    pub fn train(&mut self, epoch_count: u32, learning_rate: f64) -> Result<(), TrainError> {
        if self.count == 0 {
            return Err(TrainError::EmptyTrainingSet);
        }
        if epoch_count == 0 {
            return Err(TrainError::ZeroEpochs);
        }
        if learning_rate.is_nan() || learning_rate <= 0.0 {
            return Err(TrainError::InvalidLearningRate);
        }

        let (inputs, outputs, count) = (self.inputs, self.outputs, self.count);
        let scale = 2.0 / count as f64;

        // Epochs are strictly sequential: each starts from the previous update.
        for _ in 0..epoch_count {
            let (mut grad_w, mut grad_b) = (0.0, 0.0);
            for (&x, &y) in inputs.iter().zip(outputs).take(count) {
                let err = self.weight * x + self.bias - y;
                grad_w += err * x;
                grad_b += err;
            }
            self.weight -= learning_rate * grad_w * scale;
            self.bias -= learning_rate * grad_b * scale;
        }
        Ok(())
    }

    /// Mean squared error over the effective training set (`None` if empty).
    pub fn mse(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        let sum: f64 = self
            .inputs
            .iter()
            .zip(self.outputs)
            .take(self.count)
            .map(|(&x, &y)| {
                let err = self.predict(x) - y;
                err * err
            })
            .sum();
        Some(sum / self.count as f64)
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Effective training-set size.
    pub fn sample_count(&self) -> usize {
        self.count
    }

    /// Training inputs actually used (truncated to the effective size).
    pub fn inputs(&self) -> &'a [f64] {
        &self.inputs[..self.count]
    }
}

impl Predictor for LinReg<'_> {
    fn predict(&self, input: f64) -> f64 {
        self.weight * input + self.bias
    }
}
