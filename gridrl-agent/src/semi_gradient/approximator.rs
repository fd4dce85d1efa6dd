//! Function approximators driven by the semi-gradient rules.
use gridrl_core::{FeatureVector, GridRlError};
use ndarray::{Array1, Array2};

/// An opaque function approximator.
///
/// The learning rule only sets an input, runs the forward computation, reads
/// the outputs and asks the approximator to move its outputs towards a target
/// vector; how it does so is up to the implementation.
pub trait FunctionApproximator {
    /// Input dimension.
    fn input_dim(&self) -> usize;

    /// Output dimension.
    fn output_dim(&self) -> usize;

    /// Sets the input for the next [`FunctionApproximator::calculate`].
    fn set_input(&mut self, x: &FeatureVector) -> Result<(), GridRlError>;

    /// Computes the outputs for the current input.
    fn calculate(&mut self);

    /// Outputs of the last [`FunctionApproximator::calculate`].
    fn output(&self) -> &[f64];

    /// Moves the outputs for the current input towards `target`.
    fn learn(&mut self, target: &[f64]);
}

/// Linear model `y = W x` trained by the delta rule.
#[derive(Clone, Debug)]
pub struct LinearApproximator {
    weights: Array2<f64>,
    input: Array1<f64>,
    output: Vec<f64>,
    learning_rate: f64,
}

impl LinearApproximator {
    /// Zero-initialized model with `output_dim` outputs.
    pub fn new(input_dim: usize, output_dim: usize, learning_rate: f64) -> Self {
        Self {
            weights: Array2::zeros((output_dim, input_dim)),
            input: Array1::zeros(input_dim),
            output: vec![0.0; output_dim],
            learning_rate,
        }
    }

    /// Weight matrix, one row per output.
    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }
}

impl FunctionApproximator for LinearApproximator {
    fn input_dim(&self) -> usize {
        self.weights.ncols()
    }

    fn output_dim(&self) -> usize {
        self.weights.nrows()
    }

    fn set_input(&mut self, x: &FeatureVector) -> Result<(), GridRlError> {
        x.check_dim(self.input_dim())?;
        self.input = Array1::from(x.as_slice().to_vec());
        Ok(())
    }

    fn calculate(&mut self) {
        self.output = self.weights.dot(&self.input).to_vec();
    }

    fn output(&self) -> &[f64] {
        &self.output
    }

    fn learn(&mut self, target: &[f64]) {
        for (i, (t, y)) in target.iter().zip(self.output.iter()).enumerate() {
            let err = t - y;
            if err != 0.0 {
                let mut row = self.weights.row_mut(i);
                row.scaled_add(self.learning_rate * err, &self.input);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_linear_learns_single_output() {
        let mut f = LinearApproximator::new(3, 2, 0.5);
        f.set_input(&FeatureVector::new(vec![1.0, 0.0, 2.0])).unwrap();
        f.calculate();
        assert_eq!(f.output(), &[0.0, 0.0]);

        f.learn(&[0.0, 1.0]);
        assert_eq!(f.weights().row(0).to_vec(), vec![0.0, 0.0, 0.0]);
        assert_eq!(f.weights().row(1).to_vec(), vec![0.5, 0.0, 1.0]);

        f.calculate();
        assert_eq!(f.output(), &[0.0, 2.5]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut f = LinearApproximator::new(3, 2, 0.5);
        assert_eq!(
            f.set_input(&FeatureVector::new(vec![1.0])),
            Err(GridRlError::DimensionMismatch {
                expected: 3,
                actual: 1
            })
        );
    }
}
