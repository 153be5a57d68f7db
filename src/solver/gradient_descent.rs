//! Full-batch gradient descent for L2-regularized logistic regression
//!
//! Minimizes
//!
//! ```text
//! J(w, b) = (1/n) Σ logloss(y_i, w·x_i + b) + ‖w‖² / (2·C·n)
//! ```
//!
//! which is the usual `C`-parameterized objective divided by `n`. The
//! intercept is not regularized. Each step halves its size until the
//! objective does not increase, so large learning rates cannot diverge. If
//! no step down to `MIN_STEP` helps, the current iterate is kept and the
//! solver stops without reporting convergence.

use crate::core::{ClassifierConfig, OptimizationResult, Result, SparseVector, SpamHamError};
use log::{debug, warn};

/// Smallest step tried before an iteration gives up on decreasing J
const MIN_STEP: f64 = 1e-12;

/// Logistic function, stable for large |z|
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Log loss of a single example given its decision value
fn log_loss(target: f64, z: f64) -> f64 {
    // ln(1 + e^z) - y·z
    let softplus = if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    };
    softplus - target * z
}

/// Gradient descent solver over sparse feature vectors
pub struct GradientDescentSolver {
    config: ClassifierConfig,
}

impl GradientDescentSolver {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Fit weights and bias.
    ///
    /// `targets` are 0.0 / 1.0; every feature index must be below `n_features`.
    pub fn solve(
        &self,
        features: &[SparseVector],
        targets: &[f64],
        n_features: usize,
    ) -> Result<OptimizationResult> {
        self.config.validate()?;
        if features.len() != targets.len() {
            return Err(SpamHamError::DimensionMismatch {
                expected: features.len(),
                actual: targets.len(),
            });
        }
        if features.is_empty() {
            return Err(SpamHamError::Configuration(
                "Cannot fit classifier on an empty training set".to_string(),
            ));
        }
        if let Some(max) = features.iter().filter_map(SparseVector::max_index).max() {
            if max >= n_features {
                return Err(SpamHamError::DimensionMismatch {
                    expected: n_features,
                    actual: max + 1,
                });
            }
        }

        let n = features.len() as f64;
        let reg = 1.0 / (self.config.c * n);

        let mut weights = vec![0.0; n_features];
        let mut bias = 0.0;
        let mut iterations = 0;
        let mut converged = false;

        let mut objective = self.objective(features, targets, &weights, bias, reg);

        let mut stalled = false;
        while iterations < self.config.max_iterations {
            let (grad_w, grad_b) = self.gradient(features, targets, &weights, bias, reg);
            let max_grad = grad_w
                .iter()
                .fold(grad_b.abs(), |acc, g| acc.max(g.abs()));
            if max_grad < self.config.tolerance {
                converged = true;
                break;
            }

            let mut step = self.config.learning_rate;
            let accepted = loop {
                if step < MIN_STEP {
                    break None;
                }
                let candidate: Vec<f64> = weights
                    .iter()
                    .zip(grad_w.iter())
                    .map(|(w, g)| w - step * g)
                    .collect();
                let candidate_bias = bias - step * grad_b;
                let candidate_objective =
                    self.objective(features, targets, &candidate, candidate_bias, reg);

                if candidate_objective <= objective {
                    break Some((candidate, candidate_bias, candidate_objective));
                }
                step /= 2.0;
            };

            // No step size down to MIN_STEP decreases J: keep the current iterate
            let Some((candidate, candidate_bias, candidate_objective)) = accepted else {
                stalled = true;
                break;
            };
            weights = candidate;
            bias = candidate_bias;
            objective = candidate_objective;
            iterations += 1;
        }

        if converged {
            debug!("Gradient descent converged after {iterations} iterations");
        } else if stalled {
            warn!(
                "Gradient descent stalled after {iterations} iterations: no step above {MIN_STEP} decreases the objective (tolerance {})",
                self.config.tolerance
            );
        } else {
            warn!(
                "Gradient descent stopped at max_iterations={} before reaching tolerance {}",
                self.config.max_iterations, self.config.tolerance
            );
        }

        Ok(OptimizationResult {
            weights,
            bias,
            iterations,
            objective_value: objective,
            converged,
        })
    }

    fn objective(
        &self,
        features: &[SparseVector],
        targets: &[f64],
        weights: &[f64],
        bias: f64,
        reg: f64,
    ) -> f64 {
        let n = features.len() as f64;
        let loss: f64 = features
            .iter()
            .zip(targets.iter())
            .map(|(x, &y)| log_loss(y, x.dot_dense(weights) + bias))
            .sum();
        let penalty: f64 = weights.iter().map(|w| w * w).sum();
        loss / n + 0.5 * reg * penalty
    }

    fn gradient(
        &self,
        features: &[SparseVector],
        targets: &[f64],
        weights: &[f64],
        bias: f64,
        reg: f64,
    ) -> (Vec<f64>, f64) {
        let n = features.len() as f64;
        let mut grad_w = vec![0.0; weights.len()];
        let mut grad_b = 0.0;

        for (x, &y) in features.iter().zip(targets.iter()) {
            let error = sigmoid(x.dot_dense(weights) + bias) - y;
            grad_b += error;
            for (&i, &v) in x.indices.iter().zip(x.values.iter()) {
                grad_w[i] += error * v;
            }
        }

        for (g, w) in grad_w.iter_mut().zip(weights.iter()) {
            *g = *g / n + reg * w;
        }

        (grad_w, grad_b / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn separable() -> (Vec<SparseVector>, Vec<f64>) {
        let features = vec![
            SparseVector::new(vec![0], vec![1.0]),
            SparseVector::new(vec![0], vec![0.8]),
            SparseVector::new(vec![1], vec![1.0]),
            SparseVector::new(vec![1], vec![0.9]),
        ];
        (features, vec![1.0, 1.0, 0.0, 0.0])
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(40.0) > 0.999_999);
        assert!(sigmoid(-800.0) >= 0.0);
        assert_relative_eq!(sigmoid(2.0) + sigmoid(-2.0), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_log_loss_stable() {
        assert_relative_eq!(log_loss(1.0, 0.0), std::f64::consts::LN_2);
        assert!(log_loss(1.0, 1000.0).is_finite());
        assert!(log_loss(0.0, -1000.0).is_finite());
    }

    #[test]
    fn test_solver_separates_classes() {
        let (features, targets) = separable();
        let solver = GradientDescentSolver::new(ClassifierConfig::default());
        let result = solver.solve(&features, &targets, 2).unwrap();

        assert!(result.weights[0] > 0.0);
        assert!(result.weights[1] < 0.0);
        assert!(result.iterations > 0);
        assert!(result.objective_value < std::f64::consts::LN_2);
    }

    #[test]
    fn test_objective_never_increases_with_large_step() {
        let (features, targets) = separable();
        let config = ClassifierConfig {
            learning_rate: 500.0,
            max_iterations: 50,
            ..Default::default()
        };
        let result = GradientDescentSolver::new(config)
            .solve(&features, &targets, 2)
            .unwrap();

        assert!(result.objective_value.is_finite());
        assert!(result.objective_value <= std::f64::consts::LN_2);
    }

    #[test]
    fn test_objective_monotone_without_tolerance() {
        let (features, targets) = separable();
        let run = |max_iterations| {
            let config = ClassifierConfig {
                tolerance: 0.0,
                max_iterations,
                ..Default::default()
            };
            GradientDescentSolver::new(config)
                .solve(&features, &targets, 2)
                .unwrap()
        };

        // A zero tolerance is never met, so only max_iterations or a stall stops it
        let mut previous = std::f64::consts::LN_2;
        for max_iterations in [1, 10, 100, 1000, 5000] {
            let result = run(max_iterations);
            assert!(!result.converged);
            assert!(result.iterations <= max_iterations);
            assert!(result.objective_value.is_finite());
            assert!(result.objective_value <= previous);
            previous = result.objective_value;
        }
    }

    #[test]
    fn test_solver_rejects_bad_input() {
        let (features, targets) = separable();
        let solver = GradientDescentSolver::new(ClassifierConfig::default());

        assert!(matches!(
            solver.solve(&features, &targets[..3], 2),
            Err(SpamHamError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            solver.solve(&features, &targets, 1),
            Err(SpamHamError::DimensionMismatch {
                expected: 1,
                actual: 2
            })
        ));
        assert!(matches!(
            solver.solve(&[], &[], 2),
            Err(SpamHamError::Configuration(_))
        ));
    }
}
