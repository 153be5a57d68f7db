//! Logistic regression classifier
//!
//! [`LogisticRegression`] carries the hyper-parameters and trains a
//! [`FittedClassifier`], which holds only the learned weights and bias and
//! is never modified afterwards.

use crate::core::{
    BinaryClassifier, ClassifierConfig, Label, OptimizationResult, Prediction, Result,
    SparseVector, SpamHamError,
};
use crate::metrics::EvaluationMetrics;
use crate::solver::{sigmoid, GradientDescentSolver};
use log::info;
use serde::{Deserialize, Serialize};

/// Logistic regression trainer with builder pattern
#[derive(Debug, Clone, Default)]
pub struct LogisticRegression {
    config: ClassifierConfig,
}

impl LogisticRegression {
    /// Create a trainer with default parameters (C = 1.0)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Set inverse regularization strength C
    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    /// Set gradient descent step size
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.config.learning_rate = learning_rate;
        self
    }

    /// Set maximum number of iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set convergence tolerance on the gradient
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Train on feature vectors of dimension `n_features`
    pub fn fit(
        &self,
        features: &[SparseVector],
        labels: &[Label],
        n_features: usize,
    ) -> Result<FittedClassifier> {
        let (model, _) = self.fit_with_result(features, labels, n_features)?;
        Ok(model)
    }

    /// Train and also return the optimizer's convergence details
    pub fn fit_with_result(
        &self,
        features: &[SparseVector],
        labels: &[Label],
        n_features: usize,
    ) -> Result<(FittedClassifier, OptimizationResult)> {
        if features.len() != labels.len() {
            return Err(SpamHamError::DimensionMismatch {
                expected: features.len(),
                actual: labels.len(),
            });
        }

        let targets: Vec<f64> = labels.iter().map(|l| l.target()).collect();
        let result = GradientDescentSolver::new(self.config.clone()).solve(
            features,
            &targets,
            n_features,
        )?;

        info!(
            "Classifier trained: {} samples, {} features, {} iterations, objective {:.6}",
            features.len(),
            n_features,
            result.iterations,
            result.objective_value
        );

        let model = FittedClassifier {
            weights: result.weights.clone(),
            bias: result.bias,
        };
        Ok((model, result))
    }
}

/// Learned decision boundary: weights over the feature dimension plus bias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedClassifier {
    weights: Vec<f64>,
    bias: f64,
}

impl FittedClassifier {
    /// Build a classifier from known parameters
    pub fn from_parameters(weights: Vec<f64>, bias: f64) -> Self {
        Self { weights, bias }
    }

    /// Decision value w·x + b
    pub fn decision_function(&self, features: &SparseVector) -> Result<f64> {
        self.ensure_fitted()?;
        if let Some(max) = features.max_index() {
            if max >= self.weights.len() {
                return Err(SpamHamError::DimensionMismatch {
                    expected: self.weights.len(),
                    actual: max + 1,
                });
            }
        }
        Ok(features.dot_dense(&self.weights) + self.bias)
    }

    /// Probability of the spam class
    pub fn predict_proba(&self, features: &SparseVector) -> Result<f64> {
        Ok(sigmoid(self.decision_function(features)?))
    }

    pub fn ensure_fitted(&self) -> Result<()> {
        if self.weights.is_empty() {
            return Err(SpamHamError::NotFitted(
                "classifier has no weights".to_string(),
            ));
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(SpamHamError::NotFitted(
                "classifier parameters are not finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Confusion-matrix metrics with spam as the positive class
    pub fn evaluate_detailed(
        &self,
        features: &[SparseVector],
        labels: &[Label],
    ) -> Result<EvaluationMetrics> {
        if features.len() != labels.len() {
            return Err(SpamHamError::DimensionMismatch {
                expected: features.len(),
                actual: labels.len(),
            });
        }
        let predictions = self.predict_batch(features)?;
        let predicted: Vec<Label> = predictions.iter().map(|p| p.label).collect();
        Ok(EvaluationMetrics::from_labels(&predicted, labels))
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

impl BinaryClassifier for FittedClassifier {
    /// Spam only when P(spam) > 0.5; an exact 0.5 is ham.
    fn predict(&self, features: &SparseVector) -> Result<Prediction> {
        let p = self.predict_proba(features)?;
        let label = if p > 0.5 { Label::Spam } else { Label::Ham };
        Ok(Prediction::new(label, p))
    }

    fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn bias(&self) -> f64 {
        self.bias
    }
}
