//! Core type definitions for the spam/ham classifier

use crate::core::{Result, SpamHamError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary class label, encoded as `label_num` 0 (ham) or 1 (spam)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Ham,
    Spam,
}

impl Label {
    /// Numeric encoding used by the dataset and the classifier
    pub fn as_u8(self) -> u8 {
        match self {
            Label::Ham => 0,
            Label::Spam => 1,
        }
    }

    /// Target value for the logistic loss
    pub fn target(self) -> f64 {
        f64::from(self.as_u8())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Ham => "ham",
            Label::Spam => "spam",
        }
    }
}

impl TryFrom<u8> for Label {
    type Error = SpamHamError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Label::Ham),
            1 => Ok(Label::Spam),
            other => Err(SpamHamError::Configuration(format!(
                "Invalid label: expected 0 or 1, got {other}"
            ))),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labeled email from the training dataset
#[derive(Debug, Clone, PartialEq)]
pub struct RawExample {
    pub text: String,
    pub label: Label,
}

impl RawExample {
    pub fn new(text: impl Into<String>, label: Label) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Prediction result containing label and spam probability
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label
    pub label: Label,
    /// Probability of the spam class under the learned boundary
    pub spam_probability: f64,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(label: Label, spam_probability: f64) -> Self {
        Self {
            label,
            spam_probability,
        }
    }

    /// Probability assigned to the predicted label
    pub fn confidence(&self) -> f64 {
        match self.label {
            Label::Spam => self.spam_probability,
            Label::Ham => 1.0 - self.spam_probability,
        }
    }
}

/// Sparse vector representation with sorted indices
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Compute L2 norm
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Dot product against a dense weight vector.
    ///
    /// Indices past the end of `dense` are ignored; callers check the
    /// dimension first with [`SparseVector::max_index`].
    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        self.indices
            .iter()
            .zip(self.values.iter())
            .filter_map(|(&i, &v)| dense.get(i).map(|w| w * v))
            .sum()
    }

    /// Largest stored index, if any
    pub fn max_index(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Hyper-parameters for logistic regression training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Inverse regularization strength
    pub c: f64,
    /// Gradient descent step size
    pub learning_rate: f64,
    /// Maximum number of full-batch iterations
    pub max_iterations: usize,
    /// Stop once the largest gradient component falls below this value
    pub tolerance: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            learning_rate: 1.0,
            max_iterations: 1000,
            tolerance: 1e-6,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.c > 0.0) {
            return Err(SpamHamError::Configuration(format!(
                "C must be positive, got {}",
                self.c
            )));
        }
        if !(self.learning_rate > 0.0) {
            return Err(SpamHamError::Configuration(format!(
                "Learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.max_iterations == 0 {
            return Err(SpamHamError::Configuration(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.tolerance < 0.0 {
            return Err(SpamHamError::Configuration(format!(
                "Tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Result of the optimization process
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Learned weights, one per feature
    pub weights: Vec<f64>,
    /// Bias term (b)
    pub bias: f64,
    /// Number of iterations performed
    pub iterations: usize,
    /// Final objective value
    pub objective_value: f64,
    /// Whether the gradient tolerance was reached
    pub converged: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_vector_creation() {
        let sv = SparseVector::new(vec![2, 0, 4], vec![2.0, 1.0, 3.0]);

        assert_eq!(sv.indices, vec![0, 2, 4]);
        assert_eq!(sv.values, vec![1.0, 2.0, 3.0]);
        assert_eq!(sv.max_index(), Some(4));
    }

    #[test]
    fn test_sparse_vector_empty() {
        let sv = SparseVector::empty();
        assert!(sv.is_empty());
        assert_eq!(sv.max_index(), None);
        assert_eq!(sv.norm(), 0.0);
    }

    #[test]
    fn test_sparse_vector_norm() {
        let sv = SparseVector::new(vec![0, 1], vec![3.0, 4.0]);
        assert_eq!(sv.norm_squared(), 25.0);
        assert_eq!(sv.norm(), 5.0);
    }

    #[test]
    fn test_dot_dense() {
        let sv = SparseVector::new(vec![0, 2], vec![1.0, 3.0]);
        assert_eq!(sv.dot_dense(&[2.0, 5.0, -1.0]), -1.0);
        assert_eq!(SparseVector::empty().dot_dense(&[1.0]), 0.0);
    }

    #[test]
    #[should_panic(expected = "Indices and values must have same length")]
    fn test_sparse_vector_length_mismatch() {
        SparseVector::new(vec![0, 1], vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_label_encoding() {
        assert_eq!(Label::try_from(0).unwrap(), Label::Ham);
        assert_eq!(Label::try_from(1).unwrap(), Label::Spam);
        assert!(Label::try_from(2).is_err());
        assert_eq!(Label::Spam.to_string(), "spam");
        assert_eq!(serde_json::to_string(&Label::Ham).unwrap(), "\"ham\"");
    }

    #[test]
    fn test_prediction_confidence() {
        let spam = Prediction::new(Label::Spam, 0.9);
        assert_eq!(spam.confidence(), 0.9);

        let ham = Prediction::new(Label::Ham, 0.25);
        assert_eq!(ham.confidence(), 0.75);
    }

    #[test]
    fn test_classifier_config_validation() {
        assert!(ClassifierConfig::default().validate().is_ok());

        let bad_c = ClassifierConfig {
            c: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            bad_c.validate(),
            Err(SpamHamError::Configuration(_))
        ));

        let bad_iter = ClassifierConfig {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(bad_iter.validate().is_err());
    }
}
