//! Core traits for the spam/ham classifier

use crate::core::{Label, Prediction, RawExample, Result, SparseVector, SpamHamError};

/// Labeled dataset abstraction
pub trait Dataset: Send + Sync {
    /// Number of examples in the dataset
    fn len(&self) -> usize;

    /// Get a single example by index
    ///
    /// # Panics
    /// Panics if index >= len()
    fn get_example(&self, i: usize) -> &RawExample;

    /// Get all labels in dataset order
    fn get_labels(&self) -> Vec<Label> {
        (0..self.len()).map(|i| self.get_example(i).label).collect()
    }

    /// Get all texts in dataset order
    fn get_texts(&self) -> Vec<&str> {
        (0..self.len())
            .map(|i| self.get_example(i).text.as_str())
            .collect()
    }

    /// Check if the dataset is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Trained binary classifier over sparse feature vectors
pub trait BinaryClassifier: Send + Sync {
    /// Predict a single feature vector
    fn predict(&self, features: &SparseVector) -> Result<Prediction>;

    /// Predict multiple feature vectors
    fn predict_batch(&self, features: &[SparseVector]) -> Result<Vec<Prediction>> {
        features.iter().map(|f| self.predict(f)).collect()
    }

    /// Fraction of exact label matches
    fn score(&self, features: &[SparseVector], labels: &[Label]) -> Result<f64> {
        if features.len() != labels.len() {
            return Err(SpamHamError::DimensionMismatch {
                expected: features.len(),
                actual: labels.len(),
            });
        }
        if labels.is_empty() {
            return Err(SpamHamError::Configuration(
                "Cannot score an empty evaluation set".to_string(),
            ));
        }

        let predictions = self.predict_batch(features)?;
        let correct = predictions
            .iter()
            .zip(labels.iter())
            .filter(|(pred, &actual)| pred.label == actual)
            .count();

        Ok(correct as f64 / labels.len() as f64)
    }

    /// Feature dimension the classifier was trained on
    fn n_features(&self) -> usize;

    /// Get the bias term
    fn bias(&self) -> f64;
}
