//! Deterministic train/test partitioning

use crate::core::{Dataset, RawExample, Result, SpamHamError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Parameters of a train/test split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of examples held out for evaluation, in (0, 1)
    pub test_size: f64,
    /// Seed for the shuffling permutation
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(SpamHamError::Configuration(format!(
                "Test size must be between 0 and 1, got: {}",
                self.test_size
            )));
        }
        Ok(())
    }
}

/// Disjoint train/test index sets over one dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl Split {
    /// View of the training examples
    pub fn train_subset<'a, D: Dataset>(&'a self, dataset: &'a D) -> Subset<'a, D> {
        Subset::new(dataset, &self.train)
    }

    /// View of the held-out examples
    pub fn test_subset<'a, D: Dataset>(&'a self, dataset: &'a D) -> Subset<'a, D> {
        Subset::new(dataset, &self.test)
    }
}

/// Shuffle `0..n` with a seeded RNG and cut off the test fraction.
///
/// The test partition holds `ceil(n * test_size)` examples. The same
/// `(n, config)` always yields the same split.
pub fn train_test_split(n: usize, config: &SplitConfig) -> Result<Split> {
    config.validate()?;

    let n_test = (n as f64 * config.test_size).ceil() as usize;
    let n_train = n.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(SpamHamError::Configuration(format!(
            "Split would result in empty train or test set (n={n}, n_train={n_train}, n_test={n_test})"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(config.seed);
    indices.shuffle(&mut rng);

    let test = indices.split_off(n_train);
    Ok(Split {
        train: indices,
        test,
    })
}

/// Borrowed view of selected examples of a dataset
pub struct Subset<'a, D: Dataset> {
    dataset: &'a D,
    indices: &'a [usize],
}

impl<'a, D: Dataset> Subset<'a, D> {
    pub fn new(dataset: &'a D, indices: &'a [usize]) -> Self {
        Self { dataset, indices }
    }

    pub fn indices(&self) -> &[usize] {
        self.indices
    }
}

impl<D: Dataset> Dataset for Subset<'_, D> {
    fn len(&self) -> usize {
        self.indices.len()
    }

    fn get_example(&self, i: usize) -> &RawExample {
        self.dataset.get_example(self.indices[i])
    }
}
