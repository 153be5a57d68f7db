//! TF-IDF feature extraction
//!
//! [`TfidfVectorizer`] holds the configuration; fitting it on the training
//! texts produces a [`FittedVectorizer`] whose vocabulary and weights never
//! change afterwards. Inputs are expected to be normalized already
//! (see [`crate::text::normalize`]).
//!
//! Weighting:
//!
//! ```text
//! idf(t)      = ln((1 + n) / (1 + df(t))) + 1
//! tfidf(t, d) = count(t, d) * idf(t)
//! ```
//!
//! followed by L2 normalization of each document vector.

use crate::core::{Result, SparseVector, SpamHamError};
use crate::text::{is_stop_word, tokenize};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Default vocabulary cap
pub const DEFAULT_MAX_FEATURES: usize = 5000;

/// Vectorizer settings, recorded in the fitted artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Maximum vocabulary size
    pub max_features: usize,
    /// Drop English stop words before building the vocabulary
    pub english_stop_words: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
            english_stop_words: true,
        }
    }
}

impl VectorizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(SpamHamError::Configuration(
                "Vocabulary cap (max_features) must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Unfitted TF-IDF vectorizer with builder-style configuration
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: VectorizerConfig) -> Self {
        Self { config }
    }

    /// Set the vocabulary cap
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.config.max_features = max_features;
        self
    }

    /// Enable or disable English stop-word removal
    pub fn with_stop_words(mut self, enabled: bool) -> Self {
        self.config.english_stop_words = enabled;
        self
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// Learn the vocabulary and document frequencies from `texts`
    pub fn fit<S: AsRef<str>>(&self, texts: &[S]) -> Result<FittedVectorizer> {
        self.config.validate()?;
        if texts.is_empty() {
            return Err(SpamHamError::Configuration(
                "Cannot fit vectorizer on an empty corpus".to_string(),
            ));
        }

        let mut term_counts: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();

        for text in texts {
            let mut seen: HashSet<&str> = HashSet::new();
            for token in tokenize(text.as_ref()) {
                if self.config.english_stop_words && is_stop_word(token) {
                    continue;
                }
                *term_counts.entry(token).or_insert(0) += 1;
                if seen.insert(token) {
                    *doc_freq.entry(token).or_insert(0) += 1;
                }
            }
        }

        if term_counts.is_empty() {
            return Err(SpamHamError::Configuration(
                "Empty vocabulary: the corpus contains only stop words or no terms".to_string(),
            ));
        }

        // Most frequent terms first, ties by term so the cut is deterministic
        let mut ranked: Vec<(&str, usize)> = term_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.config.max_features);

        let mut terms: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
        terms.sort_unstable();

        let n_documents = texts.len();
        let mut vocabulary = BTreeMap::new();
        let mut document_frequencies = Vec::with_capacity(terms.len());
        let mut idf = Vec::with_capacity(terms.len());

        for (idx, term) in terms.into_iter().enumerate() {
            let df = doc_freq.get(term).copied().unwrap_or(0);
            vocabulary.insert(term.to_string(), idx);
            document_frequencies.push(df);
            idf.push(smoothed_idf(n_documents, df));
        }

        debug!(
            "Fitted vectorizer: {} documents, {} terms",
            n_documents,
            vocabulary.len()
        );

        Ok(FittedVectorizer {
            vocabulary,
            document_frequencies,
            idf,
            n_documents,
            config: self.config.clone(),
        })
    }
}

fn smoothed_idf(n_documents: usize, df: usize) -> f64 {
    ((1.0 + n_documents as f64) / (1.0 + df as f64)).ln() + 1.0
}

/// Frozen vocabulary plus term weights learned from the training texts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedVectorizer {
    vocabulary: BTreeMap<String, usize>,
    document_frequencies: Vec<usize>,
    idf: Vec<f64>,
    n_documents: usize,
    config: VectorizerConfig,
}

impl FittedVectorizer {
    /// Map each text into the fitted feature space
    pub fn transform<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<SparseVector>> {
        self.ensure_fitted()?;
        Ok(texts
            .iter()
            .map(|text| self.transform_one(text.as_ref()))
            .collect())
    }

    fn transform_one(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in tokenize(text) {
            if let Some(&idx) = self.vocabulary.get(token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        if counts.is_empty() {
            return SparseVector::empty();
        }

        let (indices, mut values): (Vec<usize>, Vec<f64>) = counts
            .into_iter()
            .map(|(idx, count)| (idx, count * self.idf[idx]))
            .unzip();

        let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in &mut values {
                *v /= norm;
            }
        }

        SparseVector::new(indices, values)
    }

    /// Check that the learned state is present and self-consistent
    pub fn ensure_fitted(&self) -> Result<()> {
        if self.vocabulary.is_empty() {
            return Err(SpamHamError::NotFitted(
                "vectorizer has no vocabulary".to_string(),
            ));
        }
        let n = self.vocabulary.len();
        if self.idf.len() != n || self.document_frequencies.len() != n {
            return Err(SpamHamError::NotFitted(format!(
                "vectorizer statistics cover {} terms but vocabulary has {}",
                self.idf.len(),
                n
            )));
        }
        if self.vocabulary.values().any(|&idx| idx >= n) {
            return Err(SpamHamError::NotFitted(
                "vectorizer vocabulary index out of range".to_string(),
            ));
        }
        Ok(())
    }

    /// Feature dimension (vocabulary size)
    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    /// IDF weight of a term, if it is in the vocabulary
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&idx| self.idf[idx])
    }

    /// Number of training documents containing a term
    pub fn document_frequency(&self, term: &str) -> Option<usize> {
        self.vocabulary
            .get(term)
            .map(|&idx| self.document_frequencies[idx])
    }

    /// Number of documents seen during fit
    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }
}
