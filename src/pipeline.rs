//! Offline training pipeline
//!
//! A run moves strictly forward through the stages of [`PipelineStage`]:
//! normalize every text, split, fit the vectorizer on the training split only,
//! fit the classifier, score the held-out split and finally persist the
//! artifact pair. The first failing stage aborts the run.
//!
//! ```rust,no_run
//! use spamham::{Corpus, TrainingConfig, TrainingPipeline};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let corpus = Corpus::from_csv_file("emails.csv")?;
//! let report = TrainingPipeline::new(TrainingConfig::default())
//!     .run_and_persist(&corpus, "artifacts")?;
//! println!("Accuracy: {:.2}%", report.metadata.accuracy * 100.0);
//! # Ok(())
//! # }
//! ```

use crate::classifier::{FittedClassifier, LogisticRegression};
use crate::core::{ClassifierConfig, Dataset, Result, SpamHamError};
use crate::data::{train_test_split, Corpus, SplitConfig};
use crate::metrics::EvaluationMetrics;
use crate::persistence::{ArtifactPair, TrainingMetadata};
use crate::text::normalize;
use crate::vectorizer::{FittedVectorizer, TfidfVectorizer, VectorizerConfig};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Stages of a training run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineStage {
    Loaded,
    Normalized,
    Split,
    VectorizerFit,
    ClassifierFit,
    Evaluated,
    Persisted,
}

impl PipelineStage {
    /// The stage that follows this one, if any
    pub fn next(self) -> Option<Self> {
        use PipelineStage::*;
        match self {
            Loaded => Some(Normalized),
            Normalized => Some(Split),
            Split => Some(VectorizerFit),
            VectorizerFit => Some(ClassifierFit),
            ClassifierFit => Some(Evaluated),
            Evaluated => Some(Persisted),
            Persisted => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Loaded => "loaded",
            PipelineStage::Normalized => "normalized",
            PipelineStage::Split => "split",
            PipelineStage::VectorizerFit => "vectorizer-fit",
            PipelineStage::ClassifierFit => "classifier-fit",
            PipelineStage::Evaluated => "evaluated",
            PipelineStage::Persisted => "persisted",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All parameters of a training run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub vectorizer: VectorizerConfig,
    pub classifier: ClassifierConfig,
    pub split: SplitConfig,
}

impl TrainingConfig {
    pub fn with_vectorizer(mut self, vectorizer: VectorizerConfig) -> Self {
        self.vectorizer = vectorizer;
        self
    }

    pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_split(mut self, split: SplitConfig) -> Self {
        self.split = split;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.vectorizer.validate()?;
        self.classifier.validate()?;
        self.split.validate()
    }
}

/// Fitted components of a run that has reached [`PipelineStage::Evaluated`]
#[derive(Debug, Clone)]
pub struct TrainedArtifacts {
    pub vectorizer: FittedVectorizer,
    pub classifier: FittedClassifier,
    pub metadata: TrainingMetadata,
}

impl TrainedArtifacts {
    pub fn accuracy(&self) -> f64 {
        self.metadata.accuracy
    }

    /// Tag both components with `run_id`
    pub fn into_pair(self, run_id: Uuid) -> ArtifactPair {
        ArtifactPair::new(run_id, self.classifier, self.vectorizer, self.metadata)
    }
}

/// Outcome of a persisted run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub run_id: Uuid,
    pub output_dir: PathBuf,
    pub metadata: TrainingMetadata,
}

/// Tracks the current stage; stages only move forward
struct StageTracker {
    current: PipelineStage,
}

impl StageTracker {
    fn start() -> Self {
        debug!("Pipeline stage: {}", PipelineStage::Loaded);
        Self {
            current: PipelineStage::Loaded,
        }
    }

    /// Run the work of the next stage and advance on success
    fn attempt<T, F>(&mut self, stage: PipelineStage, work: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        debug_assert_eq!(self.current.next(), Some(stage));
        match work() {
            Ok(value) => {
                debug!("Pipeline stage: {} -> {}", self.current, stage);
                self.current = stage;
                Ok(value)
            }
            Err(e) => {
                error!("Training failed at stage {stage}: {e}");
                Err(e)
            }
        }
    }
}

/// Batch trainer producing a vectorizer/classifier pair
#[derive(Debug, Clone, Default)]
pub struct TrainingPipeline {
    config: TrainingConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train and evaluate without touching the filesystem
    pub fn run(&self, corpus: &Corpus) -> Result<TrainedArtifacts> {
        let mut tracker = StageTracker::start();
        self.execute(corpus, &mut tracker)
    }

    /// Train, evaluate and write the artifact pair into `dir`
    pub fn run_and_persist<P: AsRef<Path>>(
        &self,
        corpus: &Corpus,
        dir: P,
    ) -> Result<TrainingReport> {
        let mut tracker = StageTracker::start();
        let trained = self.execute(corpus, &mut tracker)?;

        let run_id = Uuid::new_v4();
        let dir = dir.as_ref();
        let metadata = trained.metadata.clone();
        tracker.attempt(PipelineStage::Persisted, || {
            trained.into_pair(run_id).save_to_dir(dir)
        })?;

        info!(
            "Training run {run_id} complete: test accuracy {:.4}",
            metadata.accuracy
        );
        Ok(TrainingReport {
            run_id,
            output_dir: dir.to_path_buf(),
            metadata,
        })
    }

    fn execute(&self, corpus: &Corpus, tracker: &mut StageTracker) -> Result<TrainedArtifacts> {
        if let Err(e) = self.config.validate().and_then(|_| check_corpus(corpus)) {
            error!("Training failed at stage {}: {e}", PipelineStage::Loaded);
            return Err(e);
        }
        let (ham, spam) = corpus.label_counts();
        info!(
            "Training on {} examples ({} ham, {} spam)",
            corpus.len(),
            ham,
            spam
        );

        let normalized =
            tracker.attempt(PipelineStage::Normalized, || Ok(corpus.map_texts(normalize)))?;

        let split = tracker.attempt(PipelineStage::Split, || {
            train_test_split(normalized.len(), &self.config.split)
        })?;
        let train = split.train_subset(&normalized);
        let test = split.test_subset(&normalized);
        info!("Split: {} train / {} test", train.len(), test.len());

        let vectorizer = tracker.attempt(PipelineStage::VectorizerFit, || {
            TfidfVectorizer::with_config(self.config.vectorizer.clone()).fit(&train.get_texts())
        })?;

        let (classifier, optimization) = tracker.attempt(PipelineStage::ClassifierFit, || {
            let features = vectorizer.transform(&train.get_texts())?;
            LogisticRegression::with_config(self.config.classifier.clone()).fit_with_result(
                &features,
                &train.get_labels(),
                vectorizer.dimension(),
            )
        })?;

        let metrics = tracker.attempt(PipelineStage::Evaluated, || {
            let features = vectorizer.transform(&test.get_texts())?;
            classifier.evaluate_detailed(&features, &test.get_labels())
        })?;
        info!(
            "Test accuracy {:.4} (precision {:.4}, recall {:.4})",
            metrics.accuracy(),
            metrics.precision(),
            metrics.recall()
        );

        let metadata = TrainingMetadata {
            accuracy: metrics.accuracy(),
            metrics,
            split: self.config.split.clone(),
            n_examples: corpus.len(),
            n_train: train.len(),
            n_test: test.len(),
            vocabulary_size: vectorizer.dimension(),
            vectorizer_params: self.config.vectorizer.clone(),
            classifier_params: self.config.classifier.clone(),
            iterations: optimization.iterations,
            converged: optimization.converged,
            objective_value: optimization.objective_value,
        };

        Ok(TrainedArtifacts {
            vectorizer,
            classifier,
            metadata,
        })
    }
}

fn check_corpus(corpus: &Corpus) -> Result<()> {
    if corpus.is_empty() {
        return Err(SpamHamError::Configuration(
            "Cannot train on an empty corpus".to_string(),
        ));
    }
    Ok(())
}

/// Score a persisted pair on the test split it was evaluated on.
///
/// Re-splits `corpus` with the recorded split parameters, so on the same
/// dataset the result equals the accuracy stored in the model artifact.
pub fn evaluate_artifacts(pair: &ArtifactPair, corpus: &Corpus) -> Result<EvaluationMetrics> {
    let normalized = corpus.map_texts(normalize);
    let split = train_test_split(normalized.len(), &pair.model.metadata.split)?;
    let test = split.test_subset(&normalized);

    let features = pair.vectorizer.vectorizer.transform(&test.get_texts())?;
    pair.model
        .classifier
        .evaluate_detailed(&features, &test.get_labels())
}
