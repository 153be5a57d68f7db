//! Online inference over a loaded artifact pair
//!
//! [`InferenceService`] owns the fitted vectorizer and classifier, is built
//! once at startup and is only ever read afterwards, so one instance can be
//! shared across threads by reference or `Arc`.

use crate::classifier::FittedClassifier;
use crate::core::{BinaryClassifier, Label, Prediction, Result, SpamHamError};
use crate::persistence::ArtifactPair;
use crate::text::normalize;
use crate::vectorizer::FittedVectorizer;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Per-request classification failure
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("Empty input: text must contain at least one non-whitespace character")]
    EmptyInput,

    /// Details are in the log under `reference`
    #[error("Internal error while classifying (reference {reference})")]
    Internal { reference: Uuid },
}

impl ClassifyError {
    /// Whether the caller sent bad input, as opposed to a server-side failure
    pub fn is_client_error(&self) -> bool {
        matches!(self, ClassifyError::EmptyInput)
    }
}

/// Serialized result shape: `{"prediction": "spam"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: Label,
}

impl From<Prediction> for PredictionResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            prediction: prediction.label,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ServingStage {
    Transform,
    Predict,
}

impl fmt::Display for ServingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServingStage::Transform => f.write_str("transform"),
            ServingStage::Predict => f.write_str("predict"),
        }
    }
}

/// Immutable classifier service
#[derive(Debug, Clone)]
pub struct InferenceService {
    vectorizer: FittedVectorizer,
    classifier: FittedClassifier,
    run_id: Uuid,
}

impl InferenceService {
    /// Assemble a service from fitted components.
    ///
    /// Fails if either component is unfitted or the vectorizer's dimension
    /// differs from the classifier's.
    pub fn new(
        vectorizer: FittedVectorizer,
        classifier: FittedClassifier,
        run_id: Uuid,
    ) -> Result<Self> {
        vectorizer.ensure_fitted()?;
        classifier.ensure_fitted()?;
        if vectorizer.dimension() != classifier.n_features() {
            return Err(SpamHamError::DimensionMismatch {
                expected: classifier.n_features(),
                actual: vectorizer.dimension(),
            });
        }
        Ok(Self {
            vectorizer,
            classifier,
            run_id,
        })
    }

    /// Build from an already verified artifact pair
    pub fn from_pair(pair: ArtifactPair) -> Result<Self> {
        let run_id = pair.run_id();
        Self::new(pair.vectorizer.vectorizer, pair.model.classifier, run_id)
    }

    /// Load the artifact pair in `dir`; any problem prevents construction
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let pair = ArtifactPair::load_from_dir(dir.as_ref())?;
        let service = Self::from_pair(pair)?;
        info!(
            "Inference service ready: run {}, {} features",
            service.run_id,
            service.dimension()
        );
        Ok(service)
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn dimension(&self) -> usize {
        self.vectorizer.dimension()
    }

    /// Classify one raw email text
    pub fn classify(&self, raw_text: &str) -> std::result::Result<Prediction, ClassifyError> {
        if raw_text.trim().is_empty() {
            return Err(ClassifyError::EmptyInput);
        }

        let normalized = normalize(raw_text);
        let features = self
            .vectorizer
            .transform(&[normalized])
            .map_err(|e| self.internal(ServingStage::Transform, raw_text.len(), &e))?
            .pop()
            .ok_or_else(|| {
                self.internal(
                    ServingStage::Transform,
                    raw_text.len(),
                    &"vectorizer returned no rows",
                )
            })?;

        self.classifier
            .predict(&features)
            .map_err(|e| self.internal(ServingStage::Predict, raw_text.len(), &e))
    }

    /// Classify and wrap the label in the response shape
    pub fn classify_response(
        &self,
        raw_text: &str,
    ) -> std::result::Result<PredictionResponse, ClassifyError> {
        self.classify(raw_text).map(PredictionResponse::from)
    }

    fn internal(
        &self,
        stage: ServingStage,
        text_len: usize,
        cause: &dyn fmt::Display,
    ) -> ClassifyError {
        let reference = Uuid::new_v4();
        error!(
            "Classification failed at stage {stage} (reference {reference}, run {}, text length {text_len} bytes): {cause}",
            self.run_id
        );
        ClassifyError::Internal { reference }
    }
}
