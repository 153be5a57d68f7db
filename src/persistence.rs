//! Artifact serialization and persistence
//!
//! A training run produces two JSON files in one directory:
//! `model.json` (fitted classifier + training metadata) and
//! `vectorizer.json` (fitted vectorizer). Both start with an
//! [`ArtifactHeader`] carrying the format version and the run id of the
//! training run that wrote them. Loading checks the version before parsing
//! the body and refuses a pair whose run ids differ.

use crate::classifier::FittedClassifier;
use crate::core::{BinaryClassifier, ClassifierConfig, Result, SpamHamError};
use crate::data::SplitConfig;
use crate::metrics::EvaluationMetrics;
use crate::vectorizer::{FittedVectorizer, VectorizerConfig};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use uuid::Uuid;

/// Current artifact format version
pub const FORMAT_VERSION: u32 = 1;

/// Format versions this build can read
pub const SUPPORTED_FORMAT_VERSIONS: &[u32] = &[1];

pub const MODEL_FILE: &str = "model.json";
pub const VECTORIZER_FILE: &str = "vectorizer.json";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Model,
    Vectorizer,
}

/// Identity and version information shared by both artifacts
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ArtifactHeader {
    pub format_version: u32,
    pub kind: ArtifactKind,
    /// Identifier of the training run; equal in both files of a pair
    pub run_id: Uuid,
    /// Library version used to create the artifact
    pub library_version: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl ArtifactHeader {
    fn new(kind: ArtifactKind, run_id: Uuid, created_at: &str) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            kind,
            run_id,
            library_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: created_at.to_string(),
        }
    }
}

/// What the training run measured and which parameters it used
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrainingMetadata {
    /// Accuracy on the held-out test split
    pub accuracy: f64,
    pub metrics: EvaluationMetrics,
    pub split: SplitConfig,
    pub n_examples: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub vocabulary_size: usize,
    pub vectorizer_params: VectorizerConfig,
    pub classifier_params: ClassifierConfig,
    pub iterations: usize,
    pub converged: bool,
    pub objective_value: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ModelArtifact {
    pub header: ArtifactHeader,
    pub classifier: FittedClassifier,
    pub metadata: TrainingMetadata,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VectorizerArtifact {
    pub header: ArtifactHeader,
    pub vectorizer: FittedVectorizer,
}

#[derive(Deserialize)]
struct HeaderProbe {
    header: ArtifactHeader,
}

/// The matched classifier/vectorizer pair of one training run
#[derive(Debug, Clone)]
pub struct ArtifactPair {
    pub model: ModelArtifact,
    pub vectorizer: VectorizerArtifact,
}

impl ArtifactPair {
    /// Tag freshly fitted components with a shared run id
    pub fn new(
        run_id: Uuid,
        classifier: FittedClassifier,
        vectorizer: FittedVectorizer,
        metadata: TrainingMetadata,
    ) -> Self {
        let created_at = chrono::Utc::now().to_rfc3339();
        Self {
            model: ModelArtifact {
                header: ArtifactHeader::new(ArtifactKind::Model, run_id, &created_at),
                classifier,
                metadata,
            },
            vectorizer: VectorizerArtifact {
                header: ArtifactHeader::new(ArtifactKind::Vectorizer, run_id, &created_at),
                vectorizer,
            },
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.model.header.run_id
    }

    /// Check that both halves belong together and are usable
    pub fn verify(&self) -> Result<()> {
        let incompatible = |msg: String| SpamHamError::IncompatibleArtifactVersion(msg);

        for (header, expected) in [
            (&self.model.header, ArtifactKind::Model),
            (&self.vectorizer.header, ArtifactKind::Vectorizer),
        ] {
            check_version(header)?;
            if header.kind != expected {
                return Err(incompatible(format!(
                    "expected {expected:?} artifact, found {:?}",
                    header.kind
                )));
            }
        }

        if self.model.header.run_id != self.vectorizer.header.run_id {
            return Err(incompatible(format!(
                "artifact pair mismatch: model run {} but vectorizer run {}",
                self.model.header.run_id, self.vectorizer.header.run_id
            )));
        }

        self.vectorizer
            .vectorizer
            .ensure_fitted()
            .map_err(|e| incompatible(format!("vectorizer artifact unusable: {e}")))?;
        self.model
            .classifier
            .ensure_fitted()
            .map_err(|e| incompatible(format!("model artifact unusable: {e}")))?;

        let dim = self.vectorizer.vectorizer.dimension();
        let n_features = self.model.classifier.n_features();
        if dim != n_features {
            return Err(incompatible(format!(
                "vectorizer produces {dim} features but classifier expects {n_features}"
            )));
        }
        Ok(())
    }

    /// Write both artifacts into `dir`.
    ///
    /// Each file is first written to a temporary name in `dir` and synced;
    /// only when both are complete are they renamed into place.
    pub fn save_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(SpamHamError::IoError)?;

        let run = self.run_id().simple().to_string();
        let model_tmp = dir.join(format!(".{MODEL_FILE}.{run}.tmp"));
        let vectorizer_tmp = dir.join(format!(".{VECTORIZER_FILE}.{run}.tmp"));

        let written = write_json(&vectorizer_tmp, &self.vectorizer)
            .and_then(|_| write_json(&model_tmp, &self.model))
            .and_then(|_| {
                fs::rename(&vectorizer_tmp, dir.join(VECTORIZER_FILE))
                    .map_err(SpamHamError::IoError)
            })
            .and_then(|_| {
                fs::rename(&model_tmp, dir.join(MODEL_FILE)).map_err(SpamHamError::IoError)
            });

        if written.is_err() {
            for tmp in [&model_tmp, &vectorizer_tmp] {
                if tmp.exists() {
                    if let Err(e) = fs::remove_file(tmp) {
                        warn!("Failed to remove temporary artifact {tmp:?}: {e}");
                    }
                }
            }
        }
        written?;

        info!("Artifacts for run {} saved to {:?}", self.run_id(), dir);
        Ok(())
    }

    /// Load and verify the pair stored in `dir`
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let model: ModelArtifact = read_artifact(&dir.join(MODEL_FILE))?;
        let vectorizer: VectorizerArtifact = read_artifact(&dir.join(VECTORIZER_FILE))?;

        let pair = Self { model, vectorizer };
        pair.verify()?;
        debug!("Loaded artifact pair for run {}", pair.run_id());
        Ok(pair)
    }

    /// Print artifact summary
    pub fn print_summary(&self) {
        let header = &self.model.header;
        let meta = &self.model.metadata;
        println!("=== Spam/Ham Model Summary ===");
        println!("Run ID: {}", header.run_id);
        println!("Format Version: {}", header.format_version);
        println!("Library Version: {}", header.library_version);
        println!("Created: {}", header.created_at);
        println!("Vocabulary Size: {}", meta.vocabulary_size);
        println!("Bias: {:.6}", self.model.classifier.bias());
        println!(
            "Dataset: {} examples ({} train / {} test)",
            meta.n_examples, meta.n_train, meta.n_test
        );
        println!("Test Accuracy: {:.4}", meta.accuracy);
        println!("Training Parameters:");
        println!("  Max Features: {}", meta.vectorizer_params.max_features);
        println!("  Test Size: {}", meta.split.test_size);
        println!("  Seed: {}", meta.split.seed);
        println!("  C: {}", meta.classifier_params.c);
        println!("  Learning Rate: {}", meta.classifier_params.learning_rate);
        println!("  Max Iterations: {}", meta.classifier_params.max_iterations);
        println!(
            "  Iterations Used: {} (converged: {})",
            meta.iterations, meta.converged
        );
    }
}

fn check_version(header: &ArtifactHeader) -> Result<()> {
    if SUPPORTED_FORMAT_VERSIONS.contains(&header.format_version) {
        Ok(())
    } else {
        Err(SpamHamError::IncompatibleArtifactVersion(format!(
            "format version {} is not supported (supported: {:?})",
            header.format_version, SUPPORTED_FORMAT_VERSIONS
        )))
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(SpamHamError::IoError)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| SpamHamError::SerializationError(e.to_string()))?;
    writer.flush().map_err(SpamHamError::IoError)?;
    writer.get_ref().sync_all().map_err(SpamHamError::IoError)?;
    Ok(())
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(SpamHamError::IoError)?;

    let probe: HeaderProbe = serde_json::from_str(&content).map_err(|e| {
        SpamHamError::IncompatibleArtifactVersion(format!(
            "{path:?} has no readable artifact header: {e}"
        ))
    })?;
    check_version(&probe.header)?;

    serde_json::from_str(&content).map_err(|e| {
        SpamHamError::IncompatibleArtifactVersion(format!("{path:?} could not be decoded: {e}"))
    })
}
