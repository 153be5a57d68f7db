//! Spam/ham email classification
//!
//! Raw email text is normalized, mapped to TF-IDF features and scored by an
//! L2-regularized logistic regression. Training runs offline through
//! [`TrainingPipeline`] and persists a vectorizer/classifier pair sharing one
//! run id; [`InferenceService`] loads that pair once and classifies text.
//!
//! ```rust,no_run
//! use spamham::{InferenceService, Label};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = InferenceService::load("artifacts")?;
//! let prediction = service.classify("WIN a free prize now!!!")?;
//! if prediction.label == Label::Spam {
//!     println!("spam ({:.2})", prediction.spam_probability);
//! }
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod core;
pub mod data;
pub mod metrics;
pub mod persistence;
pub mod pipeline;
pub mod service;
pub mod solver;
pub mod text;
pub mod vectorizer;

// Re-export main types for convenience
pub use crate::classifier::{FittedClassifier, LogisticRegression};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{Result, SpamHamError};
pub use crate::data::{Corpus, SplitConfig};
pub use crate::metrics::EvaluationMetrics;
pub use crate::persistence::{ArtifactPair, TrainingMetadata};
pub use crate::pipeline::{PipelineStage, TrainingConfig, TrainingPipeline};
pub use crate::service::{ClassifyError, InferenceService, PredictionResponse};
pub use crate::text::normalize;
pub use crate::vectorizer::{FittedVectorizer, TfidfVectorizer, VectorizerConfig};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
