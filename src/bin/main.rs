//! spamham command line interface
//!
//! Train a spam/ham classifier from a labeled CSV file, classify texts with a
//! persisted artifact pair, re-evaluate it and inspect it.

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{error, info, warn};
use spamham::core::{ClassifierConfig, Result, SpamHamError};
use spamham::data::SplitConfig;
use spamham::persistence::ArtifactPair;
use spamham::pipeline::{evaluate_artifacts, TrainingConfig, TrainingPipeline};
use spamham::service::{ClassifyError, InferenceService};
use spamham::vectorizer::VectorizerConfig;
use spamham::Corpus;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "spamham")]
#[command(about = "Spam/ham email classification with TF-IDF and logistic regression")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a classifier and write its artifact pair
    Train(TrainArgs),
    /// Classify texts with a trained artifact pair
    Predict(PredictArgs),
    /// Re-score an artifact pair on its recorded test split
    Evaluate(EvaluateArgs),
    /// Display artifact information
    Info(InfoArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Labeled CSV file with `text` and `label_num` columns
    #[arg(long)]
    data: PathBuf,

    /// Output artifact directory
    #[arg(short, long)]
    output: PathBuf,

    /// Maximum vocabulary size
    #[arg(long, default_value = "5000")]
    max_features: usize,

    /// Keep English stop words in the vocabulary
    #[arg(long)]
    keep_stop_words: bool,

    /// Fraction of examples held out for evaluation
    #[arg(long, default_value = "0.2")]
    test_size: f64,

    /// Seed for the train/test shuffle
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Inverse regularization strength C
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,

    /// Initial gradient descent step size
    #[arg(long, default_value = "1.0")]
    learning_rate: f64,

    /// Maximum iterations
    #[arg(long, default_value = "1000")]
    max_iterations: usize,

    /// Gradient convergence tolerance
    #[arg(long, default_value = "1e-6")]
    tolerance: f64,
}

impl TrainArgs {
    fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            vectorizer: VectorizerConfig {
                max_features: self.max_features,
                english_stop_words: !self.keep_stop_words,
            },
            classifier: ClassifierConfig {
                c: self.c,
                learning_rate: self.learning_rate,
                max_iterations: self.max_iterations,
                tolerance: self.tolerance,
            },
            split: SplitConfig {
                test_size: self.test_size,
                seed: self.seed,
            },
        }
    }
}

#[derive(Args)]
struct PredictArgs {
    /// Artifact directory
    #[arg(short, long)]
    model: PathBuf,

    /// Text to classify (repeatable); reads one text per stdin line if absent
    #[arg(short, long)]
    text: Vec<String>,

    /// Include the spam probability and the confidence in the predicted label
    #[arg(long)]
    probability: bool,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Artifact directory
    #[arg(short, long)]
    model: PathBuf,

    /// The labeled CSV the artifacts were trained on
    #[arg(long)]
    data: PathBuf,

    /// Show detailed metrics
    #[arg(long)]
    detailed: bool,
}

#[derive(Args)]
struct InfoArgs {
    /// Artifact directory
    model: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Predict(args) => predict_command(args),
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn train_command(args: TrainArgs) -> Result<()> {
    let config = args.training_config();
    info!("Loading dataset from {:?}", args.data);
    let corpus = Corpus::from_csv_file(&args.data)?;
    info!(
        "Parameters: max_features={}, test_size={}, seed={}, C={}, max_iter={}",
        args.max_features, args.test_size, args.seed, args.c, args.max_iterations
    );

    let report = TrainingPipeline::new(config).run_and_persist(&corpus, &args.output)?;
    let meta = &report.metadata;

    println!("=== Training Complete ===");
    println!("Run ID: {}", report.run_id);
    println!("Artifacts: {:?}", report.output_dir);
    println!(
        "Examples: {} ({} train / {} test)",
        meta.n_examples, meta.n_train, meta.n_test
    );
    println!("Vocabulary Size: {}", meta.vocabulary_size);
    println!("Test Accuracy: {:.2}%", meta.accuracy * 100.0);
    if !meta.converged {
        warn!(
            "Classifier did not converge within {} iterations",
            meta.classifier_params.max_iterations
        );
    }

    Ok(())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    info!("Loading artifacts from: {:?}", args.model);
    let service = InferenceService::load(&args.model)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut classify_one = |text: &str| -> Result<()> {
        match service.classify(text) {
            Ok(prediction) => {
                let line = if args.probability {
                    serde_json::json!({
                        "prediction": prediction.label,
                        "spam_probability": prediction.spam_probability,
                        "confidence": prediction.confidence(),
                    })
                } else {
                    serde_json::json!({ "prediction": prediction.label })
                };
                writeln!(out, "{line}").map_err(SpamHamError::IoError)
            }
            Err(ClassifyError::EmptyInput) => {
                eprintln!("client error: {}", ClassifyError::EmptyInput);
                Ok(())
            }
            Err(e @ ClassifyError::Internal { .. }) => {
                eprintln!("server error: {e}");
                Ok(())
            }
        }
    };

    if args.text.is_empty() {
        for line in io::stdin().lock().lines() {
            let line = line.map_err(SpamHamError::IoError)?;
            classify_one(&line)?;
        }
    } else {
        for text in &args.text {
            classify_one(text)?;
        }
    }

    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    info!("Loading artifacts from: {:?}", args.model);
    let pair = ArtifactPair::load_from_dir(&args.model)?;

    info!("Loading dataset from: {:?}", args.data);
    let corpus = Corpus::from_csv_file(&args.data)?;

    let metrics = evaluate_artifacts(&pair, &corpus)?;
    let recorded = pair.model.metadata.accuracy;
    let accuracy = metrics.accuracy();

    println!("=== Model Evaluation ===");
    pair.print_summary();

    println!("\nTest Results:");
    println!("  Accuracy: {:.2}%", accuracy * 100.0);
    println!("  Recorded: {:.2}%", recorded * 100.0);
    if accuracy == recorded {
        println!("  Reproduced: yes");
    } else {
        println!("  Reproduced: no");
        warn!("Accuracy {accuracy} differs from recorded {recorded}; was the dataset changed?");
    }

    if args.detailed {
        println!("\nDetailed Metrics:");
        println!("  True Positives:  {}", metrics.true_positives);
        println!("  True Negatives:  {}", metrics.true_negatives);
        println!("  False Positives: {}", metrics.false_positives);
        println!("  False Negatives: {}", metrics.false_negatives);
        println!("  Precision:       {:.4}", metrics.precision());
        println!("  Recall:          {:.4}", metrics.recall());
        println!("  F1 Score:        {:.4}", metrics.f1_score());
        println!("  Specificity:     {:.4}", metrics.specificity());
    }

    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    info!("Loading artifacts from: {:?}", args.model);
    let pair = ArtifactPair::load_from_dir(&args.model)?;

    pair.print_summary();

    let vectorizer = &pair.vectorizer.vectorizer;
    println!("\nVocabulary Sample:");
    let n_show = vectorizer.dimension().min(10);
    for (term, idx) in vectorizer.vocabulary().iter().take(n_show) {
        println!(
            "  {idx:>5} {term:<20} idf={:.4}",
            vectorizer.idf(term).unwrap_or_default()
        );
    }
    if vectorizer.dimension() > n_show {
        println!("  ... ({} more)", vectorizer.dimension() - n_show);
    }

    Ok(())
}
