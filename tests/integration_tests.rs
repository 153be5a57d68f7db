//! Integration tests for the spamham library
//!
//! These tests exercise the full path from labeled CSV through training,
//! persistence and loading to online classification.

use spamham::persistence::{MODEL_FILE, VECTORIZER_FILE};
use spamham::pipeline::evaluate_artifacts;
use spamham::{
    ArtifactPair, BinaryClassifier, ClassifyError, Corpus, InferenceService, Label,
    LogisticRegression, SpamHamError, SplitConfig, TfidfVectorizer, TrainingConfig,
    TrainingPipeline,
};
use std::fs;
use tempfile::TempDir;

const SPAM: &[&str] = &[
    "WIN a FREE prize!!! Claim your cash reward now at http://win.example.com",
    "Congratulations, you have been selected for a free cruise. Call now!",
    "Cheap meds online, no prescription needed, huge discount",
    "Limited offer: free money, act now, click www.money.example",
    "You won the lottery! Send your bank details to claim the prize",
    "Hot singles in your area, click here for free access",
    "Earn cash fast working from home, guaranteed income offer",
    "URGENT: your account wins a free gift card, claim reward today",
    "Buy cheap watches, exclusive discount, free shipping offer",
    "Free credit report, claim your cash bonus prize now",
];

const HAM: &[&str] = &[
    "Hi team, the meeting agenda for Monday is attached.",
    "Please review the quarterly report before our call tomorrow.",
    "Enron gas nominations for the pipeline are attached, thanks.",
    "Can we move the project review meeting to Thursday afternoon?",
    "Attached are the minutes from yesterday's planning meeting.",
    "Forwarding the contract draft; let me know your comments.",
    "The schedule for next week's training sessions is attached.",
    "Thanks for the update on the budget, see you at the meeting.",
    "Please confirm the volumes for the December gas deliveries.",
    "Lunch on Friday to discuss the project schedule and report?",
];

fn corpus() -> Corpus {
    let mut texts = Vec::new();
    let mut labels = Vec::new();
    for (spam, ham) in SPAM.iter().zip(HAM.iter()) {
        texts.push(*spam);
        labels.push(1);
        texts.push(*ham);
        labels.push(0);
    }
    Corpus::from_pairs(&texts, &labels).expect("valid corpus")
}

fn trained_dir() -> (TempDir, spamham::pipeline::TrainingReport) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let report = TrainingPipeline::new(TrainingConfig::default())
        .run_and_persist(&corpus(), dir.path())
        .expect("Training should succeed");
    (dir, report)
}

/// Two emails, fit on both, classify a near-duplicate of the spam one.
///
/// The pipeline's 80/20 split would hold one of the two rows out, so the
/// vectorizer and classifier are fit directly here.
#[test]
fn test_two_emails_fit_on_both_rows_classify_spam() {
    let texts: Vec<String> = ["free money now!!!", "meeting agenda attached"]
        .iter()
        .map(|t| spamham::normalize(t))
        .collect();
    let vectorizer = TfidfVectorizer::new().fit(&texts).unwrap();
    let features = vectorizer.transform(&texts).unwrap();
    let classifier = LogisticRegression::new()
        .fit(&features, &[Label::Spam, Label::Ham], vectorizer.dimension())
        .unwrap();
    let service = InferenceService::new(vectorizer, classifier, uuid::Uuid::new_v4()).unwrap();

    let response = service.classify_response("free money now").unwrap();
    assert_eq!(response.prediction, Label::Spam);
}

#[test]
fn test_two_row_pipeline_holds_one_row_out() {
    let corpus = Corpus::from_pairs(&["free money now!!!", "meeting agenda attached"], &[1, 0])
        .unwrap();
    let trained = TrainingPipeline::default().run(&corpus).unwrap();

    assert_eq!(trained.metadata.n_train, 1);
    assert_eq!(trained.metadata.n_test, 1);
    assert_eq!(trained.vectorizer.n_documents(), 1);
}

#[test]
fn test_empty_input_is_client_error() {
    let (dir, _) = trained_dir();
    let service = InferenceService::load(dir.path()).unwrap();

    let err = service.classify("").unwrap_err();
    assert_eq!(err, ClassifyError::EmptyInput);
    assert!(err.is_client_error());
    assert_eq!(service.classify("\n\t  "), Err(ClassifyError::EmptyInput));
}

#[test]
fn test_reloaded_artifacts_reproduce_accuracy() {
    let (dir, report) = trained_dir();
    let pair = ArtifactPair::load_from_dir(dir.path()).unwrap();

    assert_eq!(pair.run_id(), report.run_id);
    assert_eq!(pair.model.metadata.accuracy, report.metadata.accuracy);

    let metrics = evaluate_artifacts(&pair, &corpus()).unwrap();
    assert_eq!(metrics.accuracy(), report.metadata.accuracy);
    assert_eq!(metrics, report.metadata.metrics);
}

#[test]
fn test_trained_service_separates_obvious_examples() {
    let (dir, _) = trained_dir();
    let service = InferenceService::load(dir.path()).unwrap();

    let spam = service
        .classify("FREE prize!!! claim your cash reward now")
        .unwrap();
    let ham = service
        .classify("the meeting agenda and project report are attached")
        .unwrap();
    assert_eq!(spam.label, Label::Spam);
    assert_eq!(ham.label, Label::Ham);
    assert!(spam.spam_probability > ham.spam_probability);
}

#[test]
fn test_out_of_vocabulary_text() {
    let (dir, _) = trained_dir();
    let service = InferenceService::load(dir.path()).unwrap();

    let a = service.classify("xylophone quokka zeppelin").unwrap();
    let b = service.classify("xylophone quokka zeppelin").unwrap();
    assert_eq!(a, b);
    assert!(a.spam_probability.is_finite());
}

#[test]
fn test_mismatched_pair_rejected_at_startup() {
    let (dir_a, _) = trained_dir();
    let (dir_b, _) = trained_dir();

    fs::copy(
        dir_b.path().join(VECTORIZER_FILE),
        dir_a.path().join(VECTORIZER_FILE),
    )
    .unwrap();

    assert!(matches!(
        InferenceService::load(dir_a.path()),
        Err(SpamHamError::IncompatibleArtifactVersion(_))
    ));
}

#[test]
fn test_unsupported_version_rejected_at_startup() {
    let (dir, _) = trained_dir();
    let path = dir.path().join(MODEL_FILE);

    let mut json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    json["header"]["format_version"] = serde_json::json!(2);
    fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).unwrap();

    let err = InferenceService::load(dir.path()).unwrap_err();
    assert!(matches!(err, SpamHamError::IncompatibleArtifactVersion(_)));
}

#[test]
fn test_missing_artifact_rejected_at_startup() {
    let (dir, _) = trained_dir();
    fs::remove_file(dir.path().join(VECTORIZER_FILE)).unwrap();

    assert!(matches!(
        InferenceService::load(dir.path()),
        Err(SpamHamError::IoError(_))
    ));
}

#[test]
fn test_training_is_reproducible() {
    let a = TrainingPipeline::default().run(&corpus()).unwrap();
    let b = TrainingPipeline::default().run(&corpus()).unwrap();

    assert_eq!(a.vectorizer, b.vectorizer);
    assert_eq!(a.classifier, b.classifier);
    assert_eq!(a.metadata.accuracy, b.metadata.accuracy);
}

#[test]
fn test_split_seed_recorded_in_metadata() {
    let config = TrainingConfig::default().with_split(SplitConfig {
        test_size: 0.2,
        seed: 7,
    });
    let seeded = TrainingPipeline::new(config).run(&corpus()).unwrap();
    let default = TrainingPipeline::default().run(&corpus()).unwrap();

    assert_eq!(seeded.metadata.split.seed, 7);
    assert_eq!(seeded.metadata.n_test, default.metadata.n_test);
}

#[test]
fn test_vectorizer_fit_on_train_split_only() {
    let trained = TrainingPipeline::default().run(&corpus()).unwrap();
    assert_eq!(
        trained.vectorizer.n_documents(),
        trained.metadata.n_train,
        "vocabulary statistics must come from the training split"
    );
    assert_eq!(
        trained.classifier.n_features(),
        trained.vectorizer.dimension()
    );
}

#[test]
fn test_concurrent_classification_matches_sequential() {
    let (dir, _) = trained_dir();
    let service = InferenceService::load(dir.path()).unwrap();

    let inputs: Vec<&str> = SPAM.iter().chain(HAM.iter()).copied().collect();
    let expected: Vec<_> = inputs.iter().map(|t| service.classify(t).unwrap()).collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    inputs
                        .iter()
                        .map(|t| service.classify(t).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
