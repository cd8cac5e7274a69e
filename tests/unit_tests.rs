// Unit tests for Biscuit Server

use biscuit_server::core::{
    discover, label_of, initialize, DiscoveryError, LoadError, LoadOptions, NgramProfiler, ProfileBuilder,
};
use biscuit_server::models::{rank_labels, ClassificationResult};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[test]
fn test_label_of_convention() {
    assert_eq!(label_of("corpora/de.csv").unwrap(), "de");
    assert_eq!(label_of("/abs/path/fr-CA.csv").unwrap(), "fr");
    assert!(matches!(label_of("x"), Err(DiscoveryError::InvalidLabel { .. })));
}

#[test]
fn test_discover_bundled_corpora() {
    let files = discover("./corpora/*.csv").unwrap();
    let labels: Vec<_> = files.iter().map(|f| f.label.as_str()).collect();

    assert_eq!(labels, vec!["de", "en", "fr"]);
    assert!(files.iter().all(|f| f.path.extension().unwrap() == "csv"));
}

#[test]
fn test_discover_no_match_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = dir.path().join("*.csv");
    assert!(discover(pattern.to_str().unwrap()).unwrap().is_empty());
}

#[test]
fn test_discover_rejects_short_names() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("e.csv"), "abc,1\n").unwrap();

    let pattern = dir.path().join("*.csv");
    let result = discover(pattern.to_str().unwrap());
    assert!(matches!(result, Err(DiscoveryError::InvalidLabel { .. })));
}

#[test]
fn test_profile_from_bundled_corpus() {
    let profiler = NgramProfiler::default();
    let profile = profiler.from_file("en", Path::new("corpora/en.csv"), 3).unwrap();

    assert_eq!(profile.label(), "en");
    assert_eq!(profile.order(), 3);
    assert!(!profile.is_empty());
    assert!(profile.len() <= profiler.profile_size());
    assert_eq!(profile.rank_of(" th"), Some(0));
}

#[test]
fn test_profile_malformed_row_reports_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("en.csv");
    fs::write(&path, "the,4\nand,3\nbroken row\n").unwrap();

    match NgramProfiler::default().from_file("en", &path, 3) {
        Err(LoadError::Malformed { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected malformed row error, got {:?}", other),
    }
}

#[test]
fn test_profile_size_truncates() {
    let profiler = NgramProfiler::new(5);
    let profile = profiler.from_text("en", "the quick brown fox jumps over the lazy dog", 3);
    assert_eq!(profile.len(), 5);
}

#[test]
fn test_rank_labels_is_permutation() {
    let scores: HashMap<String, f64> = [("en", 0.4), ("fr", 0.4), ("de", 0.7), ("nl", 0.0)]
        .into_iter()
        .map(|(l, s)| (l.to_string(), s))
        .collect();

    let ranking = rank_labels(&scores);
    assert_eq!(ranking, vec!["de", "en", "fr", "nl"]);

    let result = ClassificationResult::from_scores(scores);
    for pair in result.ranking.windows(2) {
        assert!(result.scores[&pair[0]] >= result.scores[&pair[1]]);
    }
}

#[test]
fn test_bundled_corpora_classify_english() {
    let profiler = Arc::new(NgramProfiler::default());
    let registry = tokio_test::block_on(initialize(
        Arc::clone(&profiler),
        "./corpora/*.csv",
        &[],
        &LoadOptions::new(3),
    ))
    .unwrap();

    let result = biscuit_server::classify(profiler.as_ref(), &registry, "the cat is in the house with the dog", 3).unwrap();
    assert_eq!(result.best_match(), Some("en"));
}
