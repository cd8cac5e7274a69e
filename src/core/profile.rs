use crate::models::ClassificationResult;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Number of ranked n-grams kept per profile by default
pub const DEFAULT_PROFILE_SIZE: usize = 300;

/// Errors that can occur while building a profile from a corpus file
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed row at {}:{line}: {reason}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("No usable n-grams in {}", .path.display())]
    Empty { path: PathBuf },
}

/// Errors that can occur while scoring an unknown profile
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompareError {
    #[error("Text `{label}` produced no n-grams to compare")]
    EmptyProfile { label: String },

    #[error("Profile `{label}` has n-gram order {found}, expected {expected}")]
    OrderMismatch {
        label: String,
        expected: usize,
        found: usize,
    },

    #[error("Comparison produced a non-finite score for `{label}`")]
    NonFinite { label: String },

    #[error("Comparison scores do not cover the registry (missing: {missing:?}, unexpected: {unexpected:?})")]
    Incomplete {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}

/// Builds and compares frequency profiles
///
/// The registry and classifier only ever hold `Self::Profile` values and
/// hand them back to the builder; they never look inside.
pub trait ProfileBuilder: Send + Sync + 'static {
    type Profile: Send + Sync + 'static;

    /// Build the reference profile for one corpus file
    fn from_file(&self, label: &str, path: &Path, order: usize) -> Result<Self::Profile, LoadError>;

    /// Build a profile from raw text. Callers reject empty text beforehand.
    fn from_text(&self, label: &str, text: &str, order: usize) -> Self::Profile;

    /// Score `unknown` against every labelled candidate
    fn compare_all(
        &self,
        unknown: &Self::Profile,
        candidates: &[(&str, &Self::Profile)],
    ) -> Result<ClassificationResult, CompareError>;
}

/// Ranked n-gram profile of a body of text
#[derive(Debug, Clone, PartialEq)]
pub struct NgramProfile {
    label: String,
    order: usize,
    ngrams: Vec<String>,
    ranks: HashMap<String, usize>,
}

impl NgramProfile {
    /// Rank n-grams by descending count (ties by n-gram) and keep the top `size`
    pub fn from_counts(label: &str, order: usize, counts: HashMap<String, u64>, size: usize) -> Self {
        let mut entries: Vec<(String, u64)> = counts.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(size);

        let ngrams: Vec<String> = entries.into_iter().map(|(ngram, _)| ngram).collect();
        let ranks = ngrams
            .iter()
            .enumerate()
            .map(|(rank, ngram)| (ngram.clone(), rank))
            .collect();

        Self {
            label: label.to_string(),
            order,
            ngrams,
            ranks,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn len(&self) -> usize {
        self.ngrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ngrams.is_empty()
    }

    /// Rank of an n-gram, 0 being the most frequent
    pub fn rank_of(&self, ngram: &str) -> Option<usize> {
        self.ranks.get(ngram).copied()
    }

    pub fn ngrams(&self) -> &[String] {
        &self.ngrams
    }
}

/// Default profile builder using Cavnar-Trenkle out-of-place distance
#[derive(Debug, Clone, Copy)]
pub struct NgramProfiler {
    profile_size: usize,
}

impl NgramProfiler {
    pub fn new(profile_size: usize) -> Self {
        Self {
            profile_size: profile_size.max(1),
        }
    }

    pub fn profile_size(&self) -> usize {
        self.profile_size
    }

    /// Out-of-place distance between two profiles
    fn distance(&self, unknown: &NgramProfile, candidate: &NgramProfile) -> usize {
        unknown
            .ngrams
            .iter()
            .enumerate()
            .map(|(rank, ngram)| match candidate.rank_of(ngram) {
                Some(other) => rank.abs_diff(other).min(self.profile_size),
                None => self.profile_size,
            })
            .sum()
    }
}

impl Default for NgramProfiler {
    fn default() -> Self {
        Self::new(DEFAULT_PROFILE_SIZE)
    }
}

impl ProfileBuilder for NgramProfiler {
    type Profile = NgramProfile;

    fn from_file(&self, label: &str, path: &Path, order: usize) -> Result<NgramProfile, LoadError> {
        let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let counts = parse_frequency_table(&contents, order).map_err(|(line, reason)| {
            LoadError::Malformed {
                path: path.to_path_buf(),
                line,
                reason,
            }
        })?;

        if counts.is_empty() {
            return Err(LoadError::Empty {
                path: path.to_path_buf(),
            });
        }

        Ok(NgramProfile::from_counts(label, order, counts, self.profile_size))
    }

    fn from_text(&self, label: &str, text: &str, order: usize) -> NgramProfile {
        NgramProfile::from_counts(label, order, ngram_counts(text, order), self.profile_size)
    }

    fn compare_all(
        &self,
        unknown: &NgramProfile,
        candidates: &[(&str, &NgramProfile)],
    ) -> Result<ClassificationResult, CompareError> {
        if unknown.is_empty() {
            return Err(CompareError::EmptyProfile {
                label: unknown.label.clone(),
            });
        }

        let max_distance = (unknown.len() * self.profile_size) as f64;
        let mut scores = HashMap::with_capacity(candidates.len());

        for (label, candidate) in candidates {
            if candidate.order != unknown.order {
                return Err(CompareError::OrderMismatch {
                    label: label.to_string(),
                    expected: unknown.order,
                    found: candidate.order,
                });
            }

            let distance = self.distance(unknown, candidate) as f64;
            scores.insert(label.to_string(), 1.0 - distance / max_distance);
        }

        Ok(ClassificationResult::from_scores(scores))
    }
}

/// Parse `ngram,count` rows, keeping those whose n-gram has `order` characters
///
/// Returns the offending line number and reason on a bad row.
fn parse_frequency_table(contents: &str, order: usize) -> Result<HashMap<String, u64>, (usize, String)> {
    let mut counts: HashMap<String, u64> = HashMap::new();

    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let (ngram, count) = line
            .rsplit_once(',')
            .ok_or_else(|| (idx + 1, "expected `ngram,count`".to_string()))?;

        let count: u64 = count
            .trim()
            .parse()
            .map_err(|e| (idx + 1, format!("invalid count `{}`: {}", count.trim(), e)))?;

        if ngram.chars().count() != order {
            continue;
        }

        *counts.entry(ngram.to_string()).or_insert(0) += count;
    }

    Ok(counts)
}

/// Count character n-grams of normalized text
///
/// Text is lowercased, every run of non-alphabetic characters becomes a
/// single space and the result is padded with one space on each side.
pub fn ngram_counts(text: &str, order: usize) -> HashMap<String, u64> {
    let mut counts = HashMap::new();
    if order == 0 {
        return counts;
    }

    let mut chars: Vec<char> = Vec::with_capacity(text.len() + 2);
    chars.push(' ');
    let mut has_letters = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphabetic() {
            chars.push(c);
            has_letters = true;
        } else if chars.last() != Some(&' ') {
            chars.push(' ');
        }
    }

    if !has_letters {
        return counts;
    }
    if chars.last() != Some(&' ') {
        chars.push(' ');
    }

    for window in chars.windows(order) {
        *counts.entry(window.iter().collect::<String>()).or_insert(0) += 1;
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_ngram_counts_pads_and_normalizes() {
        let counts = ngram_counts("Ab, AB!", 2);
        assert_eq!(counts.get(" a"), Some(&2));
        assert_eq!(counts.get("ab"), Some(&2));
        assert_eq!(counts.get("b "), Some(&2));
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn test_ngram_counts_no_letters() {
        assert!(ngram_counts("1234 !!", 3).is_empty());
        assert!(ngram_counts("abc", 0).is_empty());
    }

    #[test]
    fn test_profile_ranks_by_count_then_ngram() {
        let counts: HashMap<String, u64> = [("bbb", 5), ("aaa", 5), ("ccc", 9), ("ddd", 1)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        let profile = NgramProfile::from_counts("xx", 3, counts, 3);

        assert_eq!(profile.ngrams(), &["ccc", "aaa", "bbb"]);
        assert_eq!(profile.rank_of("ccc"), Some(0));
        assert_eq!(profile.rank_of("ddd"), None);
    }

    #[test]
    fn test_parse_skips_comments_and_other_orders() {
        let table = "# header\n the,10\nab,4\n\nand,7\r\n";
        let counts = parse_frequency_table(table, 3).unwrap();
        assert_eq!(counts.get(" th"), None);
        assert_eq!(counts.get("the"), None);
        assert_eq!(counts.get("and"), Some(&7));
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn test_parse_ngram_containing_comma() {
        let counts = parse_frequency_table("a,b,3\n", 3).unwrap();
        assert_eq!(counts.get("a,b"), Some(&3));
    }

    #[test]
    fn test_parse_rejects_bad_count() {
        let err = parse_frequency_table("abc,1\nthe,lots\n", 3).unwrap_err();
        assert_eq!(err.0, 2);
    }

    #[test]
    fn test_from_file_empty_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# nothing here").unwrap();

        let result = NgramProfiler::default().from_file("xx", file.path(), 3);
        assert!(matches!(result, Err(LoadError::Empty { .. })));
    }

    #[test]
    fn test_from_file_missing_is_io_error() {
        let result = NgramProfiler::default().from_file("xx", Path::new("/nonexistent/xx.csv"), 3);
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_identical_text_scores_one() {
        let profiler = NgramProfiler::default();
        let reference = profiler.from_text("en", "the quick brown fox", 3);
        let unknown = profiler.from_text("unknown", "the quick brown fox", 3);

        let result = profiler.compare_all(&unknown, &[("en", &reference)]).unwrap();
        assert!((result.scores["en"] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_closer_text_scores_higher() {
        let profiler = NgramProfiler::default();
        let en = profiler.from_text("en", "the cat sat on the mat with the hat", 3);
        let fr = profiler.from_text("fr", "le chat est sur le tapis avec le chapeau", 3);
        let unknown = profiler.from_text("unknown", "the hat and the cat", 3);

        let result = profiler.compare_all(&unknown, &[("en", &en), ("fr", &fr)]).unwrap();
        assert_eq!(result.best_match(), Some("en"));
        assert!(result.scores.values().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_compare_empty_unknown_fails() {
        let profiler = NgramProfiler::default();
        let en = profiler.from_text("en", "hello world", 3);
        let unknown = profiler.from_text("unknown", "42", 3);

        let result = profiler.compare_all(&unknown, &[("en", &en)]);
        assert!(matches!(result, Err(CompareError::EmptyProfile { .. })));
    }

    #[test]
    fn test_compare_order_mismatch_fails() {
        let profiler = NgramProfiler::default();
        let en = profiler.from_text("en", "hello world", 2);
        let unknown = profiler.from_text("unknown", "hello world", 3);

        let result = profiler.compare_all(&unknown, &[("en", &en)]);
        assert!(matches!(result, Err(CompareError::OrderMismatch { expected: 3, found: 2, .. })));
    }
}
