use crate::models::CorpusFile;
use globset::Glob;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while locating corpus files
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Invalid corpus pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Failed to read corpus directory {}: {source}", .dir.display())]
    Io {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot derive a label from {}: name must have at least two characters before the first `.`", .path.display())]
    InvalidLabel { path: PathBuf },
}

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

/// Resolve a shell-style pattern into the corpus files it names
///
/// Only the final path component may contain wildcards; matching is not
/// recursive. A directory that does not exist yields no files, as does a
/// pattern that matches nothing. Results are sorted by path.
pub fn discover(pattern: &str) -> Result<Vec<CorpusFile>, DiscoveryError> {
    let invalid = |reason: &str| DiscoveryError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let path = Path::new(pattern);
    let file_pattern = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| invalid("pattern has no file name component"))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if dir.to_string_lossy().contains(GLOB_META) {
        return Err(invalid("wildcards are only supported in the file name"));
    }

    let matcher = Glob::new(file_pattern)
        .map_err(|e| invalid(&e.to_string()))?
        .compile_matcher();

    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("Corpus directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(source) => return Err(DiscoveryError::Io { dir, source }),
    };

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DiscoveryError::Io {
            dir: dir.clone(),
            source,
        })?;

        // Follows symlinks, so linked corpus files are discovered too
        let is_file = std::fs::metadata(entry.path()).map(|m| m.is_file()).unwrap_or(false);
        if is_file && matcher.is_match(entry.file_name()) {
            paths.push(entry.path());
        }
    }
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let label = label_of(&path)?;
            Ok(CorpusFile { path, label })
        })
        .collect()
}

/// Derive a corpus label from a file path
///
/// The label is the first two characters of the base name, taken as-is
/// with no case or locale normalization. `en.csv` and `english.csv` both
/// yield `en`. Names whose stem is shorter than two characters are rejected.
pub fn label_of(path: impl AsRef<Path>) -> Result<String, DiscoveryError> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stem = name.split('.').next().unwrap_or_default();
    if stem.chars().count() < 2 {
        return Err(DiscoveryError::InvalidLabel {
            path: path.to_path_buf(),
        });
    }

    Ok(stem.chars().take(2).collect())
}

/// Labels of every corpus file matched by `pattern`, in discovery order
pub fn supported_bodies(pattern: &str) -> Result<Vec<String>, DiscoveryError> {
    Ok(discover(pattern)?.into_iter().map(|f| f.label).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_label_of_two_letter_name() {
        assert_eq!(label_of("./corpora/en.csv").unwrap(), "en");
    }

    #[test]
    fn test_label_of_long_name() {
        assert_eq!(label_of("corpora/english.csv").unwrap(), "en");
    }

    #[test]
    fn test_label_of_keeps_case() {
        assert_eq!(label_of("PT-br.csv").unwrap(), "PT");
    }

    #[test]
    fn test_label_of_multibyte() {
        assert_eq!(label_of("日本語.csv").unwrap(), "日本");
    }

    #[test]
    fn test_label_of_short_stem_rejected() {
        assert!(matches!(label_of("e.csv"), Err(DiscoveryError::InvalidLabel { .. })));
        assert!(matches!(label_of(".csv"), Err(DiscoveryError::InvalidLabel { .. })));
    }

    #[test]
    fn test_discover_matches_only_pattern() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("fr.csv"), "abc,1\n").unwrap();
        fs::write(dir.path().join("en.csv"), "abc,1\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let pattern = dir.path().join("*.csv");
        let files = discover(pattern.to_str().unwrap()).unwrap();

        let labels: Vec<_> = files.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["en", "fr"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_follows_symlinks() {
        let tables = tempfile::tempdir().unwrap();
        let target = tables.path().join("english-table.txt");
        fs::write(&target, "abc,1\n").unwrap();

        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("en.csv")).unwrap();
        std::os::unix::fs::symlink(tables.path(), dir.path().join("linked-dir.csv")).unwrap();

        let pattern = dir.path().join("*.csv");
        let files = discover(pattern.to_str().unwrap()).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].label, "en");
        assert_eq!(files[0].path, dir.path().join("en.csv"));
    }

    #[test]
    fn test_discover_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = dir.path().join("missing").join("*.csv");
        let files = discover(pattern.to_str().unwrap()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_discover_rejects_wildcard_directory() {
        let result = discover("./corp*/*.csv");
        assert!(matches!(result, Err(DiscoveryError::InvalidPattern { .. })));
    }

    #[test]
    fn test_discover_rejects_bad_glob() {
        let result = discover("./corpora/[a-.csv");
        assert!(matches!(result, Err(DiscoveryError::InvalidPattern { .. })));
    }
}
