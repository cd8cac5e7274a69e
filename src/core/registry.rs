use crate::core::profile::{LoadError, ProfileBuilder};
use crate::core::source::{discover, DiscoveryError};
use crate::models::{CorpusFile, DuplicatePolicy};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Errors that stop the service from starting
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Failed to load corpus `{label}` from {}: {source}", .path.display())]
    Load {
        label: String,
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    #[error("Duplicate label `{label}`: {} and {}", .first.display(), .second.display())]
    DuplicateLabel {
        label: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("`{body}` is not a supported body")]
    UnsupportedBody { body: String },

    #[error("Corpus loader task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Label to profile mapping, read-only once built
#[derive(Debug)]
pub struct Registry<P> {
    profiles: HashMap<String, P>,
}

impl<P> Registry<P> {
    pub fn empty() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    /// Build a registry directly from labelled profiles (last label wins)
    pub fn from_profiles<I, L>(profiles: I) -> Self
    where
        I: IntoIterator<Item = (L, P)>,
        L: Into<String>,
    {
        Self {
            profiles: profiles.into_iter().map(|(l, p)| (l.into(), p)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.profiles.contains_key(label)
    }

    pub fn get(&self, label: &str) -> Option<&P> {
        self.profiles.get(label)
    }

    /// Registered labels, sorted
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        labels.sort_unstable();
        labels
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &P)> {
        self.profiles.iter().map(|(l, p)| (l.as_str(), p))
    }
}

/// How the startup loader builds a registry
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub ngram_order: usize,
    pub max_concurrency: usize,
    pub on_duplicate: DuplicatePolicy,
}

impl LoadOptions {
    pub fn new(ngram_order: usize) -> Self {
        Self {
            ngram_order,
            max_concurrency: default_concurrency(),
            on_duplicate: DuplicatePolicy::default(),
        }
    }
}

/// Number of loads allowed in flight when none is configured
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Discover corpora and load them into a registry
///
/// `bodies` restricts loading to the listed labels; blank entries are
/// ignored and an empty list loads everything. Must complete before any
/// listener is bound.
pub async fn initialize<B: ProfileBuilder>(
    builder: Arc<B>,
    pattern: &str,
    bodies: &[String],
    options: &LoadOptions,
) -> Result<Registry<B::Profile>, StartupError> {
    let files = select_bodies(discover(pattern)?, bodies)?;

    if files.is_empty() {
        warn!("No corpus files matched `{}`, classification will be unavailable", pattern);
    }

    build_registry(builder, files, options).await
}

/// Keep only files whose label was requested, rejecting unknown requests
pub fn select_bodies(files: Vec<CorpusFile>, bodies: &[String]) -> Result<Vec<CorpusFile>, StartupError> {
    let requested: Vec<&str> = bodies
        .iter()
        .map(|b| b.trim())
        .filter(|b| !b.is_empty())
        .collect();

    if requested.is_empty() {
        return Ok(files);
    }

    if let Some(body) = requested
        .iter()
        .find(|body| !files.iter().any(|f| f.label == **body))
    {
        return Err(StartupError::UnsupportedBody {
            body: body.to_string(),
        });
    }

    Ok(files
        .into_iter()
        .filter(|f| requested.contains(&f.label.as_str()))
        .collect())
}

/// A profile loaded by one worker, tagged with its discovery position
struct Loaded<P> {
    index: usize,
    file: CorpusFile,
    profile: P,
}

/// Load every corpus concurrently and publish the registry once all succeed
///
/// At most `options.max_concurrency` files are read at a time. The first
/// failure cancels outstanding loads and is returned; a partial registry is
/// never produced. Profiles are merged in discovery order after the join,
/// so duplicate handling does not depend on completion order.
pub async fn build_registry<B: ProfileBuilder>(
    builder: Arc<B>,
    files: Vec<CorpusFile>,
    options: &LoadOptions,
) -> Result<Registry<B::Profile>, StartupError> {
    let total = files.len();
    let semaphore = Arc::new(Semaphore::new(options.max_concurrency.max(1)));
    let mut join_set: JoinSet<Result<Loaded<B::Profile>, StartupError>> = JoinSet::new();

    for (index, file) in files.into_iter().enumerate() {
        let builder = Arc::clone(&builder);
        let semaphore = Arc::clone(&semaphore);
        let order = options.ngram_order;

        join_set.spawn(async move {
            // The semaphore is never closed, so this only waits.
            let _permit = semaphore.acquire_owned().await.ok();

            let (label, path) = (file.label.clone(), file.path.clone());
            let built = match tokio::task::spawn_blocking(move || builder.from_file(&label, &path, order)).await {
                Ok(built) => built,
                Err(e) => return Err(StartupError::Worker(e)),
            };

            match built {
                Ok(profile) => Ok(Loaded { index, file, profile }),
                Err(source) => Err(StartupError::Load {
                    label: file.label,
                    path: file.path,
                    source,
                }),
            }
        });
    }

    let mut loaded = Vec::with_capacity(total);
    while let Some(joined) = join_set.join_next().await {
        match joined? {
            Ok(corpus) => {
                info!("Loaded corpus `{}` from {}", corpus.file.label, corpus.file.path.display());
                loaded.push(corpus);
            }
            Err(e) => {
                join_set.abort_all();
                return Err(e);
            }
        }
    }

    loaded.sort_by_key(|corpus| corpus.index);
    merge(loaded, options.on_duplicate)
}

fn merge<P>(loaded: Vec<Loaded<P>>, policy: DuplicatePolicy) -> Result<Registry<P>, StartupError> {
    let mut origins: HashMap<String, PathBuf> = HashMap::with_capacity(loaded.len());
    let mut profiles = HashMap::with_capacity(loaded.len());

    for Loaded { file, profile, .. } in loaded {
        if let Some(first) = origins.get(&file.label) {
            match policy {
                DuplicatePolicy::Error => {
                    return Err(StartupError::DuplicateLabel {
                        label: file.label,
                        first: first.clone(),
                        second: file.path,
                    });
                }
                DuplicatePolicy::Warn => {
                    warn!(
                        "Label `{}` from {} replaces {}",
                        file.label,
                        file.path.display(),
                        first.display()
                    );
                }
            }
        }

        origins.insert(file.label.clone(), file.path);
        profiles.insert(file.label, profile);
    }

    info!("Registry ready with {} bodies", profiles.len());
    Ok(Registry { profiles })
}
