use crate::core::registry::{default_concurrency, LoadOptions};
use crate::models::DuplicatePolicy;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub corpus: CorpusSettings,
    #[serde(default)]
    pub classification: ClassificationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8001 }

#[derive(Debug, Clone, Deserialize)]
pub struct CorpusSettings {
    #[serde(default = "default_pattern")]
    pub pattern: String,
    #[serde(default = "default_ngram_order")]
    pub ngram_order: usize,
    #[serde(default = "default_profile_size")]
    pub profile_size: usize,
    pub max_concurrent_loads: Option<usize>,
    #[serde(default)]
    pub on_duplicate_label: DuplicatePolicy,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            ngram_order: default_ngram_order(),
            profile_size: default_profile_size(),
            max_concurrent_loads: None,
            on_duplicate_label: DuplicatePolicy::default(),
        }
    }
}

impl CorpusSettings {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            ngram_order: self.ngram_order,
            max_concurrency: self.max_concurrent_loads.unwrap_or_else(default_concurrency),
            on_duplicate: self.on_duplicate_label,
        }
    }
}

fn default_pattern() -> String { "./corpora/*.csv".to_string() }
fn default_ngram_order() -> usize { 3 }
fn default_profile_size() -> usize { crate::core::profile::DEFAULT_PROFILE_SIZE }

#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationSettings {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ClassificationSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ClassificationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 { 5000 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with BISCUIT_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., BISCUIT__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        let settings = apply_port_override(settings)?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the loader or classifier cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.corpus.ngram_order == 0 {
            return Err(ConfigError::Message("corpus.ngram_order must be at least 1".to_string()));
        }
        if self.corpus.profile_size == 0 {
            return Err(ConfigError::Message("corpus.profile_size must be at least 1".to_string()));
        }
        if self.corpus.max_concurrent_loads == Some(0) {
            return Err(ConfigError::Message("corpus.max_concurrent_loads must be at least 1".to_string()));
        }
        if self.classification.timeout_ms == 0 {
            return Err(ConfigError::Message("classification.timeout_ms must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn environment() -> Environment {
    Environment::with_prefix("BISCUIT")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Honour the conventional `PORT` variable used by container platforms
fn apply_port_override(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
        Some(port) => Config::builder()
            .add_source(settings)
            .set_override("server.port", i64::from(port))?
            .build(),
        None => Ok(settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8001);
        assert_eq!(settings.corpus.pattern, "./corpora/*.csv");
        assert_eq!(settings.corpus.ngram_order, 3);
        assert_eq!(settings.corpus.profile_size, 300);
        assert_eq!(settings.corpus.on_duplicate_label, DuplicatePolicy::Warn);
        assert_eq!(settings.classification.timeout(), Duration::from_secs(5));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "compact");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 9100\n\n[corpus]\npattern = \"./data/*.csv\"\nmax_concurrent_loads = 2\non_duplicate_label = \"error\"\n"
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.corpus.pattern, "./data/*.csv");

        let options = settings.corpus.load_options();
        assert_eq!(options.max_concurrency, 2);
        assert_eq!(options.ngram_order, 3);
        assert_eq!(options.on_duplicate, DuplicatePolicy::Error);
    }

    #[test]
    fn test_zero_ngram_order_rejected() {
        let mut settings = Settings::default();
        settings.corpus.ngram_order = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut settings = Settings::default();
        settings.corpus.max_concurrent_loads = Some(0);
        assert!(settings.validate().is_err());
    }
}
