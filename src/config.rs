use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::eval::EvalOptions;
use crate::retrieval::SimilarityMetric;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    pub systems: Vec<SystemConfig>,
}

/// Dataset sources and column roles
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    /// Directory containing the source TSV files.
    pub dir: PathBuf,
    /// TSV files merged into the candidate table, joined on the id column.
    pub sources: Vec<String>,
    /// Column holding the serialized tag-weight mapping.
    #[serde(default = "default_tags_column")]
    pub tags_column: String,
    /// Column holding the serialized genre list.
    #[serde(default = "default_genre_column")]
    pub genre_column: String,
    /// Numeric column used for the popularity metric.
    pub popularity_column: String,
    /// Per-source column renames, keyed by file name then source column name.
    #[serde(default)]
    pub rename: HashMap<String, HashMap<String, String>>,
}

/// Evaluation knobs
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationConfig {
    /// Size of the ranked result list (top-K cutoff).
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Minimum tag weight counted by the diversity metric.
    #[serde(default = "default_weight_threshold")]
    pub weight_threshold: f64,
    /// Seed for the random-baseline permutation.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Similarity metrics to evaluate.
    #[serde(default = "default_metrics")]
    pub metrics: Vec<String>,
}

/// One retrieval system under evaluation. A system without a features file
/// is the random-baseline arm.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    pub name: String,
    /// TSV of feature embeddings (id column plus numeric feature columns).
    #[serde(default)]
    pub features_file: Option<String>,
}

fn default_tags_column() -> String {
    "(tag, weight)".to_string()
}

fn default_genre_column() -> String {
    "genre".to_string()
}

fn default_top_n() -> usize {
    10
}

fn default_weight_threshold() -> f64 {
    60.0
}

fn default_seed() -> u64 {
    42
}

fn default_metrics() -> Vec<String> {
    vec!["cosine".to_string(), "euclidean".to_string()]
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            weight_threshold: default_weight_threshold(),
            seed: default_seed(),
            metrics: default_metrics(),
        }
    }
}

impl EvaluationConfig {
    /// Parse the configured metric names. Unknown names are fatal.
    pub fn similarity_metrics(&self) -> crate::error::Result<Vec<SimilarityMetric>> {
        self.metrics.iter().map(|m| m.parse()).collect()
    }

    /// The typed option set handed to the evaluation core.
    pub fn options(&self) -> EvalOptions {
        EvalOptions {
            top_n: self.top_n,
            weight_threshold: self.weight_threshold,
            seed: self.seed,
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in MIREVAL_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignore errors - file is optional)
        let _ = dotenv::dotenv();

        let config_path = std::env::var("MIREVAL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .context("Failed to parse config.toml")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if !self.dataset.dir.exists() {
            anyhow::bail!(
                "dataset.dir does not exist: {}. Set dataset.dir in config.toml to your dataset directory.",
                self.dataset.dir.display()
            );
        }

        if !self.dataset.dir.is_dir() {
            anyhow::bail!(
                "dataset.dir must be a directory, not a file: {}",
                self.dataset.dir.display()
            );
        }

        if self.dataset.sources.is_empty() {
            anyhow::bail!("dataset.sources must list at least one TSV file");
        }

        if self.dataset.popularity_column.trim().is_empty() {
            anyhow::bail!("dataset.popularity_column must not be empty");
        }

        if self.evaluation.top_n == 0 {
            anyhow::bail!("evaluation.top_n must be greater than 0");
        }

        if self.evaluation.weight_threshold < 0.0 {
            anyhow::bail!("evaluation.weight_threshold must not be negative");
        }

        if self.evaluation.metrics.is_empty() {
            anyhow::bail!("evaluation.metrics must list at least one similarity metric");
        }

        // Surface unknown metric names before any data is read
        self.evaluation.similarity_metrics()?;

        if self.systems.is_empty() {
            anyhow::bail!("at least one [[systems]] entry is required");
        }

        let mut names = HashSet::new();
        for system in &self.systems {
            if system.name.trim().is_empty() {
                anyhow::bail!("system names must not be empty");
            }
            if !names.insert(system.name.as_str()) {
                anyhow::bail!("duplicate system name: {}", system.name);
            }
            if let Some(ref file) = system.features_file {
                if file.trim().is_empty() {
                    anyhow::bail!("system {} has an empty features_file", system.name);
                }
            }
        }

        Ok(())
    }

    /// Directory holding the source TSV files
    pub fn dataset_dir(&self) -> &Path {
        &self.dataset.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn create_test_config(temp_dir: &TempDir) -> String {
        let dir = temp_dir.path().canonicalize().unwrap();
        let dir_str = dir.to_str().unwrap().replace('\\', "\\\\");
        format!(
            r#"
[dataset]
dir = "{}"
sources = ["id_genres.tsv", "id_tags.tsv", "id_listens.tsv"]
popularity_column = "total_listens"

[evaluation]
top_n = 5
weight_threshold = 50.0
seed = 7
metrics = ["cosine"]

[[systems]]
name = "tfidf"
features_file = "id_tfidf.tsv"

[[systems]]
name = "random"
"#,
            dir_str
        )
    }

    fn with_config_env(config_path: &std::path::Path, f: impl FnOnce()) {
        let original = std::env::var("MIREVAL_CONFIG").ok();
        std::env::set_var("MIREVAL_CONFIG", config_path.to_str().unwrap());
        f();
        std::env::remove_var("MIREVAL_CONFIG");
        if let Some(val) = original {
            std::env::set_var("MIREVAL_CONFIG", val);
        }
    }

    #[test]
    fn test_config_load_success() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, create_test_config(&temp_dir)).unwrap();
        with_config_env(&config_path, || {
            let config = Config::load();
            assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
            let config = config.unwrap();
            assert_eq!(config.evaluation.top_n, 5);
            assert_eq!(config.evaluation.seed, 7);
            assert_eq!(config.dataset.tags_column, "(tag, weight)");
            assert_eq!(config.systems.len(), 2);
            assert!(config.systems[1].features_file.is_none());
        });
    }

    #[test]
    fn test_config_defaults() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().canonicalize().unwrap();
        let content = format!(
            r#"
[dataset]
dir = "{}"
sources = ["id_tags.tsv"]
popularity_column = "total_listens"

[[systems]]
name = "random"
"#,
            dir.to_str().unwrap().replace('\\', "\\\\")
        );
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, content).unwrap();
        with_config_env(&config_path, || {
            let config = Config::load().unwrap();
            assert_eq!(config.evaluation.top_n, 10);
            assert_eq!(config.evaluation.weight_threshold, 60.0);
            assert_eq!(config.evaluation.seed, 42);
            assert_eq!(config.evaluation.metrics, vec!["cosine", "euclidean"]);
        });
    }

    #[test]
    fn test_config_rejects_unknown_metric() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let content = create_test_config(&temp_dir).replace("\"cosine\"", "\"manhattan\"");
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, content).unwrap();
        with_config_env(&config_path, || {
            let err = Config::load().unwrap_err();
            assert!(err.to_string().contains("manhattan"));
        });
    }

    #[test]
    fn test_config_rejects_duplicate_system_names() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let content = create_test_config(&temp_dir).replace("name = \"random\"", "name = \"tfidf\"");
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, content).unwrap();
        with_config_env(&config_path, || {
            let err = Config::load().unwrap_err();
            assert!(err.to_string().contains("duplicate system name"));
        });
    }

    #[test]
    fn test_config_invalid_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let original = std::env::var("MIREVAL_CONFIG").ok();
        std::env::set_var("MIREVAL_CONFIG", "nonexistent.toml");
        let config = Config::load();
        assert!(config.is_err());
        std::env::remove_var("MIREVAL_CONFIG");
        if let Some(v) = original {
            std::env::set_var("MIREVAL_CONFIG", v);
        }
    }
}
