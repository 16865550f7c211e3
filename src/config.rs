//! Configuration management for ELERAG
//!
//! Provides TOML-based configuration with per-profile defaults and validation.
//! Location: ~/.elerag/config.toml (or `--config <path>`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{RagError, Result};

/// Reciprocal Rank Fusion constant; fixed, never tuned.
pub const RRF_CONSTANT: f64 = 60.0;

/// Named configurations carried over from the three corpus setups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Small fact sheets; entity enrichment only for small corpora
    Simple,
    /// Entity enrichment always on, prose chunking for text files
    Improved,
    /// Large email dumps; wider pools, header cleaning, evidence report
    Legal,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Simple => "simple",
            Profile::Improved => "improved",
            Profile::Legal => "legal",
        }
    }
}

/// When entity enrichment runs during ingest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityPolicy {
    Always,
    BelowThreshold,
    Never,
}

/// Complete configuration for ELERAG
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub profile: Profile,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub entities: EntityConfig,
    pub embedding: EmbeddingConfig,
    pub generator: GeneratorConfig,
    pub paths: PathsConfig,
}

/// Source loading and chunking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size_words: usize,
    pub overlap_words: usize,
    pub min_chunk_chars: usize,
    pub max_chunk_chars: usize,
    /// Run non-CSV sources through the smart chunker instead of blank-line splitting
    pub prose: bool,
    /// Treat every CSV text column as a raw email
    pub clean_email_bodies: bool,
}

/// Hybrid retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Top-K retained per ranked list (dense, entity)
    pub dense_pool: usize,
    /// Fused candidates handed to the diversity filter
    pub candidate_pool: usize,
    pub final_k: usize,
    pub diversity_threshold: f32,
}

/// Entity extraction and knowledge-base lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityConfig {
    pub policy: EntityPolicy,
    pub use_entities_threshold: usize,
    pub kb_endpoint: String,
    pub kb_timeout_secs: u64,
    pub kb_candidates: usize,
    pub user_agent: String,
    pub cache_negative_results: bool,
}

/// Embedding model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model_id: String,
    pub batch_size: usize,
}

/// External generator binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub executable: String,
    pub model: String,
    pub n_predict: u32,
    pub ctx_size: u32,
    pub timeout_secs: u64,
    pub report_file: Option<String>,
}

/// File system paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub memory_file: String,
    pub entity_cache_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_profile(Profile::Improved)
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size_words: 300,
            overlap_words: 50,
            min_chunk_chars: 20,
            max_chunk_chars: 5000,
            prose: true,
            clean_email_bodies: false,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            dense_pool: 15,
            candidate_pool: 10,
            final_k: 3,
            diversity_threshold: 0.85,
        }
    }
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            policy: EntityPolicy::Always,
            use_entities_threshold: 500,
            kb_endpoint: crate::kb::wikidata::DEFAULT_ENDPOINT.to_string(),
            kb_timeout_secs: 5,
            kb_candidates: 5,
            user_agent: "ELERAG/0.3 (local retrieval; contact: admin@example.com)".to_string(),
            cache_negative_results: false,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            batch_size: 64,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            executable: "llama-cli".to_string(),
            model: "ggml-model-i2_s.gguf".to_string(),
            n_predict: 128,
            ctx_size: 2048,
            timeout_secs: 300,
            report_file: None,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            memory_file: "pi_memory.json".to_string(),
            entity_cache_file: "entity_cache.json".to_string(),
        }
    }
}

impl EntityConfig {
    /// Whether ingest should run entity enrichment for a corpus of this size
    pub fn enabled_for(&self, corpus_size: usize) -> bool {
        match self.policy {
            EntityPolicy::Always => true,
            EntityPolicy::BelowThreshold => corpus_size < self.use_entities_threshold,
            EntityPolicy::Never => false,
        }
    }
}

impl Config {
    /// Built-in defaults for a profile
    pub fn for_profile(profile: Profile) -> Self {
        let mut config = Self {
            profile,
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            entities: EntityConfig::default(),
            embedding: EmbeddingConfig::default(),
            generator: GeneratorConfig::default(),
            paths: PathsConfig::default(),
        };

        match profile {
            Profile::Improved => {}
            Profile::Simple => {
                config.entities.policy = EntityPolicy::BelowThreshold;
                config.entities.kb_timeout_secs = 1;
                config.chunking.prose = false;
                config.generator.n_predict = 64;
            }
            Profile::Legal => {
                config.entities.policy = EntityPolicy::BelowThreshold;
                config.entities.kb_timeout_secs = 1;
                config.chunking.prose = false;
                config.chunking.clean_email_bodies = true;
                config.retrieval.dense_pool = 25;
                config.retrieval.final_k = 5;
                config.generator.n_predict = 64;
                config.generator.ctx_size = 4096;
                config.generator.report_file = Some("evidence_report.txt".to_string());
            }
        }

        config
    }

    /// Load configuration from an explicit file, the default location, or built-ins
    pub fn load(path: Option<&Path>, profile: Option<Profile>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from_file(path, profile)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::load_from_file(&path, profile)?,
                None => Self::for_profile(profile.unwrap_or(Profile::Improved)),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path, profile: Option<Profile>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagError::BadConfig(format!("Failed to read config: {}", e)))?;

        Self::from_toml_str(&contents, profile)
    }

    /// Parse a TOML document layered over the defaults of its profile.
    ///
    /// `profile` overrides the document's own `profile` key; values written in the
    /// document always win over profile defaults.
    pub fn from_toml_str(contents: &str, profile: Option<Profile>) -> Result<Self> {
        let overrides: toml::Value = toml::from_str(contents)
            .map_err(|e| RagError::BadConfig(format!("Failed to parse config: {}", e)))?;

        let file_profile = match overrides.get("profile") {
            Some(value) => Some(
                value
                    .clone()
                    .try_into::<Profile>()
                    .map_err(|e| RagError::BadConfig(format!("Invalid profile: {}", e)))?,
            ),
            None => None,
        };
        let profile = profile.or(file_profile).unwrap_or(Profile::Improved);

        let mut merged = toml::Value::try_from(Self::for_profile(profile))
            .map_err(|e| RagError::BadConfig(format!("Failed to serialize defaults: {}", e)))?;
        merge_toml(&mut merged, overrides);
        if let Some(table) = merged.as_table_mut() {
            table.insert(
                "profile".to_string(),
                toml::Value::String(profile.as_str().to_string()),
            );
        }

        merged
            .try_into()
            .map_err(|e| RagError::BadConfig(format!("Failed to parse config: {}", e)))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let chunking = &self.chunking;
        if chunking.chunk_size_words == 0 {
            return Err(RagError::BadConfig(
                "chunk_size_words must be greater than 0".to_string(),
            ));
        }
        if chunking.overlap_words >= chunking.chunk_size_words {
            return Err(RagError::BadConfig(
                "overlap_words must be less than chunk_size_words".to_string(),
            ));
        }
        if chunking.min_chunk_chars > chunking.max_chunk_chars {
            return Err(RagError::BadConfig(
                "min_chunk_chars must not exceed max_chunk_chars".to_string(),
            ));
        }

        let retrieval = &self.retrieval;
        if !(0.0..=1.0).contains(&retrieval.diversity_threshold) {
            return Err(RagError::BadConfig(format!(
                "diversity_threshold must be between 0.0 and 1.0, got {}",
                retrieval.diversity_threshold
            )));
        }
        for (name, value) in [
            ("dense_pool", retrieval.dense_pool),
            ("candidate_pool", retrieval.candidate_pool),
            ("final_k", retrieval.final_k),
            ("kb_candidates", self.entities.kb_candidates),
            ("embedding.batch_size", self.embedding.batch_size),
        ] {
            if value == 0 {
                return Err(RagError::BadConfig(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if self.entities.kb_timeout_secs == 0 {
            return Err(RagError::BadConfig(
                "kb_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.entities.kb_endpoint.trim().is_empty() {
            return Err(RagError::BadConfig("kb_endpoint must not be empty".to_string()));
        }

        Ok(())
    }

    /// Serialize the effective configuration
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| RagError::BadConfig(format!("Failed to serialize config: {}", e)))
    }

    /// Default configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".elerag").join("config.toml"))
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    pub fn memory_path(&self) -> PathBuf {
        Self::expand_path(&self.paths.memory_file)
    }

    pub fn entity_cache_path(&self) -> PathBuf {
        Self::expand_path(&self.paths.entity_cache_file)
    }

    pub fn report_path(&self) -> Option<PathBuf> {
        self.generator.report_file.as_deref().map(Self::expand_path)
    }
}

/// Recursively overlay `overrides` onto `base`; tables merge, everything else replaces.
fn merge_toml(base: &mut toml::Value, overrides: toml::Value) {
    match (base, overrides) {
        (toml::Value::Table(base), toml::Value::Table(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overrides) => *base = overrides,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.profile, Profile::Improved);
        assert_eq!(config.chunking.chunk_size_words, 300);
        assert_eq!(config.chunking.overlap_words, 50);
        assert_eq!(config.retrieval.dense_pool, 15);
        assert_eq!(config.retrieval.final_k, 3);
        assert_eq!(config.retrieval.diversity_threshold, 0.85);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_legal_profile_widens_pools() {
        let config = Config::for_profile(Profile::Legal);
        assert_eq!(config.retrieval.dense_pool, 25);
        assert!(config.chunking.clean_email_bodies);
        assert_eq!(config.report_path(), Some(PathBuf::from("evidence_report.txt")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_entity_policy_threshold() {
        let simple = Config::for_profile(Profile::Simple);
        assert!(simple.entities.enabled_for(499));
        assert!(!simple.entities.enabled_for(500));

        let improved = Config::for_profile(Profile::Improved);
        assert!(improved.entities.enabled_for(100_000));
    }

    #[test]
    fn test_config_validation_threshold_range() {
        let mut config = Config::default();
        config.retrieval.diversity_threshold = 1.5;
        assert!(matches!(config.validate(), Err(RagError::BadConfig(_))));
    }

    #[test]
    fn test_config_validation_overlap() {
        let mut config = Config::default();
        config.chunking.overlap_words = 300;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_final_k() {
        let mut config = Config::default();
        config.retrieval.final_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_values_win_over_profile_defaults() {
        let toml = r#"
            profile = "legal"

            [retrieval]
            final_k = 2
        "#;
        let config = Config::from_toml_str(toml, None).unwrap();
        assert_eq!(config.profile, Profile::Legal);
        assert_eq!(config.retrieval.final_k, 2);
        assert_eq!(config.retrieval.dense_pool, 25);
    }

    #[test]
    fn test_cli_profile_overrides_file_profile() {
        let toml = r#"profile = "legal""#;
        let config = Config::from_toml_str(toml, Some(Profile::Simple)).unwrap();
        assert_eq!(config.profile, Profile::Simple);
        assert_eq!(config.retrieval.dense_pool, 15);
    }

    #[test]
    fn test_unparseable_config_is_bad_config() {
        let result = Config::from_toml_str("retrieval = [", None);
        assert!(matches!(result, Err(RagError::BadConfig(_))));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::for_profile(Profile::Legal);
        let text = config.to_toml().unwrap();
        let parsed = Config::from_toml_str(&text, None).unwrap();
        assert_eq!(parsed.profile, Profile::Legal);
        assert_eq!(parsed.generator.ctx_size, 4096);
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let expanded = Config::expand_path("/absolute/path");
        assert_eq!(expanded.to_string_lossy(), "/absolute/path");
    }
}
