//! Pipeline configuration loaded from TOML.
//!
//! Every key has a default, so an empty file (or no file) is a valid
//! configuration. Command-line flags are applied on top by the caller.

use std::path::Path;
use std::time::Duration;

use ctp_extract::{DEFAULT_CONCURRENCY, DEFAULT_ENDPOINT, DEFAULT_MODEL, ExtractorConfig, LlmConfig};
use ctp_ingest::{ChunkConfig, DEFAULT_MAX_CHARS, DEFAULT_OVERLAP};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Default environment variable holding the LLM API key.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// ROOT CONFIG
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub chunking: ChunkingSettings,
    pub inference: InferenceSettings,
    pub llm: LlmSettings,
}

impl PipelineConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file without validating it.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })
    }

    /// # Errors
    ///
    /// Rejects a zero timeout, zero concurrency, an invalid chunk
    /// configuration, and an LLM backend without endpoint or model.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunk_config()?;
        if self.inference.timeout_secs == 0 {
            return Err(ConfigError::invalid("inference.timeout_secs must be at least 1"));
        }
        if self.inference.concurrency == 0 {
            return Err(ConfigError::invalid("inference.concurrency must be at least 1"));
        }
        if self.inference.backend == Backend::Llm {
            if self.llm.endpoint.trim().is_empty() {
                return Err(ConfigError::invalid("llm.endpoint must not be empty"));
            }
            if self.llm.model.trim().is_empty() {
                return Err(ConfigError::invalid("llm.model must not be empty"));
            }
        }
        Ok(())
    }

    pub fn chunk_config(&self) -> Result<ChunkConfig, ConfigError> {
        Ok(ChunkConfig::new(
            self.chunking.max_chars,
            self.chunking.overlap,
        )?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.inference.timeout_secs)
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            timeout: self.timeout(),
            concurrency: self.inference.concurrency,
        }
    }

    /// LLM client settings, reading the API key from the configured
    /// environment variable.
    pub fn llm_config(&self) -> LlmConfig {
        let api_key = std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            warn!(
                var = %self.llm.api_key_env,
                "no API key set, sending unauthenticated requests"
            );
        }
        LlmConfig {
            endpoint: self.llm.endpoint.clone(),
            model: self.llm.model.clone(),
            api_key,
            request_timeout: self.timeout(),
        }
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

/// `[chunking]`: sizes are in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChunkingSettings {
    pub max_chars: usize,
    pub overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// `[inference]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceSettings {
    pub backend: Backend,
    /// Per-chunk time budget in seconds.
    pub timeout_secs: u64,
    /// Chunks inferred at once.
    pub concurrency: usize,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// `[llm]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmSettings {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable with the API key. The key itself is
    /// never stored in the file.
    pub api_key_env: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

/// Which [`ChunkInferer`](ctp_extract::ChunkInferer) runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Rules,
    Llm,
}

impl Backend {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rules => "rules",
            Self::Llm => "llm",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_all_defaults() {
        let config: PipelineConfig = toml::from_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.chunking.max_chars, 6000);
        assert_eq!(config.chunking.overlap, 400);
        assert_eq!(config.inference.backend, Backend::Rules);
        assert_eq!(config.inference.timeout_secs, 60);
        assert_eq!(config.inference.concurrency, 4);
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
            [chunking]
            max_chars = 2000

            [inference]
            backend = "llm"
            "#,
        )
        .unwrap();
        assert_eq!(config.chunking.max_chars, 2000);
        assert_eq!(config.chunking.overlap, 400);
        assert_eq!(config.inference.backend, Backend::Llm);
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = PipelineConfig::default();
        config.inference.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let mut config = PipelineConfig::default();
        config.inference.concurrency = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let mut config = PipelineConfig::default();
        config.chunking.overlap = config.chunking.max_chars;
        assert!(matches!(config.validate(), Err(ConfigError::Chunk(_))));

        let mut config = PipelineConfig::default();
        config.inference.backend = Backend::Llm;
        config.llm.model = " ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<PipelineConfig>("[chunking]\nsize = 10").is_err());
        assert!(toml::from_str::<PipelineConfig>("[inference]\nbackend = \"gpt\"").is_err());
    }

    #[test]
    fn derived_settings() {
        let config = PipelineConfig::default();
        assert_eq!(config.extractor_config().timeout, Duration::from_secs(60));
        assert_eq!(config.extractor_config().concurrency, 4);
        assert_eq!(config.chunk_config().unwrap(), ChunkConfig::default());
        assert_eq!(Backend::Llm.label(), "llm");
    }
}
