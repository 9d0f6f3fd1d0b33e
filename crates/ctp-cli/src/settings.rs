//! Resolving the pipeline configuration from a file plus command-line flags.

use std::path::{Path, PathBuf};

use ctp_core::{Backend, ConfigError, PipelineConfig};

/// XML file name used when the PDF comes from stdin.
pub const STDIN_OUTPUT: &str = "clinical_trial.xml";

/// Flag values that replace whatever the config file says.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub backend: Option<Backend>,
    pub max_chars: Option<usize>,
    pub overlap: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub concurrency: Option<usize>,
    pub llm_endpoint: Option<String>,
    pub llm_model: Option<String>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(backend) = self.backend {
            config.inference.backend = backend;
        }
        if let Some(max_chars) = self.max_chars {
            config.chunking.max_chars = max_chars;
        }
        if let Some(overlap) = self.overlap {
            config.chunking.overlap = overlap;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.inference.timeout_secs = timeout_secs;
        }
        if let Some(concurrency) = self.concurrency {
            config.inference.concurrency = concurrency;
        }
        if let Some(endpoint) = &self.llm_endpoint {
            config.llm.endpoint.clone_from(endpoint);
        }
        if let Some(model) = &self.llm_model {
            config.llm.model.clone_from(model);
        }
    }
}

/// Load the config file (or defaults), apply the flags, then validate the
/// combined result.
///
/// The file is parsed without validation so a flag can fix a value the file
/// gets wrong.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<PipelineConfig, ConfigError> {
    let mut config = match path {
        Some(path) => PipelineConfig::read(path)?,
        None => PipelineConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// True when the input argument means "read the PDF from stdin".
pub fn is_stdin(input: &Path) -> bool {
    input.as_os_str() == "-"
}

/// Where the XML goes when `--output` is not given.
pub fn default_output_path(input: &Path) -> PathBuf {
    if is_stdin(input) {
        PathBuf::from(STDIN_OUTPUT)
    } else {
        input.with_extension("xml")
    }
}
