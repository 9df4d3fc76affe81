use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::extract::{DEFAULT_ORGAO, ExtractOptions, INDEPENDENT_SIGLA};
use crate::reconcile::DEFAULT_ALLOWED_ORGAOS;

/// Optional JSON overrides for document conventions; absent keys keep defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub default_orgao: String,
    pub independent_sigla: String,
    pub allowed_orgaos: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_orgao: DEFAULT_ORGAO.to_string(),
            independent_sigla: INDEPENDENT_SIGLA.to_string(),
            allowed_orgaos: DEFAULT_ALLOWED_ORGAOS
                .iter()
                .map(|orgao| orgao.to_string())
                .collect(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config json: {}", path.display()))
    }

    pub fn extract_options(&self, repair: bool) -> ExtractOptions {
        ExtractOptions {
            default_orgao: self.default_orgao.clone(),
            independent_sigla: self.independent_sigla.clone(),
            repair,
        }
    }
}
