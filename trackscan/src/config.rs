use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::binarize::DEFAULT_THRESHOLD;
use crate::error::Result;
use crate::junction::JunctionRegistry;
use crate::thinning::ThinningOptions;

/// Settings for a full image to token run, passed explicitly to every call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)] // missing fields fall back to their defaults
pub struct PipelineConfig {
    /// Channel mean a pixel must exceed to count as light
    pub threshold: u8,
    pub thinning: ThinningOptions,
    /// Junction signatures in match order
    pub signatures: JunctionRegistry,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            thinning: ThinningOptions::default(),
            signatures: JunctionRegistry::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::from_json(&json)?)
    }
}
