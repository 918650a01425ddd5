//! Viewer configuration.
//!
//! Every threshold the pipeline uses comes from here. Load it from TOML or
//! start from [`ViewerConfig::default`] and adjust with the `with_*` setters.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::document::parser::{ParseLimits, MAX_DEPTH_CEILING};
use crate::error::ConfigError;
use crate::graph::builder::BuildLimits;
use crate::layout::arrange::Spacing;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Rebuild on every edit (after the debounce window) instead of waiting
    /// for an explicit trigger.
    pub live: bool,
    pub debounce_ms: u64,
    pub collapse_threshold: usize,
    pub max_depth: usize,
    pub max_nodes: usize,
    pub layer_gap: f32,
    pub sibling_gap: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            live: true,
            debounce_ms: 300,
            collapse_threshold: 50,
            max_depth: 64,
            max_nodes: 100_000,
            layer_gap: 240.0,
            sibling_gap: 60.0,
        }
    }
}

impl ViewerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_CEILING {
            return Err(ConfigError::Invalid {
                field: "max_depth",
                reason: format!("must be between 1 and {MAX_DEPTH_CEILING}, got {}", self.max_depth),
            });
        }
        if self.max_nodes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_nodes",
                reason: "must be at least 1".to_string(),
            });
        }
        for (field, gap) in [("layer_gap", self.layer_gap), ("sibling_gap", self.sibling_gap)] {
            if !(gap.is_finite() && gap > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {gap}"),
                });
            }
        }
        Ok(())
    }

    pub fn with_live(mut self, live: bool) -> Self {
        self.live = live;
        self
    }

    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_collapse_threshold(mut self, threshold: usize) -> Self {
        self.collapse_threshold = threshold;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// `max_depth` as both stages apply it.
    fn depth_limit(&self) -> usize {
        self.max_depth.clamp(1, MAX_DEPTH_CEILING)
    }

    pub fn parse_limits(&self) -> ParseLimits {
        ParseLimits {
            max_depth: self.depth_limit(),
        }
    }

    pub fn build_limits(&self) -> BuildLimits {
        BuildLimits {
            max_depth: self.depth_limit(),
            max_nodes: self.max_nodes.max(1),
            collapse_threshold: self.collapse_threshold,
        }
    }

    pub fn spacing(&self) -> Spacing {
        Spacing {
            layer_gap: self.layer_gap,
            sibling_gap: self.sibling_gap,
        }
    }
}
