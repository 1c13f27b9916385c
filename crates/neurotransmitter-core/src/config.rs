//! Cascade simulation configuration.
//!
//! Every numeric constant of the cascade lives here with its default value.
//! The defaults reproduce the reference behaviour exactly; overriding them is
//! meant for experiments and sensitivity analysis, not for routine use.
//!
//! Configuration files are JSON. Missing fields fall back to their defaults:
//!
//! ```json
//! { "default_steps": 4, "confidence_decay": 0.75 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NeurotransmitterError, NeurotransmitterResult, ValidationError};

/// Baseline neurotransmitter level that changes are applied to
pub const BASELINE_LEVEL: f64 = 0.5;

/// Default number of cascade steps (the direct pass counts as step 0)
pub const DEFAULT_STEPS: usize = 3;

/// Default ceiling on cascade steps accepted from callers
pub const DEFAULT_MAX_STEPS: usize = 64;

/// Absolute ceiling on `max_steps`
pub const HARD_MAX_STEPS: usize = 1024;

/// Confidence assigned to first-order (direct) receptor effects
pub const DIRECT_EFFECT_CONFIDENCE: f64 = 0.7;

/// Per-step confidence decay base (`decay^step`)
pub const CONFIDENCE_DECAY: f64 = 0.8;

/// Minimum |activation| for a region to propagate to its targets
pub const PROPAGATION_THRESHOLD: f64 = 0.1;

/// Minimum |activation| (exclusive) for a region to appear in results
pub const RESULT_THRESHOLD: f64 = 0.05;

/// Cascade simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Baseline level that initial changes are added to
    pub baseline_level: f64,
    /// Steps used by `simulate_cascade_default_with` and the CLI when no
    /// step count is given
    pub default_steps: usize,
    /// Largest step count accepted
    pub max_steps: usize,
    /// Confidence of direct receptor effects
    pub direct_confidence: f64,
    /// Confidence decay base per propagation step
    pub confidence_decay: f64,
    /// Significance gate for propagation
    pub propagation_threshold: f64,
    /// Filter applied to the final result
    pub result_threshold: f64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            baseline_level: BASELINE_LEVEL,
            default_steps: DEFAULT_STEPS,
            max_steps: DEFAULT_MAX_STEPS,
            direct_confidence: DIRECT_EFFECT_CONFIDENCE,
            confidence_decay: CONFIDENCE_DECAY,
            propagation_threshold: PROPAGATION_THRESHOLD,
            result_threshold: RESULT_THRESHOLD,
        }
    }
}

impl CascadeConfig {
    /// Create a configuration with reference defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the default step count
    pub fn with_default_steps(mut self, steps: usize) -> Self {
        self.default_steps = steps;
        self
    }

    /// Override the step ceiling
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Override the per-step confidence decay
    pub fn with_confidence_decay(mut self, decay: f64) -> Self {
        self.confidence_decay = decay;
        self
    }

    /// Check every parameter against its allowed range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_range("baseline_level", self.baseline_level, 0.0, 1.0)?;
        ValidationError::check_range("direct_confidence", self.direct_confidence, 0.0, 1.0)?;
        ValidationError::check_range("confidence_decay", self.confidence_decay, 0.0, 1.0)?;
        ValidationError::check_range(
            "propagation_threshold",
            self.propagation_threshold,
            0.0,
            1.0,
        )?;
        ValidationError::check_range("result_threshold", self.result_threshold, 0.0, 1.0)?;

        if self.max_steps > HARD_MAX_STEPS {
            return Err(ValidationError::StepsOutOfRange {
                steps: self.max_steps,
                max: HARD_MAX_STEPS,
            });
        }
        if self.default_steps > self.max_steps {
            return Err(ValidationError::StepsOutOfRange {
                steps: self.default_steps,
                max: self.max_steps,
            });
        }
        Ok(())
    }

    /// Check a caller-supplied step count against `max_steps`.
    pub fn check_steps(&self, steps: usize) -> Result<usize, ValidationError> {
        if steps > self.max_steps {
            return Err(ValidationError::StepsOutOfRange {
                steps,
                max: self.max_steps,
            });
        }
        Ok(steps)
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> NeurotransmitterResult<Self> {
        let config: CascadeConfig = serde_json::from_str(json)
            .map_err(|e| NeurotransmitterError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> NeurotransmitterResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NeurotransmitterError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_json_str(&content)?;
        tracing::debug!(path = %path.display(), ?config, "Loaded cascade configuration");
        Ok(config)
    }
}
