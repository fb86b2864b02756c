//! Resolver configuration
//!
//! All tunables of the ray march live in one immutable structure the
//! host constructs at startup (or once per frame) and passes in. There
//! are no process-wide knobs: two resolves with the same config and
//! inputs produce the same mask.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file contents are not a valid config document.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Quality preset controlling the step budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// 8 steps.
    Low,
    /// 16 steps.
    #[default]
    Medium,
    /// 32 steps.
    High,
    /// 64 steps.
    Ultra,
}

impl Quality {
    /// Step budget for this preset.
    pub const fn max_steps(&self) -> u32 {
        match self {
            Self::Low => 8,
            Self::Medium => 16,
            Self::High => 32,
            Self::Ultra => 64,
        }
    }
}

/// Contact shadow configuration.
///
/// The step count, bias, and tolerance trade quality against cost and
/// are configuration, not derived values; see the field docs for what
/// each trades off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactShadowConfig {
    /// Fixed upper bound on march steps per pixel. Bounds the worst-case
    /// cost of the whole dispatch.
    pub max_steps: u32,
    /// Ray length as a fraction of the view-space depth times the
    /// tangent of the half-FOV, keeping the screen-space footprint
    /// roughly resolution independent.
    pub ray_length_scale: f32,
    /// Offset along the surface normal applied to the ray origin, in
    /// world units. Avoids self-shadowing acne.
    pub surface_bias: f32,
    /// Multiplier on the adaptive depth tolerance. Larger values trade
    /// false negatives for false positives at grazing angles.
    pub tolerance_scale: f32,
    /// Absolute depth epsilon under which a sample is treated as the
    /// originating surface itself. Must stay small relative to the
    /// tolerance band or it suppresses legitimate close-range occluders.
    pub self_intersect_epsilon: f32,
}

impl Default for ContactShadowConfig {
    fn default() -> Self {
        Self {
            max_steps: Quality::Medium.max_steps(),
            ray_length_scale: 0.1,
            surface_bias: 0.01,
            tolerance_scale: 2.0,
            self_intersect_epsilon: 1e-6,
        }
    }
}

impl ContactShadowConfig {
    /// Config for a quality preset, other fields at their defaults.
    pub fn preset(quality: Quality) -> Self {
        Self {
            max_steps: quality.max_steps(),
            ..Self::default()
        }
    }

    /// Set the step budget.
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the ray length scale.
    pub fn with_ray_length_scale(mut self, scale: f32) -> Self {
        self.ray_length_scale = scale;
        self
    }

    /// Set the surface bias.
    pub fn with_surface_bias(mut self, bias: f32) -> Self {
        self.surface_bias = bias;
        self
    }

    /// Set the tolerance scale.
    pub fn with_tolerance_scale(mut self, scale: f32) -> Self {
        self.tolerance_scale = scale;
        self
    }

    /// Parse a config from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a config from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ContactShadowConfig::default();
        assert_eq!(config.max_steps, 16);
        assert!(config.self_intersect_epsilon < config.tolerance_scale);
    }

    #[test]
    fn test_presets() {
        assert_eq!(ContactShadowConfig::preset(Quality::Low).max_steps, 8);
        assert_eq!(ContactShadowConfig::preset(Quality::Ultra).max_steps, 64);
        // Presets only change the step budget.
        assert_eq!(
            ContactShadowConfig::preset(Quality::High).surface_bias,
            ContactShadowConfig::default().surface_bias
        );
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = ContactShadowConfig::from_yaml_str("max_steps: 32\n").unwrap();
        assert_eq!(config.max_steps, 32);
        assert_eq!(
            config.tolerance_scale,
            ContactShadowConfig::default().tolerance_scale
        );
    }

    #[test]
    fn test_full_yaml() {
        let yaml = "\
max_steps: 64
ray_length_scale: 0.25
surface_bias: 0.005
tolerance_scale: 4.0
self_intersect_epsilon: 0.000002
";
        let config = ContactShadowConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.max_steps, 64);
        assert_eq!(config.ray_length_scale, 0.25);
        assert_eq!(config.tolerance_scale, 4.0);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let result = ContactShadowConfig::from_yaml_str("max_steps: [not a number]");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_builder_setters() {
        let config = ContactShadowConfig::default()
            .with_max_steps(8)
            .with_tolerance_scale(1.0)
            .with_surface_bias(0.0)
            .with_ray_length_scale(0.5);
        assert_eq!(config.max_steps, 8);
        assert_eq!(config.tolerance_scale, 1.0);
        assert_eq!(config.surface_bias, 0.0);
        assert_eq!(config.ray_length_scale, 0.5);
    }
}
