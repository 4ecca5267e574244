//! # Unified Configuration System
//!
//! All configuration structures for the cull traversal and its host
//! application. Every type here is serializable so a frame's settings can be
//! loaded from TOML or RON.
//!
//! ## Configuration Categories
//!
//! - **Cull Settings**: culling toggles, small-feature ratio, depth metric,
//!   LOD bias, traversal mode, verbose tracing
//! - **Logging Config**: default log filter
//! - **Application Config**: the above plus the camera

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};
use crate::cull::Camera;

/// Depth metric used to order the transparent bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DepthSortMode {
    /// Projection of the eye-to-center vector onto the look vector
    #[default]
    LookVectorDistance,
    /// Squared Euclidean distance from eye to center
    ObjectEyePointDistance,
}

/// Which children a traversal enters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TraversalMode {
    /// Honor per-node child masks (Switch)
    #[default]
    ActiveChildren,
    /// Visit every child regardless of masks
    AllChildren,
}

/// # Cull Settings
///
/// Traversal-scoped settings. A `RenderVisitor` copies these at construction
/// and they may be changed between frames through the visitor's setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullSettings {
    /// Reject bounds lying outside one of the four side planes
    pub view_frustum_culling: bool,
    /// Reject bounds whose radius is small relative to eye distance
    pub small_feature_culling: bool,
    /// Radius / distance threshold for small-feature culling
    pub small_feature_ratio: f32,
    /// Transparent depth metric
    pub depth_sort: DepthSortMode,
    /// Multiplier applied to the eye distance before LOD range lookup
    pub lod_bias: f32,
    /// Child selection policy
    pub traversal_mode: TraversalMode,
    /// Emit per-drawable trace output during cull and replay
    pub debug_logging: bool,
}

impl CullSettings {
    /// Create settings with the default culling behavior
    pub fn new() -> Self {
        Self {
            view_frustum_culling: true,
            small_feature_culling: true,
            small_feature_ratio: 0.002,
            depth_sort: DepthSortMode::default(),
            lod_bias: 1.0,
            traversal_mode: TraversalMode::default(),
            debug_logging: false,
        }
    }

    /// Enable or disable view frustum culling
    pub fn with_view_frustum_culling(mut self, enabled: bool) -> Self {
        self.view_frustum_culling = enabled;
        self
    }

    /// Enable or disable small-feature culling
    pub fn with_small_feature_culling(mut self, enabled: bool) -> Self {
        self.small_feature_culling = enabled;
        self
    }

    /// Set the small-feature ratio threshold
    pub fn with_small_feature_ratio(mut self, ratio: f32) -> Self {
        self.small_feature_ratio = ratio;
        self
    }

    /// Select the transparent depth metric
    pub fn with_depth_sort(mut self, mode: DepthSortMode) -> Self {
        self.depth_sort = mode;
        self
    }

    /// Set the LOD bias
    pub fn with_lod_bias(mut self, bias: f32) -> Self {
        self.lod_bias = bias;
        self
    }

    /// Set the traversal mode
    pub fn with_traversal_mode(mut self, mode: TraversalMode) -> Self {
        self.traversal_mode = mode;
        self
    }

    /// Enable verbose per-drawable tracing
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.small_feature_ratio.is_nan() || self.small_feature_ratio < 0.0 {
            return Err(format!("Small feature ratio must be non-negative, got {}", self.small_feature_ratio));
        }
        if self.lod_bias.is_nan() || self.lod_bias <= 0.0 {
            return Err(format!("LOD bias must be positive, got {}", self.lod_bias));
        }
        Ok(())
    }
}

impl Default for CullSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// # Logging Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that applications load from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Cull traversal settings
    pub culling: CullSettings,
    /// Initial camera
    pub camera: Camera,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.culling.validate().map_err(ConfigError::Invalid)?;
        self.camera.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}

impl Config for ApplicationConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_visitor_defaults() {
        let settings = CullSettings::default();
        assert!(settings.view_frustum_culling);
        assert!(settings.small_feature_culling);
        assert!((settings.small_feature_ratio - 0.002).abs() < f32::EPSILON);
        assert_eq!(settings.depth_sort, DepthSortMode::LookVectorDistance);
        assert!(ApplicationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let text = r#"
            [culling]
            depth_sort = "ObjectEyePointDistance"
            lod_bias = 2.0

            [camera]
            fovy_degrees = 45.0
        "#;
        let config = ApplicationConfig::from_toml_str(text).unwrap();
        assert_eq!(config.culling.depth_sort, DepthSortMode::ObjectEyePointDistance);
        assert!((config.culling.lod_bias - 2.0).abs() < f32::EPSILON);
        assert!(config.culling.small_feature_culling);
        assert!((config.camera.fovy_degrees - 45.0).abs() < f32::EPSILON);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_bad_bias() {
        let mut config = ApplicationConfig::default();
        config.culling.lod_bias = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_nan_and_negative_ratio() {
        assert!(CullSettings::new().with_small_feature_ratio(f32::NAN).validate().is_err());
        assert!(CullSettings::new().with_small_feature_ratio(-0.1).validate().is_err());
        assert!(CullSettings::new().with_lod_bias(f32::NAN).validate().is_err());
        assert!(CullSettings::new().with_small_feature_ratio(0.0).validate().is_ok());
    }

    #[test]
    fn test_ron_round_trip_preserves_modes() {
        let config = ApplicationConfig {
            culling: CullSettings::new().with_traversal_mode(TraversalMode::AllChildren),
            ..Default::default()
        };
        let text = ron::to_string(&config).unwrap();
        let parsed = ApplicationConfig::from_ron_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
