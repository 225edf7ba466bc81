/// Scene configuration loaded from TOML
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::GeometryError;
use crate::projection::{Camera, ProjectionMode};

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file parsed but holds values the scene cannot use
    #[error("Invalid settings: {0}")]
    Invalid(#[from] GeometryError),
}

/// Default camera parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_degrees: f64,
    pub near: f64,
    pub far: f64,
    pub orthographic: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            orthographic: false,
        }
    }
}

impl CameraConfig {
    /// Build a camera for a `width x height` viewport
    pub fn build(&self, width: u32, height: u32) -> Result<Camera, GeometryError> {
        let mode = if self.orthographic {
            ProjectionMode::Orthographic
        } else {
            ProjectionMode::Perspective
        };
        Camera::with_params(
            self.fov_y_degrees.to_radians(),
            width as f64,
            height as f64,
            self.near,
            self.far,
            mode,
        )
    }
}

/// How the host maps scene units onto its drawing surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Scene units covered by one terminal column
    pub units_per_cell_x: f64,
    /// Scene units covered by one terminal row
    pub units_per_cell_y: f64,
    pub target_fps: u32,
    /// Rotation step in radians for keyboard control
    pub rotation_step: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            units_per_cell_x: 10.0,
            units_per_cell_y: 20.0,
            target_fps: 30,
            rotation_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub display: DisplayConfig,
}

impl SceneConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), GeometryError> {
        // a throwaway camera runs the same checks as the setters
        self.camera.build(1, 1)?;
        let d = &self.display;
        if !(d.units_per_cell_x > 0.0 && d.units_per_cell_y > 0.0) || d.target_fps == 0 {
            return Err(GeometryError::Argument(
                "display scale and frame rate must be positive".to_string(),
            ));
        }
        if !d.rotation_step.is_finite() {
            return Err(GeometryError::Argument(format!(
                "rotation_step must be finite, got {}",
                d.rotation_step
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = SceneConfig::from_toml_str("").unwrap();
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = SceneConfig::from_toml_str(
            r#"
            [camera]
            fov_y_degrees = 60.0
            orthographic = true

            [display]
            target_fps = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.camera.fov_y_degrees, 60.0);
        assert_eq!(config.camera.far, 100.0);
        assert_eq!(config.display.target_fps, 60);

        let camera = config.camera.build(800, 600).unwrap();
        assert_eq!(camera.mode(), ProjectionMode::Orthographic);
        assert!((camera.fov_y() - 60f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = SceneConfig::from_toml_str("[camera]\nnear = 10.0\nfar = 1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(GeometryError::Argument(_))));

        let err = SceneConfig::from_toml_str("[display]\ntarget_fps = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = SceneConfig::from_toml_str("[camera\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_rotation_step_must_be_finite() {
        for value in ["nan", "inf", "-inf"] {
            let err = SceneConfig::from_toml_str(&format!("[display]\nrotation_step = {value}\n"))
                .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(GeometryError::Argument(_))), "{value}");
        }
        let config = SceneConfig::from_toml_str("[display]\nrotation_step = -0.2\n").unwrap();
        assert_eq!(config.display.rotation_step, -0.2);
    }

    #[test]
    fn test_save_and_reload() {
        let mut config = SceneConfig::default();
        config.camera.orthographic = true;
        config.camera.fov_y_degrees = 70.0;
        config.display.units_per_cell_y = 16.0;

        let text = config.to_toml_string().unwrap();
        assert!(text.contains("[camera]"));
        assert_eq!(SceneConfig::from_toml_str(&text).unwrap(), config);

        let path = std::env::temp_dir().join(format!("wire3d-config-{}.toml", std::process::id()));
        config.save(&path).unwrap();
        let loaded = SceneConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            SceneConfig::load("/nonexistent/wire3d.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
