//! Scene configuration loader.
//!
//! Every tunable lives in one YAML document per scene. All sections and
//! fields are optional; anything missing falls back to its default.
//!
//! ## Directory Structure
//!
//! ```text
//! config/
//! └── scenes/
//!     ├── default.yaml
//!     ├── moon.yaml
//!     └── ...
//! ```
//!
//! ## Example
//!
//! ```yaml
//! gravity: { x: 0.0, y: -1.62, z: 0.0 }
//! time:
//!   sim_speed: 0.5
//! net:
//!   rows: 6
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ball::BallProperties;
use crate::collision::CourtConfig;
use crate::error::{SimError, SimResult};
use crate::ik::IkConfig;
use crate::net::NetConfig;
use crate::scene::{ControlsConfig, TimeConfig};
use crate::types::{constants, Vec3};

/// Complete scene configuration.
///
/// The scene always hangs the net from `court.hoop_center`; `net.rim_center`
/// only matters when a net is built on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Gravitational acceleration (m/s²)
    pub gravity: Vec3,
    pub time: TimeConfig,
    pub ball: BallProperties,
    pub court: CourtConfig,
    pub net: NetConfig,
    pub ik: IkConfig,
    pub controls: ControlsConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -constants::GRAVITY, 0.0),
            time: TimeConfig::default(),
            ball: BallProperties::default(),
            court: CourtConfig::default(),
            net: NetConfig::default(),
            ik: IkConfig::default(),
            controls: ControlsConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(contents: &str) -> SimResult<Self> {
        let config: SimConfig = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> SimResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load and parse a single file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SimError::NotFound(path.display().to_string()));
        }
        let contents = fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&contents)?;
        info!(path = %path.display(), "Loaded scene config");
        Ok(config)
    }

    /// Reject values that would stall or blow up the fixed-step loop.
    pub fn validate(&self) -> SimResult<()> {
        let t = &self.time;
        if !(t.time_step > 0.0 && t.time_step.is_finite()) {
            return Err(invalid(format!("time.time_step must be positive, got {}", t.time_step)));
        }
        if !(t.max_frame_dt > 0.0 && t.max_frame_dt.is_finite()) {
            return Err(invalid(format!("time.max_frame_dt must be positive, got {}", t.max_frame_dt)));
        }
        if !(t.sim_speed >= 0.0 && t.sim_speed.is_finite()) {
            return Err(invalid(format!("time.sim_speed must be non-negative, got {}", t.sim_speed)));
        }
        if t.arc_sample_interval == 0 {
            return Err(invalid("time.arc_sample_interval must be at least 1".to_string()));
        }
        if !(self.ball.mass > 0.0 && self.ball.mass.is_finite()) {
            return Err(SimError::InvalidMass(self.ball.mass));
        }
        if !self.gravity.is_finite() {
            return Err(invalid("gravity must be finite".to_string()));
        }
        if self.ik.max_iterations == 0 || self.ik.fd_delta <= 0.0 {
            return Err(invalid("ik needs max_iterations >= 1 and fd_delta > 0".to_string()));
        }
        if !(self.ik.damping >= 0.0 && self.ik.damping.is_finite()) {
            return Err(invalid(format!("ik.damping must be non-negative, got {}", self.ik.damping)));
        }
        Ok(())
    }
}

fn invalid(message: String) -> SimError {
    SimError::InvalidConfig(message)
}

/// Scene loader with configurable base directory.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// The base path should contain a `scenes/` subdirectory.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Load a scene by name (without .yaml extension).
    ///
    /// # Example
    /// ```ignore
    /// let loader = ConfigLoader::new("config");
    /// let config = loader.load_scene("default")?;
    /// ```
    pub fn load_scene(&self, name: &str) -> SimResult<SimConfig> {
        let path = self.base_path.join("scenes").join(format!("{}.yaml", name));
        if !path.exists() {
            return Err(SimError::NotFound(name.to_string()));
        }
        SimConfig::from_path(path)
    }

    /// Names of all available scenes, sorted.
    pub fn list_scenes(&self) -> SimResult<Vec<String>> {
        let path = self.base_path.join("scenes");
        if !path.exists() {
            return Ok(vec![]);
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if name.ends_with(".yaml") {
                names.push(name.trim_end_matches(".yaml").to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn get_config_path() -> PathBuf {
        let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(manifest_dir).join("..").join("config")
    }

    #[test]
    fn test_defaults_match_reference_values() {
        let config = SimConfig::default();
        assert_eq!(config.gravity, Vec3::new(0.0, -9.8, 0.0));
        assert_eq!(config.time.time_step, 0.001);
        assert_eq!(config.ball.mass, 1.0);
        assert_eq!(config.ball.radius, 0.037);
        assert_eq!(config.ball.contact.ks, 5000.0);
        assert_eq!(config.net.rows, 8);
        assert_eq!(config.ik.max_iterations, 10);
        assert_eq!(config.controls.angle_vertical, 5000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let yaml = "gravity: { x: 0.0, y: -1.62, z: 0.0 }\ntime:\n  sim_speed: 0.5\nnet:\n  rows: 6\n";
        let config = SimConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.gravity.y, -1.62);
        assert_eq!(config.time.sim_speed, 0.5);
        assert_eq!(config.time.time_step, 0.001);
        assert_eq!(config.net.rows, 6);
        assert_eq!(config.net.segments, 12);
        assert_eq!(config.ball, BallProperties::default());
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = SimConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = SimConfig::default();
        let text = config.to_yaml_string().unwrap();
        assert_eq!(SimConfig::from_yaml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_malformed_yaml() {
        let result = SimConfig::from_yaml_str("time: [1, 2");
        assert!(matches!(result, Err(SimError::Parse(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SimConfig::default();
        config.ball.mass = 0.0;
        assert!(matches!(config.validate(), Err(SimError::InvalidMass(_))));

        let mut config = SimConfig::default();
        config.time.max_frame_dt = -1.0;
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));

        let mut config = SimConfig::default();
        config.time.arc_sample_interval = 0;
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));

        let mut config = SimConfig::default();
        config.ik.damping = -0.1;
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_load_default_scene() {
        let loader = ConfigLoader::new(get_config_path());
        let result = loader.load_scene("default");

        assert!(result.is_ok(), "Should load default scene: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.court.hoop_center, Vec3::new(0.0, 6.5, -8.8));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_nonexistent_scene() {
        let loader = ConfigLoader::new(get_config_path());
        match loader.load_scene("nonexistent_scene_xyz") {
            Err(SimError::NotFound(name)) => assert_eq!(name, "nonexistent_scene_xyz"),
            other => panic!("Expected NotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_list_scenes() {
        let loader = ConfigLoader::new(get_config_path());
        let scenes = loader.list_scenes().unwrap();
        assert!(scenes.contains(&"default".to_string()));
        assert!(scenes.contains(&"moon".to_string()));

        let empty = ConfigLoader::new(get_config_path().join("missing"));
        assert!(empty.list_scenes().unwrap().is_empty());
    }

    #[test]
    fn test_moon_scene_overrides_gravity() {
        let loader = ConfigLoader::new(get_config_path());
        let config = loader.load_scene("moon").unwrap();
        assert_eq!(config.gravity, Vec3::new(0.0, -1.62, 0.0));
        assert_eq!(config.ball, BallProperties::default());
    }
}
