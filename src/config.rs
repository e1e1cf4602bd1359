//! Demo settings, read from a JSON file.
//!
//! Every section and field has a default, so a partial file (or none at all)
//! is valid.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/settings.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub sun: SunConfig,
    pub render: RenderConfig,
    pub assets: AssetConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// Keep the window floating above others.
    pub always_on_top: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            title: "Hello".to_string(),
            always_on_top: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Units per second
    pub speed: f32,
    /// Radians per pixel of mouse motion
    pub sensitivity: f32,
    pub start_position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.01,
            far: 1000.0,
            speed: 10.0,
            sensitivity: 0.01,
            start_position: [0.0, 1.0, 10.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SunConfig {
    /// Render the shadow map and sample it; off gives plain diffuse shading.
    pub shadows: bool,
    /// Half extent of the orthographic sun view.
    pub view_size: f32,
    pub texture_size: u32,
    /// Sun position relative to the player camera.
    pub offset: [f32; 3],
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
    pub far: f32,
}

impl Default for SunConfig {
    fn default() -> Self {
        Self {
            shadows: true,
            view_size: 8.0,
            texture_size: 1024,
            offset: [10.0, 10.0, 10.0],
            yaw_degrees: 45.0,
            pitch_degrees: -45.0,
            far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Draw the camera into an offscreen target and blit it with a screen quad.
    pub screen_blit: bool,
    pub fps_report_secs: f32,
    pub clear_color: [f64; 4],
    /// Degrees per second the showcased mesh spins.
    pub spin_degrees_per_sec: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            screen_blit: true,
            fps_report_secs: 3.0,
            clear_color: [0.7, 0.7, 0.7, 1.0],
            spin_degrees_per_sec: 180.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub mesh: PathBuf,
    /// Mesh attached in front of the camera; skipped when absent.
    pub held_mesh: Option<PathBuf>,
    pub texture: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            mesh: PathBuf::from("assets/wand.obj"),
            held_mesh: Some(PathBuf::from("assets/shotgun.obj")),
            texture: PathBuf::from("assets/wand.png"),
        }
    }
}

impl DemoConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid settings JSON")
    }

    /// Loads settings, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!(
                "No settings at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        let config = Self::from_json(&json)
            .with_context(|| format!("Failed to load settings {}", path.display()))?;
        log::info!("Loaded settings from {}", path.display());
        Ok(config)
    }

    pub fn aspect(&self) -> f32 {
        self.window.width as f32 / self.window.height.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_demo_constants() {
        let config = DemoConfig::default();
        assert_eq!(config.window.width, 1200);
        assert_eq!(config.window.height, 800);
        assert_eq!(config.sun.texture_size, 1024);
        assert_eq!(config.sun.view_size, 8.0);
        assert_eq!(config.camera.start_position, [0.0, 1.0, 10.0]);
        assert!((config.aspect() - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = DemoConfig::from_json(
            r#"{ "sun": { "shadows": false }, "window": { "title": "demo" } }"#,
        )
        .unwrap();
        assert!(!config.sun.shadows);
        assert_eq!(config.sun.texture_size, 1024);
        assert_eq!(config.window.title, "demo");
        assert_eq!(config.window.width, 1200);
        assert_eq!(config.assets, AssetConfig::default());
    }

    #[test]
    fn held_mesh_can_be_disabled() {
        let config = DemoConfig::from_json(r#"{ "assets": { "held_mesh": null } }"#).unwrap();
        assert_eq!(config.assets.held_mesh, None);
        assert_eq!(config.assets.mesh, PathBuf::from("assets/wand.obj"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(DemoConfig::from_json("{ \"window\": 3 }").is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("objlit-settings-that-do-not-exist.json");
        assert_eq!(DemoConfig::load(&path).unwrap(), DemoConfig::default());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let path = std::env::temp_dir().join(format!("objlit-settings-{}.json", std::process::id()));
        fs::write(&path, r#"{ "camera": { "speed": 2.5 } }"#).unwrap();
        let config = DemoConfig::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.camera.speed, 2.5);
    }

    #[test]
    fn shipped_settings_file_parses() {
        let config = DemoConfig::from_json(include_str!("../config/settings.json")).unwrap();
        assert!(config.render.screen_blit);
    }
}
