// vizboard_app/src/config.rs

use crate::error::DashboardError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// # DashboardConfig
/// Everything needed to stand a dashboard up: the fixed frame, the view, a
/// static frame tree and the widget list. Parsed from a `dashboard.toml`,
/// with `VIZBOARD_`-prefixed environment variables layered on top.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct DashboardConfig {
    #[serde(default)]
    pub dashboard: DashboardSection,

    #[serde(default)]
    pub view: ViewConfig,

    // `[[frames]]` becomes a Vec of FrameConfig.
    #[serde(default)]
    pub frames: Vec<FrameConfig>,

    #[serde(default)]
    pub widgets: Vec<WidgetConfig>,
}

impl DashboardConfig {
    /// Loads defaults, then `path` (if given), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, DashboardError> {
        let mut figment = Figment::from(Serialized::defaults(DashboardConfig::default()));
        if let Some(path) = path {
            info!("Loading dashboard config from: {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        let config: DashboardConfig = figment
            .merge(Env::prefixed("VIZBOARD_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document directly, without the environment layer.
    pub fn from_toml_str(toml: &str) -> Result<Self, DashboardError> {
        let config: DashboardConfig = Figment::from(Serialized::defaults(DashboardConfig::default()))
            .merge(Toml::string(toml))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DashboardError> {
        if self.dashboard.fixed_frame.is_empty() {
            return Err(DashboardError::InvalidConfig("fixed_frame must not be empty".into()));
        }
        if self.view.pixels_per_meter <= 0.0 {
            return Err(DashboardError::InvalidConfig(
                "view.pixels_per_meter must be positive".into(),
            ));
        }

        let mut frame_ids = HashSet::new();
        for frame in &self.frames {
            if frame.id == self.dashboard.fixed_frame {
                return Err(DashboardError::InvalidConfig(format!(
                    "frame '{}' is the fixed frame and cannot have a parent",
                    frame.id
                )));
            }
            if !frame_ids.insert(frame.id.as_str()) {
                return Err(DashboardError::InvalidConfig(format!(
                    "duplicate frame id '{}'",
                    frame.id
                )));
            }
        }

        let mut widget_ids = HashSet::new();
        for widget in &self.widgets {
            if widget.id.is_empty() {
                return Err(DashboardError::InvalidConfig("widget id must not be empty".into()));
            }
            if !widget_ids.insert(widget.id.as_str()) {
                return Err(DashboardError::InvalidConfig(format!(
                    "duplicate widget id '{}'",
                    widget.id
                )));
            }
            if let Some(opacity) = widget.opacity {
                if !(0.0..=1.0).contains(&opacity) {
                    return Err(DashboardError::InvalidConfig(format!(
                        "widget '{}': opacity {} is outside [0, 1]",
                        widget.id, opacity
                    )));
                }
            }
        }
        Ok(())
    }
}

// =========================================================================
// == Configuration Sub-Structs ==
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardSection {
    /// The frame every widget renders in.
    pub fixed_frame: String,
    /// Where widget settings are persisted. In-memory only when absent.
    #[serde(default)]
    pub settings_file: Option<PathBuf>,
    pub save_map_service: String,
    pub load_map_service: String,
}

impl Default for DashboardSection {
    fn default() -> Self {
        Self {
            fixed_frame: "map".to_string(),
            settings_file: None,
            save_map_service: "/vizanti/save_map".to_string(),
            load_map_service: "/vizanti/load_map".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewConfig {
    /// Canvas size in pixels.
    pub width: f64,
    pub height: f64,
    /// Fixed-frame point shown at the canvas center, in meters.
    pub center: [f64; 2],
    pub pixels_per_meter: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            center: [0.0, 0.0],
            pixels_per_meter: 50.0,
        }
    }
}

/// One static edge of the frame tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameConfig {
    pub id: String,
    pub parent: String,
    /// `[x, y, z]` in meters, relative to the parent.
    #[serde(default)]
    pub translation: [f64; 3],
    /// `[roll, pitch, yaw]` in degrees.
    #[serde(default)]
    pub rotation: [f64; 3],
}

impl FrameConfig {
    pub fn to_isometry(&self) -> Isometry3<f64> {
        let [x, y, z] = self.translation;
        let [roll, pitch, yaw] = self.rotation;
        Isometry3::from_parts(
            Translation3::new(x, y, z),
            UnitQuaternion::from_euler_angles(roll.to_radians(), pitch.to_radians(), yaw.to_radians()),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    MarkerArray,
    Map,
    PoseArray,
    RobotModel,
    Waypoints,
}

/// A widget instance. Kind-specific fields are optional; each widget falls
/// back to its own defaults, and persisted settings override both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WidgetConfig {
    pub id: String,
    pub kind: WidgetKind,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub frame: Option<String>,
    #[serde(default)]
    pub sprite: Option<String>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub aspect_ratio: Option<f64>,
}

impl WidgetConfig {
    pub fn new(id: impl Into<String>, kind: WidgetKind) -> Self {
        Self {
            id: id.into(),
            kind,
            topic: None,
            opacity: None,
            scale: None,
            frame: None,
            sprite: None,
            length: None,
            aspect_ratio: None,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn defaults_apply_to_an_empty_file() {
        let config = DashboardConfig::from_toml_str("").unwrap();
        assert_eq!(config.dashboard.fixed_frame, "map");
        assert_eq!(config.view.width, 1280.0);
        assert_eq!(config.view.height, 720.0);
        assert_eq!(config.view.pixels_per_meter, 50.0);
        assert!(config.widgets.is_empty());
    }

    #[test]
    fn parses_frames_and_widgets() {
        let config = DashboardConfig::from_toml_str(
            r#"
            [dashboard]
            fixed_frame = "world"

            [[frames]]
            id = "odom"
            parent = "world"
            translation = [1.0, 2.0, 0.0]
            rotation = [0.0, 0.0, 90.0]

            [[widgets]]
            id = "map1"
            kind = "map"
            topic = "/map"
            opacity = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.dashboard.fixed_frame, "world");
        let iso = config.frames[0].to_isometry();
        assert_abs_diff_eq!(iso.rotation.euler_angles().2, std::f64::consts::FRAC_PI_2, epsilon = 1e-9);
        assert_eq!(config.widgets[0].kind, WidgetKind::Map);
        assert_eq!(config.widgets[0].topic.as_deref(), Some("/map"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(DashboardConfig::from_toml_str("[view]\nzoom = 3.0\n").is_err());
    }

    #[test]
    fn duplicate_widget_ids_are_rejected() {
        let err = DashboardConfig::from_toml_str(
            r#"
            [[widgets]]
            id = "a"
            kind = "map"
            [[widgets]]
            id = "a"
            kind = "pose_array"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidConfig(_)));
    }
}
