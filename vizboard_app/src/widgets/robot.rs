// vizboard_app/src/widgets/robot.rs

use super::Widget;
use crate::config::{WidgetConfig, WidgetKind};
use crate::error::DashboardError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vizboard_core::frames::{FrameResolver, Projector};
use vizboard_core::poses::{render_sprite, SpriteSpec};
use vizboard_core::render::Canvas;
use vizboard_core::types::FrameId;

fn default_frame() -> String {
    "base_link".to_string()
}

fn default_sprite() -> String {
    "robot.png".to_string()
}

fn default_length() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotModelSettings {
    #[serde(default = "default_frame")]
    pub frame: String,
    #[serde(default = "default_sprite")]
    pub sprite: String,
    #[serde(default = "default_length")]
    pub length: f64,
}

/// A partial edit of the robot model settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotModelChange {
    #[serde(default)]
    pub frame: Option<String>,
    #[serde(default)]
    pub sprite: Option<String>,
    #[serde(default)]
    pub length: Option<f64>,
}

/// Draws a robot sprite at a frame's pose. Has no feed; it redraws on
/// frame-tree and view changes only.
#[derive(Debug)]
pub struct RobotModelWidget {
    id: String,
    model: SpriteSpec,
}

impl RobotModelWidget {
    pub fn new(cfg: &WidgetConfig, stored: Option<RobotModelSettings>) -> Self {
        let settings = stored.unwrap_or_else(|| RobotModelSettings {
            frame: cfg.frame.clone().unwrap_or_else(default_frame),
            sprite: cfg.sprite.clone().unwrap_or_else(default_sprite),
            length: cfg.length.unwrap_or_else(default_length),
        });
        Self {
            id: cfg.id.clone(),
            model: SpriteSpec {
                frame: FrameId::new(settings.frame),
                sprite: settings.sprite,
                length: settings.length,
                aspect_ratio: cfg.aspect_ratio.unwrap_or(1.0),
            },
        }
    }

    pub fn model(&self) -> &SpriteSpec {
        &self.model
    }

    /// Changes any of frame, sprite and length. Nothing changes unless every
    /// given value is usable; the name of the first bad setting is returned.
    pub fn update(&mut self, change: RobotModelChange) -> Result<(), &'static str> {
        if change.frame.as_deref().is_some_and(str::is_empty) {
            return Err("frame");
        }
        if change.sprite.as_deref().is_some_and(str::is_empty) {
            return Err("sprite");
        }
        if change.length.is_some_and(|l| !(l.is_finite() && l > 0.0)) {
            return Err("length");
        }
        if let Some(frame) = change.frame {
            self.model.frame = FrameId::new(frame);
        }
        if let Some(sprite) = change.sprite {
            self.model.sprite = sprite;
        }
        if let Some(length) = change.length {
            self.model.length = length;
        }
        Ok(())
    }
}

impl Widget for RobotModelWidget {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> WidgetKind {
        WidgetKind::RobotModel
    }

    fn render(&self, canvas: &mut dyn Canvas, tf: &dyn FrameResolver, view: &dyn Projector) {
        render_sprite(canvas, tf, view, &self.model);
    }

    fn as_robot(&self) -> Option<&RobotModelWidget> {
        Some(self)
    }

    fn as_robot_mut(&mut self) -> Option<&mut RobotModelWidget> {
        Some(self)
    }

    fn settings(&self) -> Result<Value, DashboardError> {
        Ok(serde_json::to_value(RobotModelSettings {
            frame: self.model.frame.to_string(),
            sprite: self.model.sprite.clone(),
            length: self.model.length,
        })?)
    }
}
