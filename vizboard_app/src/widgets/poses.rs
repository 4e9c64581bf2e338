// vizboard_app/src/widgets/poses.rs

use super::{initial_topic, unexpected, Widget};
use crate::binding::FeedBinding;
use crate::config::{WidgetConfig, WidgetKind};
use crate::error::DashboardError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vizboard_core::frames::{FrameResolver, Projector};
use vizboard_core::messages::{FeedMessage, MessageType};
use vizboard_core::poses::PoseCache;
use vizboard_core::render::Canvas;

/// At most 20 pose arrays per second.
pub const POSE_ARRAY_THROTTLE_MS: u64 = 50;

fn default_scale() -> f64 {
    1.0
}

fn valid_scale(scale: f64) -> bool {
    scale.is_finite() && scale > 0.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseArraySettings {
    #[serde(default)]
    pub topic: String,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

#[derive(Debug)]
pub struct PoseArrayWidget {
    id: String,
    binding: FeedBinding,
    poses: PoseCache,
    scale: f64,
}

impl PoseArrayWidget {
    pub fn new(cfg: &WidgetConfig, stored: Option<PoseArraySettings>) -> Self {
        let topic = initial_topic(stored.as_ref().map(|s| s.topic.as_str()), cfg);
        let scale = stored
            .map(|s| s.scale)
            .or(cfg.scale)
            .filter(|s| valid_scale(*s))
            .unwrap_or_else(default_scale);
        Self {
            id: cfg.id.clone(),
            binding: FeedBinding::new(MessageType::PoseArray, Some(POSE_ARRAY_THROTTLE_MS))
                .with_topic(topic),
            poses: PoseCache::new(),
            scale,
        }
    }

    pub fn poses(&self) -> &PoseCache {
        &self.poses
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Arrow size multiplier. Must be finite and positive; anything else is
    /// refused.
    pub fn set_scale(&mut self, scale: f64) -> bool {
        if !valid_scale(scale) {
            return false;
        }
        self.scale = scale;
        true
    }
}

impl Widget for PoseArrayWidget {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> WidgetKind {
        WidgetKind::PoseArray
    }

    fn binding(&self) -> Option<&FeedBinding> {
        Some(&self.binding)
    }

    fn binding_mut(&mut self) -> Option<&mut FeedBinding> {
        Some(&mut self.binding)
    }

    fn apply(&mut self, message: FeedMessage, tf: &dyn FrameResolver) -> Result<(), DashboardError> {
        match message {
            FeedMessage::PoseArray(array) => {
                // An unresolvable frame keeps the previous poses.
                self.poses.accept(&array, tf);
                Ok(())
            }
            other => Err(unexpected(self.binding.topic(), MessageType::PoseArray, &other)),
        }
    }

    fn clear_state(&mut self) {
        self.poses.clear();
    }

    fn render(&self, canvas: &mut dyn Canvas, tf: &dyn FrameResolver, view: &dyn Projector) {
        self.poses.render(canvas, tf, view, self.scale);
    }

    fn as_pose_array(&self) -> Option<&PoseArrayWidget> {
        Some(self)
    }

    fn as_pose_array_mut(&mut self) -> Option<&mut PoseArrayWidget> {
        Some(self)
    }

    fn settings(&self) -> Result<Value, DashboardError> {
        Ok(serde_json::to_value(PoseArraySettings {
            topic: self.binding.topic().to_string(),
            scale: self.scale,
        })?)
    }
}
