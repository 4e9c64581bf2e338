// vizboard_app/src/widgets/mod.rs

//! The dashboard's widgets. Each owns its state outright; the frame tree and
//! the view are lent to it for every update and render.

mod map;
mod markers;
mod poses;
mod robot;
mod waypoints;

pub use map::{MapSettings, MapWidget, MAP_THROTTLE_MS};
pub use markers::{MarkerArraySettings, MarkerArrayWidget};
pub use poses::{PoseArraySettings, PoseArrayWidget, POSE_ARRAY_THROTTLE_MS};
pub use robot::{RobotModelChange, RobotModelSettings, RobotModelWidget};
pub use waypoints::{PointEntry, WaypointsSettings, WaypointsWidget, DEFAULT_PATH_TOPIC};

use crate::binding::FeedBinding;
use crate::config::{WidgetConfig, WidgetKind};
use crate::error::DashboardError;
use crate::settings::SettingsStore;
use serde_json::Value;
use vizboard_core::frames::{FrameResolver, Projector};
use vizboard_core::messages::{FeedMessage, MessageType};
use vizboard_core::render::Canvas;

/// The contract every widget fulfils.
pub trait Widget {
    fn id(&self) -> &str;
    fn kind(&self) -> WidgetKind;

    /// The feed this widget renders from, if any.
    fn binding(&self) -> Option<&FeedBinding> {
        None
    }

    fn binding_mut(&mut self) -> Option<&mut FeedBinding> {
        None
    }

    /// Message type offered in this widget's topic choice list.
    fn feed_type(&self) -> Option<MessageType> {
        self.binding().map(FeedBinding::message_type)
    }

    /// The widget's topic (subscribed or published), possibly empty.
    fn topic(&self) -> &str {
        self.binding().map(FeedBinding::topic).unwrap_or("")
    }

    /// Folds an accepted message into the widget's state.
    fn apply(&mut self, _message: FeedMessage, _tf: &dyn FrameResolver) -> Result<(), DashboardError> {
        Ok(())
    }

    /// Forgets everything accumulated from the current feed.
    fn clear_state(&mut self) {}

    /// Redraws the widget from scratch.
    fn render(&self, canvas: &mut dyn Canvas, tf: &dyn FrameResolver, view: &dyn Projector);

    /// The full settings entry to persist for this widget.
    fn settings(&self) -> Result<Value, DashboardError>;

    fn as_waypoints(&self) -> Option<&WaypointsWidget> {
        None
    }

    fn as_waypoints_mut(&mut self) -> Option<&mut WaypointsWidget> {
        None
    }

    fn as_map_mut(&mut self) -> Option<&mut MapWidget> {
        None
    }

    fn as_pose_array(&self) -> Option<&PoseArrayWidget> {
        None
    }

    fn as_pose_array_mut(&mut self) -> Option<&mut PoseArrayWidget> {
        None
    }

    fn as_robot(&self) -> Option<&RobotModelWidget> {
        None
    }

    fn as_robot_mut(&mut self) -> Option<&mut RobotModelWidget> {
        None
    }
}

/// Builds a widget from its config, letting a persisted entry override the
/// configured values.
pub fn build_widget(cfg: &WidgetConfig, store: &SettingsStore) -> Result<Box<dyn Widget>, DashboardError> {
    Ok(match cfg.kind {
        WidgetKind::MarkerArray => Box::new(MarkerArrayWidget::new(cfg, store.get(&cfg.id)?)),
        WidgetKind::Map => Box::new(MapWidget::new(cfg, store.get(&cfg.id)?)),
        WidgetKind::PoseArray => Box::new(PoseArrayWidget::new(cfg, store.get(&cfg.id)?)),
        WidgetKind::RobotModel => Box::new(RobotModelWidget::new(cfg, store.get(&cfg.id)?)),
        WidgetKind::Waypoints => Box::new(WaypointsWidget::new(cfg, store.get(&cfg.id)?)),
    })
}

/// The topic a feed widget starts on: persisted, else configured, else none.
fn initial_topic(stored: Option<&str>, cfg: &WidgetConfig) -> String {
    stored
        .map(str::to_string)
        .or_else(|| cfg.topic.clone())
        .unwrap_or_default()
}

/// Rejects a message of the wrong variant for a widget bound to `topic`.
fn unexpected(topic: &str, expected: MessageType, message: &FeedMessage) -> DashboardError {
    DashboardError::TopicTypeMismatch {
        topic: topic.to_string(),
        expected: expected.to_string(),
        actual: message.message_type().to_string(),
    }
}
