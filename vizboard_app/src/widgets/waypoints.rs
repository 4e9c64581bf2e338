// vizboard_app/src/widgets/waypoints.rs

use super::Widget;
use crate::config::{WidgetConfig, WidgetKind};
use crate::error::DashboardError;
use crate::input::PointerEvent;
use crate::view::PanZoomView;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vizboard_core::frames::{FrameResolver, Projector};
use vizboard_core::messages::{MessageType, Path};
use vizboard_core::render::Canvas;
use vizboard_core::types::{FrameId, MapPoint, Stamp};
use vizboard_core::waypoints::{build_path, render_waypoints, EditOutcome, EditorEffect, WaypointEditor};

pub const DEFAULT_PATH_TOPIC: &str = "/waypoints";

/// One persisted waypoint, in map meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointEntry {
    pub x: f64,
    pub y: f64,
}

fn default_path_topic() -> String {
    DEFAULT_PATH_TOPIC.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointsSettings {
    #[serde(default = "default_path_topic")]
    pub topic: String,
    #[serde(default)]
    pub points: Vec<PointEntry>,
}

/// Publishes an editable path. Unlike the other widgets it owns an outbound
/// topic rather than a subscription.
#[derive(Debug)]
pub struct WaypointsWidget {
    id: String,
    topic: String,
    editor: WaypointEditor,
    seq: u32,
}

impl WaypointsWidget {
    pub fn new(cfg: &WidgetConfig, stored: Option<WaypointsSettings>) -> Self {
        let (topic, points) = match stored {
            Some(s) => (s.topic, s.points),
            None => (cfg.topic.clone().unwrap_or_else(default_path_topic), Vec::new()),
        };
        let points = points.iter().map(|p| MapPoint::new(p.x, p.y)).collect();
        Self {
            id: cfg.id.clone(),
            topic,
            editor: WaypointEditor::new(points),
            seq: 0,
        }
    }

    pub fn editor(&self) -> &WaypointEditor {
        &self.editor
    }

    pub fn points(&self) -> &[MapPoint] {
        self.editor.points()
    }

    pub fn is_active(&self) -> bool {
        self.editor.is_active()
    }

    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.topic = topic.into();
    }

    /// Flips editing mode, returning what the dashboard must do about it.
    pub fn toggle_active(&mut self) -> Vec<EditorEffect> {
        let active = !self.editor.is_active();
        self.editor.set_active(active)
    }

    pub fn set_active(&mut self, active: bool) -> Vec<EditorEffect> {
        self.editor.set_active(active)
    }

    /// Routes one pointer event through the editor state machine.
    pub fn handle_pointer(&mut self, event: &PointerEvent, view: &PanZoomView) -> EditOutcome {
        use crate::input::PointerPhase;
        let pixel = event.position();
        match event.phase {
            PointerPhase::Down => self.editor.pointer_down(pixel, view),
            PointerPhase::Move => self.editor.pointer_move(pixel, view),
            PointerPhase::Up => self.editor.pointer_up(pixel, view),
        }
    }

    /// The next path to publish: the current points on `start`, none on
    /// `stop`. Each call consumes one header sequence number.
    pub fn next_path(&mut self, send_points: bool, frame_id: &FrameId, stamp: Stamp) -> Path {
        let points: &[MapPoint] = if send_points { self.editor.points() } else { &[] };
        let path = build_path(points, frame_id, stamp, self.seq);
        self.seq = self.seq.wrapping_add(1);
        path
    }
}

impl Widget for WaypointsWidget {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> WidgetKind {
        WidgetKind::Waypoints
    }

    fn feed_type(&self) -> Option<MessageType> {
        Some(MessageType::Path)
    }

    fn topic(&self) -> &str {
        &self.topic
    }

    fn render(&self, canvas: &mut dyn Canvas, _tf: &dyn FrameResolver, view: &dyn Projector) {
        render_waypoints(canvas, view, &self.editor);
    }

    fn settings(&self) -> Result<Value, DashboardError> {
        Ok(serde_json::to_value(WaypointsSettings {
            topic: self.topic.clone(),
            points: self
                .editor
                .points()
                .iter()
                .map(|p| PointEntry { x: p.x, y: p.y })
                .collect(),
        })?)
    }

    fn as_waypoints(&self) -> Option<&WaypointsWidget> {
        Some(self)
    }

    fn as_waypoints_mut(&mut self) -> Option<&mut WaypointsWidget> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> WidgetConfig {
        WidgetConfig::new("wp", WidgetKind::Waypoints)
    }

    #[test]
    fn defaults_to_waypoints_topic() {
        let w = WaypointsWidget::new(&cfg(), None);
        assert_eq!(w.topic(), DEFAULT_PATH_TOPIC);
        assert!(w.points().is_empty());
    }

    #[test]
    fn restores_persisted_points() {
        let stored = WaypointsSettings {
            topic: "/plan".into(),
            points: vec![PointEntry { x: 1.0, y: 2.0 }, PointEntry { x: 3.0, y: 4.0 }],
        };
        let w = WaypointsWidget::new(&cfg(), Some(stored.clone()));
        assert_eq!(w.points().len(), 2);
        let back: WaypointsSettings = serde_json::from_value(w.settings().unwrap()).unwrap();
        assert_eq!(back, stored);
    }

    #[test]
    fn stop_sends_empty_path_and_bumps_seq() {
        let stored = WaypointsSettings {
            topic: "/plan".into(),
            points: vec![PointEntry { x: 1.0, y: 2.0 }],
        };
        let mut w = WaypointsWidget::new(&cfg(), Some(stored));
        let frame = FrameId::new("map");
        let start = w.next_path(true, &frame, Stamp::default());
        let stop = w.next_path(false, &frame, Stamp::default());
        assert_eq!(start.poses.len(), 1);
        assert!(stop.poses.is_empty());
        assert_eq!(start.header.seq + 1, stop.header.seq);
    }
}
