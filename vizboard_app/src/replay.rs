// vizboard_app/src/replay.rs

//! Headless replay: newline-delimited JSON events in, per-widget draw
//! commands out.

use crate::config::FrameConfig;
use crate::dashboard::{Dashboard, DashboardEvent, UiRequest};
use crate::error::{DashboardError, UserNotice};
use crate::input::{IconAction, PointerEvent, PointerPhase};
use crate::transport::FeedTransport;
use crate::widgets::RobotModelChange;
use nalgebra::Point2;
use pollster::block_on;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use tracing::{debug, info, warn};
use vizboard_core::messages::{FeedMessage, MessageType};
use vizboard_core::render::DrawCommand;
use vizboard_core::types::{FrameId, Millis};

/// One line of a replay file. Every event carries the dashboard time it
/// happens at; time never runs backwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    /// A message arrives on a feed.
    Publish {
        at: Millis,
        topic: String,
        message_type: String,
        payload: serde_json::Value,
        #[serde(default)]
        latched: bool,
    },
    Pointer {
        at: Millis,
        phase: PointerPhase,
        x: f64,
        y: f64,
    },
    View {
        at: Millis,
        #[serde(default)]
        center: Option<[f64; 2]>,
        #[serde(default)]
        zoom: Option<f64>,
    },
    Resize {
        at: Millis,
        width: f64,
        height: f64,
    },
    Icon {
        at: Millis,
        widget: String,
        action: IconAction,
    },
    /// Only advances the clock.
    Tick { at: Millis },
    /// Publish the waypoints widget's path.
    Start { at: Millis, widget: String },
    /// Publish an empty path.
    Stop { at: Millis, widget: String },
    SelectTopic {
        at: Millis,
        widget: String,
        topic: String,
    },
    RefreshTopics { at: Millis, widget: String },
    /// Sets (or moves) one frame-tree edge.
    Frame { at: Millis, frame: FrameConfig },
    FixedFrame { at: Millis, frame: String },
    Opacity {
        at: Millis,
        widget: String,
        opacity: f64,
    },
    SaveMap {
        at: Millis,
        widget: String,
        path: String,
    },
    /// Loads onto `topic`, or onto the map widget's own topic when absent.
    LoadMap {
        at: Millis,
        widget: String,
        path: String,
        #[serde(default)]
        topic: Option<String>,
    },
    PoseScale {
        at: Millis,
        widget: String,
        scale: f64,
    },
    /// Absent fields are left as they are.
    RobotModel {
        at: Millis,
        widget: String,
        #[serde(default)]
        frame: Option<String>,
        #[serde(default)]
        sprite: Option<String>,
        #[serde(default)]
        length: Option<f64>,
    },
}

impl ReplayEvent {
    pub fn at(&self) -> Millis {
        match self {
            ReplayEvent::Publish { at, .. }
            | ReplayEvent::Pointer { at, .. }
            | ReplayEvent::View { at, .. }
            | ReplayEvent::Resize { at, .. }
            | ReplayEvent::Icon { at, .. }
            | ReplayEvent::Tick { at }
            | ReplayEvent::Start { at, .. }
            | ReplayEvent::Stop { at, .. }
            | ReplayEvent::SelectTopic { at, .. }
            | ReplayEvent::RefreshTopics { at, .. }
            | ReplayEvent::Frame { at, .. }
            | ReplayEvent::FixedFrame { at, .. }
            | ReplayEvent::Opacity { at, .. }
            | ReplayEvent::SaveMap { at, .. }
            | ReplayEvent::LoadMap { at, .. }
            | ReplayEvent::PoseScale { at, .. }
            | ReplayEvent::RobotModel { at, .. } => *at,
        }
    }
}

/// What a replay run produced besides the widgets' final drawings.
#[derive(Debug, Default)]
pub struct ReplaySummary {
    pub events: usize,
    pub notices: Vec<UserNotice>,
}

/// Feeds every event in `input` to the dashboard, in order.
///
/// A malformed line stops the replay. An event that fails (unknown widget,
/// undecodable payload, ...) is logged and skipped.
pub fn run_replay<R: BufRead, T: FeedTransport>(
    input: R,
    dashboard: &mut Dashboard<T>,
) -> Result<ReplaySummary, DashboardError> {
    let mut summary = ReplaySummary::default();
    for (i, line) in input.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event: ReplayEvent =
            serde_json::from_str(trimmed).map_err(|source| DashboardError::Replay { line: i + 1, source })?;

        dashboard.advance_to(event.at());
        match apply_event(event, dashboard) {
            Ok(Some(notice)) => {
                info!(notice = %notice.message, "Service notice");
                summary.notices.push(notice);
            }
            Ok(None) => {}
            Err(e) => warn!(line = i + 1, error = %e, "Replay event failed"),
        }
        serve_requests(dashboard);
        dashboard.pump();
        summary.events += 1;
    }
    info!(events = summary.events, "Replay finished");
    Ok(summary)
}

fn apply_event<T: FeedTransport>(
    event: ReplayEvent,
    dashboard: &mut Dashboard<T>,
) -> Result<Option<UserNotice>, DashboardError> {
    match event {
        ReplayEvent::Publish {
            topic,
            message_type,
            payload,
            latched,
            ..
        } => {
            let message = FeedMessage::decode(MessageType::parse(&message_type)?, payload)?;
            dashboard.transport_mut().publish(&topic, message, latched)?;
        }
        ReplayEvent::Pointer { phase, x, y, .. } => {
            dashboard.post(DashboardEvent::Pointer(PointerEvent::new(phase, x, y)));
        }
        ReplayEvent::View { center, zoom, .. } => {
            dashboard.set_view(center.map(|[x, y]| Point2::new(x, y)), zoom);
        }
        ReplayEvent::Resize { width, height, .. } => {
            dashboard.post(DashboardEvent::Resize { width, height });
        }
        ReplayEvent::Icon { widget, action, .. } => {
            dashboard.post(DashboardEvent::Icon { widget, action });
        }
        ReplayEvent::Tick { .. } => {}
        ReplayEvent::Start { widget, .. } => dashboard.send_waypoints(&widget, true)?,
        ReplayEvent::Stop { widget, .. } => dashboard.send_waypoints(&widget, false)?,
        ReplayEvent::SelectTopic { widget, topic, .. } => dashboard.select_topic(&widget, &topic)?,
        ReplayEvent::RefreshTopics { widget, .. } => {
            let choices = block_on(dashboard.refresh_topics(&widget))?;
            debug!(widget = %widget, options = ?choices.options, selected = %choices.selected, "Topic choices");
        }
        ReplayEvent::Frame { frame, .. } => {
            let pose = frame.to_isometry();
            dashboard.set_transform(FrameId::new(frame.id), FrameId::new(frame.parent), pose);
        }
        ReplayEvent::FixedFrame { frame, .. } => dashboard.set_fixed_frame(FrameId::new(frame)),
        ReplayEvent::Opacity { widget, opacity, .. } => dashboard.set_map_opacity(&widget, opacity)?,
        ReplayEvent::SaveMap { widget, path, .. } => {
            return block_on(dashboard.save_map(&widget, &path)).map(Some);
        }
        ReplayEvent::LoadMap {
            widget, path, topic, ..
        } => {
            return block_on(dashboard.load_map(&widget, &path, topic.as_deref())).map(Some);
        }
        ReplayEvent::PoseScale { widget, scale, .. } => dashboard.set_pose_scale(&widget, scale)?,
        ReplayEvent::RobotModel {
            widget,
            frame,
            sprite,
            length,
            ..
        } => {
            let change = RobotModelChange { frame, sprite, length };
            dashboard.set_robot_model(&widget, change)?;
        }
    }
    Ok(None)
}

/// Headless stand-in for the settings UI: topic refreshes are carried out,
/// settings dialogs are only logged.
fn serve_requests<T: FeedTransport>(dashboard: &mut Dashboard<T>) {
    dashboard.pump();
    for request in dashboard.take_requests() {
        match request {
            UiRequest::RefreshTopics(widget) => {
                if let Err(e) = block_on(dashboard.refresh_topics(&widget)) {
                    warn!(widget = %widget, error = %e, "Topic refresh failed");
                }
            }
            UiRequest::OpenSettings(widget) => info!(widget = %widget, "Settings requested"),
        }
    }
}

#[derive(Serialize)]
struct WidgetDrawing<'a> {
    widget: &'a str,
    commands: &'a [DrawCommand],
}

/// Writes one JSON line per widget: its id and last draw command list.
pub fn write_commands<W: Write, T: FeedTransport>(
    dashboard: &Dashboard<T>,
    mut out: W,
) -> Result<(), DashboardError> {
    for widget in dashboard.widget_ids() {
        let commands = dashboard.commands(widget).unwrap_or_default();
        serde_json::to_writer(&mut out, &WidgetDrawing { widget, commands })?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_lines() {
        let e: ReplayEvent = serde_json::from_str(r#"{"type":"pointer","at":5,"phase":"down","x":1,"y":2}"#).unwrap();
        assert_eq!(
            e,
            ReplayEvent::Pointer {
                at: 5,
                phase: PointerPhase::Down,
                x: 1.0,
                y: 2.0
            }
        );
        let e: ReplayEvent = serde_json::from_str(r#"{"type":"tick","at":9}"#).unwrap();
        assert_eq!(e.at(), 9);
    }

    #[test]
    fn optional_fields_default_to_absent() {
        let e: ReplayEvent =
            serde_json::from_str(r#"{"type":"load_map","at":3,"widget":"map","path":"office"}"#).unwrap();
        assert!(matches!(e, ReplayEvent::LoadMap { topic: None, .. }));

        let e: ReplayEvent =
            serde_json::from_str(r#"{"type":"robot_model","at":4,"widget":"robot","length":0.8}"#).unwrap();
        assert_eq!(
            e,
            ReplayEvent::RobotModel {
                at: 4,
                widget: "robot".into(),
                frame: None,
                sprite: None,
                length: Some(0.8)
            }
        );
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        assert!(serde_json::from_str::<ReplayEvent>(r#"{"type":"warp","at":0}"#).is_err());
    }
}
