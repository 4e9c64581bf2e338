// vizboard_core/src/messages.rs

use crate::error::CoreError;
use crate::types::{FrameId, Pose, Rgba, Stamp, Vec3Msg};
use serde::{Deserialize, Serialize};
use std::fmt;

// =========================================================================
// == Common Message Parts ==
// =========================================================================

/// `std_msgs/Header`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub seq: u32,
    #[serde(default)]
    pub stamp: Stamp,
    #[serde(default)]
    pub frame_id: FrameId,
}

impl Header {
    pub fn new(seq: u32, stamp: Stamp, frame_id: FrameId) -> Self {
        Self {
            seq,
            stamp,
            frame_id,
        }
    }
}

// =========================================================================
// == Marker Messages ==
// =========================================================================

/// `visualization_msgs/Marker`. The numeric `type` and `action` codes are kept
/// raw here; the marker aggregator interprets them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarkerMsg {
    #[serde(default)]
    pub header: Header,
    #[serde(default)]
    pub ns: String,
    #[serde(default)]
    pub id: i32,
    #[serde(rename = "type", default)]
    pub kind: i32,
    #[serde(default)]
    pub action: i32,
    #[serde(default)]
    pub pose: Pose,
    #[serde(default)]
    pub scale: Vec3Msg,
    #[serde(default)]
    pub color: Rgba,
    #[serde(default)]
    pub frame_locked: bool,
    #[serde(default)]
    pub points: Vec<Vec3Msg>,
    #[serde(default)]
    pub colors: Vec<Rgba>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub mesh_resource: String,
    #[serde(default)]
    pub mesh_use_embedded_materials: bool,
}

/// `visualization_msgs/MarkerArray`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarkerArray {
    #[serde(default)]
    pub markers: Vec<MarkerMsg>,
}

// =========================================================================
// == Map Messages ==
// =========================================================================

/// `nav_msgs/MapMetaData`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapMetaData {
    /// The map resolution (meters/cell).
    pub resolution: f64,
    /// Map width (cells).
    pub width: u32,
    /// Map height (cells).
    pub height: u32,
    /// The real-world pose of cell (0,0).
    #[serde(default)]
    pub origin: Pose,
}

/// `nav_msgs/OccupancyGrid`. Cells are row-major starting at (0,0); values in
/// `[0, 100]` are occupancy probabilities and negative values mean unknown.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OccupancyGrid {
    #[serde(default)]
    pub header: Header,
    pub info: MapMetaData,
    pub data: Vec<i8>,
}

// =========================================================================
// == Pose and Path Messages ==
// =========================================================================

/// `geometry_msgs/PoseArray`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseArray {
    #[serde(default)]
    pub header: Header,
    #[serde(default)]
    pub poses: Vec<Pose>,
}

/// `geometry_msgs/PoseStamped`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseStamped {
    pub header: Header,
    pub pose: Pose,
}

/// `nav_msgs/Path`. An empty pose list is a valid "stop" command.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Path {
    pub header: Header,
    #[serde(default)]
    pub poses: Vec<PoseStamped>,
}

// =========================================================================
// == Typed Feed Payloads ==
// =========================================================================

/// The message types a widget can subscribe to or publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "visualization_msgs/MarkerArray")]
    MarkerArray,
    #[serde(rename = "nav_msgs/OccupancyGrid")]
    OccupancyGrid,
    #[serde(rename = "geometry_msgs/PoseArray")]
    PoseArray,
    #[serde(rename = "nav_msgs/Path")]
    Path,
}

impl MessageType {
    pub const ALL: [MessageType; 4] = [
        MessageType::MarkerArray,
        MessageType::OccupancyGrid,
        MessageType::PoseArray,
        MessageType::Path,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::MarkerArray => "visualization_msgs/MarkerArray",
            MessageType::OccupancyGrid => "nav_msgs/OccupancyGrid",
            MessageType::PoseArray => "geometry_msgs/PoseArray",
            MessageType::Path => "nav_msgs/Path",
        }
    }

    pub fn parse(name: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == name)
            .ok_or_else(|| CoreError::UnknownMessageType(name.to_string()))
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded payload delivered on, or published to, a feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    MarkerArray(MarkerArray),
    OccupancyGrid(OccupancyGrid),
    PoseArray(PoseArray),
    Path(Path),
}

impl FeedMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            FeedMessage::MarkerArray(_) => MessageType::MarkerArray,
            FeedMessage::OccupancyGrid(_) => MessageType::OccupancyGrid,
            FeedMessage::PoseArray(_) => MessageType::PoseArray,
            FeedMessage::Path(_) => MessageType::Path,
        }
    }

    /// Decodes a loosely-typed JSON payload (as bridged from the robot) into
    /// the typed message named by `message_type`.
    pub fn decode(message_type: MessageType, payload: serde_json::Value) -> Result<Self, CoreError> {
        let wrap = |source| CoreError::Decode {
            message_type: message_type.as_str(),
            source,
        };
        Ok(match message_type {
            MessageType::MarkerArray => {
                FeedMessage::MarkerArray(serde_json::from_value(payload).map_err(wrap)?)
            }
            MessageType::OccupancyGrid => {
                FeedMessage::OccupancyGrid(serde_json::from_value(payload).map_err(wrap)?)
            }
            MessageType::PoseArray => {
                FeedMessage::PoseArray(serde_json::from_value(payload).map_err(wrap)?)
            }
            MessageType::Path => FeedMessage::Path(serde_json::from_value(payload).map_err(wrap)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_marker_array_with_missing_optional_fields() {
        let payload = json!({
            "markers": [{
                "header": { "frame_id": "base_link" },
                "ns": "obstacles",
                "id": 4,
                "type": 2,
                "action": 0,
                "pose": { "position": { "x": 1.0, "y": 2.0, "z": 0.0 },
                          "orientation": { "x": 0.0, "y": 0.0, "z": 0.0, "w": 0.0 } },
                "scale": { "x": 1.0, "y": 1.0, "z": 1.0 },
                "color": { "r": 1.0, "g": 0.0, "b": 0.0, "a": 1.0 }
            }]
        });

        let msg = FeedMessage::decode(MessageType::MarkerArray, payload).unwrap();
        let FeedMessage::MarkerArray(array) = msg else {
            panic!("wrong variant");
        };
        assert_eq!(array.markers.len(), 1);
        let m = &array.markers[0];
        assert_eq!(m.header.frame_id.as_str(), "base_link");
        assert_eq!(m.kind, 2);
        assert!(m.points.is_empty());
        assert!(m.pose.orientation.is_zero());
    }

    #[test]
    fn rejects_payload_of_the_wrong_shape() {
        let err = FeedMessage::decode(MessageType::OccupancyGrid, json!({ "poses": [] }))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Decode {
                message_type: "nav_msgs/OccupancyGrid",
                ..
            }
        ));
    }

    #[test]
    fn message_type_names_parse_back() {
        for t in MessageType::ALL {
            assert_eq!(MessageType::parse(t.as_str()).unwrap(), t);
        }
        assert!(MessageType::parse("std_msgs/Bool").is_err());
    }
}
