// vizboard_core/src/markers/mod.rs

use crate::frames::{project_pose, FrameResolver, Projector};
use crate::messages::{MarkerArray, MarkerMsg};
use crate::render::{in_local_frame, Canvas};
use crate::types::{FrameId, Pose, Rgba, Vec3Msg};
use std::collections::BTreeMap;
use tracing::{debug, trace};

mod painters;

pub use painters::{painter, Painter};

// =========================================================================
// == Marker Vocabulary ==
// =========================================================================

/// `visualization_msgs/Marker` shape codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerType {
    Arrow,
    Cube,
    Sphere,
    Cylinder,
    LineStrip,
    LineList,
    CubeList,
    SphereList,
    Points,
    TextViewFacing,
    MeshResource,
    TriangleList,
    /// A code outside the known range. Kept so it can be drawn as a no-op.
    Other(i32),
}

impl MarkerType {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => MarkerType::Arrow,
            1 => MarkerType::Cube,
            2 => MarkerType::Sphere,
            3 => MarkerType::Cylinder,
            4 => MarkerType::LineStrip,
            5 => MarkerType::LineList,
            6 => MarkerType::CubeList,
            7 => MarkerType::SphereList,
            8 => MarkerType::Points,
            9 => MarkerType::TextViewFacing,
            10 => MarkerType::MeshResource,
            11 => MarkerType::TriangleList,
            other => MarkerType::Other(other),
        }
    }

    /// Text always faces the viewer; every other shape follows the pose yaw.
    pub fn rotates_with_pose(self) -> bool {
        !matches!(self, MarkerType::TextViewFacing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerAction {
    AddModify,
    /// Obsolete code 1; handled exactly like `AddModify`.
    Deprecated,
    Delete,
    DeleteAll,
}

impl MarkerAction {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(MarkerAction::AddModify),
            1 => Some(MarkerAction::Deprecated),
            2 => Some(MarkerAction::Delete),
            3 => Some(MarkerAction::DeleteAll),
            _ => None,
        }
    }
}

/// Marker identity: namespace plus numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerKey {
    pub namespace: String,
    pub id: i32,
}

impl MarkerKey {
    pub fn new(namespace: impl Into<String>, id: i32) -> Self {
        Self {
            namespace: namespace.into(),
            id,
        }
    }
}

/// A live marker, normalized on insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub kind: MarkerType,
    pub frame_id: FrameId,
    /// Orientation is never all-zero here.
    pub pose: Pose,
    pub scale: Vec3Msg,
    pub color: Rgba,
    pub points: Vec<Vec3Msg>,
    pub colors: Vec<Rgba>,
    pub text: String,
}

impl Marker {
    fn from_msg(msg: &MarkerMsg) -> Self {
        let mut pose = msg.pose;
        pose.orientation = pose.orientation.sanitized();
        Self {
            kind: MarkerType::from_code(msg.kind),
            frame_id: msg.header.frame_id.clone(),
            pose,
            scale: msg.scale,
            color: msg.color,
            points: msg.points.clone(),
            colors: msg.colors.clone(),
            text: msg.text.clone(),
        }
    }
}

// =========================================================================
// == The Aggregator ==
// =========================================================================

/// The set of live markers for one widget.
///
/// Iteration (and therefore draw) order is the key order of the map. No
/// z-ordering is attempted.
#[derive(Debug, Default)]
pub struct MarkerAggregator {
    markers: BTreeMap<MarkerKey, Marker>,
}

impl MarkerAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies every entry of `array` in order.
    ///
    /// A delete-all empties the set and ends processing of this message;
    /// entries after it are ignored.
    pub fn apply(&mut self, array: &MarkerArray) {
        for msg in &array.markers {
            let key = MarkerKey::new(msg.ns.as_str(), msg.id);
            match MarkerAction::from_code(msg.action) {
                Some(MarkerAction::DeleteAll) => {
                    self.markers.clear();
                    return;
                }
                Some(MarkerAction::Delete) => {
                    self.markers.remove(&key);
                }
                Some(MarkerAction::AddModify | MarkerAction::Deprecated) => {
                    self.markers.insert(key, Marker::from_msg(msg));
                }
                None => {
                    debug!(action = msg.action, ns = %msg.ns, id = msg.id, "Ignoring marker with unknown action");
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn get(&self, key: &MarkerKey) -> Option<&Marker> {
        self.markers.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MarkerKey, &Marker)> {
        self.markers.iter()
    }

    /// Redraws every marker whose frame currently resolves.
    pub fn render(&self, canvas: &mut dyn Canvas, tf: &dyn FrameResolver, view: &dyn Projector) {
        canvas.clear();
        let unit = view.units_in_pixels(1.0);

        for (key, marker) in &self.markers {
            let Some(at) = project_pose(tf, view, &marker.frame_id, &marker.pose) else {
                trace!(ns = %key.namespace, id = key.id, frame = %marker.frame_id, "Marker frame unresolved; skipping");
                continue;
            };
            canvas.set_fill_style(&marker.color.to_fill_css());
            let heading = marker.kind.rotates_with_pose().then_some(at.heading);
            let paint = painter(marker.kind);
            in_local_frame(canvas, at.position, heading, |c| paint(c, marker, unit));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::test_support::{FlatTree, GridView};
    use crate::messages::Header;
    use crate::render::{CommandRecorder, DrawCommand};
    use crate::types::QuaternionMsg;

    fn marker(ns: &str, id: i32, action: i32) -> MarkerMsg {
        MarkerMsg {
            header: Header::new(0, Default::default(), FrameId::from("map")),
            ns: ns.to_string(),
            id,
            kind: 1,
            action,
            scale: Vec3Msg::new(1.0, 1.0, 1.0),
            color: Rgba::new(1.0, 0.0, 0.0, 1.0),
            ..Default::default()
        }
    }

    fn array(markers: Vec<MarkerMsg>) -> MarkerArray {
        MarkerArray { markers }
    }

    #[test]
    fn delete_all_empties_the_set() {
        let mut agg = MarkerAggregator::new();
        agg.apply(&array(vec![marker("a", 1, 0), marker("b", 2, 0)]));
        assert_eq!(agg.len(), 2);

        agg.apply(&array(vec![marker("", 0, 3)]));
        assert!(agg.is_empty());
    }

    #[test]
    fn entries_after_delete_all_are_ignored() {
        let mut agg = MarkerAggregator::new();
        agg.apply(&array(vec![marker("a", 1, 0), marker("", 0, 3), marker("b", 2, 0)]));
        assert!(agg.is_empty());
    }

    #[test]
    fn delete_is_idempotent() {
        let mut agg = MarkerAggregator::new();
        agg.apply(&array(vec![marker("a", 1, 0), marker("a", 2, 0)]));
        agg.apply(&array(vec![marker("a", 1, 2)]));
        let after_first: Vec<_> = agg.iter().map(|(k, _)| k.clone()).collect();
        agg.apply(&array(vec![marker("a", 1, 2)]));
        let after_second: Vec<_> = agg.iter().map(|(k, _)| k.clone()).collect();

        assert_eq!(after_first, after_second);
        assert_eq!(after_second, vec![MarkerKey::new("a", 2)]);
    }

    #[test]
    fn identity_is_namespace_and_id() {
        let mut agg = MarkerAggregator::new();
        let mut first = marker("ns", 7, 0);
        first.text = "old".into();
        let mut second = marker("ns", 7, 1);
        second.text = "new".into();
        agg.apply(&array(vec![first, second, marker("other", 7, 0)]));

        assert_eq!(agg.len(), 2);
        assert_eq!(agg.get(&MarkerKey::new("ns", 7)).unwrap().text, "new");
    }

    #[test]
    fn zero_orientation_is_stored_as_identity() {
        let mut m = marker("a", 1, 0);
        m.pose.orientation = QuaternionMsg {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 0.0,
        };
        let mut agg = MarkerAggregator::new();
        agg.apply(&array(vec![m]));
        let stored = agg.get(&MarkerKey::new("a", 1)).unwrap();
        assert_eq!(stored.pose.orientation, QuaternionMsg::identity());
    }

    #[test]
    fn unknown_action_leaves_set_untouched() {
        let mut agg = MarkerAggregator::new();
        agg.apply(&array(vec![marker("a", 1, 0), marker("a", 1, 42)]));
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn unresolved_frame_skips_only_that_marker() {
        let mut lost = marker("lost", 1, 0);
        lost.header.frame_id = FrameId::from("odom");
        let mut agg = MarkerAggregator::new();
        agg.apply(&array(vec![lost, marker("seen", 1, 0)]));

        let tf = FlatTree::with_frames(&[]);
        let mut rec = CommandRecorder::new(100.0, 100.0);
        agg.render(&mut rec, &tf, &GridView::default());

        let saves = rec
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Save))
            .count();
        assert_eq!(saves, 1);
        // The unresolved marker stays in the set for a later tick.
        assert_eq!(agg.len(), 2);
    }

    #[test]
    fn render_twice_is_identical() {
        let mut agg = MarkerAggregator::new();
        agg.apply(&array(vec![marker("a", 1, 0), marker("b", 1, 0)]));
        let tf = FlatTree::with_frames(&[]);
        let view = GridView::default();

        let mut rec = CommandRecorder::new(100.0, 100.0);
        agg.render(&mut rec, &tf, &view);
        let first = rec.commands().to_vec();
        agg.render(&mut rec, &tf, &view);
        assert_eq!(first, rec.commands());
    }

    #[test]
    fn text_is_not_rotated() {
        let mut m = marker("t", 1, 0);
        m.kind = 9;
        m.text = "hello".into();
        m.pose.orientation = QuaternionMsg::from_heading(1.0);
        let mut agg = MarkerAggregator::new();
        agg.apply(&array(vec![m]));

        let mut rec = CommandRecorder::new(100.0, 100.0);
        agg.render(&mut rec, &FlatTree::with_frames(&[]), &GridView::default());
        assert!(!rec
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::Rotate { .. })));
        assert!(rec
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::FillText { text, .. } if text == "hello")));
    }
}
