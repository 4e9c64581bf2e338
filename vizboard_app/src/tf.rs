// vizboard_app/src/tf.rs

use crate::config::FrameConfig;
use nalgebra::Isometry3;
use std::collections::HashMap;
use tracing::warn;
use vizboard_core::frames::FrameResolver;
use vizboard_core::types::FrameId;

// =========================================================================
// == TF Tree (The "Service") ==
// =========================================================================

/// A frame tree built from parent/child edges.
///
/// Frames are resolved by composing edges up to the root of their tree. Two
/// frames can only be related when they share a root; a frame that was
/// never mentioned, or that sits in a tree not containing the fixed frame,
/// does not resolve.
#[derive(Debug, Clone)]
pub struct TfTree {
    fixed: FrameId,
    /// child -> (parent, pose of child in parent)
    edges: HashMap<FrameId, (FrameId, Isometry3<f64>)>,
}

impl TfTree {
    pub fn new(fixed: FrameId) -> Self {
        Self {
            fixed,
            edges: HashMap::new(),
        }
    }

    pub fn from_config(fixed: &str, frames: &[FrameConfig]) -> Self {
        let mut tree = Self::new(FrameId::from(fixed));
        for f in frames {
            tree.set_transform(FrameId::new(f.id.as_str()), FrameId::new(f.parent.as_str()), f.to_isometry());
        }
        tree
    }

    pub fn set_fixed_frame(&mut self, fixed: FrameId) {
        self.fixed = fixed;
    }

    /// Inserts or replaces the edge `parent -> child`.
    pub fn set_transform(&mut self, child: FrameId, parent: FrameId, pose: Isometry3<f64>) {
        self.edges.insert(child, (parent, pose));
    }

    fn is_known(&self, frame: &FrameId) -> bool {
        *frame == self.fixed
            || self.edges.contains_key(frame)
            || self.edges.values().any(|(parent, _)| parent == frame)
    }

    /// Root of `frame`'s tree and the pose of `frame` in it.
    fn to_root(&self, frame: &FrameId) -> Option<(FrameId, Isometry3<f64>)> {
        if !self.is_known(frame) {
            return None;
        }
        let mut pose = Isometry3::identity();
        let mut current = frame;
        // More hops than edges means a cycle.
        for _ in 0..=self.edges.len() {
            match self.edges.get(current) {
                Some((parent, edge)) => {
                    pose = edge * pose;
                    current = parent;
                }
                None => return Some((current.clone(), pose)),
            }
        }
        warn!(frame = %frame, "Frame tree contains a cycle");
        None
    }
}

impl FrameResolver for TfTree {
    fn fixed_frame(&self) -> &FrameId {
        &self.fixed
    }

    fn resolved_frame(&self, frame: &FrameId) -> Option<Isometry3<f64>> {
        let (root, in_root) = self.to_root(frame)?;
        let (fixed_root, fixed_in_root) = self.to_root(&self.fixed)?;
        (root == fixed_root).then(|| fixed_in_root.inverse() * in_root)
    }

    fn transform_pose(
        &self,
        source: &FrameId,
        target: &FrameId,
        pose: &Isometry3<f64>,
    ) -> Option<Isometry3<f64>> {
        let (source_root, source_in_root) = self.to_root(source)?;
        let (target_root, target_in_root) = self.to_root(target)?;
        (source_root == target_root).then(|| target_in_root.inverse() * source_in_root * pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Translation3, UnitQuaternion, Vector3};
    use std::f64::consts::FRAC_PI_2;

    fn iso(x: f64, y: f64, yaw: f64) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::new(x, y, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw),
        )
    }

    fn tree() -> TfTree {
        let mut tf = TfTree::new(FrameId::from("map"));
        tf.set_transform("odom".into(), "map".into(), iso(1.0, 0.0, FRAC_PI_2));
        tf.set_transform("base_link".into(), "odom".into(), iso(2.0, 0.0, 0.0));
        tf
    }

    #[test]
    fn chains_compose_up_to_the_fixed_frame() {
        let tf = tree();
        let base = tf.resolved_frame(&"base_link".into()).unwrap();
        assert_abs_diff_eq!(base.translation.vector.x, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(base.translation.vector.y, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn fixed_frame_can_sit_below_the_root() {
        let mut tf = tree();
        tf.set_fixed_frame("odom".into());
        let base = tf.resolved_frame(&"base_link".into()).unwrap();
        assert_abs_diff_eq!(base.translation.vector.x, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(base.translation.vector.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn unknown_and_disconnected_frames_do_not_resolve() {
        let mut tf = tree();
        assert!(tf.resolved_frame(&"camera".into()).is_none());
        tf.set_transform("lidar".into(), "elsewhere".into(), Isometry3::identity());
        assert!(tf.resolved_frame(&"lidar".into()).is_none());
        assert!(tf.resolved_frame(&"map".into()).is_some());
    }

    #[test]
    fn cycles_do_not_hang() {
        let mut tf = TfTree::new(FrameId::from("map"));
        tf.set_transform("a".into(), "b".into(), Isometry3::identity());
        tf.set_transform("b".into(), "a".into(), Isometry3::identity());
        assert!(tf.resolved_frame(&"a".into()).is_none());
    }
}
