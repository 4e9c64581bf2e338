// vizboard_core/src/poses.rs

//! Pose arrays and sprite placement: the two remaining "draw something at a
//! resolved pose" layers.

use crate::frames::{heading, project_pose, FrameResolver, Projector};
use crate::messages::PoseArray;
use crate::render::{fill_arrow, in_local_frame, Canvas};
use crate::types::{FrameId, Pose};
use nalgebra::Point2;
use std::f64::consts::PI;
use tracing::trace;

// =========================================================================
// == Pose Arrays ==
// =========================================================================

/// A pose already expressed in the fixed frame, reduced to what a top-down
/// view needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatPose {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

/// The latest accepted pose array, transformed into the fixed frame at
/// receive time.
#[derive(Debug, Default)]
pub struct PoseCache {
    fixed_frame: Option<FrameId>,
    poses: Vec<FlatPose>,
}

impl PoseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cache with `msg`. Returns false (and keeps the previous
    /// poses) while the message's frame is not resolvable.
    pub fn accept(&mut self, msg: &PoseArray, tf: &dyn FrameResolver) -> bool {
        let source = &msg.header.frame_id;
        if tf.resolved_frame(source).is_none() {
            trace!(frame = %source, "Pose array frame unresolved; keeping previous poses");
            return false;
        }
        let fixed = tf.fixed_frame();
        self.poses = msg
            .poses
            .iter()
            .filter_map(|p| tf.transform_pose(source, fixed, &p.to_isometry()))
            .map(|iso| FlatPose {
                x: iso.translation.vector.x,
                y: iso.translation.vector.y,
                yaw: heading(&iso.rotation),
            })
            .collect();
        self.fixed_frame = Some(fixed.clone());
        true
    }

    pub fn clear(&mut self) {
        self.fixed_frame = None;
        self.poses.clear();
    }

    pub fn poses(&self) -> &[FlatPose] {
        &self.poses
    }

    /// Draws an arrow per pose, sized `unit * scale`. Poses cached under a
    /// different fixed frame than the current one are not drawn.
    pub fn render(&self, canvas: &mut dyn Canvas, tf: &dyn FrameResolver, view: &dyn Projector, scale: f64) {
        canvas.clear();
        canvas.set_fill_style("darkred");
        if self.fixed_frame.as_ref() != Some(tf.fixed_frame()) {
            return;
        }
        let size = view.units_in_pixels(1.0) * scale;
        let length = (size * 0.5).trunc();
        let shaft = (size * 0.01).trunc() + 1.0;
        let tip = (size * 0.07).trunc() + 1.0;
        let head = (size * 0.07).trunc() + 1.0;

        for p in &self.poses {
            let at = view.fixed_to_screen(Point2::new(p.x, p.y));
            in_local_frame(canvas, at, Some(p.yaw), |c| fill_arrow(c, length, shaft, tip, head));
        }
    }
}

// =========================================================================
// == Sprites ==
// =========================================================================

/// How to draw a named image at a frame's pose.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteSpec {
    pub frame: FrameId,
    pub sprite: String,
    /// Drawn width, in meters.
    pub length: f64,
    /// Height over width of the image.
    pub aspect_ratio: f64,
}

/// Draws `model.sprite` centered on the origin of `model.frame`. Nothing is
/// drawn while the frame is unresolved.
pub fn render_sprite(
    canvas: &mut dyn Canvas,
    tf: &dyn FrameResolver,
    view: &dyn Projector,
    model: &SpriteSpec,
) {
    canvas.clear();
    let Some(at) = project_pose(tf, view, &model.frame, &Pose::default()) else {
        trace!(frame = %model.frame, "Sprite frame unresolved; skipping");
        return;
    };
    let w = view.units_in_pixels(model.length);
    let h = w * model.aspect_ratio;

    // Sprites are authored nose-up, so no y flip here.
    canvas.save();
    canvas.translate(at.position.x, at.position.y);
    canvas.rotate(PI - at.heading);
    canvas.draw_sprite(&model.sprite, -w / 2.0, -h / 2.0, w, h);
    canvas.restore();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::test_support::{FlatTree, GridView};
    use crate::messages::Header;
    use crate::render::{CommandRecorder, DrawCommand};
    use crate::types::{QuaternionMsg, Vec3Msg};
    use approx::assert_abs_diff_eq;
    use nalgebra::{Isometry3, Translation3, UnitQuaternion};

    fn array(frame: &str, xs: &[f64]) -> PoseArray {
        PoseArray {
            header: Header::new(0, Default::default(), FrameId::from(frame)),
            poses: xs
                .iter()
                .map(|x| Pose::new(Vec3Msg::new(*x, 0.0, 0.0), QuaternionMsg::identity()))
                .collect(),
        }
    }

    #[test]
    fn poses_are_transformed_on_receipt() {
        let mut tf = FlatTree::with_frames(&[]);
        tf.frames.insert(
            FrameId::from("odom"),
            Isometry3::from_parts(Translation3::new(5.0, 0.0, 0.0), UnitQuaternion::identity()),
        );
        let mut cache = PoseCache::new();
        assert!(cache.accept(&array("odom", &[1.0, 2.0]), &tf));
        assert_abs_diff_eq!(cache.poses()[0].x, 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cache.poses()[1].x, 7.0, epsilon = 1e-12);
    }

    #[test]
    fn unresolved_message_keeps_previous_poses() {
        let tf = FlatTree::with_frames(&[]);
        let mut cache = PoseCache::new();
        cache.accept(&array("map", &[1.0]), &tf);
        assert!(!cache.accept(&array("odom", &[1.0, 2.0, 3.0]), &tf));
        assert_eq!(cache.poses().len(), 1);
    }

    #[test]
    fn poses_from_another_fixed_frame_are_hidden() {
        let mut tf = FlatTree::with_frames(&["world"]);
        let mut cache = PoseCache::new();
        cache.accept(&array("map", &[1.0]), &tf);

        let mut rec = CommandRecorder::new(100.0, 100.0);
        cache.render(&mut rec, &tf, &GridView::default(), 1.0);
        assert!(rec.commands().contains(&DrawCommand::Fill));

        tf.fixed = FrameId::from("world");
        cache.render(&mut rec, &tf, &GridView::default(), 1.0);
        assert!(!rec.commands().contains(&DrawCommand::Fill));
    }

    #[test]
    fn sprite_is_centered_and_turned() {
        let tf = FlatTree::with_frames(&["base_link"]);
        let model = SpriteSpec {
            frame: FrameId::from("base_link"),
            sprite: "robot.png".into(),
            length: 2.0,
            aspect_ratio: 0.5,
        };
        let mut rec = CommandRecorder::new(100.0, 100.0);
        render_sprite(&mut rec, &tf, &GridView::default(), &model);
        assert!(rec.commands().contains(&DrawCommand::Rotate { angle: PI }));
        assert!(rec.commands().contains(&DrawCommand::DrawSprite {
            sprite: "robot.png".into(),
            x: -10.0,
            y: -5.0,
            w: 20.0,
            h: 10.0
        }));
    }
}
