// vizboard_core/src/frames.rs

use crate::types::{FrameId, MapPoint, Pose, ScreenPoint};
use nalgebra::{Isometry3, Point2, UnitQuaternion};

// =========================================================================
// == Collaborator Contracts ==
// =========================================================================

/// The contract for any object that can answer transform-tree queries.
/// The dashboard's frame tree implements this, as will a mock for testing.
///
/// Implementations are read-only from a widget's point of view; they are
/// mutated by their owner, which then broadcasts a change notification.
pub trait FrameResolver {
    /// The frame every widget ultimately renders in.
    fn fixed_frame(&self) -> &FrameId;

    /// Pose of `frame` expressed in the fixed frame, or `None` while the
    /// frame has not been observed.
    fn resolved_frame(&self, frame: &FrameId) -> Option<Isometry3<f64>>;

    /// Re-expresses `pose`, authored in `source`, in the `target` frame.
    fn transform_pose(
        &self,
        source: &FrameId,
        target: &FrameId,
        pose: &Isometry3<f64>,
    ) -> Option<Isometry3<f64>>;
}

/// Maps between fixed-frame, map and screen coordinates for the current
/// pan/zoom state. Screen `y` grows downward.
pub trait Projector {
    fn fixed_to_screen(&self, point: Point2<f64>) -> ScreenPoint;
    fn map_to_screen(&self, point: MapPoint) -> ScreenPoint;
    fn screen_to_map(&self, pixel: ScreenPoint) -> MapPoint;
    /// Linear meters-to-pixels scale.
    fn units_in_pixels(&self, meters: f64) -> f64;
}

/// The one piece of view state a widget may ask to change: whether pointer
/// drags pan the camera.
pub trait PanControl {
    fn set_panning_enabled(&mut self, enabled: bool);
    fn panning_enabled(&self) -> bool;
}

// =========================================================================
// == Shared Projection Helpers ==
// =========================================================================

/// Heading (rotation about the vertical axis) of an orientation. Roll and
/// pitch are discarded; everything is drawn top-down.
pub fn heading(rotation: &UnitQuaternion<f64>) -> f64 {
    rotation.euler_angles().2
}

/// Where an item lands on screen and which way it points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPose {
    pub position: ScreenPoint,
    pub heading: f64,
}

/// Resolves a pose authored in `frame` to a screen position and heading.
///
/// Returns `None` when `frame` is not (yet) part of the tree; callers skip the
/// item for this tick and try again on the next one.
pub fn project_pose(
    tf: &dyn FrameResolver,
    view: &dyn Projector,
    frame: &FrameId,
    pose: &Pose,
) -> Option<ScreenPose> {
    tf.resolved_frame(frame)?;
    let in_fixed = tf.transform_pose(frame, tf.fixed_frame(), &pose.to_isometry())?;
    let t = in_fixed.translation.vector;
    Some(ScreenPose {
        position: view.fixed_to_screen(Point2::new(t.x, t.y)),
        heading: heading(&in_fixed.rotation),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Minimal collaborators shared by the unit tests of this crate.

    use super::*;
    use std::collections::HashMap;

    /// Frames given directly as poses in the fixed frame.
    pub struct FlatTree {
        pub fixed: FrameId,
        pub frames: HashMap<FrameId, Isometry3<f64>>,
    }

    impl FlatTree {
        pub fn with_frames(names: &[&str]) -> Self {
            let fixed = FrameId::from("map");
            let mut frames = HashMap::new();
            frames.insert(fixed.clone(), Isometry3::identity());
            for name in names {
                frames.insert(FrameId::from(*name), Isometry3::identity());
            }
            Self { fixed, frames }
        }
    }

    impl FrameResolver for FlatTree {
        fn fixed_frame(&self) -> &FrameId {
            &self.fixed
        }

        fn resolved_frame(&self, frame: &FrameId) -> Option<Isometry3<f64>> {
            self.frames.get(frame).copied()
        }

        fn transform_pose(
            &self,
            source: &FrameId,
            target: &FrameId,
            pose: &Isometry3<f64>,
        ) -> Option<Isometry3<f64>> {
            let s = self.frames.get(source)?;
            let t = self.frames.get(target)?;
            Some(t.inverse() * s * pose)
        }
    }

    /// Screen origin at the top-left, `scale` pixels per meter, y flipped.
    pub struct GridView {
        pub scale: f64,
        pub height: f64,
    }

    impl Default for GridView {
        fn default() -> Self {
            Self {
                scale: 10.0,
                height: 100.0,
            }
        }
    }

    impl Projector for GridView {
        fn fixed_to_screen(&self, p: Point2<f64>) -> ScreenPoint {
            Point2::new(p.x * self.scale, self.height - p.y * self.scale)
        }

        fn map_to_screen(&self, p: MapPoint) -> ScreenPoint {
            self.fixed_to_screen(p)
        }

        fn screen_to_map(&self, p: ScreenPoint) -> MapPoint {
            Point2::new(p.x / self.scale, (self.height - p.y) / self.scale)
        }

        fn units_in_pixels(&self, meters: f64) -> f64 {
            meters * self.scale
        }
    }
}
