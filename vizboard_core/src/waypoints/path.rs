// vizboard_core/src/waypoints/path.rs

use crate::messages::{Header, Path, PoseStamped};
use crate::types::{FrameId, MapPoint, Pose, QuaternionMsg, Stamp, Vec3Msg};

/// Heading of every waypoint along the path.
///
/// Interior points take the bearing from their previous to their next
/// neighbor; the end points use their single neighbor. The bearing of a
/// step `d` is `atan2(-d.y, d.x)`. A lone point has no neighbor and gets
/// heading 0.
pub fn path_headings(points: &[MapPoint]) -> Vec<f64> {
    let n = points.len();
    if n < 2 {
        return vec![0.0; n];
    }
    (0..n)
        .map(|i| {
            let from = points[i.saturating_sub(1)];
            let to = points[(i + 1).min(n - 1)];
            let d = to - from;
            (-d.y).atan2(d.x)
        })
        .collect()
}

/// Builds the path message for `points`: one pose per point at z = 0, all
/// sharing `stamp` and `frame_id`, each pose's sequence being its index.
/// An empty list yields an empty path, which receivers treat as "stop".
pub fn build_path(points: &[MapPoint], frame_id: &FrameId, stamp: Stamp, seq: u32) -> Path {
    let poses = points
        .iter()
        .zip(path_headings(points))
        .enumerate()
        .map(|(i, (p, heading))| PoseStamped {
            header: Header::new(i as u32, stamp, frame_id.clone()),
            pose: Pose::new(Vec3Msg::new(p.x, p.y, 0.0), QuaternionMsg::from_heading(heading)),
        })
        .collect();

    Path {
        header: Header::new(seq, stamp, frame_id.clone()),
        poses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Point2;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn empty_list_is_a_valid_stop_path() {
        let path = build_path(&[], &FrameId::from("map"), Stamp::default(), 3);
        assert!(path.poses.is_empty());
        assert_eq!(path.header.seq, 3);
        assert_eq!(path.header.frame_id.as_str(), "map");
    }

    #[test]
    fn single_point_faces_zero() {
        let path = build_path(&[Point2::new(1.0, 2.0)], &FrameId::from("map"), Stamp::default(), 0);
        assert_eq!(path.poses.len(), 1);
        let q = path.poses[0].pose.orientation;
        assert!(!q.w.is_nan());
        assert_abs_diff_eq!(q.to_unit().angle(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn interior_heading_spans_both_neighbors() {
        let pts = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, -2.0)];
        let h = path_headings(&pts);
        assert_abs_diff_eq!(h[0], 0.0, epsilon = 1e-12);
        // Interior: from (0,0) to (1,-2).
        assert_abs_diff_eq!(h[1], 2.0f64.atan2(1.0), epsilon = 1e-12);
        assert_abs_diff_eq!(h[2], FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn poses_carry_index_shared_stamp_and_flat_z() {
        let stamp = Stamp::from_millis(1_500);
        let pts = [Point2::new(0.0, 0.0), Point2::new(3.0, 4.0)];
        let path = build_path(&pts, &FrameId::from("world"), stamp, 9);
        for (i, p) in path.poses.iter().enumerate() {
            assert_eq!(p.header.seq, i as u32);
            assert_eq!(p.header.stamp, stamp);
            assert_eq!(p.header.frame_id.as_str(), "world");
            assert_eq!(p.pose.position.z, 0.0);
        }
        assert_eq!(path.poses[1].pose.position.x, 3.0);
    }
}
