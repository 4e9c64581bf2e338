// vizboard_core/src/waypoints/geometry.rs

//! Screen-space picking for the waypoint editor. All distances here are in
//! pixels; points are stored in map coordinates and projected on demand.

use crate::frames::Projector;
use crate::types::{MapPoint, ScreenPoint};
use nalgebra::distance;

/// A press strictly closer than this to a waypoint picks it.
pub const HIT_RADIUS_PX: f64 = 15.0;
/// A tap at most this far from a path segment inserts onto that segment.
pub const SEGMENT_TOLERANCE_PX: f64 = 10.0;
/// A press that moves less than this before release is a tap.
pub const TAP_SLOP_PX: f64 = 10.0;

/// Distance from `p` to the closed segment `a`-`b`. A degenerate segment
/// (`a == b`) measures to the shared endpoint.
pub fn distance_to_segment(p: &ScreenPoint, a: &ScreenPoint, b: &ScreenPoint) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return distance(p, a);
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    distance(p, &(a + ab * t))
}

/// Index of the waypoint under `pixel`. When several are in range the last
/// one wins, matching draw order (later discs are painted on top).
pub fn hit_test(points: &[MapPoint], view: &dyn Projector, pixel: &ScreenPoint) -> Option<usize> {
    points
        .iter()
        .rposition(|p| distance(&view.map_to_screen(*p), pixel) < HIT_RADIUS_PX)
}

/// Where a tap at `pixel` should be inserted if it lands on the path: the
/// index right after the earlier endpoint of the first segment in range.
pub fn segment_insertion_index(
    points: &[MapPoint],
    view: &dyn Projector,
    pixel: &ScreenPoint,
) -> Option<usize> {
    let screen: Vec<ScreenPoint> = points.iter().map(|p| view.map_to_screen(*p)).collect();
    screen
        .windows(2)
        .position(|seg| distance_to_segment(pixel, &seg[0], &seg[1]) <= SEGMENT_TOLERANCE_PX)
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::test_support::GridView;
    use approx::assert_abs_diff_eq;
    use nalgebra::Point2;

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(10.0, 0.0);
        assert_abs_diff_eq!(distance_to_segment(&Point2::new(5.0, 3.0), &a, &b), 3.0);
        assert_abs_diff_eq!(distance_to_segment(&Point2::new(13.0, 4.0), &a, &b), 5.0);
        assert_abs_diff_eq!(distance_to_segment(&Point2::new(-3.0, -4.0), &a, &b), 5.0);
    }

    #[test]
    fn zero_length_segment_measures_to_the_point() {
        let a = Point2::new(2.0, 2.0);
        let d = distance_to_segment(&Point2::new(5.0, 6.0), &a, &a);
        assert_abs_diff_eq!(d, 5.0);
        assert!(!d.is_nan());
    }

    #[test]
    fn hit_radius_boundary() {
        // One pixel per meter, so map and screen distances coincide in x.
        let view = GridView {
            scale: 1.0,
            height: 100.0,
        };
        let points = [Point2::new(50.0, 50.0)];
        assert_eq!(hit_test(&points, &view, &Point2::new(64.9, 50.0)), Some(0));
        assert_eq!(hit_test(&points, &view, &Point2::new(65.1, 50.0)), None);
    }

    #[test]
    fn last_overlapping_point_wins() {
        let view = GridView::default();
        let points = [Point2::new(1.0, 1.0), Point2::new(1.5, 1.0), Point2::new(9.0, 9.0)];
        assert_eq!(hit_test(&points, &view, &Point2::new(12.0, 90.0)), Some(1));
    }

    #[test]
    fn first_segment_in_range_wins() {
        let view = GridView::default();
        // A hairpin: both segments pass close to screen (50, 90).
        let points = [Point2::new(0.0, 1.0), Point2::new(10.0, 1.0), Point2::new(0.0, 1.2)];
        assert_eq!(
            segment_insertion_index(&points, &view, &Point2::new(50.0, 90.0)),
            Some(1)
        );
        assert_eq!(
            segment_insertion_index(&points, &view, &Point2::new(50.0, 40.0)),
            None
        );
    }
}
