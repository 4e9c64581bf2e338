// vizboard_core/src/waypoints/editor.rs

use super::geometry::{hit_test, segment_insertion_index, TAP_SLOP_PX};
use crate::frames::Projector;
use crate::types::{MapPoint, ScreenPoint};
use nalgebra::distance;
use tracing::debug;

// =========================================================================
// == Editor Outputs ==
// =========================================================================

/// A side effect the owner of the editor must carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEffect {
    /// Enable or disable camera panning.
    SetPanning(bool),
    /// The point list changed visually; redraw the widget.
    Redraw,
    /// The point list changed; write it to settings.
    Persist,
}

/// Result of feeding one pointer event to the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditOutcome {
    /// False when the editor is inactive and ignored the event.
    pub intercepted: bool,
    pub effects: Vec<EditorEffect>,
}

impl EditOutcome {
    fn ignored() -> Self {
        Self::default()
    }

    fn handled(effects: Vec<EditorEffect>) -> Self {
        Self {
            intercepted: true,
            effects,
        }
    }

    pub fn has(&self, effect: EditorEffect) -> bool {
        self.effects.contains(&effect)
    }
}

/// Pointer gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Idle,
    /// A press that started on waypoint `index`; moves drag it. Released
    /// within the tap slop of `origin`, it is a tap on that point instead.
    Dragging {
        index: usize,
        origin: ScreenPoint,
        last: ScreenPoint,
    },
    /// A press that started on empty space. Becomes a tap or a pan on release.
    PressStart {
        origin: ScreenPoint,
        last: ScreenPoint,
    },
}

// =========================================================================
// == The Editor ==
// =========================================================================

/// An ordered list of map points plus the pointer state machine that edits
/// it. Point order is path order.
#[derive(Debug, Clone)]
pub struct WaypointEditor {
    points: Vec<MapPoint>,
    active: bool,
    gesture: Gesture,
}

impl Default for WaypointEditor {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl WaypointEditor {
    pub fn new(points: Vec<MapPoint>) -> Self {
        Self {
            points,
            active: false,
            gesture: Gesture::Idle,
        }
    }

    pub fn points(&self) -> &[MapPoint] {
        &self.points
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// Turns editing on or off. Leaving edit mode mid-drag abandons the
    /// gesture and gives panning back.
    pub fn set_active(&mut self, active: bool) -> Vec<EditorEffect> {
        self.active = active;
        let mut effects = vec![EditorEffect::Redraw];
        if !active {
            if let Gesture::Dragging { .. } = self.gesture {
                effects.push(EditorEffect::SetPanning(true));
                effects.push(EditorEffect::Persist);
            }
            self.gesture = Gesture::Idle;
        }
        effects
    }

    pub fn pointer_down(&mut self, pixel: ScreenPoint, view: &dyn Projector) -> EditOutcome {
        if !self.active {
            return EditOutcome::ignored();
        }
        match hit_test(&self.points, view, &pixel) {
            Some(index) => {
                debug!(index, "Waypoint drag started");
                self.gesture = Gesture::Dragging {
                    index,
                    origin: pixel,
                    last: pixel,
                };
                EditOutcome::handled(vec![EditorEffect::SetPanning(false)])
            }
            None => {
                self.gesture = Gesture::PressStart {
                    origin: pixel,
                    last: pixel,
                };
                EditOutcome::handled(Vec::new())
            }
        }
    }

    pub fn pointer_move(&mut self, pixel: ScreenPoint, view: &dyn Projector) -> EditOutcome {
        if !self.active {
            return EditOutcome::ignored();
        }
        match &mut self.gesture {
            Gesture::Dragging { index, last, .. } => {
                *last = pixel;
                if let Some(p) = self.points.get_mut(*index) {
                    *p = view.screen_to_map(pixel);
                }
                EditOutcome::handled(vec![EditorEffect::Redraw])
            }
            Gesture::PressStart { last, .. } => {
                *last = pixel;
                EditOutcome::handled(Vec::new())
            }
            Gesture::Idle => EditOutcome::handled(Vec::new()),
        }
    }

    /// Ends the gesture. A press that moved less than `TAP_SLOP_PX` (net,
    /// from the press point to the last move) is a tap. A tap that started on
    /// a point removes it; otherwise it inserts onto the path or appends.
    pub fn pointer_up(&mut self, pixel: ScreenPoint, view: &dyn Projector) -> EditOutcome {
        if !self.active {
            return EditOutcome::ignored();
        }
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::Dragging {
                index,
                origin,
                last,
            } => {
                if distance(&origin, &last) < TAP_SLOP_PX && index < self.points.len() {
                    debug!(index, "Waypoint removed");
                    self.points.remove(index);
                } else {
                    debug!(index, "Waypoint drag finished");
                }
                EditOutcome::handled(vec![
                    EditorEffect::SetPanning(true),
                    EditorEffect::Persist,
                    EditorEffect::Redraw,
                ])
            }
            Gesture::PressStart { origin, last } => {
                if distance(&origin, &last) < TAP_SLOP_PX {
                    self.tap(pixel, view);
                    EditOutcome::handled(vec![EditorEffect::Persist, EditorEffect::Redraw])
                } else {
                    EditOutcome::handled(vec![EditorEffect::Redraw])
                }
            }
            Gesture::Idle => EditOutcome::handled(Vec::new()),
        }
    }

    fn tap(&mut self, pixel: ScreenPoint, view: &dyn Projector) {
        if let Some(index) = hit_test(&self.points, view, &pixel) {
            debug!(index, "Waypoint removed");
            self.points.remove(index);
            return;
        }
        let point = view.screen_to_map(pixel);
        match segment_insertion_index(&self.points, view, &pixel) {
            Some(index) => {
                debug!(index, "Waypoint inserted");
                self.points.insert(index, point);
            }
            None => {
                debug!(index = self.points.len(), "Waypoint appended");
                self.points.push(point);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::test_support::GridView;
    use approx::assert_abs_diff_eq;
    use nalgebra::Point2;

    fn px(x: f64, y: f64) -> ScreenPoint {
        Point2::new(x, y)
    }

    fn active(points: Vec<MapPoint>) -> WaypointEditor {
        let mut e = WaypointEditor::new(points);
        e.set_active(true);
        e
    }

    fn tap(e: &mut WaypointEditor, at: ScreenPoint, view: &GridView) -> EditOutcome {
        e.pointer_down(at, view);
        e.pointer_up(at, view)
    }

    #[test]
    fn inactive_editor_intercepts_nothing() {
        let view = GridView::default();
        let mut e = WaypointEditor::default();
        let out = tap(&mut e, px(10.0, 10.0), &view);
        assert!(!out.intercepted);
        assert!(e.points().is_empty());
    }

    #[test]
    fn tap_on_empty_space_appends() {
        let view = GridView::default();
        let mut e = active(Vec::new());
        let out = tap(&mut e, px(30.0, 40.0), &view);
        assert!(out.has(EditorEffect::Persist));
        assert_eq!(e.points(), &[Point2::new(3.0, 6.0)]);
    }

    #[test]
    fn tap_near_segment_inserts_between() {
        let view = GridView::default();
        let mut e = active(vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)]);
        // Segment midpoint is at screen (50, 100); tap 4 px off it.
        tap(&mut e, px(50.0, 96.0), &view);
        assert_eq!(e.points().len(), 3);
        assert_eq!(e.points()[0], Point2::new(0.0, 0.0));
        assert_abs_diff_eq!(e.points()[1].x, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(e.points()[1].y, 0.4, epsilon = 1e-9);
        assert_eq!(e.points()[2], Point2::new(10.0, 0.0));
    }

    #[test]
    fn tap_on_point_removes_it() {
        let view = GridView::default();
        let mut e = active(vec![Point2::new(1.0, 1.0), Point2::new(5.0, 5.0)]);
        tap(&mut e, px(52.0, 48.0), &view);
        assert_eq!(e.points(), &[Point2::new(1.0, 1.0)]);
    }

    #[test]
    fn short_wiggle_on_a_point_still_removes_it() {
        let view = GridView::default();
        let mut e = active(vec![Point2::new(1.0, 1.0), Point2::new(5.0, 5.0)]);
        let down = e.pointer_down(px(52.0, 48.0), &view);
        assert!(down.has(EditorEffect::SetPanning(false)));
        e.pointer_move(px(58.0, 48.0), &view);
        let up = e.pointer_up(px(58.0, 48.0), &view);
        assert_eq!(e.points(), &[Point2::new(1.0, 1.0)]);
        assert!(up.has(EditorEffect::SetPanning(true)));
        assert!(up.has(EditorEffect::Persist));
        assert_eq!(e.gesture(), Gesture::Idle);
    }

    #[test]
    fn tap_versus_pan_threshold() {
        let view = GridView::default();

        let mut e = active(Vec::new());
        e.pointer_down(px(20.0, 20.0), &view);
        e.pointer_move(px(29.0, 20.0), &view);
        e.pointer_up(px(29.0, 20.0), &view);
        assert_eq!(e.points().len(), 1, "9 px is a tap");

        let mut e = active(Vec::new());
        e.pointer_down(px(20.0, 20.0), &view);
        e.pointer_move(px(31.0, 20.0), &view);
        let out = e.pointer_up(px(31.0, 20.0), &view);
        assert!(e.points().is_empty(), "11 px is a pan");
        assert!(!out.has(EditorEffect::Persist));

        let mut e = active(Vec::new());
        e.pointer_down(px(20.0, 20.0), &view);
        e.pointer_move(px(26.0, 28.0), &view);
        e.pointer_up(px(26.0, 28.0), &view);
        assert!(e.points().is_empty(), "exactly 10 px is a pan");
    }

    #[test]
    fn drag_moves_point_and_toggles_panning() {
        let view = GridView::default();
        let mut e = active(vec![Point2::new(2.0, 2.0)]);

        let down = e.pointer_down(px(20.0, 80.0), &view);
        assert_eq!(down.effects, vec![EditorEffect::SetPanning(false)]);
        assert!(matches!(e.gesture(), Gesture::Dragging { index: 0, .. }));

        e.pointer_move(px(40.0, 60.0), &view);
        assert_eq!(e.points(), &[Point2::new(4.0, 4.0)]);

        // Released far from the start, but a drag is never a tap.
        let up = e.pointer_up(px(40.0, 60.0), &view);
        assert!(up.has(EditorEffect::SetPanning(true)));
        assert!(up.has(EditorEffect::Persist));
        assert_eq!(e.points().len(), 1);
        assert_eq!(e.gesture(), Gesture::Idle);
    }

    #[test]
    fn deactivating_mid_drag_restores_panning() {
        let view = GridView::default();
        let mut e = active(vec![Point2::new(2.0, 2.0)]);
        e.pointer_down(px(20.0, 80.0), &view);
        let effects = e.set_active(false);
        assert!(effects.contains(&EditorEffect::SetPanning(true)));
        assert_eq!(e.gesture(), Gesture::Idle);
    }
}
