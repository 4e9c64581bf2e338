// vizboard_core/src/waypoints/mod.rs

//! The interactive waypoint editor: picking geometry, the pointer state
//! machine, path synthesis and drawing.

mod editor;
mod geometry;
mod path;

pub use editor::{EditOutcome, EditorEffect, Gesture, WaypointEditor};
pub use geometry::{
    distance_to_segment, hit_test, segment_insertion_index, HIT_RADIUS_PX, SEGMENT_TOLERANCE_PX,
    TAP_SLOP_PX,
};
pub use path::{build_path, path_headings};

use crate::frames::Projector;
use crate::render::{Canvas, TextAlign};
use crate::types::ScreenPoint;
use std::f64::consts::TAU;

const PATH_COLOR: &str = "#EBCE00";
const EDITING_DISC_COLOR: &str = "white";
const LABEL_COLOR: &str = "#212E4A";
const DISC_RADIUS_PX: f64 = 9.0;

/// Draws the path polyline, a disc per waypoint and its index label.
pub fn render_waypoints(canvas: &mut dyn Canvas, view: &dyn Projector, editor: &WaypointEditor) {
    canvas.clear();
    canvas.set_line_width(3.0);
    canvas.set_stroke_style(PATH_COLOR);
    canvas.set_fill_style(if editor.is_active() {
        EDITING_DISC_COLOR
    } else {
        PATH_COLOR
    });

    let screen: Vec<ScreenPoint> = editor
        .points()
        .iter()
        .map(|p| view.map_to_screen(*p))
        .collect();

    canvas.begin_path();
    for (i, p) in screen.iter().enumerate() {
        if i == 0 {
            canvas.move_to(p.x, p.y);
        } else {
            canvas.line_to(p.x, p.y);
        }
    }
    canvas.stroke();

    for p in &screen {
        canvas.save();
        canvas.translate(p.x, p.y);
        canvas.begin_path();
        canvas.arc(0.0, 0.0, DISC_RADIUS_PX, 0.0, TAU);
        canvas.fill();
        canvas.restore();
    }

    canvas.set_font("bold 13px Monospace");
    canvas.set_text_align(TextAlign::Center);
    canvas.set_fill_style(LABEL_COLOR);
    for (i, p) in screen.iter().enumerate() {
        canvas.fill_text(&i.to_string(), p.x, p.y + 5.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::test_support::GridView;
    use crate::render::{CommandRecorder, DrawCommand};
    use nalgebra::Point2;

    #[test]
    fn discs_turn_white_while_editing() {
        let view = GridView::default();
        let mut editor = WaypointEditor::new(vec![Point2::new(1.0, 1.0), Point2::new(2.0, 1.0)]);
        let mut rec = CommandRecorder::new(100.0, 100.0);

        render_waypoints(&mut rec, &view, &editor);
        assert!(rec.commands().contains(&DrawCommand::FillStyle {
            style: PATH_COLOR.into()
        }));

        editor.set_active(true);
        render_waypoints(&mut rec, &view, &editor);
        assert!(rec.commands().contains(&DrawCommand::FillStyle {
            style: EDITING_DISC_COLOR.into()
        }));
        assert!(rec.commands().contains(&DrawCommand::FillText {
            text: "1".into(),
            x: 20.0,
            y: 95.0
        }));
    }
}
