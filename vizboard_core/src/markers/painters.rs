// vizboard_core/src/markers/painters.rs

//! Per-type marker drawing. Each painter runs inside the marker's local
//! frame (origin at the marker, y up) and receives the meters-to-pixels unit.

use super::{Marker, MarkerType};
use crate::render::{fill_arrow, Canvas, TextAlign};
use std::f64::consts::TAU;

pub type Painter = fn(&mut dyn Canvas, &Marker, f64);

/// The dispatch table. Shapes without a 2-D rendering map to `paint_nothing`.
pub fn painter(kind: MarkerType) -> Painter {
    match kind {
        MarkerType::Arrow => paint_arrow,
        MarkerType::Cube => paint_cube,
        MarkerType::Sphere | MarkerType::Cylinder => paint_disc,
        MarkerType::LineStrip => paint_line_strip,
        MarkerType::TextViewFacing => paint_text,
        MarkerType::LineList
        | MarkerType::CubeList
        | MarkerType::SphereList
        | MarkerType::Points
        | MarkerType::MeshResource
        | MarkerType::TriangleList
        | MarkerType::Other(_) => paint_nothing,
    }
}

fn paint_nothing(_: &mut dyn Canvas, _: &Marker, _: f64) {}

fn paint_arrow(canvas: &mut dyn Canvas, marker: &Marker, unit: f64) {
    let (sx, sy) = (marker.scale.x, marker.scale.y);
    let length = (unit * sx).trunc();
    let shaft = (unit * 0.2 * sy).trunc() + 1.0;
    let tip = (unit * 0.3 * sx).trunc() + 1.0;
    let head = (unit * 0.6 * sy).trunc() + 1.0;
    fill_arrow(canvas, length, shaft, tip, head);
}

fn paint_cube(canvas: &mut dyn Canvas, marker: &Marker, unit: f64) {
    canvas.scale(marker.scale.x, marker.scale.y);
    canvas.fill_rect(-unit / 4.0, -unit / 4.0, unit / 2.0, unit / 2.0);
}

fn paint_disc(canvas: &mut dyn Canvas, marker: &Marker, unit: f64) {
    canvas.scale(marker.scale.x, marker.scale.y);
    canvas.begin_path();
    canvas.arc(0.0, 0.0, unit / 2.0, 0.0, TAU);
    canvas.fill();
}

fn paint_line_strip(canvas: &mut dyn Canvas, marker: &Marker, unit: f64) {
    let Some((first, rest)) = marker.points.split_first() else {
        return;
    };
    let color = marker.colors.first().unwrap_or(&marker.color);
    canvas.set_line_width((marker.scale.x * unit).trunc());
    canvas.set_stroke_style(&color.to_fill_css());

    canvas.begin_path();
    canvas.move_to(first.x * unit, first.y * unit);
    for p in rest {
        canvas.line_to(p.x * unit, p.y * unit);
    }
    canvas.stroke();
}

fn paint_text(canvas: &mut dyn Canvas, marker: &Marker, unit: f64) {
    // Undo the y flip so glyphs read upright.
    canvas.scale(0.1, -0.1);
    canvas.set_font(&format!("{}px Monospace", 1.2 * unit));
    canvas.set_text_align(TextAlign::Center);
    canvas.set_fill_style("white");
    canvas.set_stroke_style("#161B21");
    canvas.set_line_width(0.3 * unit);
    canvas.stroke_text(&marker.text, 0.0, 0.0);
    canvas.fill_text(&marker.text, 0.0, 0.0);
}
