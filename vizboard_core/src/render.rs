// vizboard_core/src/render.rs

//! The drawing surface every widget renders into.
//!
//! `Canvas` mirrors the subset of a 2-D canvas context the widgets use. The
//! browser build backs it with a real context; `CommandRecorder` records the
//! calls instead, which is what the replay tool and the tests inspect.

use crate::types::ScreenPoint;
use serde::Serialize;

/// Handle to a bitmap owned by a raster cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BitmapId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Start,
    Center,
}

pub trait Canvas {
    fn width(&self) -> f64;
    fn height(&self) -> f64;

    /// Wipes the whole surface.
    fn clear(&mut self);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn scale(&mut self, sx: f64, sy: f64);
    fn rotate(&mut self, angle: f64);

    fn set_fill_style(&mut self, style: &str);
    fn set_stroke_style(&mut self, style: &str);
    fn set_line_width(&mut self, width: f64);
    fn set_global_alpha(&mut self, alpha: f64);
    fn set_image_smoothing(&mut self, enabled: bool);
    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: TextAlign);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
    fn stroke_text(&mut self, text: &str, x: f64, y: f64);
    fn draw_bitmap(&mut self, bitmap: BitmapId, x: f64, y: f64, w: f64, h: f64);
    fn draw_sprite(&mut self, sprite: &str, x: f64, y: f64, w: f64, h: f64);
}

/// One recorded canvas call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear { width: f64, height: f64 },
    Save,
    Restore,
    Translate { x: f64, y: f64 },
    Scale { x: f64, y: f64 },
    Rotate { angle: f64 },
    FillStyle { style: String },
    StrokeStyle { style: String },
    LineWidth { width: f64 },
    GlobalAlpha { alpha: f64 },
    ImageSmoothing { enabled: bool },
    Font { font: String },
    TextAlign { align: TextAlign },
    BeginPath,
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    Arc { x: f64, y: f64, radius: f64, start: f64, end: f64 },
    Fill,
    Stroke,
    FillRect { x: f64, y: f64, w: f64, h: f64 },
    FillText { text: String, x: f64, y: f64 },
    StrokeText { text: String, x: f64, y: f64 },
    DrawBitmap { bitmap: BitmapId, x: f64, y: f64, w: f64, h: f64 },
    DrawSprite { sprite: String, x: f64, y: f64, w: f64, h: f64 },
}

/// A `Canvas` that records calls. `clear` drops everything recorded so far,
/// so after a render the list holds exactly that render's output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandRecorder {
    width: f64,
    height: f64,
    commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    fn push(&mut self, cmd: DrawCommand) {
        self.commands.push(cmd);
    }
}

impl Canvas for CommandRecorder {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.push(DrawCommand::Clear {
            width: self.width,
            height: self.height,
        });
    }

    fn save(&mut self) {
        self.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.push(DrawCommand::Restore);
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::Translate { x, y });
    }

    fn scale(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::Scale { x, y });
    }

    fn rotate(&mut self, angle: f64) {
        self.push(DrawCommand::Rotate { angle });
    }

    fn set_fill_style(&mut self, style: &str) {
        self.push(DrawCommand::FillStyle {
            style: style.to_string(),
        });
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.push(DrawCommand::StrokeStyle {
            style: style.to_string(),
        });
    }

    fn set_line_width(&mut self, width: f64) {
        self.push(DrawCommand::LineWidth { width });
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.push(DrawCommand::GlobalAlpha { alpha });
    }

    fn set_image_smoothing(&mut self, enabled: bool) {
        self.push(DrawCommand::ImageSmoothing { enabled });
    }

    fn set_font(&mut self, font: &str) {
        self.push(DrawCommand::Font {
            font: font.to_string(),
        });
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.push(DrawCommand::TextAlign { align });
    }

    fn begin_path(&mut self) {
        self.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.push(DrawCommand::LineTo { x, y });
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) {
        self.push(DrawCommand::Arc {
            x,
            y,
            radius,
            start,
            end,
        });
    }

    fn fill(&mut self) {
        self.push(DrawCommand::Fill);
    }

    fn stroke(&mut self) {
        self.push(DrawCommand::Stroke);
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push(DrawCommand::FillRect { x, y, w, h });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.push(DrawCommand::FillText {
            text: text.to_string(),
            x,
            y,
        });
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64) {
        self.push(DrawCommand::StrokeText {
            text: text.to_string(),
            x,
            y,
        });
    }

    fn draw_bitmap(&mut self, bitmap: BitmapId, x: f64, y: f64, w: f64, h: f64) {
        self.push(DrawCommand::DrawBitmap { bitmap, x, y, w, h });
    }

    fn draw_sprite(&mut self, sprite: &str, x: f64, y: f64, w: f64, h: f64) {
        self.push(DrawCommand::DrawSprite {
            sprite: sprite.to_string(),
            x,
            y,
            w,
            h,
        });
    }
}

// =========================================================================
// == Shared Drawing Helpers ==
// =========================================================================

/// Runs `draw` inside a local frame placed at `at`: save, translate, flip the
/// y axis back to "up", rotate by `heading` (if any), draw, restore.
pub fn in_local_frame<F>(canvas: &mut dyn Canvas, at: ScreenPoint, heading: Option<f64>, draw: F)
where
    F: FnOnce(&mut dyn Canvas),
{
    canvas.save();
    canvas.translate(at.x, at.y);
    canvas.scale(1.0, -1.0);
    if let Some(angle) = heading {
        canvas.rotate(angle);
    }
    draw(&mut *canvas);
    canvas.restore();
}

/// Fills a closed polygon.
pub fn fill_polygon(canvas: &mut dyn Canvas, points: &[(f64, f64)]) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    canvas.begin_path();
    canvas.move_to(first.0, first.1);
    for p in rest {
        canvas.line_to(p.0, p.1);
    }
    canvas.fill();
}

/// A right-pointing arrow along +x: a shaft of half-width `shaft` up to
/// `length - tip`, then a head of half-width `head`.
pub fn fill_arrow(canvas: &mut dyn Canvas, length: f64, shaft: f64, tip: f64, head: f64) {
    fill_polygon(
        canvas,
        &[
            (0.0, -shaft),
            (length - tip, -shaft),
            (length - tip, -head),
            (length, 0.0),
            (length - tip, head),
            (length - tip, shaft),
            (0.0, shaft),
            (0.0, -shaft),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    #[test]
    fn clear_starts_a_fresh_recording() {
        let mut rec = CommandRecorder::new(10.0, 20.0);
        rec.fill_rect(0.0, 0.0, 1.0, 1.0);
        rec.clear();
        assert_eq!(
            rec.commands(),
            &[DrawCommand::Clear {
                width: 10.0,
                height: 20.0
            }]
        );
    }

    #[test]
    fn local_frame_is_balanced_and_ordered() {
        let mut rec = CommandRecorder::new(10.0, 10.0);
        in_local_frame(&mut rec, Point2::new(3.0, 4.0), Some(0.5), |c| c.fill());
        assert_eq!(
            rec.commands(),
            &[
                DrawCommand::Save,
                DrawCommand::Translate { x: 3.0, y: 4.0 },
                DrawCommand::Scale { x: 1.0, y: -1.0 },
                DrawCommand::Rotate { angle: 0.5 },
                DrawCommand::Fill,
                DrawCommand::Restore,
            ]
        );
    }

    #[test]
    fn commands_serialize_with_an_op_tag() {
        let json = serde_json::to_value(DrawCommand::Translate { x: 1.0, y: 2.0 }).unwrap();
        assert_eq!(json["op"], "translate");
        assert_eq!(json["x"], 1.0);
    }
}
