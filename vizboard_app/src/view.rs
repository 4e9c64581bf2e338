// vizboard_app/src/view.rs

use crate::config::ViewConfig;
use crate::input::{PointerEvent, PointerPhase};
use nalgebra::{Point2, Vector2};
use vizboard_core::frames::{PanControl, Projector};
use vizboard_core::types::{MapPoint, ScreenPoint};

/// A top-down orthographic camera: a fixed-frame point at the canvas
/// center, a zoom in pixels per meter, and drag-to-pan.
///
/// Map coordinates are fixed-frame coordinates.
#[derive(Debug, Clone)]
pub struct PanZoomView {
    width: f64,
    height: f64,
    center: Point2<f64>,
    pixels_per_meter: f64,
    panning_enabled: bool,
    drag_anchor: Option<ScreenPoint>,
}

impl PanZoomView {
    pub fn new(width: f64, height: f64, center: Point2<f64>, pixels_per_meter: f64) -> Self {
        Self {
            width,
            height,
            center,
            pixels_per_meter,
            panning_enabled: true,
            drag_anchor: None,
        }
    }

    pub fn from_config(cfg: &ViewConfig) -> Self {
        Self::new(
            cfg.width,
            cfg.height,
            Point2::new(cfg.center[0], cfg.center[1]),
            cfg.pixels_per_meter,
        )
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn center(&self) -> Point2<f64> {
        self.center
    }

    pub fn pixels_per_meter(&self) -> f64 {
        self.pixels_per_meter
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn set_center(&mut self, center: Point2<f64>) {
        self.center = center;
    }

    /// Non-positive or non-finite zoom values are ignored.
    pub fn set_zoom(&mut self, pixels_per_meter: f64) -> bool {
        if pixels_per_meter.is_finite() && pixels_per_meter > 0.0 {
            self.pixels_per_meter = pixels_per_meter;
            true
        } else {
            false
        }
    }

    /// Feeds a pointer event to the pan gesture. Returns true when the view
    /// moved.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        let at = event.position();
        match event.phase {
            PointerPhase::Down => {
                self.drag_anchor = self.panning_enabled.then_some(at);
                false
            }
            PointerPhase::Move => {
                let Some(anchor) = self.drag_anchor else {
                    return false;
                };
                if !self.panning_enabled {
                    self.drag_anchor = None;
                    return false;
                }
                let d = at - anchor;
                self.center -= Vector2::new(d.x, -d.y) / self.pixels_per_meter;
                self.drag_anchor = Some(at);
                d.x != 0.0 || d.y != 0.0
            }
            PointerPhase::Up => {
                self.drag_anchor = None;
                false
            }
        }
    }
}

impl Projector for PanZoomView {
    fn fixed_to_screen(&self, p: Point2<f64>) -> ScreenPoint {
        Point2::new(
            self.width / 2.0 + (p.x - self.center.x) * self.pixels_per_meter,
            self.height / 2.0 - (p.y - self.center.y) * self.pixels_per_meter,
        )
    }

    fn map_to_screen(&self, p: MapPoint) -> ScreenPoint {
        self.fixed_to_screen(p)
    }

    fn screen_to_map(&self, px: ScreenPoint) -> MapPoint {
        Point2::new(
            self.center.x + (px.x - self.width / 2.0) / self.pixels_per_meter,
            self.center.y - (px.y - self.height / 2.0) / self.pixels_per_meter,
        )
    }

    fn units_in_pixels(&self, meters: f64) -> f64 {
        meters * self.pixels_per_meter
    }
}

impl PanControl for PanZoomView {
    fn set_panning_enabled(&mut self, enabled: bool) {
        self.panning_enabled = enabled;
        if !enabled {
            self.drag_anchor = None;
        }
    }

    fn panning_enabled(&self) -> bool {
        self.panning_enabled
    }
}
