// vizboard_app/src/input.rs

use crate::timers::{TimerId, TimerQueue};
use serde::{Deserialize, Serialize};
use vizboard_core::types::{Millis, ScreenPoint};

/// How long a widget icon must be held to open its settings.
pub const LONG_PRESS_MS: Millis = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// A mouse or touch event on the view, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub x: f64,
    pub y: f64,
}

impl PointerEvent {
    pub fn new(phase: PointerPhase, x: f64, y: f64) -> Self {
        Self { phase, x, y }
    }

    pub fn position(&self) -> ScreenPoint {
        ScreenPoint::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconAction {
    Press,
    Release,
    Leave,
    Cancel,
    Click,
}

/// Long-press detection for one widget icon.
///
/// A press arms a `LONG_PRESS_MS` timer; release, leave or cancel disarms
/// it. If the timer fires, the click that ends that press is swallowed.
#[derive(Debug, Default)]
pub struct IconPress {
    timer: Option<TimerId>,
    long_press_fired: bool,
}

impl IconPress {
    pub fn press<P>(&mut self, now: Millis, timers: &mut TimerQueue<P>, on_fire: P) {
        self.disarm(timers);
        self.long_press_fired = false;
        self.timer = Some(timers.schedule(now + LONG_PRESS_MS, on_fire));
    }

    /// Release, leave and cancel all end the press the same way.
    pub fn disarm<P>(&mut self, timers: &mut TimerQueue<P>) {
        if let Some(timer) = self.timer.take() {
            timers.cancel(timer);
        }
    }

    /// The armed timer went off.
    pub fn fired(&mut self) {
        self.timer = None;
        self.long_press_fired = true;
    }

    /// Whether a click should act, i.e. it did not end a long press.
    pub fn click(&mut self) -> bool {
        !std::mem::take(&mut self.long_press_fired)
    }
}
