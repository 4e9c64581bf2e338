// vizboard_core/src/types.rs

use nalgebra::{Isometry3, Point2, Quaternion, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};
use std::fmt;

// --- Core Type Aliases ---
/// A position on a widget canvas, in pixels.
pub type ScreenPoint = Point2<f64>;
/// A 2-D position in the map frame, in meters.
pub type MapPoint = Point2<f64>;
/// Milliseconds on the dashboard's monotonic clock.
pub type Millis = u64;

// --- Core Identifier ---
/// Opaque name of a coordinate frame. Frames form a tree that is maintained
/// outside this crate; an id says nothing about whether the frame is known yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub String);

impl FrameId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for FrameId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =========================================================================
// == Geometry as it appears on the wire ==
// =========================================================================

/// A 3-D vector as carried by `geometry_msgs/Point` and `geometry_msgs/Vector3`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3Msg {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Vec3Msg {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A raw quaternion. Not guaranteed to be normalized, and publishers are
/// known to send all zeros when they mean "no rotation".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuaternionMsg {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub w: f64,
}

impl Default for QuaternionMsg {
    fn default() -> Self {
        Self::identity()
    }
}

impl QuaternionMsg {
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }

    /// True when every component is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0 && self.w == 0.0
    }

    /// Returns the identity for an all-zero quaternion, `self` otherwise.
    pub fn sanitized(self) -> Self {
        if self.is_zero() {
            Self::identity()
        } else {
            self
        }
    }

    /// Rotation about the vertical axis by `heading` radians.
    pub fn from_heading(heading: f64) -> Self {
        Self::from_unit(&UnitQuaternion::from_euler_angles(0.0, 0.0, heading))
    }

    pub fn from_unit(q: &UnitQuaternion<f64>) -> Self {
        Self {
            x: q.coords.x,
            y: q.coords.y,
            z: q.coords.z,
            w: q.coords.w,
        }
    }

    /// Normalized rotation. The zero quaternion maps to the identity so the
    /// result never carries NaN.
    pub fn to_unit(&self) -> UnitQuaternion<f64> {
        let q = self.sanitized();
        UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
    }
}

/// Position plus orientation, as carried by `geometry_msgs/Pose`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    #[serde(default)]
    pub position: Vec3Msg,
    #[serde(default)]
    pub orientation: QuaternionMsg,
}

impl Pose {
    pub fn new(position: Vec3Msg, orientation: QuaternionMsg) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::new(self.position.x, self.position.y, self.position.z),
            self.orientation.to_unit(),
        )
    }
}

// =========================================================================
// == Color and Time ==
// =========================================================================

/// `std_msgs/ColorRGBA`, nominally in `[0, 1]` per channel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgba {
    #[serde(default)]
    pub r: f32,
    #[serde(default)]
    pub g: f32,
    #[serde(default)]
    pub b: f32,
    #[serde(default)]
    pub a: f32,
}

impl Rgba {
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Every channel clamped to `[0, 1]`. NaN channels become 0.
    pub fn clamped(&self) -> Self {
        let c = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self::new(c(self.r), c(self.g), c(self.b), c(self.a))
    }

    fn rgb255(&self) -> [u8; 3] {
        let c = self.clamped();
        [c.r, c.g, c.b].map(|v| (v * 255.0).round() as u8)
    }

    /// CSS `rgba(...)` style string with the alpha channel applied.
    pub fn to_fill_css(&self) -> String {
        let [r, g, b] = self.rgb255();
        format!("rgba({}, {}, {}, {})", r, g, b, self.clamped().a)
    }

    /// CSS `rgb(...)` style string; alpha is ignored.
    pub fn to_stroke_css(&self) -> String {
        let [r, g, b] = self.rgb255();
        format!("rgb({}, {}, {})", r, g, b)
    }
}

/// A ROS-style `secs`/`nsecs` timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stamp {
    pub secs: u64,
    pub nsecs: u32,
}

impl Stamp {
    pub fn from_millis(ms: Millis) -> Self {
        Self {
            secs: ms / 1000,
            nsecs: (ms % 1000) as u32 * 1_000_000,
        }
    }
}
