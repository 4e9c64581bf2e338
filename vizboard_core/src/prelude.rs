// vizboard_core/src/prelude.rs

// --- Collaborator Contracts ---
pub use crate::frames::{FrameResolver, PanControl, Projector};
pub use crate::render::Canvas;

// --- Core Data Structures ---
pub use crate::error::CoreError;
pub use crate::messages::{FeedMessage, MessageType};
pub use crate::types::{FrameId, MapPoint, Millis, Pose, ScreenPoint};

// --- Widget State ---
pub use crate::mapping::RasterCache;
pub use crate::markers::MarkerAggregator;
pub use crate::poses::{PoseCache, SpriteSpec};
pub use crate::waypoints::{EditOutcome, EditorEffect, WaypointEditor};

// --- Rendering ---
pub use crate::render::{CommandRecorder, DrawCommand};
