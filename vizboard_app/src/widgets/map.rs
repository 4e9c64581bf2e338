// vizboard_app/src/widgets/map.rs

use super::{initial_topic, unexpected, Widget};
use crate::binding::FeedBinding;
use crate::config::{WidgetConfig, WidgetKind};
use crate::error::DashboardError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use vizboard_core::frames::{FrameResolver, Projector};
use vizboard_core::mapping::RasterCache;
use vizboard_core::messages::{FeedMessage, MessageType};
use vizboard_core::render::Canvas;

/// Grids are large; accept at most one every two seconds.
pub const MAP_THROTTLE_MS: u64 = 2000;

fn default_opacity() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSettings {
    #[serde(default)]
    pub topic: String,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

/// Blits the latest occupancy grid of one feed.
#[derive(Debug)]
pub struct MapWidget {
    id: String,
    binding: FeedBinding,
    raster: RasterCache,
    opacity: f64,
}

impl MapWidget {
    pub fn new(cfg: &WidgetConfig, stored: Option<MapSettings>) -> Self {
        let topic = initial_topic(stored.as_ref().map(|s| s.topic.as_str()), cfg);
        let opacity = stored
            .map(|s| s.opacity)
            .or(cfg.opacity)
            .unwrap_or_else(default_opacity);
        Self {
            id: cfg.id.clone(),
            binding: FeedBinding::new(MessageType::OccupancyGrid, Some(MAP_THROTTLE_MS))
                .with_topic(topic),
            raster: RasterCache::new(),
            opacity: if opacity.is_finite() {
                opacity.clamp(0.0, 1.0)
            } else {
                default_opacity()
            },
        }
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Clamps into `[0, 1]`. A non-finite value is refused and the current
    /// opacity kept.
    pub fn set_opacity(&mut self, opacity: f64) -> bool {
        if !opacity.is_finite() {
            debug!(widget = %self.id, "Ignoring non-finite opacity");
            return false;
        }
        self.opacity = opacity.clamp(0.0, 1.0);
        true
    }

    pub fn raster(&self) -> &RasterCache {
        &self.raster
    }
}

impl Widget for MapWidget {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> WidgetKind {
        WidgetKind::Map
    }

    fn binding(&self) -> Option<&FeedBinding> {
        Some(&self.binding)
    }

    fn binding_mut(&mut self) -> Option<&mut FeedBinding> {
        Some(&mut self.binding)
    }

    fn apply(&mut self, message: FeedMessage, _tf: &dyn FrameResolver) -> Result<(), DashboardError> {
        match message {
            FeedMessage::OccupancyGrid(grid) => {
                let cached = self.raster.accept(&grid)?;
                debug!(
                    widget = %self.id,
                    width = cached.bitmap.width,
                    height = cached.bitmap.height,
                    "Map rasterized"
                );
                Ok(())
            }
            other => Err(unexpected(self.binding.topic(), MessageType::OccupancyGrid, &other)),
        }
    }

    fn clear_state(&mut self) {
        self.raster.clear();
    }

    fn render(&self, canvas: &mut dyn Canvas, tf: &dyn FrameResolver, view: &dyn Projector) {
        self.raster.render(canvas, tf, view, self.opacity);
    }

    fn settings(&self) -> Result<Value, DashboardError> {
        Ok(serde_json::to_value(MapSettings {
            topic: self.binding.topic().to_string(),
            opacity: self.opacity,
        })?)
    }

    fn as_map_mut(&mut self) -> Option<&mut MapWidget> {
        Some(self)
    }
}
