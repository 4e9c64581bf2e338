// vizboard_app/src/widgets/markers.rs

use super::{initial_topic, unexpected, Widget};
use crate::binding::FeedBinding;
use crate::config::{WidgetConfig, WidgetKind};
use crate::error::DashboardError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vizboard_core::frames::{FrameResolver, Projector};
use vizboard_core::markers::MarkerAggregator;
use vizboard_core::messages::{FeedMessage, MessageType};
use vizboard_core::render::Canvas;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerArraySettings {
    #[serde(default)]
    pub topic: String,
}

/// Draws the live marker set of one `MarkerArray` feed.
#[derive(Debug)]
pub struct MarkerArrayWidget {
    id: String,
    binding: FeedBinding,
    markers: MarkerAggregator,
}

impl MarkerArrayWidget {
    pub fn new(cfg: &WidgetConfig, stored: Option<MarkerArraySettings>) -> Self {
        let topic = initial_topic(stored.as_ref().map(|s| s.topic.as_str()), cfg);
        Self {
            id: cfg.id.clone(),
            binding: FeedBinding::new(MessageType::MarkerArray, None).with_topic(topic),
            markers: MarkerAggregator::new(),
        }
    }

    pub fn markers(&self) -> &MarkerAggregator {
        &self.markers
    }
}

impl Widget for MarkerArrayWidget {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> WidgetKind {
        WidgetKind::MarkerArray
    }

    fn binding(&self) -> Option<&FeedBinding> {
        Some(&self.binding)
    }

    fn binding_mut(&mut self) -> Option<&mut FeedBinding> {
        Some(&mut self.binding)
    }

    fn apply(&mut self, message: FeedMessage, _tf: &dyn FrameResolver) -> Result<(), DashboardError> {
        match message {
            FeedMessage::MarkerArray(array) => {
                self.markers.apply(&array);
                Ok(())
            }
            other => Err(unexpected(self.binding.topic(), MessageType::MarkerArray, &other)),
        }
    }

    fn clear_state(&mut self) {
        self.markers.clear();
    }

    fn render(&self, canvas: &mut dyn Canvas, tf: &dyn FrameResolver, view: &dyn Projector) {
        self.markers.render(canvas, tf, view);
    }

    fn settings(&self) -> Result<Value, DashboardError> {
        Ok(serde_json::to_value(MarkerArraySettings {
            topic: self.binding.topic().to_string(),
        })?)
    }
}
