// vizboard_app/src/prelude.rs

// Re-export the core prelude so the data model and collaborator traits come
// along with the runtime types.
pub use vizboard_core::prelude::*;

pub use crate::config::{DashboardConfig, WidgetConfig, WidgetKind};
pub use crate::dashboard::{Dashboard, DashboardEvent, UiRequest};
pub use crate::error::{DashboardError, UserNotice};
pub use crate::input::{IconAction, PointerEvent, PointerPhase};
pub use crate::settings::SettingsStore;
pub use crate::tf::TfTree;
pub use crate::transport::{FeedTransport, LoopbackTransport};
pub use crate::view::PanZoomView;
pub use crate::widgets::Widget;
